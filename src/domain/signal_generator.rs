//! Turns an indicator table into one Buy/Sell/Hold signal per row.
//!
//! Every rule looks at the current row, and the cross rules also at the
//! previous one. Rules vote independently; a [`DecisionPolicy`] turns the
//! votes into the final signal type. ADX and ATR never vote, they only
//! annotate a Buy or Sell.

use crate::domain::error::{CrosstraderError, DataError};
use crate::domain::indicator::IndicatorKind;
use crate::domain::indicator_table::{IndicatorColumn, IndicatorTable};
use crate::domain::signal::{Signal, SignalConfig, SignalType};

/// Reasons collected for a single row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Votes {
    pub buy: Vec<String>,
    pub sell: Vec<String>,
    pub trend: Vec<String>,
    pub stops: Vec<String>,
    pub stop_level: Option<f64>,
}

pub trait DecisionPolicy: Send + Sync {
    fn resolve(&self, votes: &Votes) -> SignalType;
}

/// Buy only when nothing says sell, and the reverse. Anything else holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnanimousPolicy;

impl DecisionPolicy for UnanimousPolicy {
    fn resolve(&self, votes: &Votes) -> SignalType {
        match (votes.buy.is_empty(), votes.sell.is_empty()) {
            (false, true) => SignalType::Buy,
            (true, false) => SignalType::Sell,
            _ => SignalType::Hold,
        }
    }
}

pub struct SignalGenerator {
    config: SignalConfig,
    policy: Box<dyn DecisionPolicy>,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Result<Self, CrosstraderError> {
        config.validate()?;
        Ok(Self {
            config,
            policy: Box::new(UnanimousPolicy),
        })
    }

    pub fn with_policy(mut self, policy: impl DecisionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn generate(&self, table: &IndicatorTable) -> Result<Vec<Signal>, CrosstraderError> {
        if table.is_empty() {
            return Err(DataError::EmptyInput.into());
        }

        let first = &table.bars()[0];
        let mut signals = Vec::with_capacity(table.len());
        signals.push(Signal::hold(
            first.timestamp,
            first.close,
            self.stop_levels(table, 0).1,
        ));
        for row in 1..table.len() {
            signals.push(self.evaluate_row(table, row)?);
        }

        tracing::info!(
            rows = signals.len(),
            buys = signals.iter().filter(|s| s.is_buy()).count(),
            sells = signals.iter().filter(|s| s.is_sell()).count(),
            "signals generated"
        );
        Ok(signals)
    }

    pub fn evaluate_row(&self, table: &IndicatorTable, row: usize) -> Result<Signal, CrosstraderError> {
        if row == 0 || row >= table.len() {
            return Err(DataError::MissingPreviousRow { row }.into());
        }

        let votes = self.collect_votes(table, row);
        let bar = &table.bars()[row];
        let signal_type = self.policy.resolve(&votes);
        let signal = match signal_type {
            SignalType::Hold => Signal::hold(bar.timestamp, bar.close, votes.stop_level),
            SignalType::Buy | SignalType::Sell => {
                let Votes {
                    buy,
                    sell,
                    trend,
                    stops,
                    stop_level,
                } = votes;
                let mut reasons = if signal_type == SignalType::Buy { buy } else { sell };
                reasons.extend(trend);
                reasons.extend(stops);
                Signal {
                    timestamp: bar.timestamp,
                    price: bar.close,
                    signal_type,
                    reasons,
                    stop_level,
                }
            }
        };
        Ok(signal)
    }

    fn collect_votes(&self, table: &IndicatorTable, row: usize) -> Votes {
        let mut votes = Votes::default();
        self.moving_average_crosses(table, row, &mut votes);
        self.rsi_levels(table, row, &mut votes);
        self.macd_crosses(table, row, &mut votes);
        self.stochastic_levels(table, row, &mut votes);
        self.adx_trend(table, row, &mut votes);
        let (stops, level) = self.stop_levels(table, row);
        votes.stops = stops;
        votes.stop_level = level;
        votes
    }

    fn moving_average_crosses(&self, table: &IndicatorTable, row: usize, votes: &mut Votes) {
        for fast in table.series_of(self.config.fast_ma) {
            for slow in table.series_of(self.config.slow_ma) {
                let (Some(f), Some(s)) = (fast.output(0), slow.output(0)) else {
                    continue;
                };
                if f.id == s.id {
                    continue;
                }
                match cross(f, s, row) {
                    Some(Cross::Above) => votes
                        .buy
                        .push(format!("{} crossed above {}", fast.instance, slow.instance)),
                    Some(Cross::Below) => votes
                        .sell
                        .push(format!("{} crossed below {}", fast.instance, slow.instance)),
                    None => {}
                }
            }
        }
    }

    fn rsi_levels(&self, table: &IndicatorTable, row: usize, votes: &mut Votes) {
        let t = &self.config.thresholds;
        for series in table.series_of(IndicatorKind::Rsi) {
            let Some(rsi) = series.output(0).map(|c| c.value(row)) else {
                continue;
            };
            if rsi < t.rsi_buy {
                votes.buy.push(format!("{} below {}", series.instance, t.rsi_buy));
            } else if rsi > t.rsi_sell {
                votes.sell.push(format!("{} above {}", series.instance, t.rsi_sell));
            }
        }
    }

    fn macd_crosses(&self, table: &IndicatorTable, row: usize, votes: &mut Votes) {
        for series in table.series_of(IndicatorKind::Macd) {
            let (Some(line), Some(signal)) = (series.output(0), series.output(1)) else {
                continue;
            };
            match cross(line, signal, row) {
                Some(Cross::Above) => votes
                    .buy
                    .push(format!("{} crossed above signal line", series.instance)),
                Some(Cross::Below) => votes
                    .sell
                    .push(format!("{} crossed below signal line", series.instance)),
                None => {}
            }
        }
    }

    fn stochastic_levels(&self, table: &IndicatorTable, row: usize, votes: &mut Votes) {
        let t = &self.config.thresholds;
        for series in table.series_of(IndicatorKind::Stochastic) {
            let (Some(k), Some(d)) = (series.output(0), series.output(1)) else {
                continue;
            };
            let (k, d) = (k.value(row), d.value(row));
            if k < t.stoch_buy && d < t.stoch_buy {
                votes.buy.push(format!("{} below {}", series.instance, t.stoch_buy));
            } else if k > t.stoch_sell && d > t.stoch_sell {
                votes.sell.push(format!("{} above {}", series.instance, t.stoch_sell));
            }
        }
    }

    fn adx_trend(&self, table: &IndicatorTable, row: usize, votes: &mut Votes) {
        let t = &self.config.thresholds;
        for series in table.series_of(IndicatorKind::Adx) {
            if series.output(0).is_some_and(|c| c.value(row) > t.adx_trend) {
                votes.trend.push(format!("{} above {}", series.instance, t.adx_trend));
            }
        }
    }

    fn stop_levels(&self, table: &IndicatorTable, row: usize) -> (Vec<String>, Option<f64>) {
        let close = table.bars()[row].close;
        let multiplier = self.config.thresholds.atr_stop_multiplier;
        let mut notes = Vec::new();
        let mut first = None;
        for series in table.series_of(IndicatorKind::Atr) {
            let Some(atr) = series.output(0).map(|c| c.value(row)) else {
                continue;
            };
            let level = close - multiplier * atr;
            if !level.is_finite() {
                continue;
            }
            first.get_or_insert(level);
            notes.push(format!("{} stop loss at {:.2}", series.instance, level));
        }
        (notes, first)
    }
}

enum Cross {
    Above,
    Below,
}

/// NaN on either row compares false on both sides, so no cross is reported.
fn cross(a: &IndicatorColumn, b: &IndicatorColumn, row: usize) -> Option<Cross> {
    let (a_now, b_now) = (a.value(row), b.value(row));
    let (a_prev, b_prev) = (a.value(row - 1), b.value(row - 1));
    if a_now > b_now && a_prev < b_prev {
        Some(Cross::Above)
    } else if a_now < b_now && a_prev > b_prev {
        Some(Cross::Below)
    } else {
        None
    }
}
