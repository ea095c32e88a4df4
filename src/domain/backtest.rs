//! Signal replay against OHLC bars.
//!
//! A signal on bar j acts on bar j+1: entries and signal exits fill at the
//! next open, stops and targets are checked against the next bar's range.
//! Within one bar the stop wins over the target, and the target over a
//! reversing signal.

use crate::domain::error::{CrosstraderError, DataError};
use crate::domain::metrics::{equity_curve, PerformanceReport};
use crate::domain::ohlcv::{PriceField, PriceSeries};
use crate::domain::position::{Direction, ExitReason, Position, Trade};
use crate::domain::signal::{Signal, SignalType};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub initial_capital: f64,
    pub allow_shorting: bool,
    /// Close a position still open on the last bar at its close.
    pub close_at_end: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
            initial_capital: 100_000.0,
            allow_shorting: true,
            close_at_end: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    /// Cumulative return after each trade, starting at 1.0.
    pub equity_curve: Vec<f64>,
    pub open_position: Option<Position>,
    pub report: PerformanceReport,
}

pub fn run(
    prices: &PriceSeries,
    signals: &[Signal],
    config: &BacktestConfig,
) -> Result<BacktestResult, CrosstraderError> {
    for field in [PriceField::Open, PriceField::High, PriceField::Low] {
        prices.require(field)?;
    }
    let bars = prices.bars();
    if signals.len() != bars.len() {
        return Err(DataError::SignalMismatch {
            index: signals.len().min(bars.len()),
        }
        .into());
    }
    if let Some(index) = bars
        .iter()
        .zip(signals)
        .position(|(bar, signal)| bar.timestamp != signal.timestamp)
    {
        return Err(DataError::SignalMismatch { index }.into());
    }

    let mut trades = Vec::new();
    let mut position: Option<Position> = None;

    for j in 0..bars.len().saturating_sub(1) {
        let next = &bars[j + 1];
        let signal = signals[j].signal_type;

        match position.take() {
            None => {
                let direction = match signal {
                    SignalType::Buy => Direction::Long,
                    SignalType::Sell if config.allow_shorting => Direction::Short,
                    _ => Direction::Flat,
                };
                position = Position::open(
                    direction,
                    next.open,
                    j + 1,
                    config.stop_loss_pct,
                    config.take_profit_pct,
                );
                if let Some(pos) = &position {
                    tracing::debug!(
                        direction = %pos.direction,
                        entry_index = pos.entry_index,
                        entry_price = pos.entry_price,
                        "position opened"
                    );
                }
            }
            Some(pos) => {
                let reversing = match pos.direction {
                    Direction::Long => signal == SignalType::Sell,
                    Direction::Short => signal == SignalType::Buy,
                    Direction::Flat => false,
                };
                let exit = if pos.should_stop_loss(next.high, next.low) {
                    Some((pos.stop_loss_price, ExitReason::StopLoss))
                } else if pos.should_take_profit(next.high, next.low) {
                    Some((pos.take_profit_price, ExitReason::TakeProfit))
                } else if reversing {
                    Some((next.open, ExitReason::Signal))
                } else {
                    None
                };

                match exit {
                    Some((price, reason)) => {
                        let trade = pos.close(price, j + 1, reason);
                        tracing::debug!(
                            exit_index = trade.exit_index,
                            exit_price = trade.exit_price,
                            reason = %trade.exit_reason,
                            "position closed"
                        );
                        trades.push(trade);
                    }
                    None => position = Some(pos),
                }
            }
        }
    }

    if let Some(pos) = position.take() {
        let last_index = bars.len() - 1;
        if config.close_at_end {
            trades.push(pos.close(bars[last_index].close, last_index, ExitReason::EndOfData));
        } else {
            tracing::warn!(
                direction = %pos.direction,
                entry_index = pos.entry_index,
                "position still open at end of data"
            );
            position = Some(pos);
        }
    }

    let report = PerformanceReport::compute(&trades, config.initial_capital);
    tracing::info!(
        trades = report.total_trades,
        cumulative_return = report.cumulative_return,
        "backtest complete"
    );
    Ok(BacktestResult {
        equity_curve: equity_curve(&trades),
        trades,
        open_position: position,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::days(i as i64)
    }

    /// (open, high, low, close) rows.
    fn prices(rows: &[(f64, f64, f64, f64)]) -> PriceSeries {
        let bars = rows
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| PriceBar {
                timestamp: ts(i),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn signals(types: &[SignalType]) -> Vec<Signal> {
        types
            .iter()
            .enumerate()
            .map(|(i, &signal_type)| Signal {
                timestamp: ts(i),
                price: 100.0,
                signal_type,
                reasons: vec![],
                stop_level: None,
            })
            .collect()
    }

    use SignalType::{Buy, Hold, Sell};

    #[test]
    fn long_stopped_out_at_stop_price() {
        let prices = prices(&[
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 101.0, 99.5, 100.0),
            (99.0, 99.0, 97.0, 98.0),
        ]);
        let result = run(&prices, &signals(&[Buy, Hold, Hold]), &BacktestConfig::default()).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_relative_eq!(trade.entry_price, 100.0);
        assert_relative_eq!(trade.exit_price, 98.0);
        assert_relative_eq!(trade.return_pct, -0.02, epsilon = 1e-12);
        assert_eq!(trade.entry_index, 1);
        assert_eq!(trade.exit_index, 2);
        assert_eq!(trade.duration, 1);
        assert!(result.open_position.is_none());
    }

    #[test]
    fn stop_wins_over_target_on_the_same_bar() {
        let prices = prices(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 110.0, 90.0, 100.0),
        ]);
        let result = run(&prices, &signals(&[Buy, Hold, Hold]), &BacktestConfig::default()).unwrap();
        assert_eq!(result.trades[0].exit_reason, ExitReason::StopLoss);
    }

    #[test]
    fn long_hits_target() {
        let prices = prices(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
            (101.0, 105.0, 100.0, 104.5),
        ]);
        let result = run(&prices, &signals(&[Buy, Hold, Hold]), &BacktestConfig::default()).unwrap();
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert_relative_eq!(trade.exit_price, 104.0, epsilon = 1e-12);
    }

    #[test]
    fn sell_signal_exits_long_at_next_open() {
        let prices = prices(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 101.0, 99.0, 100.5),
            (101.0, 102.0, 100.0, 101.0),
        ]);
        let result = run(
            &prices,
            &signals(&[Buy, Hold, Sell, Hold]),
            &BacktestConfig::default(),
        )
        .unwrap();
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        assert_relative_eq!(trade.exit_price, 101.0);
        assert_eq!(trade.exit_index, 3);
        // closing does not flip into a short on the same bar
        assert!(result.open_position.is_none());
    }

    #[test]
    fn short_profits_when_price_falls() {
        let prices = prices(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
            (99.0, 99.5, 95.0, 96.0),
        ]);
        let result = run(&prices, &signals(&[Sell, Hold, Hold]), &BacktestConfig::default()).unwrap();
        let trade = &result.trades[0];
        assert_eq!(trade.direction, Direction::Short);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert_relative_eq!(trade.exit_price, 96.0, epsilon = 1e-12);
        assert_relative_eq!(trade.return_pct, 100.0 / 96.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn short_stopped_out_above_entry() {
        let prices = prices(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
            (101.0, 103.0, 100.5, 102.5),
        ]);
        let result = run(&prices, &signals(&[Sell, Hold, Hold]), &BacktestConfig::default()).unwrap();
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.direction, Direction::Short);
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_index, 2);
        assert_relative_eq!(trade.exit_price, 102.0, epsilon = 1e-12);
        assert_relative_eq!(trade.return_pct, 1.0 / 1.02 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn buy_signal_closes_short_at_next_open() {
        let prices = prices(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
            (99.5, 100.0, 99.0, 99.5),
        ]);
        let result =
            run(&prices, &signals(&[Sell, Hold, Buy, Hold]), &BacktestConfig::default()).unwrap();
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.direction, Direction::Short);
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        assert_eq!(trade.entry_index, 1);
        assert_eq!(trade.exit_index, 3);
        assert_relative_eq!(trade.exit_price, 99.5, epsilon = 1e-12);
        assert_relative_eq!(trade.return_pct, 100.0 / 99.5 - 1.0, epsilon = 1e-12);
        assert!(result.open_position.is_none());
    }

    #[test]
    fn shorting_can_be_disabled() {
        let prices = prices(&[(100.0, 100.0, 100.0, 100.0); 3]);
        let config = BacktestConfig {
            allow_shorting: false,
            ..BacktestConfig::default()
        };
        let result = run(&prices, &signals(&[Sell, Sell, Hold]), &config).unwrap();
        assert!(result.trades.is_empty());
        assert!(result.open_position.is_none());
    }

    #[test]
    fn open_position_is_reported_not_closed() {
        let prices = prices(&[(100.0, 100.0, 100.0, 100.0); 3]);
        let result = run(&prices, &signals(&[Buy, Hold, Hold]), &BacktestConfig::default()).unwrap();
        assert!(result.trades.is_empty());
        let open = result.open_position.unwrap();
        assert_eq!(open.direction, Direction::Long);
        assert_eq!(open.entry_index, 1);
        assert_eq!(result.report.total_trades, 0);
    }

    #[test]
    fn close_at_end_books_the_open_position() {
        let prices = prices(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 100.5, 99.5, 100.0),
            (100.0, 101.0, 99.5, 101.0),
        ]);
        let config = BacktestConfig {
            close_at_end: true,
            ..BacktestConfig::default()
        };
        let result = run(&prices, &signals(&[Buy, Hold, Hold]), &config).unwrap();
        assert!(result.open_position.is_none());
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::EndOfData);
        assert_relative_eq!(trade.exit_price, 101.0);
        assert_eq!(trade.exit_index, 2);
    }

    #[test]
    fn last_bar_signal_is_ignored() {
        let prices = prices(&[(100.0, 100.0, 100.0, 100.0); 2]);
        let result = run(&prices, &signals(&[Hold, Buy]), &BacktestConfig::default()).unwrap();
        assert!(result.trades.is_empty());
        assert!(result.open_position.is_none());
    }

    #[test]
    fn equity_curve_tracks_trades() {
        let prices = prices(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 105.0, 100.0, 104.0),
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 100.0, 97.0, 98.0),
        ]);
        let result = run(
            &prices,
            &signals(&[Buy, Hold, Buy, Hold, Hold]),
            &BacktestConfig::default(),
        )
        .unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.equity_curve.len(), 3);
        assert_relative_eq!(result.equity_curve[0], 1.0);
        assert_relative_eq!(result.equity_curve[2], 1.04 * 0.98, epsilon = 1e-12);
        assert_relative_eq!(result.report.cumulative_return, 1.04 * 0.98, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_signal_count() {
        let prices = prices(&[(100.0, 100.0, 100.0, 100.0); 3]);
        let err = run(&prices, &signals(&[Hold, Hold]), &BacktestConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CrosstraderError::Data(DataError::SignalMismatch { index: 2 })
        ));
    }

    #[test]
    fn mismatched_timestamp() {
        let prices = prices(&[(100.0, 100.0, 100.0, 100.0); 3]);
        let mut sigs = signals(&[Hold, Hold, Hold]);
        sigs[1].timestamp = ts(9);
        let err = run(&prices, &sigs, &BacktestConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CrosstraderError::Data(DataError::SignalMismatch { index: 1 })
        ));
    }

    #[test]
    fn close_only_prices_are_rejected() {
        let full = prices(&[(100.0, 100.0, 100.0, 100.0); 2]);
        let close_only = PriceSeries::with_fields(
            full.bars().to_vec(),
            [PriceField::Close].into_iter().collect(),
        )
        .unwrap();
        let err = run(&close_only, &signals(&[Hold, Hold]), &BacktestConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CrosstraderError::Data(DataError::MissingColumn {
                field: PriceField::Open
            })
        ));
    }
}
