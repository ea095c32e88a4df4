//! Performance statistics over a completed trade log.

use super::position::Trade;
use std::fmt;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// A statistic whose denominator may be zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    Value(f64),
    Undefined,
}

impl Statistic {
    /// Finite values only; NaN and infinities become `Undefined`.
    pub fn from_ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            return Statistic::Undefined;
        }
        Statistic::from(numerator / denominator)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Statistic::Value(v) => Some(*v),
            Statistic::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Statistic::Undefined)
    }
}

impl From<f64> for Statistic {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Statistic::Value(v)
        } else {
            Statistic::Undefined
        }
    }
}

/// Honors a precision flag: `format!("{:.2}", stat)`.
impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, f.precision()) {
            (Statistic::Value(v), Some(p)) => write!(f, "{:.*}", p, v),
            (Statistic::Value(v), None) => write!(f, "{}", v),
            (Statistic::Undefined, _) => f.write_str("undefined"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub win_rate: Statistic,
    pub avg_win: Statistic,
    /// Negative when defined.
    pub avg_loss: Statistic,
    pub profit_factor: Statistic,
    pub expectancy: Statistic,
    /// Largest (peak - trough) / peak on the cumulative curve.
    pub max_drawdown: f64,
    /// Trades spent in the longest drawdown.
    pub max_drawdown_duration: usize,
    pub sharpe_ratio: Statistic,
    pub cumulative_return: f64,
    pub total_return: f64,
    pub final_equity: f64,
    pub largest_win: Statistic,
    pub largest_loss: Statistic,
    pub avg_trade_duration: Statistic,
}

impl PerformanceReport {
    pub fn compute(trades: &[Trade], initial_capital: f64) -> Self {
        let returns: Vec<f64> = trades.iter().map(|t| t.return_pct).collect();

        let wins: Vec<f64> = returns.iter().copied().filter(|&r| r > 0.0).collect();
        let losses: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
        let total_trades = returns.len();
        let winning_trades = wins.len();
        let losing_trades = losses.len();
        let breakeven_trades = total_trades - winning_trades - losing_trades;

        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum();

        let win_rate = Statistic::from_ratio(winning_trades as f64, total_trades as f64);
        let avg_win = Statistic::from_ratio(gross_profit, winning_trades as f64);
        let avg_loss = Statistic::from_ratio(gross_loss, losing_trades as f64);
        let profit_factor = Statistic::from_ratio(gross_profit, gross_loss.abs());

        let expectancy = match win_rate {
            Statistic::Value(wr) => Statistic::from(
                wr * avg_win.value().unwrap_or(0.0) + (1.0 - wr) * avg_loss.value().unwrap_or(0.0),
            ),
            Statistic::Undefined => Statistic::Undefined,
        };

        let curve = equity_curve(trades);
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&curve);
        let cumulative_return = curve.last().copied().unwrap_or(1.0);

        let largest_win = wins
            .iter()
            .copied()
            .reduce(f64::max)
            .map_or(Statistic::Undefined, Statistic::from);
        let largest_loss = losses
            .iter()
            .copied()
            .reduce(f64::min)
            .map_or(Statistic::Undefined, Statistic::from);

        let total_duration: usize = trades.iter().map(|t| t.duration).sum();
        let avg_trade_duration = Statistic::from_ratio(total_duration as f64, total_trades as f64);

        PerformanceReport {
            total_trades,
            winning_trades,
            losing_trades,
            breakeven_trades,
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
            expectancy,
            max_drawdown,
            max_drawdown_duration,
            sharpe_ratio: compute_sharpe(&returns),
            cumulative_return,
            total_return: cumulative_return - 1.0,
            final_equity: initial_capital * cumulative_return,
            largest_win,
            largest_loss,
            avg_trade_duration,
        }
    }

    /// Metric name and value pairs in report order.
    pub fn rows(&self) -> Vec<(&'static str, Statistic)> {
        vec![
            ("total_trades", Statistic::Value(self.total_trades as f64)),
            ("winning_trades", Statistic::Value(self.winning_trades as f64)),
            ("losing_trades", Statistic::Value(self.losing_trades as f64)),
            ("breakeven_trades", Statistic::Value(self.breakeven_trades as f64)),
            ("win_rate", self.win_rate),
            ("avg_win", self.avg_win),
            ("avg_loss", self.avg_loss),
            ("profit_factor", self.profit_factor),
            ("expectancy", self.expectancy),
            ("max_drawdown", Statistic::Value(self.max_drawdown)),
            (
                "max_drawdown_duration",
                Statistic::Value(self.max_drawdown_duration as f64),
            ),
            ("sharpe_ratio", self.sharpe_ratio),
            ("cumulative_return", Statistic::Value(self.cumulative_return)),
            ("total_return", Statistic::Value(self.total_return)),
            ("final_equity", Statistic::Value(self.final_equity)),
            ("largest_win", self.largest_win),
            ("largest_loss", self.largest_loss),
            ("avg_trade_duration", self.avg_trade_duration),
        ]
    }
}

/// Cumulative return after each trade, starting at 1.0 before the first.
pub fn equity_curve(trades: &[Trade]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut cumulative = 1.0;
    curve.push(cumulative);
    for trade in trades {
        cumulative *= 1.0 + trade.return_pct;
        curve.push(cumulative);
    }
    curve
}

fn compute_drawdown(curve: &[f64]) -> (f64, usize) {
    let Some(&first) = curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for &value in curve {
        if value >= peak {
            peak = value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

/// Mean over sample standard deviation of per-trade returns, scaled by √252.
fn compute_sharpe(returns: &[f64]) -> Statistic {
    if returns.len() < 2 {
        return Statistic::Undefined;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    if std_dev <= f64::EPSILON {
        return Statistic::Undefined;
    }
    Statistic::from(mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt())
}
