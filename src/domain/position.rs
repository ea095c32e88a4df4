//! Open positions and completed trades.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Flat,
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Flat => "flat",
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    EndOfData,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Signal => "signal",
            ExitReason::EndOfData => "end_of_data",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub entry_index: usize,
}

impl Position {
    /// Open at `entry_price` with stop and target placed as fractions of it.
    /// `Flat` yields `None`.
    pub fn open(
        direction: Direction,
        entry_price: f64,
        entry_index: usize,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Option<Self> {
        let (stop_loss_price, take_profit_price) = match direction {
            Direction::Long => (
                entry_price * (1.0 - stop_loss_pct),
                entry_price * (1.0 + take_profit_pct),
            ),
            Direction::Short => (
                entry_price * (1.0 + stop_loss_pct),
                entry_price * (1.0 - take_profit_pct),
            ),
            Direction::Flat => return None,
        };
        Some(Self {
            direction,
            entry_price,
            stop_loss_price,
            take_profit_price,
            entry_index,
        })
    }

    /// Whether a bar with this high/low range reaches the stop.
    pub fn should_stop_loss(&self, high: f64, low: f64) -> bool {
        match self.direction {
            Direction::Long => low <= self.stop_loss_price,
            Direction::Short => high >= self.stop_loss_price,
            Direction::Flat => false,
        }
    }

    pub fn should_take_profit(&self, high: f64, low: f64) -> bool {
        match self.direction {
            Direction::Long => high >= self.take_profit_price,
            Direction::Short => low <= self.take_profit_price,
            Direction::Flat => false,
        }
    }

    pub fn return_at(&self, exit_price: f64) -> f64 {
        match self.direction {
            Direction::Long => exit_price / self.entry_price - 1.0,
            Direction::Short => self.entry_price / exit_price - 1.0,
            Direction::Flat => 0.0,
        }
    }

    pub fn close(&self, exit_price: f64, exit_index: usize, exit_reason: ExitReason) -> Trade {
        Trade {
            entry_index: self.entry_index,
            exit_index,
            entry_price: self.entry_price,
            exit_price,
            direction: self.direction,
            exit_reason,
            return_pct: self.return_at(exit_price),
            duration: exit_index.saturating_sub(self.entry_index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub direction: Direction,
    pub exit_reason: ExitReason,
    /// Fractional return, 0.02 for +2%.
    pub return_pct: f64,
    /// Bars held.
    pub duration: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn long_at_100() -> Position {
        Position::open(Direction::Long, 100.0, 1, 0.02, 0.04).unwrap()
    }

    fn short_at_100() -> Position {
        Position::open(Direction::Short, 100.0, 1, 0.02, 0.04).unwrap()
    }

    #[test]
    fn long_levels() {
        let pos = long_at_100();
        assert_eq!(pos.direction, Direction::Long);
        assert_relative_eq!(pos.stop_loss_price, 98.0);
        assert_relative_eq!(pos.take_profit_price, 104.0);
    }

    #[test]
    fn short_levels() {
        let pos = short_at_100();
        assert_eq!(pos.direction, Direction::Short);
        assert_relative_eq!(pos.stop_loss_price, 102.0);
        assert_relative_eq!(pos.take_profit_price, 96.0);
    }

    #[test]
    fn flat_does_not_open() {
        assert!(Position::open(Direction::Flat, 100.0, 0, 0.02, 0.04).is_none());
    }

    #[test]
    fn long_stop_and_target() {
        let pos = long_at_100();
        assert!(pos.should_stop_loss(99.0, 97.0));
        assert!(pos.should_stop_loss(99.0, 98.0));
        assert!(!pos.should_stop_loss(99.0, 98.5));
        assert!(pos.should_take_profit(104.0, 101.0));
        assert!(!pos.should_take_profit(103.9, 101.0));
    }

    #[test]
    fn short_stop_and_target() {
        let pos = short_at_100();
        assert!(pos.should_stop_loss(102.5, 99.0));
        assert!(!pos.should_stop_loss(101.0, 99.0));
        assert!(pos.should_take_profit(99.0, 95.0));
        assert!(!pos.should_take_profit(99.0, 97.0));
    }

    #[test]
    fn long_return() {
        let trade = long_at_100().close(98.0, 4, ExitReason::StopLoss);
        assert_relative_eq!(trade.return_pct, -0.02);
        assert_eq!(trade.duration, 3);
        assert_eq!(trade.direction, Direction::Long);
    }

    #[test]
    fn short_return() {
        let trade = short_at_100().close(80.0, 2, ExitReason::Signal);
        assert_relative_eq!(trade.return_pct, 0.25);
        assert_eq!(trade.duration, 1);
    }

    #[test]
    fn reason_labels() {
        assert_eq!(ExitReason::TakeProfit.to_string(), "take_profit");
        assert_eq!(Direction::Short.to_string(), "short");
    }
}
