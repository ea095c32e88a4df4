//! Trading signals and the thresholds that produce them.

use crate::domain::error::ConfigurationError;
use crate::domain::indicator::IndicatorKind;
use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Buy => "BUY",
            SignalType::Sell => "SELL",
            SignalType::Hold => "HOLD",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const NO_CLEAR_SIGNAL: &str = "No clear signal";

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    /// Close of the bar the signal was evaluated on.
    pub price: f64,
    pub signal_type: SignalType,
    pub reasons: Vec<String>,
    /// First valid ATR stop level on this row, whatever the signal type.
    pub stop_level: Option<f64>,
}

impl Signal {
    pub fn hold(timestamp: NaiveDateTime, price: f64, stop_level: Option<f64>) -> Self {
        Self {
            timestamp,
            price,
            signal_type: SignalType::Hold,
            reasons: vec![NO_CLEAR_SIGNAL.to_string()],
            stop_level,
        }
    }

    pub fn reason(&self) -> String {
        self.reasons.join(", ")
    }

    pub fn is_buy(&self) -> bool {
        self.signal_type == SignalType::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.signal_type == SignalType::Sell
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub rsi_buy: f64,
    pub rsi_sell: f64,
    pub stoch_buy: f64,
    pub stoch_sell: f64,
    pub adx_trend: f64,
    pub atr_stop_multiplier: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rsi_buy: 30.0,
            rsi_sell: 70.0,
            stoch_buy: 20.0,
            stoch_sell: 80.0,
            adx_trend: 25.0,
            atr_stop_multiplier: 2.0,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |name: &str, reason: &str| ConfigurationError::InvalidThreshold {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        let levels = [
            ("rsi_buy", self.rsi_buy),
            ("rsi_sell", self.rsi_sell),
            ("stoch_buy", self.stoch_buy),
            ("stoch_sell", self.stoch_sell),
            ("adx_trend", self.adx_trend),
        ];
        for (name, value) in levels {
            if !(0.0..=100.0).contains(&value) {
                return Err(invalid(name, "must be between 0 and 100"));
            }
        }
        if self.rsi_buy >= self.rsi_sell {
            return Err(invalid("rsi_buy", "must be below rsi_sell"));
        }
        if self.stoch_buy >= self.stoch_sell {
            return Err(invalid("stoch_buy", "must be below stoch_sell"));
        }
        if !self.atr_stop_multiplier.is_finite() || self.atr_stop_multiplier <= 0.0 {
            return Err(invalid("atr_multiplier", "must be positive"));
        }
        Ok(())
    }
}

/// Which moving-average columns form the fast and slow sides of a cross.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub fast_ma: IndicatorKind,
    pub slow_ma: IndicatorKind,
    pub thresholds: Thresholds,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            fast_ma: IndicatorKind::Sma,
            slow_ma: IndicatorKind::Ema,
            thresholds: Thresholds::default(),
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, kind) in [("fast_ma", self.fast_ma), ("slow_ma", self.slow_ma)] {
            if !matches!(kind, IndicatorKind::Sma | IndicatorKind::Ema) {
                return Err(ConfigurationError::InvalidThreshold {
                    name: name.to_string(),
                    reason: format!("{} is not a moving average", kind.name()),
                });
            }
        }
        self.thresholds.validate()
    }
}
