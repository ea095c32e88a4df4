//! Technical indicator implementations.
//!
//! Each submodule computes one indicator as plain `Vec<f64>` series with NaN
//! for warm-up rows. [`IndicatorKind`] describes what each indicator needs
//! (parameters, price fields) and what it produces (output columns).

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

use crate::domain::error::ConfigurationError;
use crate::domain::ohlcv::PriceField;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndicatorKind {
    Sma,
    Ema,
    Rsi,
    Macd,
    Stochastic,
    Adx,
    Atr,
    Bollinger,
}

const CLOSE: &[PriceField] = &[PriceField::Close];
const HLC: &[PriceField] = &[PriceField::High, PriceField::Low, PriceField::Close];

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 8] = [
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Stochastic,
        IndicatorKind::Adx,
        IndicatorKind::Atr,
        IndicatorKind::Bollinger,
    ];

    /// Lower-case prefix used in column identifiers.
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "sma",
            IndicatorKind::Ema => "ema",
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Macd => "macd",
            IndicatorKind::Stochastic => "stoch",
            IndicatorKind::Adx => "adx",
            IndicatorKind::Atr => "atr",
            IndicatorKind::Bollinger => "bbands",
        }
    }

    /// Upper-case label used in signal reasons.
    pub fn label(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Stochastic => "STOCH",
            IndicatorKind::Adx => "ADX",
            IndicatorKind::Atr => "ATR",
            IndicatorKind::Bollinger => "BBANDS",
        }
    }

    /// Required parameters in their conventional reading order.
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            IndicatorKind::Sma
            | IndicatorKind::Ema
            | IndicatorKind::Rsi
            | IndicatorKind::Adx
            | IndicatorKind::Atr => &["timeperiod"],
            IndicatorKind::Macd => &["fastperiod", "slowperiod", "signalperiod"],
            IndicatorKind::Stochastic => &["fastk_period", "slowk_period", "slowd_period"],
            IndicatorKind::Bollinger => &["timeperiod", "nbdevup", "nbdevdn"],
        }
    }

    /// Output names in column-index order. Single-output kinds have one.
    pub fn output_names(&self) -> &'static [&'static str] {
        match self {
            IndicatorKind::Macd => &["line", "signal", "histogram"],
            IndicatorKind::Stochastic => &["k", "d"],
            IndicatorKind::Bollinger => &["upper", "middle", "lower"],
            _ => &["value"],
        }
    }

    pub fn is_multi_output(&self) -> bool {
        self.output_names().len() > 1
    }

    pub fn required_fields(&self) -> &'static [PriceField] {
        match self {
            IndicatorKind::Stochastic | IndicatorKind::Adx | IndicatorKind::Atr => HLC,
            _ => CLOSE,
        }
    }

    /// Periods must be positive integers; band deviations positive reals.
    pub fn validate_param(&self, param: &str, value: f64) -> Result<(), ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidParameter {
            indicator: self.name().to_string(),
            param: param.to_string(),
            value,
            reason: reason.to_string(),
        };

        if !value.is_finite() || value <= 0.0 {
            return Err(invalid("must be positive"));
        }
        let is_deviation = matches!(param, "nbdevup" | "nbdevdn");
        if !is_deviation && value.fract() != 0.0 {
            return Err(invalid("period must be a whole number"));
        }
        if !is_deviation && value > f64::from(u32::MAX) {
            return Err(invalid("period is too large"));
        }
        Ok(())
    }
}

impl FromStr for IndicatorKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sma" => Ok(IndicatorKind::Sma),
            "ema" => Ok(IndicatorKind::Ema),
            "rsi" => Ok(IndicatorKind::Rsi),
            "macd" => Ok(IndicatorKind::Macd),
            "stoch" | "stochastic" => Ok(IndicatorKind::Stochastic),
            "adx" => Ok(IndicatorKind::Adx),
            "atr" => Ok(IndicatorKind::Atr),
            "bbands" | "bollinger" => Ok(IndicatorKind::Bollinger),
            _ => Err(ConfigurationError::UnknownIndicator {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("SMA".parse::<IndicatorKind>(), Ok(IndicatorKind::Sma));
        assert_eq!(" macd ".parse::<IndicatorKind>(), Ok(IndicatorKind::Macd));
        assert_eq!(
            "Stochastic".parse::<IndicatorKind>(),
            Ok(IndicatorKind::Stochastic)
        );
        assert_eq!("bbands".parse::<IndicatorKind>(), Ok(IndicatorKind::Bollinger));
    }

    #[test]
    fn parse_unknown_name() {
        assert_eq!(
            "vwap".parse::<IndicatorKind>(),
            Err(ConfigurationError::UnknownIndicator {
                name: "vwap".into()
            })
        );
    }

    #[test]
    fn names_round_trip() {
        for kind in IndicatorKind::ALL {
            assert_eq!(kind.name().parse::<IndicatorKind>(), Ok(kind));
        }
    }

    #[test]
    fn output_shapes() {
        assert!(!IndicatorKind::Sma.is_multi_output());
        assert_eq!(IndicatorKind::Macd.output_names(), &["line", "signal", "histogram"]);
        assert_eq!(IndicatorKind::Stochastic.output_names().len(), 2);
    }

    #[test]
    fn atr_needs_high_low() {
        assert!(IndicatorKind::Atr.required_fields().contains(&PriceField::High));
        assert_eq!(IndicatorKind::Rsi.required_fields(), &[PriceField::Close]);
    }

    #[test]
    fn validate_param_rules() {
        assert!(IndicatorKind::Sma.validate_param("timeperiod", 20.0).is_ok());
        assert!(IndicatorKind::Sma.validate_param("timeperiod", 0.0).is_err());
        assert!(IndicatorKind::Sma.validate_param("timeperiod", 2.5).is_err());
        assert!(IndicatorKind::Bollinger.validate_param("nbdevup", 2.5).is_ok());
        assert!(IndicatorKind::Bollinger.validate_param("nbdevdn", -1.0).is_err());
    }

    #[test]
    fn validate_param_caps_periods() {
        assert!(IndicatorKind::Adx
            .validate_param("timeperiod", f64::from(u32::MAX))
            .is_ok());
        let err = IndicatorKind::Adx
            .validate_param("timeperiod", 1e19)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidParameter { .. }));
        assert!(err.to_string().contains("too large"));
        assert!(IndicatorKind::Bollinger.validate_param("nbdevup", 1e19).is_ok());
    }
}
