//! Strategy configuration: the indicator grid, signal thresholds and
//! backtest settings read from one INI file.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::CrosstraderError;
use crate::domain::indicator::IndicatorKind;
use crate::domain::indicator_spec::IndicatorSpec;
use crate::domain::signal::{SignalConfig, Thresholds};
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub indicators: Vec<IndicatorSpec>,
    pub signals: SignalConfig,
    pub backtest: BacktestConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorSpec::default_grid(),
            signals: SignalConfig::default(),
            backtest: BacktestConfig::default(),
        }
    }
}

impl StrategyConfig {
    /// Missing sections and keys fall back to defaults. Values that are
    /// present but unparseable are errors.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CrosstraderError> {
        Ok(Self {
            indicators: indicator_specs(config)?,
            signals: signal_config(config)?,
            backtest: backtest_config(config)?,
        })
    }
}

fn indicator_specs(config: &dyn ConfigPort) -> Result<Vec<IndicatorSpec>, CrosstraderError> {
    if !config.has_section("indicators") {
        return Ok(IndicatorSpec::default_grid());
    }
    let enabled = config
        .get_string("indicators", "enabled")
        .ok_or_else(|| CrosstraderError::ConfigMissing {
            section: "indicators".into(),
            key: "enabled".into(),
        })?;

    let mut specs = Vec::new();
    for name in split_list(&enabled) {
        let section = name.to_lowercase();
        let keys = config.keys(&section);
        if keys.is_empty() {
            specs.push(default_spec(&section).unwrap_or_else(|| IndicatorSpec::new(name)));
            continue;
        }
        let mut spec = IndicatorSpec::new(name);
        for key in keys {
            let raw = config.get_string(&section, &key).unwrap_or_default();
            spec = spec.param(key.clone(), parse_number_list(&section, &key, &raw)?);
        }
        specs.push(spec);
    }
    Ok(specs)
}

/// Default grid entry for an indicator section that was enabled but not
/// configured.
fn default_spec(name: &str) -> Option<IndicatorSpec> {
    let kind: IndicatorKind = name.parse().ok()?;
    IndicatorSpec::default_grid()
        .into_iter()
        .find(|spec| spec.name == kind.name())
}

fn signal_config(config: &dyn ConfigPort) -> Result<SignalConfig, CrosstraderError> {
    let defaults = SignalConfig::default();
    let t = &defaults.thresholds;
    Ok(SignalConfig {
        fast_ma: parse_kind(config, "signals", "fast_ma")?.unwrap_or(defaults.fast_ma),
        slow_ma: parse_kind(config, "signals", "slow_ma")?.unwrap_or(defaults.slow_ma),
        thresholds: Thresholds {
            rsi_buy: number_or(config, "signals", "rsi_buy", t.rsi_buy)?,
            rsi_sell: number_or(config, "signals", "rsi_sell", t.rsi_sell)?,
            stoch_buy: number_or(config, "signals", "stoch_buy", t.stoch_buy)?,
            stoch_sell: number_or(config, "signals", "stoch_sell", t.stoch_sell)?,
            adx_trend: number_or(config, "signals", "adx_trend", t.adx_trend)?,
            atr_stop_multiplier: number_or(
                config,
                "signals",
                "atr_multiplier",
                t.atr_stop_multiplier,
            )?,
        },
    })
}

fn backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, CrosstraderError> {
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        stop_loss_pct: number_or(config, "backtest", "stop_loss", defaults.stop_loss_pct)?,
        take_profit_pct: number_or(config, "backtest", "take_profit", defaults.take_profit_pct)?,
        initial_capital: number_or(
            config,
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        )?,
        allow_shorting: bool_or(
            config,
            "backtest",
            "allow_shorting",
            defaults.allow_shorting,
        )?,
        close_at_end: bool_or(config, "backtest", "close_at_end", defaults.close_at_end)?,
    })
}

pub(crate) fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn parse_number_list(
    section: &str,
    key: &str,
    raw: &str,
) -> Result<Vec<f64>, CrosstraderError> {
    split_list(raw)
        .map(|item| {
            item.parse::<f64>().map_err(|_| CrosstraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{}' is not a number", item),
            })
        })
        .collect()
}

/// The number at `section.key`, or `default` when the key is absent.
pub(crate) fn number_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, CrosstraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| CrosstraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a number", raw.trim()),
        }),
    }
}

/// Accepts true/yes/1 and false/no/0 in any case.
pub(crate) fn bool_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, CrosstraderError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(CrosstraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}

fn parse_kind(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<IndicatorKind>, CrosstraderError> {
    config
        .get_string(section, key)
        .map(|raw| {
            raw.parse().map_err(|_| CrosstraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("unknown indicator '{}'", raw.trim()),
            })
        })
        .transpose()
}
