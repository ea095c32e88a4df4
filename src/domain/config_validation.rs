//! Configuration validation.
//!
//! Validates every section before any price data is read.

use crate::domain::error::CrosstraderError;
use crate::domain::strategy::StrategyConfig;
use crate::ports::config_port::ConfigPort;

/// Parse and range-check the whole configuration.
pub fn validate_config(config: &dyn ConfigPort) -> Result<StrategyConfig, CrosstraderError> {
    let strategy = StrategyConfig::from_config(config)?;
    validate_indicators(&strategy)?;
    strategy.signals.validate()?;
    validate_backtest(&strategy)?;
    Ok(strategy)
}

fn validate_indicators(strategy: &StrategyConfig) -> Result<(), CrosstraderError> {
    if strategy.indicators.is_empty() {
        return Err(invalid("indicators", "enabled", "at least one indicator is required"));
    }
    for spec in &strategy.indicators {
        spec.expand()?;
    }
    Ok(())
}

fn validate_backtest(strategy: &StrategyConfig) -> Result<(), CrosstraderError> {
    let bt = &strategy.backtest;
    if !(bt.stop_loss_pct > 0.0 && bt.stop_loss_pct < 1.0) {
        return Err(invalid("backtest", "stop_loss", "stop_loss must be between 0 and 1"));
    }
    if !(bt.take_profit_pct > 0.0 && bt.take_profit_pct.is_finite()) {
        return Err(invalid("backtest", "take_profit", "take_profit must be positive"));
    }
    if !(bt.initial_capital > 0.0 && bt.initial_capital.is_finite()) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> CrosstraderError {
    CrosstraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
