//! Indicator specifications and parameter-grid expansion.
//!
//! An [`IndicatorSpec`] maps each parameter name to a list of candidate
//! values. [`IndicatorSpec::expand`] walks the Cartesian product of those
//! lists: names in lexicographic order, values in the order given, the last
//! name varying fastest. Every grid point becomes an [`IndicatorInstance`],
//! and every output of an instance is addressed by a [`ColumnId`].

use crate::domain::error::ConfigurationError;
use crate::domain::indicator::{
    adx::calculate_adx, atr::calculate_atr, bollinger::calculate_bollinger,
    ema::calculate_ema, macd::{self, calculate_macd}, rsi::calculate_rsi, sma::calculate_sma,
    stochastic::calculate_stochastic, IndicatorKind,
};
use crate::domain::ohlcv::PriceSeries;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    pub name: String,
    pub params: BTreeMap<String, Vec<f64>>,
}

impl IndicatorSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        self.params.insert(name.into(), values.into_iter().collect());
        self
    }

    /// The grid the engine uses when no indicator configuration is given.
    pub fn default_grid() -> Vec<IndicatorSpec> {
        let periods = [5.0, 10.0, 20.0, 50.0, 100.0, 200.0];
        vec![
            IndicatorSpec::new("sma").param("timeperiod", periods),
            IndicatorSpec::new("ema").param("timeperiod", periods),
            IndicatorSpec::new("rsi").param("timeperiod", [6.0, 12.0, 24.0]),
            IndicatorSpec::new("macd")
                .param("fastperiod", [macd::DEFAULT_FAST as f64])
                .param("slowperiod", [macd::DEFAULT_SLOW as f64])
                .param("signalperiod", [macd::DEFAULT_SIGNAL as f64]),
            IndicatorSpec::new("stoch")
                .param("fastk_period", [14.0])
                .param("slowk_period", [3.0])
                .param("slowd_period", [3.0]),
            IndicatorSpec::new("adx").param("timeperiod", [14.0]),
            IndicatorSpec::new("atr").param("timeperiod", [14.0]),
        ]
    }

    /// Validate the spec and expand it into concrete instances.
    pub fn expand(&self) -> Result<Vec<IndicatorInstance>, ConfigurationError> {
        let kind: IndicatorKind = self.name.parse()?;

        for required in kind.param_names() {
            if !self.params.contains_key(*required) {
                return Err(ConfigurationError::MissingParameter {
                    indicator: kind.name().to_string(),
                    param: required.to_string(),
                });
            }
        }
        for (param, values) in &self.params {
            if !kind.param_names().contains(&param.as_str()) {
                return Err(ConfigurationError::UnknownParameter {
                    indicator: kind.name().to_string(),
                    param: param.clone(),
                });
            }
            if values.is_empty() {
                return Err(ConfigurationError::EmptyParameterGrid {
                    indicator: kind.name().to_string(),
                    param: param.clone(),
                });
            }
            for &value in values {
                kind.validate_param(param, value)?;
            }
        }

        let mut combos: Vec<Vec<(String, f64)>> = vec![Vec::new()];
        for (param, values) in &self.params {
            combos = combos
                .into_iter()
                .flat_map(move |prefix| {
                    values.iter().map(move |&v| {
                        let mut next = prefix.clone();
                        next.push((param.clone(), v));
                        next
                    })
                })
                .collect();
        }

        Ok(combos
            .into_iter()
            .map(|params| IndicatorInstance { kind, params })
            .collect())
    }
}

/// One concrete point of a parameter grid.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorInstance {
    pub kind: IndicatorKind,
    /// Parameter values in grid (lexicographic name) order.
    pub params: Vec<(String, f64)>,
}

impl IndicatorInstance {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .map(|&(_, v)| v)
    }

    fn period(&self, name: &str) -> usize {
        self.get(name).map(|v| v as usize).unwrap_or(0)
    }

    pub fn column_ids(&self) -> Vec<ColumnId> {
        let values: Vec<f64> = self.params.iter().map(|&(_, v)| v).collect();
        if self.kind.is_multi_output() {
            (0..self.kind.output_names().len())
                .map(|output| ColumnId {
                    kind: self.kind,
                    params: values.clone(),
                    output: Some(output),
                })
                .collect()
        } else {
            vec![ColumnId {
                kind: self.kind,
                params: values,
                output: None,
            }]
        }
    }

    /// Compute every output series, in output-index order.
    pub fn compute(&self, prices: &PriceSeries) -> Vec<Vec<f64>> {
        let bars = prices.bars();
        let closes = prices.closes();
        match self.kind {
            IndicatorKind::Sma => vec![calculate_sma(&closes, self.period("timeperiod"))],
            IndicatorKind::Ema => vec![calculate_ema(&closes, self.period("timeperiod"))],
            IndicatorKind::Rsi => vec![calculate_rsi(&closes, self.period("timeperiod"))],
            IndicatorKind::Adx => vec![calculate_adx(bars, self.period("timeperiod"))],
            IndicatorKind::Atr => vec![calculate_atr(bars, self.period("timeperiod"))],
            IndicatorKind::Macd => {
                let macd = calculate_macd(
                    &closes,
                    self.period("fastperiod"),
                    self.period("slowperiod"),
                    self.period("signalperiod"),
                );
                vec![macd.line, macd.signal, macd.histogram]
            }
            IndicatorKind::Stochastic => {
                let stoch = calculate_stochastic(
                    bars,
                    self.period("fastk_period"),
                    self.period("slowk_period"),
                    self.period("slowd_period"),
                );
                vec![stoch.k, stoch.d]
            }
            IndicatorKind::Bollinger => {
                let bands = calculate_bollinger(
                    &closes,
                    self.period("timeperiod"),
                    self.get("nbdevup").unwrap_or(2.0),
                    self.get("nbdevdn").unwrap_or(2.0),
                );
                vec![bands.upper, bands.middle, bands.lower]
            }
        }
    }
}

/// Renders as `SMA(20)` or `MACD(12,26,9)`, parameters in conventional order.
impl fmt::Display for IndicatorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self
            .kind
            .param_names()
            .iter()
            .filter_map(|name| self.get(name))
            .map(|v| v.to_string())
            .collect();
        write!(f, "{}({})", self.kind.label(), values.join(","))
    }
}

/// Identifier of one indicator output column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnId {
    pub kind: IndicatorKind,
    pub params: Vec<f64>,
    pub output: Option<usize>,
}

/// `name_v1_v2[_output]`, e.g. `sma_20` or `macd_12_9_26_0`.
impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.name())?;
        for value in &self.params {
            write!(f, "_{}", value)?;
        }
        if let Some(output) = self.output {
            write!(f, "_{}", output)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_param_grid() {
        let instances = IndicatorSpec::new("sma")
            .param("timeperiod", [5.0, 10.0])
            .expand()
            .unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].column_ids()[0].to_string(), "sma_5");
        assert_eq!(instances[1].column_ids()[0].to_string(), "sma_10");
    }

    #[test]
    fn grid_orders_names_lexicographically() {
        let instances = IndicatorSpec::new("macd")
            .param("slowperiod", [26.0])
            .param("fastperiod", [8.0, 12.0])
            .param("signalperiod", [9.0])
            .expand()
            .unwrap();

        let ids: Vec<String> = instances
            .iter()
            .map(|i| i.column_ids()[0].to_string())
            .collect();
        // fastperiod, signalperiod, slowperiod
        assert_eq!(ids, vec!["macd_8_9_26_0", "macd_12_9_26_0"]);
    }

    #[test]
    fn last_param_varies_fastest() {
        let instances = IndicatorSpec::new("stoch")
            .param("fastk_period", [5.0, 14.0])
            .param("slowd_period", [3.0])
            .param("slowk_period", [1.0, 3.0])
            .expand()
            .unwrap();
        let ids: Vec<String> = instances
            .iter()
            .map(|i| i.column_ids()[0].to_string())
            .collect();
        assert_eq!(
            ids,
            vec!["stoch_5_3_1_0", "stoch_5_3_3_0", "stoch_14_3_1_0", "stoch_14_3_3_0"]
        );
    }

    #[test]
    fn multi_output_columns_are_suffixed() {
        let instance = &IndicatorSpec::new("macd")
            .param("fastperiod", [12.0])
            .param("slowperiod", [26.0])
            .param("signalperiod", [9.0])
            .expand()
            .unwrap()[0];
        let ids: Vec<String> = instance.column_ids().iter().map(|c| c.to_string()).collect();
        assert_eq!(ids, vec!["macd_12_9_26_0", "macd_12_9_26_1", "macd_12_9_26_2"]);
    }

    #[test]
    fn default_grid_uses_standard_macd() {
        let macd = IndicatorSpec::default_grid()
            .into_iter()
            .find(|spec| spec.name == "macd")
            .unwrap();
        let instances = macd.expand().unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].column_ids()[0].to_string(), "macd_12_9_26_0");
    }

    #[test]
    fn fractional_values_keep_their_digits() {
        let instance = &IndicatorSpec::new("bbands")
            .param("timeperiod", [20.0])
            .param("nbdevup", [2.5])
            .param("nbdevdn", [2.0])
            .expand()
            .unwrap()[0];
        assert_eq!(instance.column_ids()[1].to_string(), "bbands_2_2.5_20_1");
    }

    #[test]
    fn instance_display_uses_conventional_order() {
        let instance = &IndicatorSpec::new("macd")
            .param("fastperiod", [12.0])
            .param("slowperiod", [26.0])
            .param("signalperiod", [9.0])
            .expand()
            .unwrap()[0];
        assert_eq!(instance.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn unknown_indicator() {
        let err = IndicatorSpec::new("vwap").param("timeperiod", [5.0]).expand();
        assert_eq!(
            err,
            Err(ConfigurationError::UnknownIndicator {
                name: "vwap".into()
            })
        );
    }

    #[test]
    fn missing_parameter() {
        let err = IndicatorSpec::new("macd")
            .param("fastperiod", [12.0])
            .param("slowperiod", [26.0])
            .expand();
        assert_eq!(
            err,
            Err(ConfigurationError::MissingParameter {
                indicator: "macd".into(),
                param: "signalperiod".into()
            })
        );
    }

    #[test]
    fn unexpected_parameter() {
        let err = IndicatorSpec::new("rsi")
            .param("timeperiod", [14.0])
            .param("window", [3.0])
            .expand();
        assert!(matches!(err, Err(ConfigurationError::UnknownParameter { .. })));
    }

    #[test]
    fn empty_candidate_list() {
        let err = IndicatorSpec::new("ema")
            .param("timeperiod", Vec::<f64>::new())
            .expand();
        assert!(matches!(err, Err(ConfigurationError::EmptyParameterGrid { .. })));
    }

    #[test]
    fn non_integer_period() {
        let err = IndicatorSpec::new("ema").param("timeperiod", [2.5]).expand();
        assert!(matches!(err, Err(ConfigurationError::InvalidParameter { .. })));
    }

    #[test]
    fn default_grid_expands() {
        let count: usize = IndicatorSpec::default_grid()
            .iter()
            .map(|s| s.expand().unwrap().len())
            .sum();
        // 6 sma + 6 ema + 3 rsi + macd + stoch + adx + atr
        assert_eq!(count, 19);
    }
}
