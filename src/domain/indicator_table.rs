//! The price series augmented with one column per indicator output.

use crate::domain::error::ConfigurationError;
use crate::domain::indicator::IndicatorKind;
use crate::domain::indicator_spec::{ColumnId, IndicatorInstance};
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorColumn {
    pub id: ColumnId,
    pub values: Vec<f64>,
}

impl IndicatorColumn {
    pub fn value(&self, row: usize) -> f64 {
        self.values.get(row).copied().unwrap_or(f64::NAN)
    }
}

/// All output columns of one indicator instance, in output-index order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub instance: IndicatorInstance,
    pub outputs: Vec<IndicatorColumn>,
}

impl IndicatorSeries {
    pub fn output(&self, index: usize) -> Option<&IndicatorColumn> {
        self.outputs.get(index)
    }

    pub fn has_values(&self) -> bool {
        self.outputs
            .iter()
            .any(|c| c.values.iter().any(|v| v.is_finite()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    prices: PriceSeries,
    series: Vec<IndicatorSeries>,
}

impl IndicatorTable {
    /// Every column must be as long as the price series and every column id
    /// must be unique.
    pub fn new(prices: PriceSeries, series: Vec<IndicatorSeries>) -> Result<Self, ConfigurationError> {
        let mut seen = HashSet::new();
        for column in series.iter().flat_map(|s| &s.outputs) {
            debug_assert_eq!(column.values.len(), prices.len());
            let name = column.id.to_string();
            if !seen.insert(name.clone()) {
                return Err(ConfigurationError::DuplicateColumn { column: name });
            }
        }
        Ok(Self { prices, series })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        self.prices.bars()
    }

    pub fn series_of(&self, kind: IndicatorKind) -> impl Iterator<Item = &IndicatorSeries> {
        self.series.iter().filter(move |s| s.instance.kind == kind)
    }

    pub fn columns(&self) -> impl Iterator<Item = &IndicatorColumn> {
        self.series.iter().flat_map(|s| s.outputs.iter())
    }

    pub fn column(&self, name: &str) -> Option<&IndicatorColumn> {
        self.columns().find(|c| c.id.to_string() == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns().map(|c| c.id.to_string()).collect()
    }
}
