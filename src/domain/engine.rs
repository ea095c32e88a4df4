//! Indicator engine: expands indicator specs and computes every instance
//! over a price series.

use crate::domain::error::{CrosstraderError, DataError};
use crate::domain::indicator_spec::{IndicatorInstance, IndicatorSpec};
use crate::domain::indicator_table::{IndicatorColumn, IndicatorSeries, IndicatorTable};
use crate::domain::ohlcv::PriceSeries;
use rayon::prelude::*;

/// Compute every instance of every spec and attach the results to `prices`.
///
/// All specs are resolved before any computation starts, so a bad spec
/// never yields a partial table. Instances run in parallel and are merged
/// back in enumeration order.
pub fn compute(
    prices: &PriceSeries,
    specs: &[IndicatorSpec],
) -> Result<IndicatorTable, CrosstraderError> {
    let mut instances: Vec<IndicatorInstance> = Vec::new();
    for spec in specs {
        instances.extend(spec.expand()?);
    }
    for instance in &instances {
        for &field in instance.kind.required_fields() {
            prices.require(field)?;
        }
    }

    let series: Vec<IndicatorSeries> = instances
        .par_iter()
        .map(|instance| {
            let outputs = instance
                .column_ids()
                .into_iter()
                .zip(instance.compute(prices))
                .map(|(id, values)| IndicatorColumn { id, values })
                .collect();
            tracing::debug!(instance = %instance, "computed indicator");
            IndicatorSeries {
                instance: instance.clone(),
                outputs,
            }
        })
        .collect();

    if !series.is_empty() && !series.iter().any(IndicatorSeries::has_values) {
        return Err(DataError::InsufficientHistory { bars: prices.len() }.into());
    }

    let table = IndicatorTable::new(prices.clone(), series)?;
    tracing::info!(
        bars = table.len(),
        columns = table.columns().count(),
        "indicator table ready"
    );
    Ok(table)
}
