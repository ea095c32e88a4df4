//! Price bar representation and the validated input series.

use crate::domain::error::DataError;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    pub const ALL: [PriceField; 5] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::Volume,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// An ordered, validated run of bars together with the columns the
/// provider actually supplied. Fields that were not supplied hold NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
    fields: BTreeSet<PriceField>,
}

impl PriceSeries {
    /// Build a series where every OHLCV column is present.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, DataError> {
        Self::with_fields(bars, PriceField::ALL.into_iter().collect())
    }

    pub fn with_fields(
        bars: Vec<PriceBar>,
        fields: BTreeSet<PriceField>,
    ) -> Result<Self, DataError> {
        if bars.is_empty() {
            return Err(DataError::EmptyInput);
        }
        if !fields.contains(&PriceField::Close) {
            return Err(DataError::MissingColumn {
                field: PriceField::Close,
            });
        }
        if let Some(index) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(DataError::NonMonotonicTimestamps { index: index + 1 });
        }
        Ok(Self { bars, fields })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn has_field(&self, field: PriceField) -> bool {
        self.fields.contains(&field)
    }

    pub fn require(&self, field: PriceField) -> Result<(), DataError> {
        if self.has_field(field) {
            Ok(())
        } else {
            Err(DataError::MissingColumn { field })
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
