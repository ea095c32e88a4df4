//! Price data access port trait.

use crate::domain::error::CrosstraderError;
use crate::domain::ohlcv::PriceSeries;

pub trait DataPort {
    /// Load the full, validated price history for `symbol`.
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, CrosstraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, CrosstraderError>;
}
