//! Slow Stochastic oscillator.
//!
//! raw %K[i] = 100 * (C[i] - LL) / (HH - LL) over the last `fastk` bars,
//! 0 when the range is flat.
//! %K = SMA(slowk) of raw %K, %D = SMA(slowd) of %K.
//!
//! Warmup: %K is NaN before fastk + slowk - 2, %D before fastk + slowk + slowd - 3.

use super::sma::calculate_sma_skip_nan;
use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn calculate_stochastic(
    bars: &[PriceBar],
    fastk_period: usize,
    slowk_period: usize,
    slowd_period: usize,
) -> StochasticSeries {
    let n = bars.len();
    let mut raw_k = vec![f64::NAN; n];

    if fastk_period == 0 || slowk_period == 0 || slowd_period == 0 || n < fastk_period {
        return StochasticSeries {
            k: raw_k.clone(),
            d: raw_k,
        };
    }

    for i in (fastk_period - 1)..n {
        let window = &bars[i + 1 - fastk_period..=i];
        let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let range = highest - lowest;
        raw_k[i] = if range > 0.0 {
            100.0 * (bars[i].close - lowest) / range
        } else {
            0.0
        };
    }

    let k = calculate_sma_skip_nan(&raw_k, slowk_period);
    let d = calculate_sma_skip_nan(&k, slowd_period);
    StochasticSeries { k, d }
}
