//! Bollinger Bands.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (nbdevup × StdDev)
//! - Lower: Middle - (nbdevdn × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//! Warmup: first (period-1) values are NaN.

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn calculate_bollinger(closes: &[f64], period: usize, dev_up: f64, dev_down: f64) -> BollingerSeries {
    let n = closes.len();
    let mut bands = BollingerSeries {
        upper: vec![f64::NAN; n],
        middle: vec![f64::NAN; n],
        lower: vec![f64::NAN; n],
    };
    if period == 0 {
        return bands;
    }

    for i in (period - 1)..n {
        let window = &closes[i + 1 - period..=i];
        let middle: f64 = window.iter().sum::<f64>() / period as f64;
        let variance: f64 = window
            .iter()
            .map(|c| {
                let diff = c - middle;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        let stddev = variance.sqrt();

        bands.upper[i] = middle + dev_up * stddev;
        bands.middle[i] = middle;
        bands.lower[i] = middle - dev_down * stddev;
    }
    bands
}
