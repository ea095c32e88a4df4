//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) values are NaN.

pub fn calculate_sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = sum / period as f64;
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = sum / period as f64;
    }
    out
}

/// SMA over a series that itself starts with NaN warm-up values. The
/// average begins once `period` consecutive finite values are available.
pub fn calculate_sma_skip_nan(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    let Some(start) = values.iter().position(|v| v.is_finite()) else {
        return out;
    };
    let tail = calculate_sma(&values[start..], period);
    out[start..].copy_from_slice(&tail);
    out
}
