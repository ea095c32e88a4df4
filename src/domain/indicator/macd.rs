//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded with the SMA of its first
//! `signal` valid values
//! Histogram = MACD Line - Signal Line
//!
//! Warmup: all three outputs are NaN before index max(fast, slow) - 1 + signal - 1.

use super::ema::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let n = closes.len();
    let nan = || vec![f64::NAN; n];
    if fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            line: nan(),
            signal: nan(),
            histogram: nan(),
        };
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);
    let raw_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();

    let line_warmup = fast.max(slow) - 1;
    let signal_warmup = line_warmup.saturating_add(signal_period - 1);

    let mut signal = nan();
    if n > line_warmup {
        let tail = calculate_ema(&raw_line[line_warmup..], signal_period);
        signal[line_warmup..].copy_from_slice(&tail);
    }

    let mut line = nan();
    let mut histogram = nan();
    for i in signal_warmup.min(n)..n {
        line[i] = raw_line[i];
        histogram[i] = raw_line[i] - signal[i];
    }

    MacdSeries {
        line,
        signal,
        histogram,
    }
}
