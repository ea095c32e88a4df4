//! Average Directional Index (Wilder).
//!
//! +DM/-DM and TR start at bar 1. Their Wilder sums are seeded with the first
//! n values (index n) and then run as s = s - s/n + x. DX = 100·|+DI − −DI| /
//! (+DI + −DI), 0 when both are 0. ADX is seeded at index 2n-1 with the mean
//! of the first n DX values, then smoothed as (prev·(n-1) + DX) / n.
//!
//! Warmup: first 2n-1 values are NaN.

use crate::domain::ohlcv::PriceBar;

pub fn calculate_adx(bars: &[PriceBar], period: usize) -> Vec<f64> {
    let len = bars.len();
    let mut out = vec![f64::NAN; len];
    let window = match period.checked_mul(2) {
        Some(w) if period > 0 && len >= w => w,
        _ => return out,
    };

    let mut plus_dm = vec![0.0; len];
    let mut minus_dm = vec![0.0; len];
    let mut tr = vec![0.0; len];
    for i in 1..len {
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
        tr[i] = bars[i].true_range(bars[i - 1].close);
    }

    let n = period as f64;
    let mut s_tr: f64 = tr[1..=period].iter().sum();
    let mut s_plus: f64 = plus_dm[1..=period].iter().sum();
    let mut s_minus: f64 = minus_dm[1..=period].iter().sum();

    let mut dx = vec![f64::NAN; len];
    dx[period] = directional_index(s_plus, s_minus, s_tr);
    for i in (period + 1)..len {
        s_tr = s_tr - s_tr / n + tr[i];
        s_plus = s_plus - s_plus / n + plus_dm[i];
        s_minus = s_minus - s_minus / n + minus_dm[i];
        dx[i] = directional_index(s_plus, s_minus, s_tr);
    }

    let first = window - 1;
    let mut adx = dx[period..=first].iter().sum::<f64>() / n;
    out[first] = adx;
    for i in (first + 1)..len {
        adx = (adx * (n - 1.0) + dx[i]) / n;
        out[i] = adx;
    }
    out
}

fn directional_index(s_plus: f64, s_minus: f64, s_tr: f64) -> f64 {
    if s_tr <= 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * s_plus / s_tr;
    let minus_di = 100.0 * s_minus / s_tr;
    let sum = plus_di + minus_di;
    if sum == 0.0 {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / sum
    }
}
