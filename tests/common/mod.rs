#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use crosstrader::domain::error::{CrosstraderError, DataError};
use crosstrader::domain::ohlcv::{PriceBar, PriceSeries};
use crosstrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, CrosstraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(DataError::Parse {
                reason: reason.clone(),
            }
            .into());
        }
        let bars = self.data.get(symbol).cloned().unwrap_or_default();
        Ok(PriceSeries::new(bars)?)
    }

    fn list_symbols(&self) -> Result<Vec<String>, CrosstraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> PriceBar {
    PriceBar {
        timestamp: NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// Daily bars from a list of closes, starting 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Daily bars rising by one each day.
pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..count)
        .map(|i| PriceBar {
            timestamp: start + chrono::Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: 1000.0,
        })
        .collect()
}

/// Closes that swing up and down so crossover rules fire.
pub fn oscillating_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin() + i as f64 * 0.05)
        .collect()
}

/// A price CSV in the Yahoo layout.
pub fn price_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for bar in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            bar.timestamp.format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.close,
            bar.volume
        ));
    }
    out
}
