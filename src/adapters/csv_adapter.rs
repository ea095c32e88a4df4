//! CSV file data adapter.
//!
//! Columns are located by header name, case-insensitively, so files from
//! different exporters load without reordering. `Adj Close` and any other
//! unrecognised column is ignored.

use crate::domain::error::{CrosstraderError, DataError};
use crate::domain::ohlcv::{PriceBar, PriceField, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

const DATE_HEADERS: [&str; 3] = ["date", "timestamp", "datetime"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<base>/<symbol>` when that file exists, `<base>/<symbol>.csv` otherwise.
    fn csv_path(&self, symbol: &str) -> PathBuf {
        let direct = self.base_path.join(symbol);
        if direct.is_file() {
            direct
        } else {
            self.base_path.join(format!("{}.csv", symbol))
        }
    }

    /// Load a price series from a file path.
    pub fn read_path<P: AsRef<Path>>(path: P) -> Result<PriceSeries, CrosstraderError> {
        let file = fs::File::open(path.as_ref())?;
        let series = Self::read(file)?;
        tracing::debug!(path = %path.as_ref().display(), bars = series.len(), "loaded prices");
        Ok(series)
    }

    pub fn read<R: Read>(reader: R) -> Result<PriceSeries, CrosstraderError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        let find = |name: &str| headers.iter().position(|h| h == name);

        let date_col = DATE_HEADERS
            .iter()
            .find_map(|name| find(*name))
            .ok_or_else(|| DataError::Parse {
                reason: "missing date column".into(),
            })?;
        let columns: Vec<(PriceField, usize)> = PriceField::ALL
            .iter()
            .filter_map(|&field| find(field.name()).map(|col| (field, col)))
            .collect();
        let fields: BTreeSet<PriceField> = columns.iter().map(|&(field, _)| field).collect();

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let line = row + 2;

            let raw_date = record.get(date_col).unwrap_or("");
            let timestamp = parse_timestamp(raw_date).ok_or_else(|| DataError::Parse {
                reason: format!("line {}: invalid date '{}'", line, raw_date),
            })?;

            let mut bar = PriceBar {
                timestamp,
                open: f64::NAN,
                high: f64::NAN,
                low: f64::NAN,
                close: f64::NAN,
                volume: f64::NAN,
            };
            for &(field, col) in &columns {
                let raw = record.get(col).unwrap_or("");
                let value: f64 = raw.parse().map_err(|_| DataError::Parse {
                    reason: format!("line {}: invalid {} value '{}'", line, field, raw),
                })?;
                match field {
                    PriceField::Open => bar.open = value,
                    PriceField::High => bar.high = value,
                    PriceField::Low => bar.low = value,
                    PriceField::Close => bar.close = value,
                    PriceField::Volume => bar.volume = value,
                }
            }
            bars.push(bar);
        }

        Ok(PriceSeries::with_fields(bars, fields)?)
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl DataPort for CsvAdapter {
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, CrosstraderError> {
        Self::read_path(self.csv_path(symbol))
    }

    fn list_symbols(&self) -> Result<Vec<String>, CrosstraderError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}
