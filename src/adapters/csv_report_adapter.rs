//! CSV report adapter: one file per pipeline stage in an output directory.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::CrosstraderError;
use crate::domain::indicator_table::IndicatorTable;
use crate::domain::signal::Signal;
use crate::ports::report_port::ReportPort;
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const INDICATORS_FILE: &str = "indicators.csv";
pub const SIGNALS_FILE: &str = "signals.csv";
pub const TRADES_FILE: &str = "trades.csv";
pub const REPORT_FILE: &str = "report.csv";

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

#[derive(Serialize)]
struct SignalRow {
    timestamp: String,
    price: f64,
    signal: &'static str,
    reason: String,
    stop_level: Option<f64>,
}

#[derive(Serialize)]
struct TradeRow {
    direction: &'static str,
    entry_index: usize,
    exit_index: usize,
    entry_price: f64,
    exit_price: f64,
    exit_reason: &'static str,
    return_pct: f64,
    duration: usize,
}

#[derive(Serialize)]
struct ReportRow {
    metric: &'static str,
    value: String,
}

impl CsvReportAdapter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    fn writer(&self, name: &str) -> Result<csv::Writer<fs::File>, CrosstraderError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(name);
        tracing::debug!(path = %path.display(), "writing report file");
        Ok(csv::Writer::from_path(path)?)
    }
}

/// Midnight timestamps render as a bare date.
fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.num_seconds_from_midnight() == 0 {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// NaN warm-up values render as an empty cell.
fn cell(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_indicators(&self, table: &IndicatorTable) -> Result<(), CrosstraderError> {
        let mut wtr = self.writer(INDICATORS_FILE)?;

        let mut header: Vec<String> = ["timestamp", "open", "high", "low", "close", "volume"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        header.extend(table.column_names());
        wtr.write_record(&header)?;

        let columns: Vec<_> = table.columns().collect();
        for (row, bar) in table.bars().iter().enumerate() {
            let mut record = vec![
                format_timestamp(&bar.timestamp),
                cell(bar.open),
                cell(bar.high),
                cell(bar.low),
                cell(bar.close),
                cell(bar.volume),
            ];
            record.extend(columns.iter().map(|c| cell(c.value(row))));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_signals(&self, signals: &[Signal]) -> Result<(), CrosstraderError> {
        let mut wtr = self.writer(SIGNALS_FILE)?;
        for signal in signals {
            wtr.serialize(SignalRow {
                timestamp: format_timestamp(&signal.timestamp),
                price: signal.price,
                signal: signal.signal_type.as_str(),
                reason: signal.reason(),
                stop_level: signal.stop_level,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_trades(&self, result: &BacktestResult) -> Result<(), CrosstraderError> {
        let mut wtr = self.writer(TRADES_FILE)?;
        if result.trades.is_empty() {
            wtr.write_record([
                "direction",
                "entry_index",
                "exit_index",
                "entry_price",
                "exit_price",
                "exit_reason",
                "return_pct",
                "duration",
            ])?;
        }
        for trade in &result.trades {
            wtr.serialize(TradeRow {
                direction: trade.direction.as_str(),
                entry_index: trade.entry_index,
                exit_index: trade.exit_index,
                entry_price: trade.entry_price,
                exit_price: trade.exit_price,
                exit_reason: trade.exit_reason.as_str(),
                return_pct: trade.return_pct,
                duration: trade.duration,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_report(&self, result: &BacktestResult) -> Result<(), CrosstraderError> {
        let mut wtr = self.writer(REPORT_FILE)?;
        for (metric, value) in result.report.rows() {
            wtr.serialize(ReportRow {
                metric,
                value: value.to_string(),
            })?;
        }
        if let Some(open) = &result.open_position {
            wtr.serialize(ReportRow {
                metric: "open_position",
                value: format!(
                    "{} from index {} at {}",
                    open.direction, open.entry_index, open.entry_price
                ),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
