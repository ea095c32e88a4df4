//! Report output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::CrosstraderError;
use crate::domain::indicator_table::IndicatorTable;
use crate::domain::signal::Signal;

/// Port for writing pipeline output.
pub trait ReportPort {
    fn write_indicators(&self, table: &IndicatorTable) -> Result<(), CrosstraderError>;

    fn write_signals(&self, signals: &[Signal]) -> Result<(), CrosstraderError>;

    fn write_trades(&self, result: &BacktestResult) -> Result<(), CrosstraderError>;

    fn write_report(&self, result: &BacktestResult) -> Result<(), CrosstraderError>;

    /// Trades followed by the summary report.
    fn write_backtest(&self, result: &BacktestResult) -> Result<(), CrosstraderError> {
        self.write_trades(result)?;
        self.write_report(result)
    }
}
