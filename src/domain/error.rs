//! Domain error types.
//!
//! Configuration problems and data problems are kept apart so callers can
//! tell a bad indicator grid from a bad price file. Division-by-zero in a
//! statistic is not an error: it becomes [`crate::domain::metrics::Statistic::Undefined`].

use crate::domain::ohlcv::PriceField;

/// Invalid or incomplete configuration. Always fatal, never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown indicator '{name}'")]
    UnknownIndicator { name: String },

    #[error("indicator {indicator} requires parameter '{param}'")]
    MissingParameter { indicator: String, param: String },

    #[error("indicator {indicator} does not accept parameter '{param}'")]
    UnknownParameter { indicator: String, param: String },

    #[error("indicator {indicator} has no candidate values for '{param}'")]
    EmptyParameterGrid { indicator: String, param: String },

    #[error("invalid value {value} for {indicator} parameter '{param}': {reason}")]
    InvalidParameter {
        indicator: String,
        param: String,
        value: f64,
        reason: String,
    },

    #[error("column {column} is produced more than once")]
    DuplicateColumn { column: String },

    #[error("invalid threshold {name}: {reason}")]
    InvalidThreshold { name: String, reason: String },
}

/// Malformed or insufficient input data. Fatal for the stage that raised it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("price series is empty")]
    EmptyInput,

    #[error("price series has no {field} column")]
    MissingColumn { field: PriceField },

    #[error("timestamps are not strictly increasing at row {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("{bars} bars is not enough history for any configured indicator")]
    InsufficientHistory { bars: usize },

    #[error("row {row} has no previous row for cross detection")]
    MissingPreviousRow { row: usize },

    #[error("signal at index {index} does not line up with the price series")]
    SignalMismatch { index: usize },

    #[error("parse error: {reason}")]
    Parse { reason: String },
}

/// Top-level error type for crosstrader.
#[derive(Debug, thiserror::Error)]
pub enum CrosstraderError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CrosstraderError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CrosstraderError::Configuration(_)
                | CrosstraderError::ConfigParse { .. }
                | CrosstraderError::ConfigMissing { .. }
                | CrosstraderError::ConfigInvalid { .. }
        )
    }

    pub fn is_data(&self) -> bool {
        matches!(self, CrosstraderError::Data(_))
    }
}

impl From<csv::Error> for CrosstraderError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => CrosstraderError::Io(io),
                other => CrosstraderError::Data(DataError::Parse {
                    reason: format!("{other:?}"),
                }),
            }
        } else {
            CrosstraderError::Data(DataError::Parse {
                reason: err.to_string(),
            })
        }
    }
}

impl From<&CrosstraderError> for std::process::ExitCode {
    fn from(err: &CrosstraderError) -> Self {
        let code: u8 = match err {
            CrosstraderError::Io(_) => 1,
            CrosstraderError::Configuration(_)
            | CrosstraderError::ConfigParse { .. }
            | CrosstraderError::ConfigMissing { .. }
            | CrosstraderError::ConfigInvalid { .. } => 2,
            CrosstraderError::Data(_) => 3,
        };
        std::process::ExitCode::from(code)
    }
}
