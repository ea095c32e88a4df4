//! Core domain types and logic.

pub mod ohlcv;
pub mod error;
pub mod indicator;
pub mod indicator_spec;
pub mod indicator_table;
pub mod engine;
pub mod signal;
pub mod signal_generator;
pub mod position;
pub mod backtest;
pub mod metrics;
pub mod strategy;
pub mod config_validation;
