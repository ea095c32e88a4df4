//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestResult};
use crate::domain::config_validation::validate_config;
use crate::domain::engine;
use crate::domain::error::CrosstraderError;
use crate::domain::indicator_table::IndicatorTable;
use crate::domain::signal::Signal;
use crate::domain::signal_generator::SignalGenerator;
use crate::domain::strategy::StrategyConfig;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "crosstrader",
    about = "Technical indicators, crossover signals and backtests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the indicator table
    Indicators {
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute indicators and generate signals
    Signals {
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the full pipeline and backtest the signals
    Backtest {
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// How far through the pipeline to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Indicators,
    Signals,
    Backtest,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: IndicatorTable,
    pub signals: Option<Vec<Signal>>,
    pub backtest: Option<BacktestResult>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Indicators {
            prices,
            config,
            output,
        } => run_stage(Stage::Indicators, &prices, config.as_ref(), output.as_ref()),
        Command::Signals {
            prices,
            config,
            output,
        } => run_stage(Stage::Signals, &prices, config.as_ref(), output.as_ref()),
        Command::Backtest {
            prices,
            config,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&prices, config.as_ref())
            } else {
                run_stage(Stage::Backtest, &prices, config.as_ref(), output.as_ref())
            }
        }
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = CrosstraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Defaults when no file is given; otherwise the parsed and validated file.
pub fn load_strategy(path: Option<&PathBuf>) -> Result<StrategyConfig, ExitCode> {
    let Some(path) = path else {
        tracing::info!("no config given, using default indicator grid");
        return Ok(StrategyConfig::default());
    };
    tracing::info!(path = %path.display(), "loading config");
    let adapter = load_config(path)?;
    validate_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// A data port and symbol that resolve to the given price file.
fn price_source(path: &Path) -> (CsvAdapter, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let symbol = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (CsvAdapter::new(dir.to_path_buf()), symbol)
}

/// Fetch prices and run every stage up to and including `stage`.
pub fn run_pipeline(
    data_port: &dyn DataPort,
    symbol: &str,
    strategy: &StrategyConfig,
    stage: Stage,
) -> Result<PipelineOutput, CrosstraderError> {
    // Stage 1: prices
    let prices = data_port.fetch_prices(symbol)?;
    tracing::info!(symbol, bars = prices.len(), "prices loaded");

    // Stage 2: indicators
    let table = engine::compute(&prices, &strategy.indicators)?;
    if stage == Stage::Indicators {
        return Ok(PipelineOutput {
            table,
            signals: None,
            backtest: None,
        });
    }

    // Stage 3: signals
    let generator = SignalGenerator::new(strategy.signals.clone())?;
    let signals = generator.generate(&table)?;
    if stage == Stage::Signals {
        return Ok(PipelineOutput {
            table,
            signals: Some(signals),
            backtest: None,
        });
    }

    // Stage 4: backtest
    let result = backtest_engine::run(&prices, &signals, &strategy.backtest)?;
    Ok(PipelineOutput {
        table,
        signals: Some(signals),
        backtest: Some(result),
    })
}

pub fn write_output(
    report: &dyn ReportPort,
    output: &PipelineOutput,
) -> Result<(), CrosstraderError> {
    report.write_indicators(&output.table)?;
    if let Some(signals) = &output.signals {
        report.write_signals(signals)?;
    }
    if let Some(result) = &output.backtest {
        report.write_backtest(result)?;
    }
    Ok(())
}

fn run_stage(
    stage: Stage,
    prices_path: &Path,
    config_path: Option<&PathBuf>,
    output_dir: Option<&PathBuf>,
) -> ExitCode {
    let strategy = match load_strategy(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let (data_port, symbol) = price_source(prices_path);
    let output = match run_pipeline(&data_port, &symbol, &strategy, stage) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_summary(&output);

    if let Some(dir) = output_dir {
        let report = CsvReportAdapter::new(dir);
        if let Err(e) = write_output(&report, &output) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        tracing::info!(dir = %dir.display(), "output written");
    }

    ExitCode::SUCCESS
}

fn print_summary(output: &PipelineOutput) {
    println!(
        "Indicators:       {} columns over {} bars",
        output.table.columns().count(),
        output.table.len()
    );

    if let Some(signals) = &output.signals {
        let buys = signals.iter().filter(|s| s.is_buy()).count();
        let sells = signals.iter().filter(|s| s.is_sell()).count();
        println!(
            "Signals:          {} buy, {} sell, {} hold",
            buys,
            sells,
            signals.len() - buys - sells
        );
    }

    if let Some(result) = &output.backtest {
        let r = &result.report;
        println!("\n=== Backtest Results ===");
        println!("Total Trades:     {}", r.total_trades);
        println!("Win Rate:         {:.4}", r.win_rate);
        println!("Average Win:      {:.4}", r.avg_win);
        println!("Average Loss:     {:.4}", r.avg_loss);
        println!("Profit Factor:    {:.4}", r.profit_factor);
        println!("Expectancy:       {:.4}", r.expectancy);
        println!("Max Drawdown:     {:.4}", r.max_drawdown);
        println!("Sharpe Ratio:     {:.4}", r.sharpe_ratio);
        println!("Total Return:     {:.4}", r.total_return);
        println!("Final Equity:     {:.2}", r.final_equity);
        if let Some(open) = &result.open_position {
            println!(
                "Open Position:    {} from bar {} at {:.2}",
                open.direction, open.entry_index, open.entry_price
            );
        }
    }
}

/// Grid size of each configured indicator, in config order.
pub fn instance_counts(strategy: &StrategyConfig) -> Result<Vec<(&str, usize)>, CrosstraderError> {
    strategy
        .indicators
        .iter()
        .map(|spec| Ok((spec.name.as_str(), spec.expand()?.len())))
        .collect()
}

pub fn run_dry_run(prices_path: &Path, config_path: Option<&PathBuf>) -> ExitCode {
    let strategy = match load_strategy(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let (data_port, symbol) = price_source(prices_path);
    let prices = match data_port.fetch_prices(&symbol) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let instances: usize = match instance_counts(&strategy) {
        Ok(counts) => counts.iter().map(|(_, n)| n).sum(),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nDry run:");
    eprintln!("  Prices:         {} bars", prices.len());
    eprintln!("  Indicators:     {} instances", instances);
    eprintln!(
        "  Moving averages: {} crossing {}",
        strategy.signals.fast_ma.label(),
        strategy.signals.slow_ma.label()
    );
    eprintln!(
        "  Stop / target:  {} / {}",
        strategy.backtest.stop_loss_pct, strategy.backtest.take_profit_pct
    );
    eprintln!("  Shorting:       {}", strategy.backtest.allow_shorting);
    eprintln!("\nDry run complete. No backtest executed.");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let strategy = match load_strategy(Some(config_path)) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let counts = match instance_counts(&strategy) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    for (name, count) in counts {
        eprintln!("  {:<8} {} instance(s)", name, count);
    }
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
