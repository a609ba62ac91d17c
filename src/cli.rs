//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_ledger_report::CsvLedgerReport;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart::SvgEquityChart;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::broker::ExecutionConfig;
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::SmacrossError;
use crate::domain::sizing::DEFAULT_ALLOCATION_FRACTION;
use crate::domain::strategy::{parse_strategy_list, StrategySpec, DEFAULT_STRATEGIES};
use crate::domain::universe::{load_universe, parse_symbols};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "smacross", about = "Moving-average crossover backtester")]
pub struct Cli {
    /// Maximum log level written to stderr
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding one <SYMBOL>.csv per instrument
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Trade ledger CSV output
        #[arg(long)]
        ledger: Option<PathBuf>,
        /// Equity curve SVG output
        #[arg(long)]
        chart: Option<PathBuf>,
        /// Comma-separated symbols, replacing [backtest] symbols
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Output locations for a run. `None` skips that report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPaths {
    pub ledger: Option<PathBuf>,
    pub chart: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            ledger,
            chart,
            symbols,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, symbols.as_deref())
            } else {
                run_backtest(&config, data_dir, ledger, chart, symbols.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(e: &SmacrossError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// Full configuration check. Strategy list errors are printed with a caret
/// under the offending character.
pub fn validate_config(adapter: &dyn ConfigPort) -> Result<(), ExitCode> {
    validate_backtest_config(adapter).map_err(|e| fail(&e))?;
    if let Err(e) = validate_strategy_config(adapter) {
        if let SmacrossError::StrategyParse(parse_err) = &e {
            let list = strategy_list(adapter);
            eprintln!(
                "error: failed to parse [strategies] list:\n{}",
                parse_err.display_with_context(&list)
            );
            return Err((&e).into());
        }
        return Err(fail(&e));
    }
    Ok(())
}

fn strategy_list(adapter: &dyn ConfigPort) -> String {
    adapter.get_string_or("strategies", "list", DEFAULT_STRATEGIES)
}

pub fn build_strategies(adapter: &dyn ConfigPort) -> Result<Vec<StrategySpec>, SmacrossError> {
    parse_strategy_list(&strategy_list(adapter))
}

/// Symbols from the override when given, otherwise from `[backtest] symbols`.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    adapter: &dyn ConfigPort,
) -> Result<Vec<String>, SmacrossError> {
    let raw = match symbol_override {
        Some(s) => s.to_string(),
        None => adapter
            .get_string("backtest", "symbols")
            .ok_or_else(|| SmacrossError::ConfigMissing {
                section: "backtest".into(),
                key: "symbols".into(),
            })?,
    };
    parse_symbols(&raw).map_err(|e| SmacrossError::ConfigInvalid {
        section: "backtest".into(),
        key: "symbols".into(),
        reason: e.to_string(),
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SmacrossError> {
    build_backtest_config_with(adapter, None)
}

pub fn build_backtest_config_with(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<BacktestConfig, SmacrossError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    let config = BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", 0.0)?,
        allocation_fraction: adapter.get_double(
            "backtest",
            "allocation_fraction",
            DEFAULT_ALLOCATION_FRACTION,
        )?,
        symbols: resolve_symbols(symbol_override, adapter)?,
        strategies: build_strategies(adapter)?,
        execution: ExecutionConfig {
            commission_per_trade: adapter.get_double("backtest", "commission_per_trade", 0.0)?,
            commission_pct: adapter.get_double("backtest", "commission_pct", 0.0)?,
            slippage_pct: adapter.get_double("backtest", "slippage_pct", 0.0)?,
        },
        min_bars: adapter.get_int("backtest", "min_bars", 1)?.max(1) as usize,
    };
    config.validate()?;
    Ok(config)
}

/// Command-line paths win over `[data]` / `[report]` keys.
pub fn resolve_data_dir(cli_dir: Option<PathBuf>, adapter: &dyn ConfigPort) -> PathBuf {
    cli_dir.unwrap_or_else(|| PathBuf::from(adapter.get_string_or("data", "dir", "data")))
}

pub fn resolve_report_paths(
    ledger: Option<PathBuf>,
    chart: Option<PathBuf>,
    adapter: &dyn ConfigPort,
) -> ReportPaths {
    let from_config = |key: &str| {
        adapter
            .get_string("report", key)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    };
    ReportPaths {
        ledger: ledger.or_else(|| from_config("ledger_path")),
        chart: chart.or_else(|| from_config("chart_path")),
    }
}

fn run_backtest(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    ledger: Option<PathBuf>,
    chart: Option<PathBuf>,
    symbol_override: Option<&str>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(code) = validate_config(&adapter) {
        return code;
    }

    let bt_config = match build_backtest_config_with(&adapter, symbol_override) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let data_dir = resolve_data_dir(data_dir, &adapter);
    let reports = resolve_report_paths(ledger, chart, &adapter);
    info!(dir = %data_dir.display(), "reading price data");
    let data_port = CsvAdapter::new(data_dir);

    match run_backtest_pipeline(&data_port, &bt_config, &reports) {
        Ok(result) => {
            println!("{}", result.summary());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Load the universe, run it, and write whichever reports are configured.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    reports: &ReportPaths,
) -> Result<BacktestResult, SmacrossError> {
    let universe = load_universe(
        data_port,
        &bt_config.symbols,
        bt_config.start_date,
        bt_config.end_date,
        bt_config.min_bars,
    )?;

    info!(
        symbols = universe.series.len(),
        strategies = bt_config.strategies.len(),
        start = %bt_config.start_date,
        end = %bt_config.end_date,
        "starting backtest"
    );

    let result = backtest_engine::run_backtest(&universe.series, bt_config)?;

    if let Some(path) = &reports.ledger {
        CsvLedgerReport.write(&result, path)?;
        info!(path = %path.display(), rows = result.ledger.len(), "ledger written");
    }
    if let Some(path) = &reports.chart {
        SvgEquityChart.write(&result, path)?;
        info!(path = %path.display(), "equity chart written");
    }

    Ok(result)
}

fn print_plan(bt_config: &BacktestConfig) {
    println!("Period:      {} to {}", bt_config.start_date, bt_config.end_date);
    println!("Capital:     {:.2}", bt_config.initial_capital);
    println!(
        "Allocation:  {:.2}% of equity per entry",
        bt_config.allocation_fraction * 100.0
    );
    println!("Symbols:     {}", bt_config.symbols.join(", "));
    let labels: Vec<String> = bt_config.strategies.iter().map(|s| s.label()).collect();
    println!("Strategies:  {}", labels.join(", "));
    println!(
        "Instances:   {}",
        bt_config.symbols.len() * bt_config.strategies.len()
    );
}

pub fn run_dry_run(config_path: &Path, symbol_override: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(code) = validate_config(&adapter) {
        return code;
    }
    let bt_config = match build_backtest_config_with(&adapter, symbol_override) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    print_plan(&bt_config);
    println!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(code) = validate_config(&adapter) {
        return code;
    }
    match build_strategies(&adapter) {
        Ok(specs) => {
            println!("Strategies:");
            for spec in &specs {
                println!("  {} (warm-up {} bars)", spec.label(), spec.warmup_bars());
            }
            println!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
