//! Backtest configuration and the bar-sequencing event loop.
//!
//! For each date on the unified timeline the loop marks every instrument
//! that traded, steps each strategy instance on its instrument's bar in
//! setup order, then records portfolio equity.

use chrono::NaiveDate;
use std::fmt;
use tracing::info;

use crate::domain::broker::{EquityPoint, ExecutionConfig, SimulatedBroker};
use crate::domain::config_validation::{
    check_allocation_fraction, check_date_order, check_initial_capital, check_non_negative,
};
use crate::domain::error::{SizingError, SmacrossError};
use crate::domain::instrument_data::{build_unified_timeline, InstrumentSeries};
use crate::domain::ledger::TradeLedger;
use crate::domain::lifecycle::{StepOutcome, StrategyInstance};
use crate::domain::sizing::PositionSizer;
use crate::domain::strategy::StrategySpec;
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub allocation_fraction: f64,
    pub symbols: Vec<String>,
    pub strategies: Vec<StrategySpec>,
    pub execution: ExecutionConfig,
    pub min_bars: usize,
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), SmacrossError> {
        check_initial_capital(self.initial_capital)?;
        check_allocation_fraction(self.allocation_fraction)?;
        check_non_negative("commission_per_trade", self.execution.commission_per_trade)?;
        check_non_negative("commission_pct", self.execution.commission_pct)?;
        check_non_negative("slippage_pct", self.execution.slippage_pct)?;
        check_date_order(self.start_date, self.end_date)?;
        if self.symbols.is_empty() {
            return Err(SmacrossError::ConfigMissing {
                section: "backtest".into(),
                key: "symbols".into(),
            });
        }
        if self.strategies.is_empty() {
            return Err(SmacrossError::invalid(
                "strategies",
                "list",
                "at least one strategy is required",
            ));
        }
        Ok(())
    }

    pub fn sizer(&self) -> PositionSizer {
        PositionSizer::new(self.allocation_fraction)
    }
}

/// Per-step conditions that were handled locally during the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunDiagnostics {
    pub insufficient_funds: usize,
    pub zero_quantity: usize,
    pub rejected: usize,
    pub warming_up: usize,
    pub ignored_while_pending: usize,
}

impl RunDiagnostics {
    fn tally(&mut self, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Skipped(SizingError::InsufficientFunds { .. }) => {
                self.insufficient_funds += 1
            }
            StepOutcome::Skipped(SizingError::ZeroQuantity { .. }) => self.zero_quantity += 1,
            StepOutcome::Rejected { .. } => self.rejected += 1,
            StepOutcome::WarmingUp => self.warming_up += 1,
            StepOutcome::AwaitingFill => self.ignored_while_pending += 1,
            _ => {}
        }
    }
}

/// A strategy still long when the data ran out.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub instrument: String,
    pub strategy: String,
    pub quantity: i64,
    pub last_close: f64,
}

impl OpenPosition {
    pub fn market_value(&self) -> f64 {
        self.quantity as f64 * self.last_close
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub ledger: TradeLedger,
    pub equity_curve: Vec<EquityPoint>,
    pub initial_capital: f64,
    pub final_cash: f64,
    pub final_equity: f64,
    pub commissions_paid: f64,
    pub open_positions: Vec<OpenPosition>,
    pub diagnostics: RunDiagnostics,
}

impl BacktestResult {
    pub fn total_return(&self) -> f64 {
        if self.initial_capital > 0.0 {
            (self.final_equity - self.initial_capital) / self.initial_capital
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> RunSummary<'_> {
        RunSummary { result: self }
    }
}

/// Console rendering of a finished run.
pub struct RunSummary<'a> {
    result: &'a BacktestResult,
}

impl fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.result;
        writeln!(f, "=== Backtest Results ===")?;
        writeln!(f, "Initial Capital:    {:.2}", r.initial_capital)?;
        writeln!(f, "Final Cash:         {:.2}", r.final_cash)?;
        writeln!(f, "Total Return:       {:.2}%", r.total_return() * 100.0)?;
        writeln!(f, "Trades:             {}", r.ledger.len())?;
        writeln!(f, "Commissions Paid:   {:.2}", r.commissions_paid)?;
        writeln!(f, "Open Positions:     {}", r.open_positions.len())?;
        writeln!(
            f,
            "Skipped Buys:       {} insufficient funds, {} zero size",
            r.diagnostics.insufficient_funds, r.diagnostics.zero_quantity
        )?;
        writeln!(f, "Rejected Orders:    {}", r.diagnostics.rejected)?;
        writeln!(f, "Not-Ready Steps:    {}", r.diagnostics.warming_up)?;
        writeln!(f, "Ignored (Pending):  {}", r.diagnostics.ignored_while_pending)?;
        write!(f, "Final Portfolio Value: {:.2}", r.final_equity)
    }
}

/// One instance per (symbol, strategy) in symbol-major order, each paired
/// with the index of its series.
pub fn build_instances(
    series: &[InstrumentSeries],
    strategies: &[StrategySpec],
    sizer: PositionSizer,
) -> Vec<(usize, StrategyInstance)> {
    series
        .iter()
        .enumerate()
        .flat_map(move |(idx, s)| {
            strategies
                .iter()
                .map(move |spec| (idx, StrategyInstance::new(&s.symbol, *spec, sizer)))
        })
        .collect()
}

/// Validate the configuration, then replay every bar through every
/// strategy instance.
pub fn run_backtest(
    series: &[InstrumentSeries],
    config: &BacktestConfig,
) -> Result<BacktestResult, SmacrossError> {
    config.validate()?;

    let timeline = build_unified_timeline(series);
    let mut broker = SimulatedBroker::new(config.initial_capital, config.execution.clone());
    let mut instances = build_instances(series, &config.strategies, config.sizer());
    let mut ledger = TradeLedger::new();
    let mut diagnostics = RunDiagnostics::default();
    let mut equity_curve = Vec::with_capacity(timeline.len());

    info!(
        instruments = series.len(),
        instances = instances.len(),
        dates = timeline.len(),
        "running backtest"
    );

    for &date in &timeline {
        for s in series {
            if let Some(bar) = s.get_bar(date) {
                broker.mark(&s.symbol, bar.close);
            }
        }

        for (idx, instance) in instances.iter_mut() {
            if let Some(bar) = series[*idx].get_bar(date) {
                let outcome = instance.on_bar(bar, &mut broker, &mut ledger);
                diagnostics.tally(&outcome);
            }
        }

        equity_curve.push(EquityPoint {
            date,
            equity: broker.current_equity(),
        });
    }

    let open_positions = instances
        .iter()
        .filter(|(_, inst)| inst.held_quantity() > 0)
        .map(|(_, inst)| OpenPosition {
            instrument: inst.instrument().to_string(),
            strategy: inst.label().to_string(),
            quantity: inst.held_quantity(),
            last_close: broker.last_price(inst.instrument()).unwrap_or(0.0),
        })
        .collect();

    let result = BacktestResult {
        ledger,
        equity_curve,
        initial_capital: config.initial_capital,
        final_cash: broker.current_cash(),
        final_equity: broker.current_equity(),
        commissions_paid: broker.commissions_paid(),
        open_positions,
        diagnostics,
    };

    info!(
        trades = result.ledger.len(),
        final_equity = result.final_equity,
        "backtest finished"
    );

    Ok(result)
}
