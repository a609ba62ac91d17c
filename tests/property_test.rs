//! Property tests for decision-engine invariants.
//!
//! Uses proptest to verify:
//! 1. Position accounting: shares are held only in the LONG phase
//! 2. At most one order in flight per instance
//! 3. Signals respect position state
//! 4. Equity identity after every bar
//! 5. Replays are deterministic

mod common;

use common::*;
use proptest::prelude::*;
use smacross::domain::backtest::run_backtest;
use smacross::domain::broker::{ExecutionConfig, SimulatedBroker};
use smacross::domain::indicator::{IndicatorReading, IndicatorState, SmaWindow};
use smacross::domain::instrument_data::InstrumentSeries;
use smacross::domain::ledger::TradeLedger;
use smacross::domain::lifecycle::{OrderPhase, StepOutcome, StrategyInstance};
use smacross::domain::order::{OrderOutcome, OrderRequest, Side};
use smacross::domain::signal::{evaluate_dual_cross, evaluate_threshold, Signal};
use smacross::domain::sizing::PositionSizer;
use smacross::domain::strategy::StrategySpec;
use smacross::ports::execution_port::ExecutionPort;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..200.0_f64).prop_map(|p| (p * 100.0).round() / 100.0), 1..80)
}

fn arb_spec() -> impl Strategy<Value = StrategySpec> {
    prop_oneof![
        (1usize..8).prop_map(|w| StrategySpec::threshold(w).unwrap()),
        (1usize..6, 1usize..6)
            .prop_map(|(s, extra)| StrategySpec::dual_cross(s, s + extra).unwrap()),
    ]
}

fn arb_reading() -> impl Strategy<Value = IndicatorReading> {
    prop_oneof![
        Just(IndicatorReading::NotReady {
            observed: 0,
            required: 3
        }),
        (1.0..100.0_f64).prop_map(|c| IndicatorReading::Ready(IndicatorState {
            current: c,
            previous: None
        })),
        (1.0..100.0_f64, 1.0..100.0_f64).prop_map(|(c, p)| IndicatorReading::Ready(
            IndicatorState {
                current: c,
                previous: Some(p)
            }
        )),
    ]
}

/// Answers submissions from a script: 0 fills, 1 rejects, 2 leaves the
/// order working.
struct FlakyBroker {
    inner: SimulatedBroker,
    script: VecDeque<u8>,
    submissions: usize,
}

impl ExecutionPort for FlakyBroker {
    fn submit(&mut self, order: &OrderRequest) -> OrderOutcome {
        self.submissions += 1;
        match self.script.pop_front().unwrap_or(0) {
            1 => OrderOutcome::Rejected {
                reason: "scripted".into(),
            },
            2 => OrderOutcome::Working,
            _ => self.inner.submit(order),
        }
    }

    fn current_cash(&self) -> f64 {
        self.inner.current_cash()
    }

    fn current_equity(&self) -> f64 {
        self.inner.current_equity()
    }
}

fn sized_instance(spec: StrategySpec) -> StrategyInstance {
    StrategyInstance::new("TSLA", spec, PositionSizer::default())
}

// ── 1. Position accounting ───────────────────────────────────────────

proptest! {
    #[test]
    fn shares_held_only_while_long(closes in arb_closes(), spec in arb_spec()) {
        let mut inst = sized_instance(spec);
        let mut broker = SimulatedBroker::new(100_000.0, ExecutionConfig::default());
        let mut ledger = TradeLedger::new();

        for bar in bars_from(jan(1), &closes) {
            broker.mark("TSLA", bar.close);
            inst.on_bar(&bar, &mut broker, &mut ledger);

            match inst.phase() {
                OrderPhase::Long { quantity } => prop_assert!(*quantity > 0),
                _ => prop_assert_eq!(inst.held_quantity(), 0),
            }
            prop_assert_eq!(broker.holding("TSLA"), inst.held_quantity());
            // the simulated broker answers synchronously
            prop_assert!(!inst.phase().is_pending());
        }
    }

    #[test]
    fn ledger_alternates_buy_and_sell(closes in arb_closes(), spec in arb_spec()) {
        let series = vec![InstrumentSeries::new("TSLA".into(), bars_from(jan(1), &closes))];
        let mut config = sample_config();
        config.symbols = vec!["TSLA".into()];
        config.strategies = vec![spec];

        let result = run_backtest(&series, &config).unwrap();
        for (i, record) in result.ledger.records().iter().enumerate() {
            let expected = if i % 2 == 0 { Side::Buy } else { Side::Sell };
            prop_assert_eq!(record.side, expected);
            prop_assert!(record.quantity > 0);
        }
    }
}

// ── 2. One order in flight ───────────────────────────────────────────

proptest! {
    #[test]
    fn no_submission_while_pending(
        closes in arb_closes(),
        spec in arb_spec(),
        script in prop::collection::vec(0u8..3, 0..40),
        resolve_every in 1usize..5,
    ) {
        let mut inst = sized_instance(spec);
        let mut broker = FlakyBroker {
            inner: SimulatedBroker::new(100_000.0, ExecutionConfig::default()),
            script: script.into(),
            submissions: 0,
        };
        let mut ledger = TradeLedger::new();

        for (i, bar) in bars_from(jan(1), &closes).into_iter().enumerate() {
            broker.inner.mark("TSLA", bar.close);
            let was_pending = inst.phase().is_pending();
            let before = broker.submissions;

            let outcome = inst.on_bar(&bar, &mut broker, &mut ledger);

            if was_pending {
                prop_assert_eq!(outcome, StepOutcome::AwaitingFill);
                prop_assert_eq!(broker.submissions, before);
            } else {
                prop_assert!(broker.submissions <= before + 1);
            }

            // settle working orders against the simulated book from time to time
            if i % resolve_every == 0 {
                if let Some(order) = inst.phase().pending_order().cloned() {
                    let fill = broker.inner.submit(&order);
                    inst.resolve(fill, bar.date, &broker, &mut ledger);
                }
            }

            match inst.phase() {
                OrderPhase::Long { quantity } => prop_assert!(*quantity > 0),
                _ => prop_assert_eq!(inst.held_quantity(), 0),
            }
        }
    }
}

// ── 3. Signals respect position state ────────────────────────────────

proptest! {
    #[test]
    fn threshold_signal_respects_position(
        price in 1.0..100.0_f64,
        sma in arb_reading(),
        open in any::<bool>(),
    ) {
        let signal = evaluate_threshold(price, sma, open);
        if open {
            prop_assert_ne!(signal, Signal::Open);
        } else {
            prop_assert_ne!(signal, Signal::Close);
        }
        if let Some(state) = sma.state() {
            if price == state.current {
                prop_assert_eq!(signal, Signal::Hold);
            }
        }
    }

    #[test]
    fn dual_cross_signal_respects_position(
        short in arb_reading(),
        long in arb_reading(),
        open in any::<bool>(),
    ) {
        let signal = evaluate_dual_cross(short, long, open);
        if open {
            prop_assert_ne!(signal, Signal::Open);
        } else {
            prop_assert_ne!(signal, Signal::Close);
        }
        if !short.is_ready() || !long.is_ready() {
            prop_assert_eq!(signal, Signal::Hold);
        }
    }

    #[test]
    fn sma_matches_trailing_mean(closes in arb_closes(), period in 1usize..10) {
        let mut window = SmaWindow::new(NonZeroUsize::new(period).unwrap());
        for (i, &close) in closes.iter().enumerate() {
            let reading = window.update(close);
            if i + 1 < period {
                prop_assert!(!reading.is_ready());
            } else {
                let tail = &closes[i + 1 - period..=i];
                let mean = tail.iter().sum::<f64>() / period as f64;
                let state = reading.state().unwrap();
                prop_assert!((state.current - mean).abs() < 1e-9);
            }
        }
    }
}

// ── 4/5. Equity identity and determinism ─────────────────────────────

proptest! {
    #[test]
    fn equity_is_cash_plus_marked_holdings(closes in arb_closes(), spec in arb_spec()) {
        let series = vec![InstrumentSeries::new("TSLA".into(), bars_from(jan(1), &closes))];
        let mut config = sample_config();
        config.symbols = vec!["TSLA".into()];
        config.strategies = vec![spec, StrategySpec::threshold(2).unwrap()];

        let result = run_backtest(&series, &config).unwrap();
        let held: f64 = result.open_positions.iter().map(|p| p.market_value()).sum();
        prop_assert!((result.final_equity - (result.final_cash + held)).abs() < 1e-6);
        prop_assert!(result.final_cash >= 0.0);
        prop_assert_eq!(result.equity_curve.len(), closes.len());
    }

    #[test]
    fn replay_is_deterministic(closes in arb_closes(), spec in arb_spec()) {
        let series = vec![InstrumentSeries::new("TSLA".into(), bars_from(jan(1), &closes))];
        let mut config = sample_config();
        config.symbols = vec!["TSLA".into()];
        config.strategies = vec![spec];

        let first = run_backtest(&series, &config).unwrap();
        let second = run_backtest(&series, &config).unwrap();
        prop_assert_eq!(first.ledger, second.ledger);
        prop_assert_eq!(first.final_equity, second.final_equity);
    }
}
