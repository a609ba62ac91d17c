//! Order lifecycle state machine.
//!
//! Each strategy instance cycles through
//! `Flat -> PendingOpen -> Long -> PendingClose -> Flat`. At most one order is
//! in flight per instance; signals arriving while an order is pending are
//! ignored. A rejection returns the instance to the phase it submitted from.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::error::SizingError;
use crate::domain::indicator::SmaWindow;
use crate::domain::ledger::{TradeLedger, TradeRecord};
use crate::domain::order::{OrderOutcome, OrderRequest, Side};
use crate::domain::price_bar::PriceBar;
use crate::domain::signal::{Signal, SignalInputs};
use crate::domain::sizing::PositionSizer;
use crate::domain::strategy::StrategySpec;
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone, PartialEq)]
pub enum OrderPhase {
    Flat,
    PendingOpen { order: OrderRequest },
    Long { quantity: i64 },
    PendingClose { order: OrderRequest },
}

impl OrderPhase {
    pub fn name(&self) -> &'static str {
        match self {
            OrderPhase::Flat => "FLAT",
            OrderPhase::PendingOpen { .. } => "ORDER_PENDING_OPEN",
            OrderPhase::Long { .. } => "LONG",
            OrderPhase::PendingClose { .. } => "ORDER_PENDING_CLOSE",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            OrderPhase::PendingOpen { .. } | OrderPhase::PendingClose { .. }
        )
    }

    pub fn is_long(&self) -> bool {
        matches!(self, OrderPhase::Long { .. })
    }

    /// Shares held. Non-zero only while `Long`.
    pub fn held_quantity(&self) -> i64 {
        match self {
            OrderPhase::Long { quantity } => *quantity,
            _ => 0,
        }
    }

    pub fn pending_order(&self) -> Option<&OrderRequest> {
        match self {
            OrderPhase::PendingOpen { order } | OrderPhase::PendingClose { order } => Some(order),
            _ => None,
        }
    }
}

/// What one step (or one resolution) did to an instance.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// This bar date was already evaluated; nothing happened.
    AlreadyEvaluated,
    /// Indicators lack the history needed for a decision.
    WarmingUp,
    Hold,
    /// An order is in flight, so the bar's signal was ignored.
    AwaitingFill,
    /// An OPEN signal could not be sized this bar.
    Skipped(SizingError),
    Filled(Side),
    Rejected { side: Side, reason: String },
    /// Submitted and still working at the collaborator.
    Working(Side),
    /// A resolution arrived with no order in flight.
    NothingPending,
}

#[derive(Debug, Clone)]
enum Indicators {
    Threshold(SmaWindow),
    DualCross { short: SmaWindow, long: SmaWindow },
}

impl Indicators {
    fn for_spec(spec: &StrategySpec) -> Self {
        match *spec {
            StrategySpec::ThresholdCross { window } => Indicators::Threshold(SmaWindow::new(window)),
            StrategySpec::DualCross { short, long } => Indicators::DualCross {
                short: SmaWindow::new(short),
                long: SmaWindow::new(long),
            },
        }
    }

    fn update(&mut self, close: f64) -> SignalInputs {
        match self {
            Indicators::Threshold(sma) => SignalInputs::Threshold {
                price: close,
                sma: sma.update(close),
            },
            Indicators::DualCross { short, long } => SignalInputs::DualCross {
                short: short.update(close),
                long: long.update(close),
            },
        }
    }
}

/// One (instrument, strategy variant, parameters) triple with its own
/// indicators and order phase. Nothing here is shared between instances.
#[derive(Debug, Clone)]
pub struct StrategyInstance {
    instrument: String,
    spec: StrategySpec,
    label: String,
    sizer: PositionSizer,
    indicators: Indicators,
    phase: OrderPhase,
    last_bar: Option<NaiveDate>,
}

impl StrategyInstance {
    pub fn new(instrument: &str, spec: StrategySpec, sizer: PositionSizer) -> Self {
        StrategyInstance {
            instrument: instrument.to_string(),
            label: spec.label(),
            indicators: Indicators::for_spec(&spec),
            spec,
            sizer,
            phase: OrderPhase::Flat,
            last_bar: None,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn spec(&self) -> &StrategySpec {
        &self.spec
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn phase(&self) -> &OrderPhase {
        &self.phase
    }

    pub fn held_quantity(&self) -> i64 {
        self.phase.held_quantity()
    }

    /// Advance one bar: update indicators, evaluate, and act on the signal.
    ///
    /// A bar dated on or before the last evaluated bar is a no-op, so
    /// stepping twice on the same bar never produces a second signal.
    pub fn on_bar(
        &mut self,
        bar: &PriceBar,
        broker: &mut dyn ExecutionPort,
        ledger: &mut TradeLedger,
    ) -> StepOutcome {
        if self.last_bar.is_some_and(|last| bar.date <= last) {
            return StepOutcome::AlreadyEvaluated;
        }
        self.last_bar = Some(bar.date);

        let inputs = self.indicators.update(bar.close);

        if self.phase.is_pending() {
            debug!(
                instrument = %self.instrument,
                strategy = %self.label,
                phase = self.phase.name(),
                "order in flight, signal ignored"
            );
            return StepOutcome::AwaitingFill;
        }
        if inputs.is_warming_up() {
            return StepOutcome::WarmingUp;
        }

        match inputs.evaluate(self.phase.is_long()) {
            Signal::Hold => StepOutcome::Hold,
            Signal::Open => self.submit_open(bar, broker, ledger),
            Signal::Close => self.submit_close(bar, broker, ledger),
        }
    }

    fn submit_open(
        &mut self,
        bar: &PriceBar,
        broker: &mut dyn ExecutionPort,
        ledger: &mut TradeLedger,
    ) -> StepOutcome {
        let equity = broker.current_equity();
        let cash = broker.current_cash();
        let quantity = match self.sizer.size(equity, cash, bar.close) {
            Ok(q) => q,
            Err(e) => {
                warn!(
                    date = %bar.date,
                    instrument = %self.instrument,
                    strategy = %self.label,
                    "buy skipped: {e}"
                );
                return StepOutcome::Skipped(e);
            }
        };

        let order = OrderRequest::buy(&self.instrument, quantity);
        self.submit(order, bar.date, broker, ledger)
    }

    fn submit_close(
        &mut self,
        bar: &PriceBar,
        broker: &mut dyn ExecutionPort,
        ledger: &mut TradeLedger,
    ) -> StepOutcome {
        let order = OrderRequest::sell(&self.instrument, self.phase.held_quantity());
        self.submit(order, bar.date, broker, ledger)
    }

    fn submit(
        &mut self,
        order: OrderRequest,
        date: NaiveDate,
        broker: &mut dyn ExecutionPort,
        ledger: &mut TradeLedger,
    ) -> StepOutcome {
        debug!(
            date = %date,
            instrument = %self.instrument,
            strategy = %self.label,
            side = %order.side,
            quantity = order.quantity,
            "submitting order"
        );
        let outcome = broker.submit(&order);
        self.phase = match order.side {
            Side::Buy => OrderPhase::PendingOpen { order },
            Side::Sell => OrderPhase::PendingClose { order },
        };
        self.resolve(outcome, date, &*broker, ledger)
    }

    /// Reconcile an execution outcome with the pending order.
    ///
    /// Called internally right after submission, and by callers whose
    /// collaborator answered `Working` once the real outcome is known.
    pub fn resolve(
        &mut self,
        outcome: OrderOutcome,
        date: NaiveDate,
        broker: &dyn ExecutionPort,
        ledger: &mut TradeLedger,
    ) -> StepOutcome {
        let phase = std::mem::replace(&mut self.phase, OrderPhase::Flat);
        match (phase, outcome) {
            (OrderPhase::PendingOpen { order }, OrderOutcome::Working) => {
                self.phase = OrderPhase::PendingOpen { order };
                StepOutcome::Working(Side::Buy)
            }
            (OrderPhase::PendingClose { order }, OrderOutcome::Working) => {
                self.phase = OrderPhase::PendingClose { order };
                StepOutcome::Working(Side::Sell)
            }
            (OrderPhase::PendingOpen { .. }, OrderOutcome::Filled { price, quantity }) => {
                self.phase = OrderPhase::Long { quantity };
                self.record_fill(Side::Buy, price, quantity, date, broker, ledger);
                StepOutcome::Filled(Side::Buy)
            }
            (OrderPhase::PendingClose { .. }, OrderOutcome::Filled { price, quantity }) => {
                self.phase = OrderPhase::Flat;
                self.record_fill(Side::Sell, price, quantity, date, broker, ledger);
                StepOutcome::Filled(Side::Sell)
            }
            (OrderPhase::PendingOpen { .. }, OrderOutcome::Rejected { reason }) => {
                warn!(
                    date = %date,
                    instrument = %self.instrument,
                    strategy = %self.label,
                    "buy rejected: {reason}"
                );
                StepOutcome::Rejected {
                    side: Side::Buy,
                    reason,
                }
            }
            (OrderPhase::PendingClose { order }, OrderOutcome::Rejected { reason }) => {
                warn!(
                    date = %date,
                    instrument = %self.instrument,
                    strategy = %self.label,
                    "sell rejected: {reason}"
                );
                self.phase = OrderPhase::Long {
                    quantity: order.quantity,
                };
                StepOutcome::Rejected {
                    side: Side::Sell,
                    reason,
                }
            }
            (settled, _) => {
                self.phase = settled;
                StepOutcome::NothingPending
            }
        }
    }

    fn record_fill(
        &self,
        side: Side,
        price: f64,
        quantity: i64,
        date: NaiveDate,
        broker: &dyn ExecutionPort,
        ledger: &mut TradeLedger,
    ) {
        let record = TradeRecord {
            date,
            side,
            strategy: self.label.clone(),
            instrument: self.instrument.clone(),
            fill_price: price,
            quantity,
            notional: price * quantity as f64,
            cash_after: broker.current_cash(),
            equity_after: broker.current_equity(),
        };
        debug!(
            date = %date,
            instrument = %self.instrument,
            strategy = %self.label,
            side = %side,
            price,
            quantity,
            "order filled"
        );
        ledger.append(record);
    }
}
