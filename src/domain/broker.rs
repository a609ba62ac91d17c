//! Simulated broker: cash, holdings and fills against the current bar.
//!
//! Orders fill immediately at the last marked close for the instrument,
//! adjusted for slippage, with commission charged on the trade value.
//! Holdings are aggregated per instrument across all strategies.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::order::{OrderOutcome, OrderRequest, Side};
use crate::ports::execution_port::ExecutionPort;

/// Cost model for simulated fills.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission_per_trade: f64,
    pub commission_pct: f64,
    pub slippage_pct: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_per_trade: 0.0,
            commission_pct: 0.0,
            slippage_pct: 0.0,
        }
    }
}

/// Calculate commission: flat_fee + (trade_value * pct / 100).
pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    config.commission_per_trade + (trade_value * config.commission_pct / 100.0)
}

/// Buys fill above the market price, sells below it.
pub fn apply_slippage(market_price: f64, side: Side, slippage_pct: f64) -> f64 {
    match side {
        Side::Buy => market_price * (1.0 + slippage_pct / 100.0),
        Side::Sell => market_price * (1.0 - slippage_pct / 100.0),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct SimulatedBroker {
    cash: f64,
    config: ExecutionConfig,
    marks: HashMap<String, f64>,
    holdings: HashMap<String, i64>,
    commissions_paid: f64,
}

impl SimulatedBroker {
    pub fn new(initial_capital: f64, config: ExecutionConfig) -> Self {
        SimulatedBroker {
            cash: initial_capital,
            config,
            marks: HashMap::new(),
            holdings: HashMap::new(),
            commissions_paid: 0.0,
        }
    }

    /// Record the latest close for an instrument. Used for fills and for
    /// mark-to-market equity.
    pub fn mark(&mut self, instrument: &str, close: f64) {
        self.marks.insert(instrument.to_string(), close);
    }

    pub fn last_price(&self, instrument: &str) -> Option<f64> {
        self.marks.get(instrument).copied()
    }

    pub fn holding(&self, instrument: &str) -> i64 {
        self.holdings.get(instrument).copied().unwrap_or(0)
    }

    pub fn commissions_paid(&self) -> f64 {
        self.commissions_paid
    }

    /// Market value of all holdings at their last marked close.
    pub fn holdings_value(&self) -> f64 {
        self.holdings
            .iter()
            .map(|(instrument, &qty)| qty as f64 * self.last_price(instrument).unwrap_or(0.0))
            .sum()
    }

    fn fill_buy(&mut self, order: &OrderRequest, market_price: f64) -> OrderOutcome {
        let execution_price = apply_slippage(market_price, Side::Buy, self.config.slippage_pct);
        let cost = order.quantity as f64 * execution_price;
        let commission = calculate_commission(cost, &self.config);
        let total_cost = cost + commission;

        if total_cost > self.cash {
            return OrderOutcome::Rejected {
                reason: format!(
                    "cost {:.2} exceeds available cash {:.2}",
                    total_cost, self.cash
                ),
            };
        }

        self.cash -= total_cost;
        self.commissions_paid += commission;
        *self.holdings.entry(order.instrument.clone()).or_insert(0) += order.quantity;

        OrderOutcome::Filled {
            price: execution_price,
            quantity: order.quantity,
        }
    }

    fn fill_sell(&mut self, order: &OrderRequest, market_price: f64) -> OrderOutcome {
        let held = self.holding(&order.instrument);
        if order.quantity > held {
            return OrderOutcome::Rejected {
                reason: format!(
                    "sell of {} exceeds holding of {} in {}",
                    order.quantity, held, order.instrument
                ),
            };
        }

        let execution_price = apply_slippage(market_price, Side::Sell, self.config.slippage_pct);
        let value = order.quantity as f64 * execution_price;
        let commission = calculate_commission(value, &self.config);

        self.cash += value - commission;
        self.commissions_paid += commission;
        if held == order.quantity {
            self.holdings.remove(&order.instrument);
        } else {
            self.holdings.insert(order.instrument.clone(), held - order.quantity);
        }

        OrderOutcome::Filled {
            price: execution_price,
            quantity: order.quantity,
        }
    }
}

impl ExecutionPort for SimulatedBroker {
    fn submit(&mut self, order: &OrderRequest) -> OrderOutcome {
        if order.quantity <= 0 {
            return OrderOutcome::Rejected {
                reason: format!("non-positive quantity {}", order.quantity),
            };
        }
        let Some(market_price) = self.last_price(&order.instrument) else {
            return OrderOutcome::Rejected {
                reason: format!("no price for {}", order.instrument),
            };
        };

        match order.side {
            Side::Buy => self.fill_buy(order, market_price),
            Side::Sell => self.fill_sell(order, market_price),
        }
    }

    fn current_cash(&self) -> f64 {
        self.cash
    }

    fn current_equity(&self) -> f64 {
        self.cash + self.holdings_value()
    }
}
