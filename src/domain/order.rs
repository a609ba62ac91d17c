//! Simulated orders and their outcomes.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A market order handed to the execution collaborator. Quantity is always
/// positive; direction is carried by `side`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub instrument: String,
    pub side: Side,
    pub quantity: i64,
}

impl OrderRequest {
    pub fn buy(instrument: &str, quantity: i64) -> Self {
        OrderRequest {
            instrument: instrument.to_string(),
            side: Side::Buy,
            quantity,
        }
    }

    pub fn sell(instrument: &str, quantity: i64) -> Self {
        OrderRequest {
            instrument: instrument.to_string(),
            side: Side::Sell,
            quantity,
        }
    }
}

/// What the execution collaborator did with an order.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Filled { price: f64, quantity: i64 },
    Rejected { reason: String },
    /// Accepted but not yet resolved; the fill or rejection arrives later.
    Working,
}
