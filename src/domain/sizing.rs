//! Position sizing.
//!
//! quantity = floor(equity * allocation_fraction / price), whole shares only.
//! An order is only affordable when cash strictly exceeds quantity * price,
//! so the last unit of cash is never spent.

use super::error::SizingError;

pub const DEFAULT_ALLOCATION_FRACTION: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSizer {
    pub allocation_fraction: f64,
}

impl Default for PositionSizer {
    fn default() -> Self {
        PositionSizer {
            allocation_fraction: DEFAULT_ALLOCATION_FRACTION,
        }
    }
}

impl PositionSizer {
    pub fn new(allocation_fraction: f64) -> Self {
        PositionSizer {
            allocation_fraction,
        }
    }

    /// Whole-share quantity for a target allocation of `equity`. Zero for a
    /// non-positive price.
    pub fn quantity(&self, equity: f64, price: f64) -> i64 {
        if price <= 0.0 || !price.is_finite() {
            return 0;
        }
        let raw = (equity * self.allocation_fraction / price).floor();
        if raw.is_finite() && raw > 0.0 {
            raw as i64
        } else {
            0
        }
    }

    /// Size an order and verify it is affordable.
    pub fn size(&self, equity: f64, cash: f64, price: f64) -> Result<i64, SizingError> {
        let quantity = self.quantity(equity, price);
        if quantity == 0 {
            return Err(SizingError::ZeroQuantity { equity, price });
        }
        let cost = quantity as f64 * price;
        if !is_solvent(cash, quantity, price) {
            return Err(SizingError::InsufficientFunds { cash, cost });
        }
        Ok(quantity)
    }
}

/// Strict solvency: `cash > quantity * price`.
pub fn is_solvent(cash: f64, quantity: i64, price: f64) -> bool {
    cash > quantity as f64 * price
}
