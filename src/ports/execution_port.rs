//! Execution collaborator port trait.

use crate::domain::order::{OrderOutcome, OrderRequest};

/// Broker seam consumed by strategy instances: order submission plus the
/// read-only cash and equity figures used for sizing.
pub trait ExecutionPort {
    fn submit(&mut self, order: &OrderRequest) -> OrderOutcome;
    fn current_cash(&self) -> f64;
    fn current_equity(&self) -> f64;
}
