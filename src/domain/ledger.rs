//! Append-only trade ledger.

use chrono::NaiveDate;

use super::order::Side;

/// One confirmed fill with the portfolio valuation right after it.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub side: Side,
    pub strategy: String,
    pub instrument: String,
    pub fill_price: f64,
    pub quantity: i64,
    pub notional: f64,
    pub cash_after: f64,
    pub equity_after: f64,
}

/// Fills in confirmation order. Records are never edited or removed, so
/// insertion order is chronological order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLedger {
    records: Vec<TradeRecord>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: TradeRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count_side(&self, side: Side) -> usize {
        self.records.iter().filter(|r| r.side == side).count()
    }

    /// Records for one strategy label on one instrument, in order.
    pub fn for_instance<'a>(
        &'a self,
        instrument: &'a str,
        strategy: &'a str,
    ) -> impl Iterator<Item = &'a TradeRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.instrument == instrument && r.strategy == strategy)
    }
}
