//! Daily price bar.

use chrono::NaiveDate;

/// One closing price for one instrument on one trading day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        PriceBar { date, close }
    }
}
