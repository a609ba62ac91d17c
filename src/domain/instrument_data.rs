//! Per-instrument bar series and the unified timeline.

use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl InstrumentSeries {
    pub fn new(symbol: String, bars: Vec<PriceBar>) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            symbol,
            bars,
            date_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }
}

/// Every date on which at least one instrument has a bar, ascending.
pub fn build_unified_timeline(series: &[InstrumentSeries]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}
