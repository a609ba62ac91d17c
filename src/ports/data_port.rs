//! Price history port trait.

use crate::domain::error::SmacrossError;
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `symbol` within `[start_date, end_date]`, ascending.
    /// `NoData` when the symbol has no source at all; malformed data is `Data`.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, SmacrossError>;
}
