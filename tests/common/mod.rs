#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use smacross::domain::backtest::BacktestConfig;
use smacross::domain::broker::ExecutionConfig;
use smacross::domain::error::SmacrossError;
pub use smacross::domain::price_bar::PriceBar;
use smacross::domain::strategy::StrategySpec;
use smacross::ports::data_port::DataPort;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, SmacrossError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SmacrossError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| b.date >= start_date && b.date <= end_date)
                .copied()
                .collect()),
            None => Err(SmacrossError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One bar per calendar day starting at `start`.
pub fn bars_from(start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar::new(start + Days::new(i as u64), close))
        .collect()
}

/// Day `n` of January 2021.
pub fn jan(n: u32) -> NaiveDate {
    date(2021, 1, n)
}

pub const TSLA_CLOSES: [f64; 12] = [
    10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 14.0, 13.0, 12.0, 11.0, 10.0, 9.0,
];
pub const MSFT_CLOSES: [f64; 12] = [
    20.0, 19.0, 18.0, 17.0, 16.0, 15.0, 16.0, 17.0, 18.0, 19.0, 20.0, 21.0,
];
pub const GOOG_CLOSES: [f64; 12] = [50.0; 12];
/// AAPL starts trading on January 5th.
pub const AAPL_CLOSES: [f64; 8] = [30.0, 31.0, 32.0, 33.0, 34.0, 35.0, 36.0, 37.0];

/// Four instruments over twelve days: one rises then falls, one falls then
/// rises, one never moves, and one lists late and rises.
pub fn four_symbol_port() -> MockDataPort {
    MockDataPort::new()
        .with_bars("TSLA", bars_from(jan(1), &TSLA_CLOSES))
        .with_bars("MSFT", bars_from(jan(1), &MSFT_CLOSES))
        .with_bars("GOOG", bars_from(jan(1), &GOOG_CLOSES))
        .with_bars("AAPL", bars_from(jan(5), &AAPL_CLOSES))
}

pub fn four_symbols() -> Vec<String> {
    ["TSLA", "MSFT", "GOOG", "AAPL"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn two_strategies() -> Vec<StrategySpec> {
    vec![
        StrategySpec::threshold(3).unwrap(),
        StrategySpec::dual_cross(2, 4).unwrap(),
    ]
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: jan(1),
        end_date: date(2021, 12, 31),
        initial_capital: 100_000.0,
        allocation_fraction: 0.10,
        symbols: four_symbols(),
        strategies: two_strategies(),
        execution: ExecutionConfig::default(),
        min_bars: 1,
    }
}

/// Write `<dir>/<SYMBOL>.csv` in the usual Yahoo-style layout.
pub fn write_symbol_csv(dir: &Path, symbol: &str, bars: &[PriceBar]) {
    let mut content = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{c},{c},{c},{c},{c},1000\n",
            bar.date.format("%Y-%m-%d"),
            c = bar.close
        ));
    }
    fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

pub fn write_four_symbol_csvs(dir: &Path) {
    write_symbol_csv(dir, "TSLA", &bars_from(jan(1), &TSLA_CLOSES));
    write_symbol_csv(dir, "MSFT", &bars_from(jan(1), &MSFT_CLOSES));
    write_symbol_csv(dir, "GOOG", &bars_from(jan(1), &GOOG_CLOSES));
    write_symbol_csv(dir, "AAPL", &bars_from(jan(5), &AAPL_CLOSES));
}
