//! Instrument universe.
//!
//! Parses the symbol list from configuration and loads each symbol's bars,
//! skipping symbols that have no usable data.

use crate::domain::error::SmacrossError;
use crate::domain::instrument_data::InstrumentSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    pub series: Vec<InstrumentSeries>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Fetch bars for every symbol, in order. Symbols with no data file, no bars
/// in range, or fewer than `min_bars` bars are skipped with a warning; any
/// other data error aborts the load. If nothing survives the run cannot start.
pub fn load_universe(
    data_port: &dyn DataPort,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_bars: usize,
) -> Result<LoadedUniverse, SmacrossError> {
    let mut series = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let bars = match data_port.fetch_bars(symbol, start_date, end_date) {
            Ok(bars) => bars,
            Err(SmacrossError::NoData { .. }) => {
                warn!(symbol = %symbol, "skipping symbol: no data file");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        if bars.is_empty() {
            warn!(symbol = %symbol, "skipping symbol: no data in range");
            skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        if bars.len() < min_bars {
            warn!(
                symbol = %symbol,
                bars = bars.len(),
                minimum = min_bars,
                "skipping symbol: not enough bars"
            );
            skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: SkipReason::InsufficientBars { bars: bars.len() },
            });
            continue;
        }

        info!(symbol = %symbol, bars = bars.len(), "loaded");
        series.push(InstrumentSeries::new(symbol.clone(), bars));
    }

    if series.is_empty() {
        return Err(SmacrossError::InsufficientData {
            symbol: "all".to_string(),
            bars: 0,
            minimum: min_bars,
        });
    }

    if !skipped.is_empty() {
        info!(
            "backtesting {} of {} symbols",
            series.len(),
            series.len() + skipped.len()
        );
    }

    Ok(LoadedUniverse { series, skipped })
}
