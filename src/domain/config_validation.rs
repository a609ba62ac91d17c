//! Configuration validation.
//!
//! Every check here is fatal: a run with an invalid configuration never
//! starts. The value-level checks are shared with [`BacktestConfig::validate`].
//!
//! [`BacktestConfig::validate`]: crate::domain::backtest::BacktestConfig::validate

use crate::domain::error::SmacrossError;
use crate::domain::strategy::{parse_strategy_list, DEFAULT_STRATEGIES};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    check_initial_capital(config.get_double("backtest", "initial_capital", 0.0)?)?;
    check_allocation_fraction(config.get_double(
        "backtest",
        "allocation_fraction",
        crate::domain::sizing::DEFAULT_ALLOCATION_FRACTION,
    )?)?;
    validate_costs(config)?;
    validate_min_bars(config)?;
    validate_dates(config)?;
    validate_symbols(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let list = config.get_string_or("strategies", "list", DEFAULT_STRATEGIES);
    parse_strategy_list(&list)?;
    Ok(())
}

pub(crate) fn check_initial_capital(value: f64) -> Result<(), SmacrossError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(SmacrossError::invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

pub(crate) fn check_allocation_fraction(value: f64) -> Result<(), SmacrossError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(SmacrossError::invalid(
            "backtest",
            "allocation_fraction",
            "allocation_fraction must be in (0, 1]",
        ));
    }
    Ok(())
}

pub(crate) fn check_non_negative(key: &str, value: f64) -> Result<(), SmacrossError> {
    if value < 0.0 || !value.is_finite() {
        return Err(SmacrossError::invalid(
            "backtest",
            key,
            format!("{key} must be non-negative"),
        ));
    }
    Ok(())
}

pub(crate) fn check_date_order(start: NaiveDate, end: NaiveDate) -> Result<(), SmacrossError> {
    if start >= end {
        return Err(SmacrossError::invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    for key in ["commission_per_trade", "commission_pct", "slippage_pct"] {
        check_non_negative(key, config.get_double("backtest", key, 0.0)?)?;
    }
    Ok(())
}

fn validate_min_bars(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    if config.get_int("backtest", "min_bars", 1)? < 1 {
        return Err(SmacrossError::invalid(
            "backtest",
            "min_bars",
            "min_bars must be at least 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let start_date = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;
    check_date_order(start_date, end_date)
}

pub(crate) fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SmacrossError> {
    match value {
        None => Err(SmacrossError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            SmacrossError::invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    match config.get_string("backtest", "symbols") {
        Some(s) if !s.trim().is_empty() => parse_symbols(&s)
            .map(|_| ())
            .map_err(|e| SmacrossError::invalid("backtest", "symbols", e.to_string())),
        _ => Err(SmacrossError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbols".to_string(),
        }),
    }
}
