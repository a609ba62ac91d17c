//! Core domain types and logic.

pub mod price_bar;
pub mod indicator;
pub mod sizing;
pub mod signal;
pub mod strategy;
pub mod order;
pub mod lifecycle;
pub mod ledger;
pub mod broker;
pub mod instrument_data;
pub mod universe;
pub mod backtest;
pub mod config_validation;
pub mod error;
