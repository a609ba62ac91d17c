//! smacross: moving-average crossover decision engine and backtester.
//!
//! Hexagonal architecture: indicator, signal and order-lifecycle logic in
//! [`domain`], port traits in [`ports`], concrete implementations in
//! [`adapters`], command-line wiring in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
