//! Report output port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;

/// Port for persisting a finished run. Reports only read the result.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SmacrossError>;
}
