//! Trade ledger CSV export.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;
use crate::domain::ledger::TradeRecord;
use crate::ports::report_port::ReportPort;

pub const LEDGER_HEADER: [&str; 9] = [
    "date",
    "operation",
    "strategy",
    "instrument",
    "fill_price",
    "quantity",
    "notional",
    "cash_after",
    "equity_after",
];

pub struct CsvLedgerReport;

fn report_error(path: &Path, e: impl std::fmt::Display) -> SmacrossError {
    SmacrossError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn row(record: &TradeRecord) -> [String; 9] {
    [
        record.date.format("%Y-%m-%d").to_string(),
        record.side.to_string(),
        record.strategy.clone(),
        record.instrument.clone(),
        format!("{:.4}", record.fill_price),
        record.quantity.to_string(),
        format!("{:.2}", record.notional),
        format!("{:.2}", record.cash_after),
        format!("{:.2}", record.equity_after),
    ]
}

impl ReportPort for CsvLedgerReport {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SmacrossError> {
        let mut writer =
            csv::Writer::from_path(output_path).map_err(|e| report_error(output_path, e))?;
        writer
            .write_record(LEDGER_HEADER)
            .map_err(|e| report_error(output_path, e))?;
        for record in result.ledger.records() {
            writer
                .write_record(row(record))
                .map_err(|e| report_error(output_path, e))?;
        }
        writer.flush()?;
        Ok(())
    }
}
