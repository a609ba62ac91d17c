//! CSV file data adapter: one `<SYMBOL>.csv` per instrument.

use crate::domain::error::SmacrossError;
use crate::domain::price_bar::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn data_error(reason: String) -> SmacrossError {
    SmacrossError::Data { reason }
}

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, SmacrossError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SmacrossError::NoData {
                symbol: symbol.to_string(),
            },
            _ => data_error(format!("{}: {}", path.display(), e)),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_error(format!("{}: bad header: {}", path.display(), e)))?
            .clone();
        let date_col = column(&headers, "date")
            .ok_or_else(|| data_error(format!("{}: missing date column", path.display())))?;
        let close_col = column(&headers, "close")
            .ok_or_else(|| data_error(format!("{}: missing close column", path.display())))?;

        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result
                .map_err(|e| data_error(format!("{}: CSV parse error: {}", path.display(), e)))?;
            let line = row + 2;

            let date_str = record.get(date_col).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                data_error(format!(
                    "{} line {}: invalid date '{}': {}",
                    path.display(),
                    line,
                    date_str,
                    e
                ))
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let close_str = record.get(close_col).unwrap_or("").trim();
            let close: f64 = close_str.parse().map_err(|e| {
                data_error(format!(
                    "{} line {}: invalid close '{}': {}",
                    path.display(),
                    line,
                    close_str,
                    e
                ))
            })?;
            if !close.is_finite() || close <= 0.0 {
                return Err(data_error(format!(
                    "{} line {}: close must be a positive number, got '{}'",
                    path.display(),
                    line,
                    close_str
                )));
            }

            bars.push(PriceBar::new(date, close));
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
