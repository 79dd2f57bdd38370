//! Data loading
//!
//! Loads precomputed indicator readings from CSV. The first column is the bar
//! datetime, every other column is one named series and a `close` column is
//! required:
//!
//! ```text
//! datetime,close,sma,stoch_d
//! 2024-01-02 09:30:00,4000.25,,
//! 2024-01-02 09:35:00,4001.00,3990.5,18.2
//! ```
//!
//! Blank cells are warm-up bars and read as no value.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

use crate::indicators::{SeriesBook, CLOSE};

/// One bar of readings, values in column order
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRow {
    pub datetime: DateTime<Utc>,
    pub values: Vec<f64>,
}

/// Readings for a whole replay
#[derive(Debug, Clone, Default)]
pub struct ReadingTable {
    pub columns: Vec<String>,
    pub rows: Vec<ReadingRow>,
}

impl ReadingTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Empty book declaring every column
    pub fn empty_book(&self) -> SeriesBook {
        SeriesBook::new(self.columns.iter().cloned())
    }

    /// (series, value) pairs of row `index`
    pub fn row(&self, index: usize) -> impl Iterator<Item = (&str, f64)> {
        let values = self.rows.get(index).map(|r| r.values.as_slice()).unwrap_or(&[]);
        self.columns
            .iter()
            .map(String::as_str)
            .zip(values.iter().copied())
    }

    /// Close of row `index`, if present
    pub fn close(&self, index: usize) -> Option<f64> {
        let column = self.columns.iter().position(|c| c == CLOSE)?;
        self.rows
            .get(index)
            .and_then(|r| r.values.get(column))
            .copied()
            .filter(|v| !v.is_nan())
    }
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Try parsing without timezone and assume UTC
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        })
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|d| DateTime::<Utc>::from_naive_utc_and_offset(d.and_time(chrono::NaiveTime::MIN), Utc))
        })
        .with_context(|| format!("Failed to parse datetime: {}", value))
}

/// Load indicator readings from a CSV reader
pub fn read_readings<R: std::io::Read>(reader: R) -> Result<ReadingTable> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    if !columns.iter().any(|c| c == CLOSE) {
        anyhow::bail!("CSV header has no '{}' column", CLOSE);
    }

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let dt_str = record.get(0).context("Missing datetime column")?;
        let datetime = parse_datetime(dt_str)?;

        let mut values = Vec::with_capacity(columns.len());
        for (col_idx, name) in columns.iter().enumerate() {
            let cell = record.get(col_idx + 1).unwrap_or("");
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>()
                    .with_context(|| format!("Failed to parse {} on row {}", name, row_idx + 1))?
            };
            values.push(value);
        }
        rows.push(ReadingRow { datetime, values });
    }

    Ok(ReadingTable { columns, rows })
}

/// Load indicator readings from a CSV file
pub fn load_readings(path: impl AsRef<Path>) -> Result<ReadingTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
    let table = read_readings(file)
        .with_context(|| format!("Failed to load readings from {}", path.display()))?;
    info!("Loaded {} bars ({} series) from {}", table.len(), table.columns.len(), path.display());
    Ok(table)
}
