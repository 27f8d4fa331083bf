//! CSV ingestion for the history log and forecast series.
//!
//! Cells that are missing, blank, or not finite numbers are read as `None`
//! rather than as zero, so callers can tell absent data from a real zero.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::dispatch::types::HistoricalRecord;

/// Timestamp layouts accepted in forecast files, tried in order.
pub const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Timestamp column shared by all forecast files.
pub const DATETIME_COLUMN: &str = "Datetime";

/// History column names.
pub const LOAD_COLUMN: &str = "Load_MW";
pub const WIND_COLUMN: &str = "Wind_MW";
pub const PV_COLUMN: &str = "PV_MW";
pub const ES_POWER_COLUMN: &str = "ES_MW_Optimized";
pub const ES_SOC_COLUMN: &str = "ES_SOC_Optimized";

/// One raw forecast row before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    /// Parsed timestamp, if the cell matched an accepted layout.
    pub timestamp: Option<NaiveDateTime>,
    /// Parsed value, if the cell held a finite number.
    pub value: Option<f64>,
}

/// Parses a numeric cell, treating blanks and non-finite values as absent.
///
/// # Examples
///
/// ```
/// use es_dispatch::io::reader::parse_number;
///
/// assert_eq!(parse_number(" 12.5 "), Some(12.5));
/// assert_eq!(parse_number(""), None);
/// assert_eq!(parse_number("n/a"), None);
/// ```
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a timestamp using the first matching layout in [`TIMESTAMP_FORMATS`].
pub fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let text = cell.trim();
    if text.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.flexible(true).trim(csv::Trim::Headers);
    builder
}

/// Position of `name` in the header row, if present.
fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
}

/// Reads the history log from a file in chronological (file) order.
///
/// # Errors
///
/// Returns a `csv::Error` if the file cannot be opened or is not valid CSV.
pub fn read_history(path: &Path) -> Result<Vec<HistoricalRecord>, csv::Error> {
    let file = File::open(path)?;
    read_history_from(file)
}

/// Reads history records from any reader.
///
/// Columns other than the five history columns are ignored; a missing
/// column reads as absent for every row.
///
/// # Errors
///
/// Returns a `csv::Error` on I/O failure or malformed CSV.
pub fn read_history_from(reader: impl Read) -> Result<Vec<HistoricalRecord>, csv::Error> {
    let mut rdr = reader_builder().from_reader(reader);
    let headers = rdr.headers()?.clone();
    let load = column_index(&headers, LOAD_COLUMN);
    let wind = column_index(&headers, WIND_COLUMN);
    let pv = column_index(&headers, PV_COLUMN);
    let es = column_index(&headers, ES_POWER_COLUMN);
    let soc = column_index(&headers, ES_SOC_COLUMN);

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        // A whitespace-only line; rows of empty cells are kept as all-absent records.
        if row.len() <= 1 && row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        records.push(HistoricalRecord {
            load_mw: cell(&row, load).and_then(parse_number),
            wind_mw: cell(&row, wind).and_then(parse_number),
            pv_mw: cell(&row, pv).and_then(parse_number),
            es_mw: cell(&row, es).and_then(parse_number),
            es_soc: cell(&row, soc).and_then(parse_number),
        });
    }
    Ok(records)
}

/// Reads a forecast file with a `Datetime` column and one value column.
///
/// # Errors
///
/// Returns a `csv::Error` if the file cannot be opened or is not valid CSV.
pub fn read_series(path: &Path, value_column: &str) -> Result<Vec<SeriesPoint>, csv::Error> {
    let file = File::open(path)?;
    read_series_from(file, value_column)
}

/// Reads raw forecast points from any reader, one per non-blank data row.
///
/// # Errors
///
/// Returns a `csv::Error` on I/O failure or malformed CSV.
pub fn read_series_from(
    reader: impl Read,
    value_column: &str,
) -> Result<Vec<SeriesPoint>, csv::Error> {
    let mut rdr = reader_builder().from_reader(reader);
    let headers = rdr.headers()?.clone();
    let ts_idx = column_index(&headers, DATETIME_COLUMN);
    let value_idx = column_index(&headers, value_column);

    let mut points = Vec::new();
    for row in rdr.records() {
        let row = row?;
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        points.push(SeriesPoint {
            timestamp: cell(&row, ts_idx).and_then(parse_timestamp),
            value: cell(&row, value_idx).and_then(parse_number),
        });
    }
    Ok(points)
}
