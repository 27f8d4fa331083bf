//! CSV rendering for dispatch plans.

use std::io::{self, Write};

use crate::dispatch::types::DecisionRow;

/// Column header for decision output.
pub const HEADER: &str = "Datetime,Load_Forecast,Wind_Forecast,PV_Forecast,Net_Load,\
                          ES_MW_Decision,ES_SOC_Decision,Action";

/// Canonical timestamp layout for output rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a value as fixed-point with up to four decimals.
///
/// Trailing zeros and a trailing decimal point are removed; `None` renders
/// as an empty field.
///
/// # Examples
///
/// ```
/// use es_dispatch::io::export::format_value;
///
/// assert_eq!(format_value(Some(12.3456)), "12.3456");
/// assert_eq!(format_value(Some(4.0)), "4");
/// assert_eq!(format_value(Some(-0.25)), "-0.25");
/// assert_eq!(format_value(None), "");
/// ```
pub fn format_value(value: Option<f64>) -> String {
    let Some(v) = value else {
        return String::new();
    };
    let fixed = format!("{v:.4}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    // Tiny negatives round to "-0".
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes decision rows as CSV to any writer.
///
/// Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `rows` - Planned steps in order
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_decision_csv(rows: &[DecisionRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in rows {
        wtr.write_record(&[
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format_value(Some(r.load)),
            format_value(Some(r.wind)),
            format_value(Some(r.pv)),
            format_value(Some(r.net_load)),
            format_value(Some(r.es_mw)),
            format_value(Some(r.es_soc)),
            r.action.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Renders decision rows to an in-memory CSV string.
///
/// # Errors
///
/// Returns an `io::Error` if rendering fails.
pub fn render_decision_csv(rows: &[DecisionRow]) -> io::Result<String> {
    let mut buf = Vec::new();
    write_decision_csv(rows, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
