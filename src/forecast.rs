//! Merging of independently produced load, wind and solar forecasts.
//!
//! The load forecast drives the output: every load row with a valid
//! timestamp and value yields one [`ForecastRow`]. Wind and solar values are
//! looked up by exact timestamp and default to zero when absent.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::dispatch::types::{ForecastRow, Staged};
use crate::error::{Series, Warning};
use crate::io::reader::{SeriesPoint, read_series};

/// Locations of the three forecast files.
#[derive(Debug, Clone)]
pub struct ForecastFiles {
    pub load: PathBuf,
    pub wind: PathBuf,
    pub pv: PathBuf,
}

/// Joins forecast series into one time-ordered sequence.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForecastMerger;

impl ForecastMerger {
    /// Reads the three forecast files and merges them.
    ///
    /// A missing or unreadable wind/pv file degrades to zeros with a single
    /// warning. A missing or unreadable load file yields an empty sequence,
    /// which callers treat as fatal.
    pub fn load_and_merge(&self, files: &ForecastFiles) -> Staged<Vec<ForecastRow>> {
        let mut warnings = Vec::new();

        let Some(load) = read_optional(Series::Load, &files.load, &mut warnings) else {
            return Staged::new(Vec::new(), warnings);
        };
        let wind = read_optional(Series::Wind, &files.wind, &mut warnings);
        let pv = read_optional(Series::Pv, &files.pv, &mut warnings);

        let merged = self.merge(&load, wind.as_deref(), pv.as_deref());
        warnings.extend(merged.warnings);
        Staged::new(merged.value, warnings)
    }

    /// Merges already-read series.
    ///
    /// # Arguments
    ///
    /// * `load` - Raw load forecast rows (required)
    /// * `wind` - Raw wind forecast rows, `None` when the source is unavailable
    /// * `pv` - Raw solar forecast rows, `None` when the source is unavailable
    ///
    /// # Returns
    ///
    /// Rows sorted ascending by timestamp with one row per distinct load
    /// timestamp. An empty result carries a warning explaining why.
    pub fn merge(
        &self,
        load: &[SeriesPoint],
        wind: Option<&[SeriesPoint]>,
        pv: Option<&[SeriesPoint]>,
    ) -> Staged<Vec<ForecastRow>> {
        let mut warnings = Vec::new();
        if load.is_empty() {
            warnings.push(Warning::LoadForecastEmpty);
            return Staged::new(Vec::new(), warnings);
        }

        let wind_map = lookup_table(wind.unwrap_or_default());
        let pv_map = lookup_table(pv.unwrap_or_default());

        let mut rows: Vec<ForecastRow> = load
            .iter()
            .filter_map(|p| Some((p.timestamp?, p.value?)))
            .map(|(timestamp, value)| ForecastRow {
                timestamp,
                load: value,
                wind: wind_map.get(&timestamp).copied().unwrap_or(0.0),
                pv: pv_map.get(&timestamp).copied().unwrap_or(0.0),
            })
            .collect();

        if rows.is_empty() {
            warnings.push(Warning::LoadForecastUnparsable);
            return Staged::new(rows, warnings);
        }

        rows.sort_by_key(|r| r.timestamp);
        let before = rows.len();
        rows.dedup_by_key(|r| r.timestamp);
        let duplicates = before - rows.len();
        if duplicates > 0 {
            warnings.push(Warning::DuplicateTimestamps {
                series: Series::Load,
                count: duplicates,
            });
        }

        debug!(
            rows = rows.len(),
            dropped = load.len() - before,
            "forecast series merged"
        );
        Staged::new(rows, warnings)
    }
}

/// Timestamp lookup for an auxiliary series; later rows overwrite earlier ones.
fn lookup_table(points: &[SeriesPoint]) -> HashMap<NaiveDateTime, f64> {
    points
        .iter()
        .filter_map(|p| Some((p.timestamp?, p.value?)))
        .collect()
}

/// Reads one forecast file, turning absence or read errors into a warning.
fn read_optional(
    series: Series,
    path: &Path,
    warnings: &mut Vec<Warning>,
) -> Option<Vec<SeriesPoint>> {
    let display = path.display().to_string();
    match read_series(path, series.column()) {
        Ok(points) => Some(points),
        Err(e) => {
            let missing = matches!(e.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound);
            let warning = if missing {
                Warning::ForecastFileMissing {
                    series,
                    path: display,
                }
            } else {
                Warning::ForecastUnreadable {
                    series,
                    path: display,
                    reason: e.to_string(),
                }
            };
            warn!(%warning, "forecast input degraded");
            warnings.push(warning);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap_or_default()
    }

    fn point(h: u32, v: f64) -> SeriesPoint {
        SeriesPoint {
            timestamp: Some(hour(h)),
            value: Some(v),
        }
    }

    #[test]
    fn joins_by_exact_timestamp() {
        let load = [point(0, 10.0), point(1, 11.0)];
        let wind = [point(1, 3.0)];
        let pv = [point(0, 1.0), point(5, 9.0)];
        let out = ForecastMerger.merge(&load, Some(&wind), Some(&pv));
        assert!(out.warnings.is_empty());
        assert_eq!(out.value.len(), 2);
        assert_eq!(out.value[0].wind, 0.0);
        assert_eq!(out.value[0].pv, 1.0);
        assert_eq!(out.value[1].wind, 3.0);
        assert_eq!(out.value[1].pv, 0.0);
    }

    #[test]
    fn output_is_sorted_by_timestamp() {
        let load = [point(3, 1.0), point(1, 2.0), point(2, 3.0)];
        let out = ForecastMerger.merge(&load, None, None);
        let hours: Vec<_> = out.value.iter().map(|r| r.timestamp).collect();
        assert_eq!(hours, vec![hour(1), hour(2), hour(3)]);
    }

    #[test]
    fn drops_rows_without_timestamp_or_value() {
        let load = [
            point(0, 1.0),
            SeriesPoint {
                timestamp: None,
                value: Some(2.0),
            },
            SeriesPoint {
                timestamp: Some(hour(2)),
                value: None,
            },
        ];
        let out = ForecastMerger.merge(&load, None, None);
        assert_eq!(out.value.len(), 1);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn empty_load_is_reported() {
        let out = ForecastMerger.merge(&[], None, None);
        assert!(out.value.is_empty());
        assert_eq!(out.warnings, vec![Warning::LoadForecastEmpty]);
    }

    #[test]
    fn all_rows_dropped_is_reported() {
        let load = [SeriesPoint {
            timestamp: None,
            value: Some(1.0),
        }];
        let out = ForecastMerger.merge(&load, None, None);
        assert!(out.value.is_empty());
        assert_eq!(out.warnings, vec![Warning::LoadForecastUnparsable]);
    }

    #[test]
    fn duplicate_load_timestamps_keep_first() {
        let load = [point(0, 1.0), point(0, 2.0), point(1, 3.0)];
        let out = ForecastMerger.merge(&load, None, None);
        assert_eq!(out.value.len(), 2);
        assert_eq!(out.value[0].load, 1.0);
        assert_eq!(
            out.warnings,
            vec![Warning::DuplicateTimestamps {
                series: Series::Load,
                count: 1
            }]
        );
    }

    #[test]
    fn missing_files_degrade_with_warnings() {
        let files = ForecastFiles {
            load: PathBuf::from("/nonexistent/load.csv"),
            wind: PathBuf::from("/nonexistent/wind.csv"),
            pv: PathBuf::from("/nonexistent/pv.csv"),
        };
        let out = ForecastMerger.load_and_merge(&files);
        assert!(out.value.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert!(matches!(
            out.warnings[0],
            Warning::ForecastFileMissing {
                series: Series::Load,
                ..
            }
        ));
    }
}
