//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use es_dispatch::config::DecisionConfig;
use tempfile::TempDir;

/// Two-record history: SOC 50 -> 55, ES power 3 / -2, net target 8.5.
pub const HISTORY: &str = "\
Datetime,Load_MW,Wind_MW,PV_MW,ES_MW_Optimized,ES_SOC_Optimized
2024-05-31 22:00,10,2,1,3,50
2024-05-31 23:00,12,1,1,-2,55
";

/// Writes `content` at `rel` under `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir {}: {e}", parent.display()));
    }
    fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
}

/// Renders a single-series forecast CSV with hourly timestamps starting 2024-06-01 00:00.
pub fn series_csv(column: &str, values: &[f64]) -> String {
    let mut out = format!("Datetime,{column}\n");
    for (h, v) in values.iter().enumerate() {
        out.push_str(&format!("2024-06-01 {h:02}:00:00,{v}\n"));
    }
    out
}

/// A 24-step load profile with a morning dip and an evening peak.
pub fn daily_load() -> Vec<f64> {
    (0..24)
        .map(|h| match h {
            0..=5 => 6.0,
            6..=16 => 9.0,
            17..=21 => 14.0,
            _ => 8.0,
        })
        .collect()
}

/// Data directory holding history, load, wind and pv inputs.
pub fn full_fixture() -> TempDir {
    let tmp = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let root = tmp.path();
    write_file(root, "history.csv", HISTORY);
    write_file(root, "output/Load_forecast_24h.csv", &series_csv("Load_Forecast", &daily_load()));
    write_file(root, "output/Wind_forecast_24h.csv", &series_csv("Wind_Forecast", &[1.5; 24]));
    let pv: Vec<f64> = (0..24).map(|h| if (8..=16).contains(&h) { 2.0 } else { 0.0 }).collect();
    write_file(root, "output/PV_forecast_24h.csv", &series_csv("PV_Forecast", &pv));
    tmp
}

/// Configuration pointing at `root` with the fixture's history file.
pub fn config_for(root: &Path, horizons: Vec<i64>) -> DecisionConfig {
    DecisionConfig {
        data_dir: root.to_path_buf(),
        horizons,
        history_file: "history.csv".to_string(),
        ..DecisionConfig::default()
    }
}
