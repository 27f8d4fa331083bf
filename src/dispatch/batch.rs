//! Batch orchestration: history stats + merged forecast -> one plan per horizon.
//!
//! Stages never panic or bubble errors past this module. Each returns its
//! value together with warnings, and the batch folds those into a single
//! [`DecisionOutput`].

use std::num::NonZeroUsize;

use tracing::{info, warn};

use super::planner::DispatchPlanner;
use super::stats::HistoryStatsCollector;
use super::summary::PlanSummary;
use super::types::DecisionStats;
use crate::config::DecisionConfig;
use crate::error::{DispatchError, Warning};
use crate::forecast::ForecastMerger;
use crate::io::export::render_decision_csv;
use crate::io::reader::read_history;
use crate::io::sandbox::SandboxWriter;

/// One rendered plan.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCsv {
    /// Output name relative to the data directory.
    pub name: String,
    /// Requested horizon in steps.
    pub horizon: usize,
    /// Rendered CSV text.
    pub content: String,
    /// Aggregate indicators of the plan.
    pub summary: PlanSummary,
}

/// Aggregate result of a decision batch.
#[derive(Debug)]
pub struct DecisionOutput {
    /// Fatal condition that stopped the batch, if any.
    pub failure: Option<DispatchError>,
    /// Generated plans in horizon order.
    pub outputs: Vec<GeneratedCsv>,
    /// Non-fatal diagnostics in the order they were raised.
    pub warnings: Vec<Warning>,
    /// Envelope computed from history, once available.
    pub stats: Option<DecisionStats>,
}

impl DecisionOutput {
    fn failed(error: DispatchError, warnings: Vec<Warning>, stats: Option<DecisionStats>) -> Self {
        warn!(%error, "decision batch failed");
        Self {
            failure: Some(error),
            outputs: Vec::new(),
            warnings,
            stats,
        }
    }

    /// Whether the batch produced (and, for writes, persisted) at least one plan.
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }

    /// `"ok"` or the rendered failure.
    pub fn message(&self) -> String {
        self.failure
            .as_ref()
            .map_or_else(|| "ok".to_string(), ToString::to_string)
    }

    /// Names of generated outputs, in horizon order.
    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|o| o.name.as_str()).collect()
    }

    /// Rendered warnings, in order.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Plans every configured horizon and renders CSV text in memory.
///
/// Nothing is written to disk. Outputs are keyed by
/// [`DecisionConfig::output_name`].
pub fn build_decision_csvs(config: &DecisionConfig) -> DecisionOutput {
    if config.horizons.is_empty() {
        return DecisionOutput::failed(DispatchError::EmptyHorizons, Vec::new(), None);
    }
    if let Err(e) = config.confine_inputs() {
        return DecisionOutput::failed(e, Vec::new(), None);
    }

    let history_path = config.history_path();
    if !history_path.exists() {
        return DecisionOutput::failed(
            DispatchError::HistoryMissing(config.history_file.clone()),
            Vec::new(),
            None,
        );
    }
    let history = match read_history(&history_path) {
        Ok(records) => records,
        Err(source) => {
            return DecisionOutput::failed(
                DispatchError::HistoryUnreadable {
                    path: config.history_file.clone(),
                    source,
                },
                Vec::new(),
                None,
            );
        }
    };
    if history.is_empty() {
        return DecisionOutput::failed(DispatchError::HistoryEmpty, Vec::new(), None);
    }

    let mut warnings = Vec::new();
    let stats = HistoryStatsCollector
        .collect(&history)
        .drain_into(&mut warnings);
    info!(
        records = history.len(),
        soc_min = stats.soc_min,
        soc_max = stats.soc_max,
        discharge_max = stats.discharge_max,
        charge_max = stats.charge_max,
        net_target = stats.net_target,
        "history envelope computed"
    );

    let forecast = ForecastMerger
        .load_and_merge(&config.forecast_files())
        .drain_into(&mut warnings);
    if forecast.is_empty() {
        return DecisionOutput::failed(DispatchError::ForecastEmpty, warnings, Some(stats));
    }
    info!(steps = forecast.len(), "forecast merged");

    let planner = DispatchPlanner::new(stats);
    let mut outputs: Vec<GeneratedCsv> = Vec::with_capacity(config.horizons.len());
    for &requested in &config.horizons {
        let Some(horizon) = usize::try_from(requested).ok().and_then(NonZeroUsize::new) else {
            warn!(horizon = requested, "skipping invalid horizon");
            warnings.push(Warning::InvalidHorizon(requested));
            continue;
        };
        let name = config.output_name(horizon.get());
        if outputs.iter().any(|o| o.name == name) {
            continue;
        }

        let rows = planner.plan(&forecast, horizon);
        match render_decision_csv(&rows) {
            Ok(content) => {
                let summary = PlanSummary::from_rows(&rows);
                info!(horizon = horizon.get(), steps = rows.len(), file = %name, "plan built");
                outputs.push(GeneratedCsv {
                    name,
                    horizon: horizon.get(),
                    content,
                    summary,
                });
            }
            Err(e) => warnings.push(Warning::RenderFailed {
                horizon: horizon.get(),
                reason: e.to_string(),
            }),
        }
    }

    if outputs.is_empty() {
        return DecisionOutput::failed(DispatchError::NothingGenerated, warnings, Some(stats));
    }

    DecisionOutput {
        failure: None,
        outputs,
        warnings,
        stats: Some(stats),
    }
}

/// Builds every plan and persists it through the sandbox rooted at `data_dir`.
///
/// Rejected writes become warnings. Persisted outputs are re-keyed by the
/// writer's normalized relative path. The batch succeeds when at least one
/// file was written.
pub fn write_decision_csvs(config: &DecisionConfig) -> DecisionOutput {
    let built = build_decision_csvs(config);
    if !built.is_ok() {
        return built;
    }

    let writer = SandboxWriter::new(&config.data_dir);
    let mut warnings = built.warnings;
    let mut saved = Vec::with_capacity(built.outputs.len());
    for mut output in built.outputs {
        match writer.write(&output.name, &output.content) {
            Ok(written) => {
                output.name = written.filename;
                saved.push(output);
            }
            Err(rejection) => {
                warn!(file = %output.name, %rejection, "decision output rejected");
                warnings.push(Warning::WriteFailed {
                    name: output.name,
                    reason: rejection.to_string(),
                });
            }
        }
    }

    if saved.is_empty() {
        return DecisionOutput::failed(DispatchError::NothingWritten, warnings, built.stats);
    }

    info!(files = saved.len(), "decision batch written");
    DecisionOutput {
        failure: None,
        outputs: saved,
        warnings,
        stats: built.stats,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    const HISTORY: &str = "\
Datetime,Load_MW,Wind_MW,PV_MW,ES_MW_Optimized,ES_SOC_Optimized
2024-06-01 00:00,10,2,1,3,50
2024-06-01 01:00,12,1,1,-2,55
";

    fn write_file(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir: {e}"));
        }
        fs::write(path, content).unwrap_or_else(|e| panic!("write {rel}: {e}"));
    }

    fn load_forecast(hours: u32) -> String {
        let mut out = String::from("Datetime,Load_Forecast\n");
        for h in 0..hours {
            out.push_str(&format!("2024-06-02 {h:02}:00:00,{}\n", 9 + h % 3));
        }
        out
    }

    fn config_in(root: &Path, horizons: Vec<i64>) -> DecisionConfig {
        DecisionConfig {
            data_dir: root.to_path_buf(),
            horizons,
            history_file: "history.csv".to_string(),
            ..DecisionConfig::default()
        }
    }

    fn fixture(hours: u32) -> TempDir {
        let tmp = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        write_file(tmp.path(), "history.csv", HISTORY);
        write_file(tmp.path(), "output/Load_forecast_24h.csv", &load_forecast(hours));
        tmp
    }

    #[test]
    fn empty_horizons_are_fatal() {
        let tmp = fixture(24);
        let out = build_decision_csvs(&config_in(tmp.path(), Vec::new()));
        assert!(matches!(out.failure, Some(DispatchError::EmptyHorizons)));
    }

    #[test]
    fn missing_history_is_fatal() {
        let tmp = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let out = build_decision_csvs(&config_in(tmp.path(), vec![6]));
        assert!(matches!(out.failure, Some(DispatchError::HistoryMissing(_))));
        assert!(out.message().contains("history.csv"));
    }

    #[test]
    fn history_outside_data_dir_is_never_read() {
        let tmp = fixture(24);
        let elsewhere = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        write_file(elsewhere.path(), "history.csv", HISTORY);
        let outside = elsewhere.path().join("history.csv");

        for history_file in [outside.to_string_lossy().into_owned(), "../history.csv".to_string()] {
            let cfg = DecisionConfig {
                history_file,
                ..config_in(tmp.path(), vec![6])
            };
            let out = build_decision_csvs(&cfg);
            assert!(matches!(
                out.failure,
                Some(DispatchError::InputOutsideRoot { field: "history_file", .. })
            ));
            assert!(out.stats.is_none());
        }
    }

    #[test]
    fn header_only_history_is_fatal() {
        let tmp = fixture(24);
        write_file(tmp.path(), "history.csv", "Load_MW,Wind_MW\n");
        let out = build_decision_csvs(&config_in(tmp.path(), vec![6]));
        assert!(matches!(out.failure, Some(DispatchError::HistoryEmpty)));
    }

    #[test]
    fn history_of_empty_cells_falls_back_with_warnings() {
        let tmp = fixture(24);
        write_file(
            tmp.path(),
            "history.csv",
            "Load_MW,Wind_MW,PV_MW,ES_MW_Optimized,ES_SOC_Optimized\n,,,,\n,,,,\n",
        );
        let out = build_decision_csvs(&config_in(tmp.path(), vec![6]));
        assert!(out.is_ok(), "{}", out.message());
        assert_eq!(out.stats, Some(DecisionStats::default()));
        assert_eq!(
            &out.warnings[..3],
            &[Warning::SocMissing, Warning::EsPowerMissing, Warning::NetLoadMissing]
        );
    }

    #[test]
    fn empty_forecast_is_fatal_with_stats_and_warnings() {
        let tmp = fixture(0);
        let out = build_decision_csvs(&config_in(tmp.path(), vec![6]));
        assert!(matches!(out.failure, Some(DispatchError::ForecastEmpty)));
        assert!(out.stats.is_some());
        assert!(out.warnings.contains(&Warning::LoadForecastEmpty));
    }

    #[test]
    fn invalid_horizon_is_skipped() {
        let tmp = fixture(24);
        let out = build_decision_csvs(&config_in(tmp.path(), vec![0, 6]));
        assert!(out.is_ok());
        assert_eq!(out.output_names(), vec!["output/ES_decision_6h_agent.csv"]);
        assert!(out.warnings.contains(&Warning::InvalidHorizon(0)));
    }

    #[test]
    fn only_invalid_horizons_generate_nothing() {
        let tmp = fixture(24);
        let out = build_decision_csvs(&config_in(tmp.path(), vec![0, -3]));
        assert!(matches!(out.failure, Some(DispatchError::NothingGenerated)));
        let skipped = out
            .warnings
            .iter()
            .filter(|w| matches!(w, Warning::InvalidHorizon(_)))
            .count();
        assert_eq!(skipped, 2);
    }

    #[test]
    fn repeated_horizon_generates_one_output() {
        let tmp = fixture(24);
        let out = build_decision_csvs(&config_in(tmp.path(), vec![6, 6]));
        assert_eq!(out.outputs.len(), 1);
    }

    #[test]
    fn build_does_not_touch_disk() {
        let tmp = fixture(24);
        let out = build_decision_csvs(&config_in(tmp.path(), vec![6]));
        assert!(out.is_ok());
        assert!(!tmp.path().join("output/ES_decision_6h_agent.csv").exists());
    }

    #[test]
    fn write_persists_outputs() {
        let tmp = fixture(24);
        let out = write_decision_csvs(&config_in(tmp.path(), vec![1, 24]));
        assert!(out.is_ok(), "{}", out.message());
        assert_eq!(out.outputs.len(), 2);
        for o in &out.outputs {
            let on_disk = fs::read_to_string(tmp.path().join(&o.name)).unwrap_or_default();
            assert_eq!(on_disk, o.content);
        }
    }

    #[test]
    fn rejected_prefix_fails_write() {
        let tmp = fixture(24);
        let cfg = DecisionConfig {
            output_prefix: "../escape/ES_decision".to_string(),
            ..config_in(tmp.path(), vec![6])
        };
        let out = write_decision_csvs(&cfg);
        assert!(matches!(out.failure, Some(DispatchError::NothingWritten)));
        assert!(
            out.warnings
                .iter()
                .any(|w| matches!(w, Warning::WriteFailed { .. }))
        );
    }
}
