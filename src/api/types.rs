//! API request and response bodies.

use serde::{Deserialize, Serialize};

use crate::config::DecisionConfig;
use crate::dispatch::{DecisionOutput, DecisionStats, PlanSummary};

/// Optional overrides applied on top of the server's base configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecisionRequest {
    pub horizons: Option<Vec<i64>>,
    pub history_file: Option<String>,
    pub load_forecast: Option<String>,
    pub wind_forecast: Option<String>,
    pub pv_forecast: Option<String>,
    pub output_prefix: Option<String>,
}

impl DecisionRequest {
    /// Returns a copy of `base` with every present override applied.
    pub fn apply_to(self, base: &DecisionConfig) -> DecisionConfig {
        let mut cfg = base.clone();
        if let Some(h) = self.horizons {
            cfg.horizons = h;
        }
        if let Some(v) = self.history_file {
            cfg.history_file = v;
        }
        if let Some(v) = self.load_forecast {
            cfg.load_forecast = v;
        }
        if let Some(v) = self.wind_forecast {
            cfg.wind_forecast = v;
        }
        if let Some(v) = self.pv_forecast {
            cfg.pv_forecast = v;
        }
        if let Some(v) = self.output_prefix {
            cfg.output_prefix = v;
        }
        cfg
    }
}

/// One persisted plan.
#[derive(Debug, Serialize)]
pub struct FileEntry {
    /// Normalized path relative to the data directory.
    pub name: String,
    pub horizon: usize,
    pub summary: PlanSummary,
}

/// Successful batch result.
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub ok: bool,
    pub files: Vec<FileEntry>,
    pub warnings: Vec<String>,
    pub stats: Option<DecisionStats>,
}

impl From<DecisionOutput> for DecisionResponse {
    fn from(out: DecisionOutput) -> Self {
        let warnings = out.warning_messages();
        Self {
            ok: out.is_ok(),
            files: out
                .outputs
                .into_iter()
                .map(|o| FileEntry {
                    name: o.name,
                    horizon: o.horizon,
                    summary: o.summary,
                })
                .collect(),
            warnings,
            stats: out.stats,
        }
    }
}

/// Error response body for failed batches and malformed requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    /// Human-readable error message.
    pub error: String,
    pub warnings: Vec<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_request_keeps_base_config() {
        let base = DecisionConfig::default();
        let cfg = DecisionRequest::default().apply_to(&base);
        assert_eq!(cfg, base);
    }

    #[test]
    fn overrides_replace_only_present_fields() {
        let base = DecisionConfig::default();
        let req: DecisionRequest =
            serde_json::from_str(r#"{"horizons":[3],"output_prefix":"plans/x"}"#)
                .unwrap_or_default();
        let cfg = req.apply_to(&base);
        assert_eq!(cfg.horizons, vec![3]);
        assert_eq!(cfg.output_prefix, "plans/x");
        assert_eq!(cfg.load_forecast, base.load_forecast);
    }

    #[test]
    fn unknown_override_is_rejected() {
        let req: Result<DecisionRequest, _> = serde_json::from_str(r#"{"data_dir":"/"}"#);
        assert!(req.is_err());
    }
}
