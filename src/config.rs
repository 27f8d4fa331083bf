//! TOML-based batch configuration with documented defaults.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DispatchError;
use crate::forecast::ForecastFiles;
use crate::io::sandbox::confine_relative;

/// Planning horizons used when none are configured.
pub const DEFAULT_HORIZONS: [i64; 4] = [1, 6, 12, 24];

/// Inputs and outputs of one decision batch.
///
/// All fields have defaults. File names are relative to `data_dir`. Load
/// from TOML with [`DecisionConfig::from_toml_file`] or start from
/// [`DecisionConfig::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecisionConfig {
    /// Sandbox root holding inputs and receiving outputs.
    pub data_dir: PathBuf,
    /// Planning horizons in steps. Non-positive entries are skipped with a warning.
    pub horizons: Vec<i64>,
    /// Historical operating log.
    pub history_file: String,
    /// Load forecast (required at run time).
    pub load_forecast: String,
    /// Wind forecast (optional at run time).
    pub wind_forecast: String,
    /// Solar forecast (optional at run time).
    pub pv_forecast: String,
    /// Output name prefix; files are named `<prefix>_<H>h_agent.csv`.
    pub output_prefix: String,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            horizons: DEFAULT_HORIZONS.to_vec(),
            history_file: "VPP一年优化数据.csv".to_string(),
            load_forecast: "output/Load_forecast_24h.csv".to_string(),
            wind_forecast: "output/Wind_forecast_24h.csv".to_string(),
            pv_forecast: "output/PV_forecast_24h.csv".to_string(),
            output_prefix: "output/ES_decision".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Field name (e.g., `"horizons"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl DecisionConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Input names with their field names, in reading order.
    fn input_names(&self) -> [(&'static str, &str); 4] {
        [
            ("history_file", &self.history_file),
            ("load_forecast", &self.load_forecast),
            ("wind_forecast", &self.wind_forecast),
            ("pv_forecast", &self.pv_forecast),
        ]
    }

    /// Checks that every input name is a relative path below `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InputOutsideRoot`] for the first absolute,
    /// empty, or `..`-bearing input name.
    pub fn confine_inputs(&self) -> Result<(), DispatchError> {
        for (field, name) in self.input_names() {
            confine_relative(name).map_err(|reason| DispatchError::InputOutsideRoot {
                field,
                path: name.to_string(),
                reason,
            })?;
        }
        Ok(())
    }

    /// Location of the history file under `data_dir`.
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    /// Locations of the three forecast files.
    pub fn forecast_files(&self) -> ForecastFiles {
        ForecastFiles {
            load: self.data_dir.join(&self.load_forecast),
            wind: self.data_dir.join(&self.wind_forecast),
            pv: self.data_dir.join(&self.pv_forecast),
        }
    }

    /// Output name for one horizon, relative to `data_dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use es_dispatch::config::DecisionConfig;
    ///
    /// let cfg = DecisionConfig::default();
    /// assert_eq!(cfg.output_name(24), "output/ES_decision_24h_agent.csv");
    /// ```
    pub fn output_name(&self, horizon: usize) -> String {
        format!("{}_{horizon}h_agent.csv", self.output_prefix)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.horizons.is_empty() {
            errors.push(ConfigError {
                field: "horizons".into(),
                message: "must not be empty".into(),
            });
        }
        for h in self.horizons.iter().filter(|h| **h <= 0) {
            errors.push(ConfigError {
                field: "horizons".into(),
                message: format!("must be > 0, got {h}"),
            });
        }

        if self.output_prefix.trim().is_empty() {
            errors.push(ConfigError {
                field: "output_prefix".into(),
                message: "must not be empty".into(),
            });
        }
        for (field, name) in self.input_names() {
            if name.trim().is_empty() {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must not be empty".into(),
                });
            } else if let Err(reason) = confine_relative(name) {
                errors.push(ConfigError {
                    field: field.into(),
                    message: format!("must be a relative path inside data_dir: {reason}"),
                });
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        let errors = DecisionConfig::default().validate();
        assert!(errors.is_empty(), "defaults should be valid: {errors:?}");
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
data_dir = "/srv/vpp/data"
horizons = [4, 8]
history_file = "history.csv"
load_forecast = "fc/load.csv"
wind_forecast = "fc/wind.csv"
pv_forecast = "fc/pv.csv"
output_prefix = "plans/es"
"#;
        let cfg = DecisionConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.horizons.clone()), Some(vec![4, 8]));
        assert_eq!(
            cfg.as_ref().map(|c| c.output_name(8)).as_deref(),
            Some("plans/es_8h_agent.csv")
        );
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = DecisionConfig::from_toml_str("horizons = [48]\n");
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.horizons.clone()), Some(vec![48]));
        assert_eq!(
            cfg.as_ref().map(|c| c.load_forecast.as_str()),
            Some("output/Load_forecast_24h.csv")
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let result = DecisionConfig::from_toml_str("bogus_field = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_empty_horizons() {
        let cfg = DecisionConfig {
            horizons: Vec::new(),
            ..DecisionConfig::default()
        };
        assert!(cfg.validate().iter().any(|e| e.field == "horizons"));
    }

    #[test]
    fn validation_catches_non_positive_horizon() {
        let cfg = DecisionConfig {
            horizons: vec![6, 0, -2],
            ..DecisionConfig::default()
        };
        let errors = cfg.validate();
        assert_eq!(errors.iter().filter(|e| e.field == "horizons").count(), 2);
    }

    #[test]
    fn validation_catches_blank_file_name() {
        let cfg = DecisionConfig {
            wind_forecast: "  ".to_string(),
            ..DecisionConfig::default()
        };
        assert!(cfg.validate().iter().any(|e| e.field == "wind_forecast"));
    }

    #[test]
    fn validation_catches_escaping_input() {
        let cfg = DecisionConfig {
            pv_forecast: "../../pv.csv".to_string(),
            ..DecisionConfig::default()
        };
        assert!(cfg.validate().iter().any(|e| e.field == "pv_forecast"));
    }

    #[test]
    fn absolute_or_traversing_inputs_are_not_confined() {
        for history_file in ["/etc/x.csv", "../x.csv", r"C:\x.csv", "output/../../x.csv"] {
            let cfg = DecisionConfig {
                history_file: history_file.to_string(),
                ..DecisionConfig::default()
            };
            let err = cfg.confine_inputs();
            assert!(
                matches!(
                    err,
                    Err(DispatchError::InputOutsideRoot { field: "history_file", .. })
                ),
                "{history_file} should be rejected"
            );
        }
        assert!(DecisionConfig::default().confine_inputs().is_ok());
    }

    #[test]
    fn paths_are_joined_to_data_dir() {
        let cfg = DecisionConfig {
            data_dir: PathBuf::from("/srv/data"),
            ..DecisionConfig::default()
        };
        assert_eq!(
            cfg.forecast_files().wind,
            PathBuf::from("/srv/data/output/Wind_forecast_24h.csv")
        );
        assert_eq!(
            cfg.history_path(),
            PathBuf::from("/srv/data/VPP一年优化数据.csv")
        );
    }
}
