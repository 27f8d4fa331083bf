//! Fatal batch errors, sandbox write rejections, and non-fatal warnings.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Forecast series identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Load,
    Wind,
    Pv,
}

impl Series {
    /// Value column carrying this series in its forecast file.
    pub fn column(self) -> &'static str {
        match self {
            Self::Load => "Load_Forecast",
            Self::Wind => "Wind_Forecast",
            Self::Pv => "PV_Forecast",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Wind => "wind",
            Self::Pv => "pv",
        })
    }
}

/// Conditions that stop a decision batch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("horizons must not be empty")]
    EmptyHorizons,

    #[error("{field} must stay inside the data directory ({path}): {reason}")]
    InputOutsideRoot {
        field: &'static str,
        path: String,
        #[source]
        reason: WriteRejection,
    },

    #[error("history file does not exist: {0}")]
    HistoryMissing(String),

    #[error("failed to read history file {path}: {source}")]
    HistoryUnreadable {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("history file contains no records")]
    HistoryEmpty,

    #[error("forecast data is empty or could not be parsed")]
    ForecastEmpty,

    #[error("no decision output was generated")]
    NothingGenerated,

    #[error("no decision output could be written")]
    NothingWritten,
}

/// Reasons the sandbox writer refuses a file.
#[derive(Debug, Error)]
pub enum WriteRejection {
    #[error("filename and content are required")]
    Empty,

    #[error("absolute paths are not allowed")]
    Absolute,

    #[error("parent directory segments are not allowed")]
    Traversal,

    #[error("invalid path")]
    InvalidPath,

    #[error("only .csv files are allowed")]
    NotCsv,

    #[error("filename must end with _agent.csv")]
    NotAgentCsv,

    #[error("sandbox root does not exist: {}", .0.display())]
    RootMissing(PathBuf),

    #[error("target resolves outside the sandbox root")]
    OutsideRoot,

    #[error("write failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Non-fatal diagnostics accumulated while a batch degrades gracefully.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// History has no usable state-of-charge values.
    SocMissing,
    /// History has no usable storage power values.
    EsPowerMissing,
    /// History has no record with load, wind and pv all present.
    NetLoadMissing,
    /// A forecast file does not exist; its values default to zero.
    ForecastFileMissing { series: Series, path: String },
    /// A forecast file exists but could not be read; its values default to zero.
    ForecastUnreadable {
        series: Series,
        path: String,
        reason: String,
    },
    /// The load forecast file has no data rows.
    LoadForecastEmpty,
    /// No load forecast row had both a valid timestamp and value.
    LoadForecastUnparsable,
    /// Repeated timestamps in a forecast series; the first occurrence is kept.
    DuplicateTimestamps { series: Series, count: usize },
    /// A requested horizon is not a positive step count.
    InvalidHorizon(i64),
    /// A plan could not be rendered to CSV.
    RenderFailed { horizon: usize, reason: String },
    /// The sandbox writer refused or failed to persist an output.
    WriteFailed { name: String, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SocMissing => f.write_str(
                "history is missing ES_SOC_Optimized; SOC statistics fall back to 0",
            ),
            Self::EsPowerMissing => f.write_str(
                "history is missing ES_MW_Optimized; power limits fall back to 0",
            ),
            Self::NetLoadMissing => f.write_str(
                "history has no complete Load_MW/Wind_MW/PV_MW rows; net load target falls back to 0",
            ),
            Self::ForecastFileMissing { series, path } => {
                write!(f, "{series} forecast file does not exist ({path}); using 0")
            }
            Self::ForecastUnreadable {
                series,
                path,
                reason,
            } => write!(
                f,
                "{series} forecast file could not be read ({path}): {reason}; using 0"
            ),
            Self::LoadForecastEmpty => {
                f.write_str("load forecast file is empty or could not be parsed")
            }
            Self::LoadForecastUnparsable => {
                f.write_str("load forecast data could not be parsed into a time series")
            }
            Self::DuplicateTimestamps { series, count } => write!(
                f,
                "{series} forecast has {count} duplicate timestamp(s); keeping the first of each"
            ),
            Self::InvalidHorizon(h) => write!(f, "ignoring invalid horizon {h}h"),
            Self::RenderFailed { horizon, reason } => {
                write!(f, "failed to render {horizon}h decision: {reason}")
            }
            Self::WriteFailed { name, reason } => write!(f, "{name} write failed: {reason}"),
        }
    }
}
