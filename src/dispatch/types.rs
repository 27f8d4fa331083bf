//! Core dispatch types: history records, envelope statistics, forecast and plan rows.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::Warning;

/// Power magnitude (MW) below which a decision is reported as idle.
pub const IDLE_THRESHOLD_MW: f64 = 0.001;

/// One row of the historical operating log.
///
/// Fields are `None` when the source cell is missing or not a finite number.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoricalRecord {
    /// Measured load (MW).
    pub load_mw: Option<f64>,
    /// Measured wind output (MW).
    pub wind_mw: Option<f64>,
    /// Measured solar output (MW).
    pub pv_mw: Option<f64>,
    /// Optimized storage power (MW; positive = discharge).
    pub es_mw: Option<f64>,
    /// Optimized storage state of charge.
    pub es_soc: Option<f64>,
}

impl HistoricalRecord {
    /// Net load `load - wind - pv`, present only when all three inputs are.
    pub fn net_load_mw(&self) -> Option<f64> {
        Some(self.load_mw? - self.wind_mw? - self.pv_mw?)
    }
}

/// Operating envelope derived from history.
///
/// # Examples
///
/// ```
/// use es_dispatch::dispatch::types::DecisionStats;
///
/// let stats = DecisionStats {
///     soc_min: 40.0,
///     soc_max: 60.0,
///     soc_initial: 75.0,
///     discharge_max: 5.0,
///     charge_max: 5.0,
///     net_target: 0.0,
/// };
/// assert_eq!(stats.clamped_initial_soc(), 60.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DecisionStats {
    /// Lowest observed state of charge.
    pub soc_min: f64,
    /// Highest observed state of charge.
    pub soc_max: f64,
    /// Most recent observed state of charge.
    pub soc_initial: f64,
    /// Largest observed discharge power (MW, >= 0).
    pub discharge_max: f64,
    /// Largest observed charge power magnitude (MW, >= 0).
    pub charge_max: f64,
    /// Mean historical net load (MW).
    pub net_target: f64,
}

impl DecisionStats {
    /// Initial SOC clamped into `[soc_min, soc_max]`.
    pub fn clamped_initial_soc(&self) -> f64 {
        self.soc_initial.max(self.soc_min).min(self.soc_max)
    }
}

/// One merged forecast step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRow {
    /// Step timestamp.
    pub timestamp: NaiveDateTime,
    /// Forecast load (MW).
    pub load: f64,
    /// Forecast wind output (MW).
    pub wind: f64,
    /// Forecast solar output (MW).
    pub pv: f64,
}

impl ForecastRow {
    /// Net load `load - wind - pv` (MW).
    pub fn net_load(&self) -> f64 {
        self.load - self.wind - self.pv
    }
}

/// Storage action implied by a power decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Discharge,
    Charge,
    Idle,
}

impl Action {
    /// Classifies a power decision (positive = discharge).
    pub fn from_power(power_mw: f64) -> Self {
        if power_mw > IDLE_THRESHOLD_MW {
            Self::Discharge
        } else if power_mw < -IDLE_THRESHOLD_MW {
            Self::Charge
        } else {
            Self::Idle
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discharge => "discharge",
            Self::Charge => "charge",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned dispatch step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionRow {
    /// Step timestamp.
    pub timestamp: NaiveDateTime,
    /// Forecast load (MW).
    pub load: f64,
    /// Forecast wind output (MW).
    pub wind: f64,
    /// Forecast solar output (MW).
    pub pv: f64,
    /// Net load `load - wind - pv` (MW).
    pub net_load: f64,
    /// Storage power decision (MW; positive = discharge).
    pub es_mw: f64,
    /// State of charge after applying `es_mw`.
    pub es_soc: f64,
    /// Action classification of `es_mw`.
    pub action: Action,
}

/// A stage result paired with the non-fatal diagnostics produced while computing it.
#[derive(Debug, Clone)]
pub struct Staged<T> {
    /// The stage output.
    pub value: T,
    /// Diagnostics in the order they were raised.
    pub warnings: Vec<Warning>,
}

impl<T> Staged<T> {
    pub fn new(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }

    /// Moves this stage's warnings onto `sink` and returns the value.
    pub fn drain_into(self, sink: &mut Vec<Warning>) -> T {
        sink.extend(self.warnings);
        self.value
    }
}
