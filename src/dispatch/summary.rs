//! Post-hoc summary of a dispatch plan.

use std::fmt;

use serde::Serialize;

use super::types::{Action, DecisionRow};

/// Aggregate indicators derived from a complete plan.
///
/// Energies assume one-hour steps, so MW per step equals MWh.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanSummary {
    /// Number of planned steps.
    pub steps: usize,
    /// Total energy discharged (MWh).
    pub discharged_mwh: f64,
    /// Total energy charged (MWh, positive).
    pub charged_mwh: f64,
    /// Largest discharge decision (MW).
    pub peak_discharge_mw: f64,
    /// Largest charge decision (MW, positive magnitude).
    pub peak_charge_mw: f64,
    /// State of charge after the last step.
    pub final_soc: Option<f64>,
    /// Steps classified as discharge.
    pub discharge_steps: usize,
    /// Steps classified as charge.
    pub charge_steps: usize,
    /// Steps classified as idle.
    pub idle_steps: usize,
}

impl PlanSummary {
    /// Computes the summary from planned rows.
    pub fn from_rows(rows: &[DecisionRow]) -> Self {
        let mut summary = Self {
            steps: rows.len(),
            final_soc: rows.last().map(|r| r.es_soc),
            ..Self::default()
        };

        for r in rows {
            if r.es_mw > 0.0 {
                summary.discharged_mwh += r.es_mw;
                summary.peak_discharge_mw = summary.peak_discharge_mw.max(r.es_mw);
            } else {
                summary.charged_mwh -= r.es_mw;
                summary.peak_charge_mw = summary.peak_charge_mw.max(-r.es_mw);
            }
            match r.action {
                Action::Discharge => summary.discharge_steps += 1,
                Action::Charge => summary.charge_steps += 1,
                Action::Idle => summary.idle_steps += 1,
            }
        }
        summary
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Plan Summary ({} steps) ---", self.steps)?;
        writeln!(
            f,
            "Discharged:   {:.3} MWh (peak {:.3} MW, {} steps)",
            self.discharged_mwh, self.peak_discharge_mw, self.discharge_steps
        )?;
        writeln!(
            f,
            "Charged:      {:.3} MWh (peak {:.3} MW, {} steps)",
            self.charged_mwh, self.peak_charge_mw, self.charge_steps
        )?;
        writeln!(f, "Idle steps:   {}", self.idle_steps)?;
        match self.final_soc {
            Some(soc) => write!(f, "Final SOC:    {soc:.3}"),
            None => write!(f, "Final SOC:    n/a"),
        }
    }
}
