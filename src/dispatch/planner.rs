//! SOC-tracking dispatch planner.
//!
//! Sign convention: positive power is discharge (energy leaving storage), so
//! `soc_next = soc - power`.

use std::num::NonZeroUsize;

use super::types::{Action, DecisionRow, DecisionStats, ForecastRow};

/// Plans storage power step by step within the historical envelope.
///
/// Each step follows the net-load deviation from the historical baseline
/// and adds a proportional correction that spreads the gap between the
/// running SOC and the starting SOC over the remaining steps.
#[derive(Debug, Clone, Copy)]
pub struct DispatchPlanner {
    stats: DecisionStats,
}

impl DispatchPlanner {
    pub fn new(stats: DecisionStats) -> Self {
        Self { stats }
    }

    /// Plans the leading `min(horizon, forecast.len())` forecast rows.
    ///
    /// # Arguments
    ///
    /// * `forecast` - Time-ordered merged forecast
    /// * `horizon` - Requested planning window in steps
    ///
    /// # Returns
    ///
    /// One [`DecisionRow`] per planned step, SOC carried across steps.
    pub fn plan(&self, forecast: &[ForecastRow], horizon: NonZeroUsize) -> Vec<DecisionRow> {
        let steps = horizon.get().min(forecast.len());
        let target_soc = self.stats.clamped_initial_soc();
        let mut soc = target_soc;

        forecast[..steps]
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let net_load = row.net_load();
                let base_power = net_load - self.stats.net_target;
                let remaining = (steps - i).max(1) as f64;
                let soc_bias = -(target_soc - soc) / remaining;
                let power = self.clamp_power(base_power + soc_bias, soc);
                // Rounding in `soc - (soc - soc_min)` can land just outside the band.
                soc = (soc - power).max(self.stats.soc_min).min(self.stats.soc_max);

                DecisionRow {
                    timestamp: row.timestamp,
                    load: row.load,
                    wind: row.wind,
                    pv: row.pv,
                    net_load,
                    es_mw: power,
                    es_soc: soc,
                    action: Action::from_power(power),
                }
            })
            .collect()
    }

    /// Limits a desired power to the power envelope and to the SOC headroom.
    ///
    /// Discharge is capped by `discharge_max` and the energy above `soc_min`;
    /// charge is capped by `charge_max` and the room below `soc_max`.
    pub fn clamp_power(&self, desired: f64, soc: f64) -> f64 {
        let s = &self.stats;
        if desired > 0.0 {
            desired.min(s.discharge_max).min((soc - s.soc_min).max(0.0))
        } else {
            desired.max(-s.charge_max).max(-(s.soc_max - soc))
        }
    }
}
