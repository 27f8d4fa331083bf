//! Operating-envelope statistics derived from the history log.

use tracing::debug;

use super::types::{DecisionStats, HistoricalRecord, Staged};
use crate::error::Warning;

/// Collects the dispatch envelope from chronological history records.
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoryStatsCollector;

impl HistoryStatsCollector {
    /// Computes SOC bounds, power bounds and the baseline net load.
    ///
    /// Never fails: each missing input family falls back to zero and raises
    /// its own warning.
    ///
    /// # Arguments
    ///
    /// * `records` - History in chronological order; the last present SOC is current
    pub fn collect(&self, records: &[HistoricalRecord]) -> Staged<DecisionStats> {
        let mut warnings = Vec::new();

        let mut soc: Option<(f64, f64, f64)> = None;
        let mut es: Option<(f64, f64)> = None;
        let mut net_sum = 0.0_f64;
        let mut net_count = 0_usize;

        for r in records {
            if let Some(v) = r.es_soc {
                soc = Some(match soc {
                    Some((lo, hi, _)) => (lo.min(v), hi.max(v), v),
                    None => (v, v, v),
                });
            }
            if let Some(v) = r.es_mw {
                es = Some(match es {
                    Some((lo, hi)) => (lo.min(v), hi.max(v)),
                    None => (v, v),
                });
            }
            if let Some(net) = r.net_load_mw() {
                net_sum += net;
                net_count += 1;
            }
        }

        let (soc_min, soc_max, soc_initial) = soc.unwrap_or_else(|| {
            warnings.push(Warning::SocMissing);
            (0.0, 0.0, 0.0)
        });

        let (discharge_max, charge_max) = match es {
            Some((lo, hi)) => (hi.max(0.0), lo.abs()),
            None => {
                warnings.push(Warning::EsPowerMissing);
                (0.0, 0.0)
            }
        };

        let net_target = if net_count == 0 {
            warnings.push(Warning::NetLoadMissing);
            0.0
        } else {
            net_sum / net_count as f64
        };

        let stats = DecisionStats {
            soc_min,
            soc_max,
            soc_initial,
            discharge_max,
            charge_max,
            net_target,
        };
        debug!(?stats, records = records.len(), "history statistics computed");
        Staged::new(stats, warnings)
    }
}
