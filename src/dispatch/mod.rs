//! Dispatch planning: history envelope, horizon planner, and batch orchestration.

/// Batch orchestration across horizons.
pub mod batch;
/// Receding-horizon storage planner.
pub mod planner;
/// Operating envelope derived from history.
pub mod stats;
pub mod summary;
pub mod types;

pub use batch::{DecisionOutput, GeneratedCsv, build_decision_csvs, write_decision_csvs};
pub use planner::DispatchPlanner;
pub use stats::HistoryStatsCollector;
pub use summary::PlanSummary;
pub use types::{Action, DecisionRow, DecisionStats, ForecastRow, HistoricalRecord};
