//! Day-ahead energy-storage dispatch planner for a virtual power plant.

/// REST API exposing the decision batch (requires the `api` feature).
#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod forecast;
pub mod io;
