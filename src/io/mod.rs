//! CSV input, rendering, and sandboxed persistence.

/// Decision CSV rendering.
pub mod export;
/// Tolerant CSV readers for history and forecast series.
pub mod reader;
pub mod sandbox;
