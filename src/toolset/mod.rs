//! Runtime toolset activation for dynamic-discovery sessions.

pub mod engine;

pub use engine::{DisableReport, EnableReport, ToolsetEngine, ToolsetStatus, ToolsetSummary};
