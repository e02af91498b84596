#![forbid(unsafe_code)]

//! `findata-gateway` — MCP gateway server for financial market data.
//!
//! Exposes the upstream provider's data operations as MCP tools, with a
//! per-session capability layer: a bounded session-resource cache, a
//! capability-exposure mode policy, and a runtime toolset activation
//! engine.

pub mod config;
pub mod errors;
pub mod mcp;
pub mod mode;
pub mod orchestrator;
pub mod policy;
pub mod registry;
pub mod session;
pub mod toolset;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
pub use mode::ToolsetMode;
