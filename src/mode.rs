//! Toolset exposure mode — which tools a session sees.
//!
//! `ToolsetMode` is resolved once per session by the mode policy and stored
//! alongside the cached session resources. It determines whether a session
//! gets every data tool, a fixed subset, or only the runtime discovery
//! meta-tools.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Capability-exposure policy for one session.
///
/// Exactly one mode applies to a session at any time. Defaults to
/// [`ToolsetMode::AllToolsets`], the legacy behavior of exposing the full
/// catalog.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolsetMode {
    /// Every module in the registry is registered up front.
    #[default]
    AllToolsets,
    /// Only the modules of a fixed, validated toolset list are registered.
    StaticToolsets,
    /// No data tools up front; the session toggles toolsets at runtime via
    /// the `enable_toolset` / `disable_toolset` meta-tools.
    DynamicDiscovery,
}
