//! Session layer: client identity, per-request session configuration, and
//! the bounded session-resource cache.

pub mod cache;
pub mod identity;

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::mcp::handle::ServerHandle;
use crate::mode::ToolsetMode;
use crate::toolset::engine::ToolsetEngine;

pub use cache::SessionCache;
pub use identity::{ClientIdentity, ANONYMOUS_IDENTITY};

/// Per-request session configuration, immutable once received.
///
/// Unknown transport parameters are ignored upstream; only these three keys
/// reach the session layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Session-supplied credential; overridden by a configured server-level
    /// credential during resolution.
    pub credential: Option<String>,
    /// Comma-separated toolset list requesting static exposure.
    pub toolsets: Option<String>,
    /// Dynamic-discovery flag; only the string `"true"` (case-insensitive)
    /// activates it.
    pub dynamic_toolsets: Option<String>,
}

/// Everything a session owns: its server handle, optional activation
/// engine, resolved mode, and active-toolset snapshot.
///
/// Cheap to clone; all fields are shared. Two resources from the same cache
/// entry compare handle-identical via `Arc::ptr_eq`.
#[derive(Clone)]
pub struct SessionResources {
    /// The tool table this session's MCP requests dispatch against.
    pub handle: Arc<ServerHandle>,
    /// Activation engine; present only in dynamic-discovery mode.
    pub engine: Option<Arc<Mutex<ToolsetEngine>>>,
    /// Resolved exposure mode.
    pub mode: ToolsetMode,
    /// Toolsets registered at build time (static mode), empty otherwise.
    pub toolsets: Arc<BTreeSet<String>>,
}

impl std::fmt::Debug for SessionResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResources")
            .field("mode", &self.mode)
            .field("toolsets", &self.toolsets)
            .field("has_engine", &self.engine.is_some())
            .finish_non_exhaustive()
    }
}
