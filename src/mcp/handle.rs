//! Per-session server handle: the mutable tool table an MCP connection
//! dispatches against.
//!
//! Tools can be added at any time (bulk registration at session build, or
//! incrementally by the toolset activation engine) but are never removed —
//! logical disable is bookkeeping in the engine, not retraction here. The
//! table sits behind a synchronous `RwLock` that is never held across an
//! await point; handlers are cloned out under the read lock and invoked
//! afterwards.

use std::sync::{Arc, PoisonError, RwLock};

use futures_util::future::BoxFuture;
use rmcp::model::{CallToolResult, Tool};
use rmcp::service::{Peer, RoleServer};

/// Raw JSON arguments as delivered by the MCP transport.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Per-call inputs handed to a tool handler.
pub struct ToolCallArgs {
    /// Tool arguments from the `tools/call` request, if any.
    pub arguments: Option<JsonObject>,
    /// Peer for server-initiated notifications to the connected client.
    pub peer: Option<Peer<RoleServer>>,
}

/// Boxed async tool handler stored in the table.
pub type ToolHandler =
    Arc<dyn Fn(ToolCallArgs) -> BoxFuture<'static, Result<CallToolResult, rmcp::ErrorData>> + Send + Sync>;

struct ToolEntry {
    tool: Tool,
    handler: ToolHandler,
}

/// Insertion-ordered tool table for one session.
#[derive(Default)]
pub struct ServerHandle {
    entries: RwLock<Vec<ToolEntry>>,
}

impl ServerHandle {
    /// Create an empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any existing tool of the same name.
    pub fn insert(&self, tool: Tool, handler: ToolHandler) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.iter_mut().find(|e| e.tool.name == tool.name) {
            existing.tool = tool;
            existing.handler = handler;
        } else {
            entries.push(ToolEntry { tool, handler });
        }
    }

    /// Clone out the handler for `name`, if registered.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ToolHandler> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|e| e.tool.name == name)
            .map(|e| Arc::clone(&e.handler))
    }

    /// Current tool list in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<Tool> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.tool.clone())
            .collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no tools are registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
