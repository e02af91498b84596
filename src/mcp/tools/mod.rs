//! MCP meta-tool handlers for dynamic toolset discovery.
//!
//! These three tools are the only ones registered up front on a
//! dynamic-discovery session; every data tool arrives later through
//! `enable_toolset`.

pub mod disable_toolset;
pub mod enable_toolset;
pub mod get_toolset_status;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::mcp::handle::{ServerHandle, ToolCallArgs};
use crate::toolset::ToolsetEngine;
use crate::AppError;

/// Register the three discovery meta-tools on `handle`, bound to `engine`.
pub fn register_meta_tools(handle: &Arc<ServerHandle>, engine: &Arc<Mutex<ToolsetEngine>>) {
    {
        let engine = Arc::clone(engine);
        handle.insert(
            enable_toolset::tool(),
            Arc::new(move |args: ToolCallArgs| {
                let engine = Arc::clone(&engine);
                Box::pin(async move { enable_toolset::handle(&engine, args).await })
            }),
        );
    }
    {
        let engine = Arc::clone(engine);
        handle.insert(
            disable_toolset::tool(),
            Arc::new(move |args: ToolCallArgs| {
                let engine = Arc::clone(&engine);
                Box::pin(async move { disable_toolset::handle(&engine, args).await })
            }),
        );
    }
    {
        let engine = Arc::clone(engine);
        handle.insert(
            get_toolset_status::tool(),
            Arc::new(move |args: ToolCallArgs| {
                let engine = Arc::clone(&engine);
                Box::pin(async move { get_toolset_status::handle(&engine, args).await })
            }),
        );
    }
}

/// Convert a `serde_json::Value::Object` into the `Arc<Map>` expected by `Tool`.
pub(crate) fn schema(value: serde_json::Value) -> Arc<serde_json::Map<String, serde_json::Value>> {
    match value {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::default()),
    }
}

/// Map a domain error onto the MCP error surface.
///
/// Validation and conflict errors are caller mistakes; load failures are
/// internal.
pub(crate) fn to_error_data(err: &AppError) -> rmcp::ErrorData {
    match err {
        AppError::UnknownToolset(_) | AppError::ToolsetConflict(_) => {
            rmcp::ErrorData::invalid_params(err.to_string(), None)
        }
        _ => rmcp::ErrorData::internal_error(err.to_string(), None),
    }
}

/// Extract the required `name` argument from a meta-tool call.
pub(crate) fn require_name(args: &ToolCallArgs) -> Result<String, rmcp::ErrorData> {
    args.arguments
        .as_ref()
        .and_then(|map| map.get("name"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| rmcp::ErrorData::invalid_params("missing required parameter: name", None))
}
