//! `get_toolset_status` MCP tool handler.
//!
//! Pure reader: reports available toolsets, active toolsets, and the
//! logically registered modules for the current session.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool};
use tokio::sync::Mutex;

use crate::mcp::handle::ToolCallArgs;
use crate::toolset::ToolsetEngine;

/// Tool definition for `get_toolset_status`.
#[must_use]
pub fn tool() -> Tool {
    Tool {
        name: "get_toolset_status".into(),
        description: Some(
            "Report available toolsets, active toolsets, and registered \
             modules for this session."
                .into(),
        ),
        input_schema: super::schema(serde_json::json!({
            "type": "object",
            "properties": {}
        })),
        output_schema: None,
        annotations: None,
        title: None,
        icons: None,
        meta: None,
    }
}

/// Handle the `get_toolset_status` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` only if the status snapshot fails to
/// serialize.
pub async fn handle(
    engine: &Arc<Mutex<ToolsetEngine>>,
    _args: ToolCallArgs,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let status = engine.lock().await.status();
    let response = serde_json::to_value(&status).map_err(|err| {
        rmcp::ErrorData::internal_error(format!("failed to serialize toolset status: {err}"), None)
    })?;

    Ok(CallToolResult::success(vec![Content::json(response)
        .map_err(|err| {
            rmcp::ErrorData::internal_error(
                format!("failed to serialize get_toolset_status response: {err}"),
                None,
            )
        })?]))
}
