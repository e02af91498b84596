//! `enable_toolset` MCP tool handler.
//!
//! Activates a toolset for the current session, loading and registering
//! any of its modules that are not yet on the server handle.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool};
use tokio::sync::Mutex;
use tracing::{info_span, Instrument};

use crate::mcp::handle::ToolCallArgs;
use crate::toolset::ToolsetEngine;

/// Tool definition for `enable_toolset`.
#[must_use]
pub fn tool() -> Tool {
    Tool {
        name: "enable_toolset".into(),
        description: Some(
            "Enable a toolset for this session, registering its data tools. \
             Use get_toolset_status to list available toolsets."
                .into(),
        ),
        input_schema: super::schema(serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Toolset name to enable" }
            },
            "required": ["name"]
        })),
        output_schema: None,
        annotations: None,
        title: None,
        icons: None,
        meta: None,
    }
}

/// Handle the `enable_toolset` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` for an unknown toolset, an already-enabled
/// toolset, or a module load failure.
pub async fn handle(
    engine: &Arc<Mutex<ToolsetEngine>>,
    args: ToolCallArgs,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let name = super::require_name(&args)?;
    let span = info_span!("enable_toolset", toolset = %name);

    async move {
        let report = engine
            .lock()
            .await
            .enable(&name, args.peer.as_ref())
            .await
            .map_err(|err| super::to_error_data(&err))?;

        let loaded: Vec<&str> = report
            .loaded_modules
            .iter()
            .map(|module| module.as_str())
            .collect();
        let response = serde_json::json!({
            "status": "enabled",
            "toolset": report.toolset,
            "modules_loaded": loaded.len(),
            "loaded_modules": loaded,
        });

        Ok(CallToolResult::success(vec![Content::json(response)
            .map_err(|err| {
                rmcp::ErrorData::internal_error(
                    format!("failed to serialize enable_toolset response: {err}"),
                    None,
                )
            })?]))
    }
    .instrument(span)
    .await
}
