//! `disable_toolset` MCP tool handler.
//!
//! Deactivates a toolset for the current session. Tools already registered
//! on the handle stay callable; only the logical bookkeeping changes.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool};
use tokio::sync::Mutex;
use tracing::{info_span, Instrument};

use crate::mcp::handle::ToolCallArgs;
use crate::toolset::ToolsetEngine;

/// Tool definition for `disable_toolset`.
#[must_use]
pub fn tool() -> Tool {
    Tool {
        name: "disable_toolset".into(),
        description: Some(
            "Disable a previously enabled toolset for this session. Already \
             registered tools remain callable until the session is rebuilt."
                .into(),
        ),
        input_schema: super::schema(serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Toolset name to disable" }
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

/// Handle the `disable_toolset` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` for an unknown toolset or one that is not
/// currently active.
pub async fn handle(
    engine: &Arc<Mutex<ToolsetEngine>>,
    args: ToolCallArgs,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let name = super::require_name(&args)?;
    let span = info_span!("disable_toolset", toolset = %name);

    async move {
        let report = engine
            .lock()
            .await
            .disable(&name, args.peer.as_ref())
            .await
            .map_err(|err| super::to_error_data(&err))?;

        let released: Vec<&str> = report
            .released_modules
            .iter()
            .map(|module| module.as_str())
            .collect();
        let response = serde_json::json!({
            "status": "disabled",
            "toolset": report.toolset,
            "released_modules": released,
        });

        Ok(CallToolResult::success(vec![Content::json(response)
            .map_err(|err| {
                rmcp::ErrorData::internal_error(
                    format!("failed to serialize disable_toolset response: {err}"),
                    None,
                )
            })?]))
    }
    .instrument(span)
    .await
}
