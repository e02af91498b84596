//! MCP server handler and shared application state.
//!
//! [`GatewayServer`] is the rmcp-facing server type. One instance exists
//! per transport connection, carrying that connection's session
//! configuration; every `tools/list` and `tools/call` resolves the session
//! resources through the orchestrator (cheap on a cache hit) and then
//! dispatches against the session's server handle.

use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use tracing::info_span;

use crate::config::GlobalConfig;
use crate::mcp::handle::ToolCallArgs;
use crate::orchestrator::SessionOrchestrator;
use crate::session::SessionConfig;

/// Shared application state accessible from every connection.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Per-request session resolution.
    pub orchestrator: SessionOrchestrator,
}

/// MCP server bound to one transport connection.
pub struct GatewayServer {
    state: Arc<AppState>,
    session: SessionConfig,
}

impl GatewayServer {
    /// Server for a connection with no session parameters (stdio).
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self::with_session(state, SessionConfig::default())
    }

    /// Server for a connection carrying an explicit session configuration.
    #[must_use]
    pub fn with_session(state: Arc<AppState>, session: SessionConfig) -> Self {
        Self { state, session }
    }

    /// Access the shared application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

impl ServerHandler for GatewayServer {
    fn get_info(&self) -> ServerInfo {
        let mut capabilities = ServerCapabilities::builder().enable_tools().build();
        if let Some(ref mut tools) = capabilities.tools {
            tools.list_changed = Some(true);
        }

        ServerInfo {
            instructions: Some(
                "Financial market data gateway. Tool availability depends on the \
                 session's toolset mode; in dynamic-discovery mode use \
                 get_toolset_status, enable_toolset, and disable_toolset to manage \
                 which data tools are exposed."
                    .into(),
            ),
            capabilities,
            ..Default::default()
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, rmcp::ErrorData>> + Send + '_ {
        let _span = info_span!("call_tool", tool = %request.name).entered();

        async move {
            let resources = self
                .state
                .orchestrator
                .session_resources(&self.session)
                .await
                .map_err(|err| {
                    rmcp::ErrorData::internal_error(
                        format!("failed to resolve session resources: {err}"),
                        None,
                    )
                })?;

            let handler = resources.handle.lookup(&request.name).ok_or_else(|| {
                rmcp::ErrorData::invalid_params(format!("unknown tool: {}", request.name), None)
            })?;

            handler(ToolCallArgs {
                arguments: request.arguments,
                peer: Some(context.peer),
            })
            .await
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, rmcp::ErrorData>> + Send + '_ {
        async move {
            let resources = self
                .state
                .orchestrator
                .session_resources(&self.session)
                .await
                .map_err(|err| {
                    rmcp::ErrorData::internal_error(
                        format!("failed to resolve session resources: {err}"),
                        None,
                    )
                })?;

            Ok(ListToolsResult::with_all_items(resources.handle.list()))
        }
    }
}
