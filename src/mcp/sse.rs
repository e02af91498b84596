//! HTTP/SSE transport for multi-session connections.
//!
//! Mounts an [`SseServer`] behind an axum router. Each SSE connection may
//! carry session parameters in its query string
//! (`/sse?credential=...&toolsets=market_data,news&dynamic_toolsets=true`);
//! unknown parameters are ignored. The extracted [`SessionConfig`] rides
//! with the per-connection [`GatewayServer`], and the orchestrator resolves
//! it on every request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use rmcp::transport::sse_server::{SseServer, SseServerConfig};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::handler::{AppState, GatewayServer};
use crate::session::SessionConfig;
use crate::{AppError, Result};

/// Handler for `GET /health` — returns 200 OK with a plain-text body.
async fn health() -> &'static str {
    "ok"
}

/// Extract a single query parameter from a URI.
///
/// Returns `None` when the parameter is absent or empty.
fn extract_param(uri: &axum::http::Uri, name: &str) -> Option<String> {
    uri.query().and_then(|q| {
        q.split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_owned())
            .filter(|v| !v.is_empty())
    })
}

/// Build a [`SessionConfig`] from the recognized query parameters.
fn extract_session_config(uri: &axum::http::Uri) -> SessionConfig {
    SessionConfig {
        credential: extract_param(uri, "credential"),
        toolsets: extract_param(uri, "toolsets"),
        dynamic_toolsets: extract_param(uri, "dynamic_toolsets"),
    }
}

/// Start the HTTP/SSE MCP transport on `config.http_port`.
///
/// Each SSE connection creates a fresh [`GatewayServer`] sharing the same
/// [`AppState`], carrying the session configuration from its query string.
///
/// # Errors
///
/// Returns `AppError::Config` if the server fails to bind.
pub async fn serve_sse(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let port = state.config.http_port;
    let bind = SocketAddr::from(([127, 0, 0, 1], port));

    let config = SseServerConfig {
        bind,
        sse_path: "/sse".into(),
        post_path: "/message".into(),
        ct: ct.clone(),
        sse_keep_alive: None,
    };

    let (sse_server, router) = SseServer::new(config);
    let router = router.route("/health", get(health));

    // Shared inbox: the middleware writes the SessionConfig extracted from
    // the query string; the factory closure reads it when creating the
    // per-connection GatewayServer. A semaphore serialises SSE connection
    // establishment so the inbox value is never clobbered by a concurrent
    // connection.
    let session_inbox: Arc<std::sync::Mutex<Option<SessionConfig>>> =
        Arc::new(std::sync::Mutex::new(None));
    let connection_semaphore = Arc::new(Semaphore::new(1));

    // Each inbound SSE connection gets its own GatewayServer instance.
    let inbox_for_factory = Arc::clone(&session_inbox);
    let server_ct = {
        let state = Arc::clone(&state);
        sse_server.with_service(move || {
            let session = inbox_for_factory
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .take()
                .unwrap_or_default();
            if session != SessionConfig::default() {
                info!("SSE connection with per-session configuration");
            }
            GatewayServer::with_session(Arc::clone(&state), session)
        })
    };

    // Middleware: extract session parameters from the query string on
    // `/sse` requests and store them in the inbox while holding the
    // semaphore.
    let inbox_for_mw = Arc::clone(&session_inbox);
    let sem_for_mw = Arc::clone(&connection_semaphore);
    let router = router.layer(middleware::from_fn(move |request: Request, next: Next| {
        let inbox = Arc::clone(&inbox_for_mw);
        let sem = Arc::clone(&sem_for_mw);
        async move {
            let is_sse = request.uri().path() == "/sse";
            if is_sse {
                // Serialise so the inbox value is consumed by exactly
                // the factory call that corresponds to this request.
                let Ok(_permit) = sem.acquire().await else {
                    warn!("connection semaphore closed; skipping session extraction");
                    return next.run(request).await;
                };
                let session = extract_session_config(request.uri());
                *inbox
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session);
                let response: Response = next.run(request).await;
                // _permit drops here after the factory has consumed the inbox
                response
            } else {
                next.run(request).await
            }
        }
    }));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind SSE on {bind}: {err}")))?;

    info!(%bind, "starting HTTP/SSE MCP transport");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            ct.cancelled().await;
            server_ct.cancel();
        })
        .await
        .map_err(|err| AppError::Config(format!("SSE server error: {err}")))?;

    info!("HTTP/SSE MCP transport shut down");
    Ok(())
}
