#![forbid(unsafe_code)]

//! `findata-gateway` — MCP financial market data gateway binary.
//!
//! Bootstraps configuration, resolves the process-wide toolset override
//! (failing fast on invalid names), and starts the MCP transports
//! (stdio and HTTP/SSE).

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use findata_gateway::config::{resolve_mode_override, GlobalConfig};
use findata_gateway::mcp::handler::AppState;
use findata_gateway::mcp::{sse, transport};
use findata_gateway::orchestrator::SessionOrchestrator;
use findata_gateway::policy::ModePolicy;
use findata_gateway::registry::{CapabilityRegistry, HttpCatalog};
use findata_gateway::session::SessionCache;
use findata_gateway::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "findata-gateway", about = "MCP financial market data gateway", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Pin every session to these toolsets (comma-separated). Outranks the
    /// FINDATA_TOOLSETS environment variable.
    #[arg(long)]
    toolsets: Option<String>,

    /// Pin every session to dynamic toolset discovery. Outranks both
    /// --toolsets and the FINDATA_DYNAMIC_TOOLSETS environment variable.
    #[arg(long, default_value_t = false)]
    dynamic_toolsets: bool,

    /// Override the HTTP port for the SSE transport.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("findata-gateway server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(ref path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    if let Some(port) = args.port {
        config.http_port = port;
    }
    config.load_credentials().await;

    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Resolve the process-wide override, failing fast ─
    let registry = CapabilityRegistry::builtin();
    let mode_override =
        resolve_mode_override(args.toolsets.as_deref(), args.dynamic_toolsets, &registry)
            .inspect_err(|err| error!(%err, "invalid toolset override, refusing to start"))?;
    if let Some(ref pinned) = mode_override {
        info!(mode = ?pinned.mode, toolsets = ?pinned.toolsets, "process-wide toolset override active");
    }

    // ── Build shared application state ──────────────────
    let catalog = Arc::new(HttpCatalog::new(config.upstream_base_url.clone()));
    let cache = Arc::new(SessionCache::new(
        config.max_sessions,
        config.session_ttl(),
    ));
    let orchestrator = SessionOrchestrator::new(
        registry,
        catalog,
        Arc::clone(&cache),
        ModePolicy::new(mode_override),
        config.api_key.clone(),
        config.module_load_timeout(),
    );

    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        orchestrator,
    });

    // ── Start transports ────────────────────────────────
    let ct = CancellationToken::new();

    let stdio_ct = ct.clone();
    let stdio_state = Arc::clone(&state);
    let stdio_handle = tokio::spawn(async move {
        if let Err(err) = transport::serve_stdio(stdio_state, stdio_ct).await {
            error!(%err, "stdio transport failed");
        }
    });

    let sse_ct = ct.clone();
    let sse_state = Arc::clone(&state);
    let sse_handle = tokio::spawn(async move {
        if let Err(err) = sse::serve_sse(sse_state, sse_ct).await {
            error!(%err, "sse transport failed");
        }
    });

    info!("MCP server ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();
    cache.stop();

    let _ = tokio::join!(stdio_handle, sse_handle);
    info!("findata-gateway shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
