//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::mode::ToolsetMode;
use crate::registry::CapabilityRegistry;
use crate::{AppError, Result};

/// Environment variable naming a comma-separated toolset override.
pub const ENV_TOOLSETS: &str = "FINDATA_TOOLSETS";

/// Environment variable enabling the dynamic-discovery override.
pub const ENV_DYNAMIC_TOOLSETS: &str = "FINDATA_DYNAMIC_TOOLSETS";

/// Environment variable supplying the server-level API credential.
pub const ENV_API_KEY: &str = "FINDATA_API_KEY";

fn default_upstream_base_url() -> String {
    "https://api.findata.example.com".into()
}

fn default_http_port() -> u16 {
    3000
}

fn default_max_sessions() -> usize {
    1000
}

fn default_session_ttl_seconds() -> u64 {
    3600
}

fn default_module_load_timeout_seconds() -> u64 {
    10
}

/// Global configuration parsed from `config.toml`; every field has a
/// default so the file itself is optional.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct GlobalConfig {
    /// Base URL of the upstream financial-data provider.
    pub upstream_base_url: String,
    /// HTTP port for the SSE transport.
    pub http_port: u16,
    /// Maximum number of concurrently cached sessions.
    pub max_sessions: usize,
    /// Session time-to-live in seconds.
    pub session_ttl_seconds: u64,
    /// Per-module load timeout in seconds.
    pub module_load_timeout_seconds: u64,
    /// Server-level API credential; when set it overrides any
    /// session-supplied credential. Loaded at runtime via OS keychain or
    /// environment variable, never from the TOML file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            upstream_base_url: default_upstream_base_url(),
            http_port: default_http_port(),
            max_sessions: default_max_sessions(),
            session_ttl_seconds: default_session_ttl_seconds(),
            module_load_timeout_seconds: default_module_load_timeout_seconds(),
            api_key: None,
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the server-level credential from OS keychain with env-var
    /// fallback. Absence is not an error; the upstream is then queried
    /// with session-supplied credentials only.
    pub async fn load_credentials(&mut self) {
        self.api_key = load_credential("api_key", ENV_API_KEY).await;
    }

    /// Session TTL as a [`Duration`].
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    /// Per-module load timeout as a [`Duration`].
    #[must_use]
    pub fn module_load_timeout(&self) -> Duration {
        Duration::from_secs(self.module_load_timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            return Err(AppError::Config(
                "max_sessions must be greater than zero".into(),
            ));
        }
        if self.session_ttl_seconds == 0 {
            return Err(AppError::Config(
                "session_ttl_seconds must be greater than zero".into(),
            ));
        }
        if self.upstream_base_url.is_empty() {
            return Err(AppError::Config("upstream_base_url must not be empty".into()));
        }
        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Option<String> {
    let key = keyring_key.to_owned();

    // Keyring is synchronous I/O; run it off the async threads.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new("findata-gateway", &key).and_then(|entry| entry.get_password())
    })
    .await;

    match keychain_result {
        Ok(Ok(value)) if !value.is_empty() => return Some(value),
        Ok(Ok(_)) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Ok(Err(err)) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
        Err(err) => {
            warn!(key = keyring_key, %err, "keychain task panicked, trying env var");
        }
    }

    env::var(env_key).ok().filter(|value| !value.is_empty())
}

/// Process-wide capability-exposure override, fixed at startup.
///
/// When present it outranks every session's own configuration for the
/// process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeOverride {
    /// Pinned exposure mode for every session.
    pub mode: ToolsetMode,
    /// Pinned toolset list; non-empty only for
    /// [`ToolsetMode::StaticToolsets`].
    pub toolsets: Vec<String>,
}

/// Resolve the process-wide override from CLI flags and environment
/// variables. CLI outranks env; a dynamic-discovery flag outranks a
/// toolset list from the same source.
///
/// # Errors
///
/// Returns `AppError::Config` when a toolset override names unknown
/// toolsets, listing both the invalid names and the valid alternatives.
/// The process must not start in that state.
pub fn resolve_mode_override(
    cli_toolsets: Option<&str>,
    cli_dynamic: bool,
    registry: &CapabilityRegistry,
) -> Result<Option<ModeOverride>> {
    if cli_dynamic {
        return Ok(Some(ModeOverride {
            mode: ToolsetMode::DynamicDiscovery,
            toolsets: Vec::new(),
        }));
    }
    if let Some(raw) = cli_toolsets {
        return static_override(raw, registry).map(Some);
    }

    if env::var(ENV_DYNAMIC_TOOLSETS).is_ok_and(|flag| flag.eq_ignore_ascii_case("true")) {
        return Ok(Some(ModeOverride {
            mode: ToolsetMode::DynamicDiscovery,
            toolsets: Vec::new(),
        }));
    }
    if let Ok(raw) = env::var(ENV_TOOLSETS) {
        if !raw.trim().is_empty() {
            return static_override(&raw, registry).map(Some);
        }
    }

    Ok(None)
}

/// Validate a static toolset override, failing fast on any unknown name.
fn static_override(raw: &str, registry: &CapabilityRegistry) -> Result<ModeOverride> {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for entry in raw.split(',') {
        let name = entry.trim();
        if name.is_empty() || valid.iter().any(|seen| seen == name) {
            continue;
        }
        if registry.get(name).is_some() {
            valid.push(name.to_owned());
        } else {
            invalid.push(name.to_owned());
        }
    }

    if !invalid.is_empty() {
        return Err(AppError::Config(format!(
            "toolset override names unknown toolsets [{}]; valid toolsets are [{}]",
            invalid.join(", "),
            registry.names().join(", "),
        )));
    }
    if valid.is_empty() {
        return Err(AppError::Config(format!(
            "toolset override is empty after validation; valid toolsets are [{}]",
            registry.names().join(", "),
        )));
    }

    Ok(ModeOverride {
        mode: ToolsetMode::StaticToolsets,
        toolsets: valid,
    })
}
