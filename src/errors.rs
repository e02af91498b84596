//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// A toolset name that does not exist in the capability registry.
    UnknownToolset(String),
    /// A toolset state conflict: already enabled, or not currently active.
    ToolsetConflict(String),
    /// A module loader failed or exceeded its load timeout.
    ModuleLoad(String),
    /// Upstream data-provider request failure.
    Upstream(String),
    /// MCP protocol or tool dispatch failure.
    Mcp(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::UnknownToolset(msg) => write!(f, "unknown toolset: {msg}"),
            Self::ToolsetConflict(msg) => write!(f, "toolset conflict: {msg}"),
            Self::ModuleLoad(msg) => write!(f, "module load: {msg}"),
            Self::Upstream(msg) => write!(f, "upstream: {msg}"),
            Self::Mcp(msg) => write!(f, "mcp: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
