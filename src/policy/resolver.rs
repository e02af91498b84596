//! Pure mode-resolution rules.
//!
//! Turns the process-level override and a session's own configuration into
//! exactly one [`ToolsetMode`], plus the static toolset list when that mode
//! applies. The override is an explicitly constructed value injected at
//! startup; there is no ambient global state to reset.

use tracing::warn;

use crate::config::ModeOverride;
use crate::mode::ToolsetMode;
use crate::registry::CapabilityRegistry;
use crate::session::SessionConfig;

/// Mode-resolution policy for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct ModePolicy {
    mode_override: Option<ModeOverride>,
}

impl ModePolicy {
    /// Build a policy, optionally pinned to a process-wide override.
    #[must_use]
    pub fn new(mode_override: Option<ModeOverride>) -> Self {
        Self { mode_override }
    }

    /// The active process-wide override, if any.
    #[must_use]
    pub fn mode_override(&self) -> Option<&ModeOverride> {
        self.mode_override.as_ref()
    }

    /// Resolve the exposure mode for one session. First match wins:
    ///
    /// 1. a process-wide override pins the mode unconditionally;
    /// 2. `dynamic_toolsets` equal to `"true"` selects dynamic discovery;
    /// 3. a toolset list that validates to at least one known name selects
    ///    static exposure;
    /// 4. otherwise every toolset is exposed (legacy default).
    ///
    /// A supplied list that validates to nothing falls back to
    /// [`ToolsetMode::AllToolsets`] with a warning, never to an empty
    /// static set.
    #[must_use]
    pub fn resolve_mode(&self, config: &SessionConfig, registry: &CapabilityRegistry) -> ToolsetMode {
        if let Some(ref pinned) = self.mode_override {
            return pinned.mode;
        }

        if config
            .dynamic_toolsets
            .as_deref()
            .is_some_and(|flag| flag.eq_ignore_ascii_case("true"))
        {
            return ToolsetMode::DynamicDiscovery;
        }

        if let Some(ref raw) = config.toolsets {
            if !raw.trim().is_empty() {
                let valid = validate_toolset_list(raw, registry);
                if valid.is_empty() {
                    warn!(
                        requested = %raw,
                        "session toolset list contains no known toolsets, exposing all toolsets"
                    );
                    return ToolsetMode::AllToolsets;
                }
                return ToolsetMode::StaticToolsets;
            }
        }

        ToolsetMode::AllToolsets
    }

    /// Resolve the static toolset list for a session already resolved to
    /// `mode`. Empty unless `mode` is [`ToolsetMode::StaticToolsets`].
    #[must_use]
    pub fn resolve_static_toolsets(
        &self,
        config: &SessionConfig,
        mode: ToolsetMode,
        registry: &CapabilityRegistry,
    ) -> Vec<String> {
        if mode != ToolsetMode::StaticToolsets {
            return Vec::new();
        }

        if let Some(ref pinned) = self.mode_override {
            return pinned.toolsets.clone();
        }

        config
            .toolsets
            .as_deref()
            .map(|raw| validate_toolset_list(raw, registry))
            .unwrap_or_default()
    }
}

/// Normalize a comma-separated toolset list: trim entries, drop empties,
/// dedupe preserving first occurrence, keep only registry-known names.
#[must_use]
pub fn validate_toolset_list(raw: &str, registry: &CapabilityRegistry) -> Vec<String> {
    let mut valid = Vec::new();
    for entry in raw.split(',') {
        let name = entry.trim();
        if name.is_empty() || valid.iter().any(|seen| seen == name) {
            continue;
        }
        if registry.get(name).is_some() {
            valid.push(name.to_owned());
        }
    }
    valid
}
