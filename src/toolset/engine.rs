//! Toolset activation engine.
//!
//! One instance per dynamic-discovery session, bound to that session's
//! server handle and credential at construction. Tracks two explicit sets:
//! the toolsets declared active, and the modules physically registered on
//! the handle. Disabling a toolset removes only the logical bookkeeping —
//! the handle keeps already-registered tools callable, a platform
//! limitation the bookkeeping deliberately preserves rather than hides.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rmcp::service::{Peer, RoleServer};
use serde::Serialize;
use tracing::{info, warn};

use crate::mcp::handle::ServerHandle;
use crate::registry::{CapabilityRegistry, ModuleId, OperationCatalog};
use crate::{AppError, Result};

/// Outcome of a successful `enable` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableReport {
    /// The toolset that was enabled.
    pub toolset: String,
    /// Modules newly loaded by this call, in registration order.
    pub loaded_modules: Vec<ModuleId>,
}

/// Outcome of a successful `disable` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisableReport {
    /// The toolset that was disabled.
    pub toolset: String,
    /// Modules released from the logical registered set (exclusive to this
    /// toolset). Their tools remain physically callable.
    pub released_modules: Vec<ModuleId>,
}

/// One toolset row in a status report.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolsetSummary {
    /// Toolset name.
    pub name: &'static str,
    /// Human-readable title.
    pub title: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Whether the toolset is currently active.
    pub active: bool,
}

/// Snapshot returned by `get_toolset_status`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolsetStatus {
    /// Every defined toolset with its activation flag.
    pub available_toolsets: Vec<ToolsetSummary>,
    /// Names of currently active toolsets.
    pub active_toolsets: Vec<String>,
    /// Logically registered modules.
    pub registered_modules: Vec<String>,
    /// Total number of defined toolsets.
    pub total_toolsets: usize,
    /// Number of active toolsets.
    pub active_count: usize,
}

/// Runtime enable/disable of toolsets against one server handle.
pub struct ToolsetEngine {
    registry: CapabilityRegistry,
    catalog: Arc<dyn OperationCatalog>,
    handle: Arc<ServerHandle>,
    credential: Option<String>,
    load_timeout: Duration,
    active: BTreeSet<String>,
    registered: BTreeSet<ModuleId>,
}

impl ToolsetEngine {
    /// Bind an engine to a session's handle and credential.
    #[must_use]
    pub fn new(
        registry: CapabilityRegistry,
        catalog: Arc<dyn OperationCatalog>,
        handle: Arc<ServerHandle>,
        credential: Option<String>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            catalog,
            handle,
            credential,
            load_timeout,
            active: BTreeSet::new(),
            registered: BTreeSet::new(),
        }
    }

    /// Names of every defined toolset.
    #[must_use]
    pub fn available_toolsets(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    /// Names of currently active toolsets.
    #[must_use]
    pub fn active_toolsets(&self) -> Vec<String> {
        self.active.iter().cloned().collect()
    }

    /// Whether `name` is currently active.
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Whether `module` is in the logical registered set.
    #[must_use]
    pub fn is_registered(&self, module: ModuleId) -> bool {
        self.registered.contains(&module)
    }

    /// Full status snapshot.
    #[must_use]
    pub fn status(&self) -> ToolsetStatus {
        let available_toolsets = self
            .registry
            .toolsets()
            .iter()
            .map(|def| ToolsetSummary {
                name: def.name,
                title: def.title,
                description: def.description,
                active: self.active.contains(def.name),
            })
            .collect();

        ToolsetStatus {
            available_toolsets,
            active_toolsets: self.active.iter().cloned().collect(),
            registered_modules: self
                .registered
                .iter()
                .map(|module| module.as_str().to_owned())
                .collect(),
            total_toolsets: self.registry.len(),
            active_count: self.active.len(),
        }
    }

    /// Enable a toolset, loading and registering any of its modules not yet
    /// on the handle.
    ///
    /// A loader failure or timeout aborts the remaining loads for this call
    /// but leaves already-loaded modules registered; there is no rollback.
    /// On success a best-effort `tools/list_changed` notification is sent
    /// through `peer`.
    ///
    /// # Errors
    ///
    /// - `AppError::UnknownToolset` for an empty or unknown name, listing
    ///   the available toolsets.
    /// - `AppError::ToolsetConflict` when the toolset is already enabled.
    /// - `AppError::ModuleLoad` naming the module that failed or timed out.
    pub async fn enable(
        &mut self,
        name: &str,
        peer: Option<&Peer<RoleServer>>,
    ) -> Result<EnableReport> {
        let def = self
            .registry
            .get(name)
            .ok_or_else(|| self.unknown_toolset(name))?;

        if self.active.contains(name) {
            return Err(AppError::ToolsetConflict(format!(
                "toolset '{name}' is already enabled"
            )));
        }

        let mut loaded = Vec::new();
        for module in def.modules {
            if self.registered.contains(module) {
                continue;
            }

            let registrar = match tokio::time::timeout(
                self.load_timeout,
                self.catalog.load(*module),
            )
            .await
            {
                Ok(Ok(registrar)) => registrar,
                Ok(Err(err)) => {
                    return Err(AppError::ModuleLoad(format!(
                        "module '{module}' of toolset '{name}' failed to load: {err}"
                    )));
                }
                Err(_elapsed) => {
                    return Err(AppError::ModuleLoad(format!(
                        "module '{module}' of toolset '{name}' timed out after {}s",
                        self.load_timeout.as_secs()
                    )));
                }
            };

            registrar(&self.handle, self.credential.as_deref());
            self.registered.insert(*module);
            loaded.push(*module);
        }

        self.active.insert(name.to_owned());
        info!(
            toolset = name,
            loaded = loaded.len(),
            "toolset enabled"
        );

        notify_tool_list_changed(peer).await;

        Ok(EnableReport {
            toolset: name.to_owned(),
            loaded_modules: loaded,
        })
    }

    /// Disable a toolset.
    ///
    /// Modules exclusive to this toolset (required by no other active
    /// toolset) leave the logical registered set; the handle keeps their
    /// tools callable. Always succeeds once validation passes.
    ///
    /// # Errors
    ///
    /// - `AppError::UnknownToolset` for an empty or unknown name.
    /// - `AppError::ToolsetConflict` when the toolset is not active.
    pub async fn disable(
        &mut self,
        name: &str,
        peer: Option<&Peer<RoleServer>>,
    ) -> Result<DisableReport> {
        let def = self
            .registry
            .get(name)
            .ok_or_else(|| self.unknown_toolset(name))?;

        if !self.active.contains(name) {
            return Err(AppError::ToolsetConflict(format!(
                "toolset '{name}' is not currently active"
            )));
        }

        // Modules still required by another active toolset stay registered.
        let still_required: BTreeSet<ModuleId> = self
            .active
            .iter()
            .filter(|active| active.as_str() != name)
            .filter_map(|active| self.registry.get(active))
            .flat_map(|other| other.modules.iter().copied())
            .collect();

        let mut released = Vec::new();
        for module in def.modules {
            if !still_required.contains(module) && self.registered.remove(module) {
                released.push(*module);
            }
        }

        self.active.remove(name);
        info!(
            toolset = name,
            released = released.len(),
            "toolset disabled"
        );

        notify_tool_list_changed(peer).await;

        Ok(DisableReport {
            toolset: name.to_owned(),
            released_modules: released,
        })
    }

    fn unknown_toolset(&self, name: &str) -> AppError {
        AppError::UnknownToolset(format!(
            "'{name}' is not a known toolset; available toolsets: {}",
            self.registry.names().join(", ")
        ))
    }
}

/// Send a best-effort `tools/list_changed` notification.
///
/// Failures are logged and swallowed; they must never fail an otherwise
/// successful enable or disable.
async fn notify_tool_list_changed(peer: Option<&Peer<RoleServer>>) {
    let Some(peer) = peer else { return };
    if let Err(err) = peer.notify_tool_list_changed().await {
        warn!(%err, "failed to send tools/list_changed notification");
    }
}
