//! Session orchestration: the per-request entry point that turns a session
//! configuration into live session resources.
//!
//! Resolution order: credential, client identity, exposure mode, cache
//! lookup. A compatible cache hit returns the stored handle untouched; a
//! miss or mode/toolset mismatch builds a fresh handle, registers
//! capabilities per mode, and replaces the cache entry. A failed build
//! propagates its error and caches nothing.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::mcp::handle::ServerHandle;
use crate::mcp::tools::register_meta_tools;
use crate::mode::ToolsetMode;
use crate::policy::ModePolicy;
use crate::registry::{CapabilityRegistry, ModuleId, OperationCatalog};
use crate::session::{ClientIdentity, SessionCache, SessionConfig, SessionResources};
use crate::toolset::ToolsetEngine;
use crate::{AppError, Result};

/// Composes identity derivation, mode policy, the session cache, and
/// capability registration.
pub struct SessionOrchestrator {
    registry: CapabilityRegistry,
    catalog: Arc<dyn OperationCatalog>,
    cache: Arc<SessionCache>,
    policy: ModePolicy,
    server_credential: Option<String>,
    load_timeout: Duration,
}

impl SessionOrchestrator {
    /// Wire an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        registry: CapabilityRegistry,
        catalog: Arc<dyn OperationCatalog>,
        cache: Arc<SessionCache>,
        policy: ModePolicy,
        server_credential: Option<String>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            catalog,
            cache,
            policy,
            server_credential,
            load_timeout,
        }
    }

    /// The session cache, for lifecycle control at shutdown.
    #[must_use]
    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Resolve the session resources for one incoming request.
    ///
    /// # Errors
    ///
    /// Propagates any module-load failure during a session build; the cache
    /// is only written after a fully successful build.
    pub async fn session_resources(&self, config: &SessionConfig) -> Result<SessionResources> {
        // A configured server-level credential always wins over the
        // session-supplied one.
        let credential = self
            .server_credential
            .clone()
            .or_else(|| config.credential.clone());
        let identity = ClientIdentity::derive(credential.as_deref());

        let mode = self.policy.resolve_mode(config, &self.registry);
        let desired_list = self
            .policy
            .resolve_static_toolsets(config, mode, &self.registry);
        let desired_set: BTreeSet<String> = desired_list.iter().cloned().collect();

        if let Some(cached) = self.cache.get(&identity).await {
            let toolsets_match =
                mode != ToolsetMode::StaticToolsets || *cached.toolsets == desired_set;
            if cached.mode == mode && toolsets_match {
                debug!(identity = %identity, ?mode, "session cache hit");
                return Ok(cached);
            }
            debug!(identity = %identity, ?mode, "session cache entry incompatible, rebuilding");
        }

        let resources = self
            .build_session(mode, &desired_list, desired_set, credential)
            .await?;
        self.cache.set(identity.clone(), resources.clone()).await;
        info!(identity = %identity, ?mode, "session built");

        Ok(resources)
    }

    async fn build_session(
        &self,
        mode: ToolsetMode,
        desired_list: &[String],
        desired_set: BTreeSet<String>,
        credential: Option<String>,
    ) -> Result<SessionResources> {
        let handle = Arc::new(ServerHandle::new());

        let engine = match mode {
            ToolsetMode::DynamicDiscovery => {
                let engine = Arc::new(Mutex::new(ToolsetEngine::new(
                    self.registry,
                    Arc::clone(&self.catalog),
                    Arc::clone(&handle),
                    credential,
                    self.load_timeout,
                )));
                register_meta_tools(&handle, &engine);
                Some(engine)
            }
            ToolsetMode::StaticToolsets => {
                let modules = self.modules_for(desired_list);
                self.register_modules(&handle, &modules, credential.as_deref())
                    .await?;
                None
            }
            ToolsetMode::AllToolsets => {
                let modules = self.registry.all_modules();
                self.register_modules(&handle, &modules, credential.as_deref())
                    .await?;
                None
            }
        };

        Ok(SessionResources {
            handle,
            engine,
            mode,
            toolsets: Arc::new(desired_set),
        })
    }

    /// Deduplicated modules of the desired toolsets, in toolset order.
    fn modules_for(&self, toolsets: &[String]) -> Vec<ModuleId> {
        let mut modules = Vec::new();
        for name in toolsets {
            if let Some(def) = self.registry.get(name) {
                for module in def.modules {
                    if !modules.contains(module) {
                        modules.push(*module);
                    }
                }
            }
        }
        modules
    }

    /// Bulk-register modules under the per-module load timeout.
    async fn register_modules(
        &self,
        handle: &Arc<ServerHandle>,
        modules: &[ModuleId],
        credential: Option<&str>,
    ) -> Result<()> {
        for module in modules {
            let registrar =
                match tokio::time::timeout(self.load_timeout, self.catalog.load(*module)).await {
                    Ok(result) => result?,
                    Err(_elapsed) => {
                        return Err(AppError::ModuleLoad(format!(
                            "module '{module}' timed out after {}s during session build",
                            self.load_timeout.as_secs()
                        )));
                    }
                };
            registrar(handle, credential);
        }
        Ok(())
    }
}
