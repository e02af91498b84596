//! Integration tests for the session orchestrator: identity, mode
//! resolution, cache reuse, and session builds working together.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use rmcp::model::{CallToolResult, Tool};

use findata_gateway::mcp::handle::{ServerHandle, ToolHandler};
use findata_gateway::orchestrator::SessionOrchestrator;
use findata_gateway::policy::ModePolicy;
use findata_gateway::registry::{CapabilityRegistry, ModuleId, OperationCatalog, Registrar};
use findata_gateway::session::{SessionCache, SessionConfig};
use findata_gateway::{AppError, Result, ToolsetMode};

/// Catalog that registers stub tools, recording the credential each
/// registrar was applied with. Optionally fails or stalls.
struct StubCatalog {
    credentials: Arc<std::sync::Mutex<Vec<Option<String>>>>,
    fail: bool,
    delay: Option<Duration>,
}

impl StubCatalog {
    fn new() -> Self {
        Self {
            credentials: Arc::new(std::sync::Mutex::new(Vec::new())),
            fail: false,
            delay: None,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }
}

fn stub_handler() -> ToolHandler {
    Arc::new(|_args| Box::pin(async { Ok(CallToolResult::success(vec![])) }))
}

fn stub_tool(name: &'static str) -> Tool {
    Tool {
        name: name.into(),
        description: None,
        input_schema: Arc::new(serde_json::Map::new()),
        output_schema: None,
        annotations: None,
        title: None,
        icons: None,
        meta: None,
    }
}

impl OperationCatalog for StubCatalog {
    fn load(&self, module: ModuleId) -> BoxFuture<'static, Result<Registrar>> {
        let credentials = Arc::clone(&self.credentials);
        let fail = self.fail;
        let delay = self.delay;

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(AppError::Upstream(format!("module '{module}' unavailable")));
            }
            let registrar: Registrar = Box::new(move |handle: &ServerHandle, credential| {
                credentials
                    .lock()
                    .unwrap()
                    .push(credential.map(str::to_owned));
                for (name, _description) in module.tools() {
                    handle.insert(stub_tool(name), stub_handler());
                }
            });
            Ok(registrar)
        })
    }
}

fn orchestrator(catalog: StubCatalog, server_credential: Option<&str>) -> SessionOrchestrator {
    SessionOrchestrator::new(
        CapabilityRegistry::builtin(),
        Arc::new(catalog),
        Arc::new(SessionCache::new(10, Duration::from_secs(3600))),
        ModePolicy::default(),
        server_credential.map(str::to_owned),
        Duration::from_secs(10),
    )
}

fn session(credential: Option<&str>, toolsets: Option<&str>, dynamic: Option<&str>) -> SessionConfig {
    SessionConfig {
        credential: credential.map(str::to_owned),
        toolsets: toolsets.map(str::to_owned),
        dynamic_toolsets: dynamic.map(str::to_owned),
    }
}

fn total_tool_count() -> usize {
    CapabilityRegistry::builtin()
        .all_modules()
        .iter()
        .map(|module| module.tools().len())
        .sum()
}

#[tokio::test]
async fn default_session_exposes_every_tool() {
    let orchestrator = orchestrator(StubCatalog::new(), None);
    let resources = orchestrator
        .session_resources(&session(None, None, None))
        .await
        .expect("session builds");

    assert_eq!(resources.mode, ToolsetMode::AllToolsets);
    assert!(resources.engine.is_none());
    assert!(resources.toolsets.is_empty());
    assert_eq!(resources.handle.len(), total_tool_count());
}

#[tokio::test]
async fn repeated_request_reuses_the_cached_handle() {
    let orchestrator = orchestrator(StubCatalog::new(), None);
    let config = session(Some("key-1"), None, None);

    let first = orchestrator
        .session_resources(&config)
        .await
        .expect("first build");
    let second = orchestrator
        .session_resources(&config)
        .await
        .expect("cache hit");

    assert!(Arc::ptr_eq(&first.handle, &second.handle));
    assert_eq!(orchestrator.cache().len().await, 1);
}

#[tokio::test]
async fn different_credentials_get_isolated_sessions() {
    let orchestrator = orchestrator(StubCatalog::new(), None);

    let first = orchestrator
        .session_resources(&session(Some("key-1"), None, None))
        .await
        .expect("build");
    let second = orchestrator
        .session_resources(&session(Some("key-2"), None, None))
        .await
        .expect("build");

    assert!(!Arc::ptr_eq(&first.handle, &second.handle));
    assert_eq!(orchestrator.cache().len().await, 2);
}

#[tokio::test]
async fn server_credential_overrides_session_credentials() {
    let catalog = StubCatalog::new();
    let credentials = Arc::clone(&catalog.credentials);
    let orchestrator = orchestrator(catalog, Some("server-key"));

    let first = orchestrator
        .session_resources(&session(Some("key-1"), None, None))
        .await
        .expect("build");
    let second = orchestrator
        .session_resources(&session(Some("key-2"), None, None))
        .await
        .expect("cache hit");

    // Both requests collapse onto the server-credential identity.
    assert!(Arc::ptr_eq(&first.handle, &second.handle));
    assert_eq!(orchestrator.cache().len().await, 1);
    assert!(credentials
        .lock()
        .unwrap()
        .iter()
        .all(|cred| cred.as_deref() == Some("server-key")));
}

#[tokio::test]
async fn static_session_registers_only_requested_toolsets() {
    let orchestrator = orchestrator(StubCatalog::new(), None);
    let resources = orchestrator
        .session_resources(&session(None, Some("news"), None))
        .await
        .expect("session builds");

    assert_eq!(resources.mode, ToolsetMode::StaticToolsets);
    assert!(resources.toolsets.contains("news"));

    let expected: usize = [ModuleId::NewsFeed, ModuleId::PressReleases]
        .iter()
        .map(|module| module.tools().len())
        .sum();
    assert_eq!(resources.handle.len(), expected);

    let names: Vec<_> = resources
        .handle
        .list()
        .iter()
        .map(|tool| tool.name.to_string())
        .collect();
    assert!(names.contains(&"market_news".to_owned()));
    assert!(!names.contains(&"quote_snapshot".to_owned()));
}

#[tokio::test]
async fn shared_modules_register_once_in_static_mode() {
    let orchestrator = orchestrator(StubCatalog::new(), None);
    let resources = orchestrator
        .session_resources(&session(None, Some("market_data,screener"), None))
        .await
        .expect("session builds");

    let mut names: Vec<_> = resources
        .handle
        .list()
        .iter()
        .map(|tool| tool.name.to_string())
        .collect();
    let before = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), before, "no duplicate tool registrations");
}

#[tokio::test]
async fn mode_change_rebuilds_the_session() {
    let orchestrator = orchestrator(StubCatalog::new(), None);
    let credential = Some("key-1");

    let all = orchestrator
        .session_resources(&session(credential, None, None))
        .await
        .expect("build all");
    let static_mode = orchestrator
        .session_resources(&session(credential, Some("news"), None))
        .await
        .expect("rebuild static");

    assert!(!Arc::ptr_eq(&all.handle, &static_mode.handle));
    assert_eq!(static_mode.mode, ToolsetMode::StaticToolsets);

    // The rebuilt entry replaced the old one; same config now hits.
    let again = orchestrator
        .session_resources(&session(credential, Some("news"), None))
        .await
        .expect("cache hit");
    assert!(Arc::ptr_eq(&static_mode.handle, &again.handle));
    assert_eq!(orchestrator.cache().len().await, 1);
}

#[tokio::test]
async fn changed_static_toolset_list_rebuilds() {
    let orchestrator = orchestrator(StubCatalog::new(), None);
    let credential = Some("key-1");

    let first = orchestrator
        .session_resources(&session(credential, Some("news"), None))
        .await
        .expect("build");
    let second = orchestrator
        .session_resources(&session(credential, Some("news,crypto"), None))
        .await
        .expect("rebuild");

    assert!(!Arc::ptr_eq(&first.handle, &second.handle));
}

#[tokio::test]
async fn equivalent_static_lists_hit_the_cache() {
    let orchestrator = orchestrator(StubCatalog::new(), None);
    let credential = Some("key-1");

    let first = orchestrator
        .session_resources(&session(credential, Some("news,crypto"), None))
        .await
        .expect("build");
    // Different order and a duplicate normalize to the same set.
    let second = orchestrator
        .session_resources(&session(credential, Some("crypto, news, crypto"), None))
        .await
        .expect("cache hit");

    assert!(Arc::ptr_eq(&first.handle, &second.handle));
}

#[tokio::test]
async fn dynamic_session_starts_with_only_meta_tools() {
    let orchestrator = orchestrator(StubCatalog::new(), None);
    let resources = orchestrator
        .session_resources(&session(None, None, Some("true")))
        .await
        .expect("session builds");

    assert_eq!(resources.mode, ToolsetMode::DynamicDiscovery);
    let engine = resources.engine.as_ref().expect("engine present");

    let mut names: Vec<_> = resources
        .handle
        .list()
        .iter()
        .map(|tool| tool.name.to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["disable_toolset", "enable_toolset", "get_toolset_status"]
    );

    // Enabling through the engine grows the same handle the session serves.
    engine
        .lock()
        .await
        .enable("news", None)
        .await
        .expect("enable succeeds");
    assert!(resources.handle.lookup("market_news").is_some());
}

#[tokio::test]
async fn failed_build_caches_nothing() {
    let orchestrator = orchestrator(StubCatalog::failing(), None);

    let err = orchestrator
        .session_resources(&session(None, Some("news"), None))
        .await
        .expect_err("build must fail");
    assert!(matches!(err, AppError::Upstream(_)));
    assert!(orchestrator.cache().is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn stalled_module_load_fails_the_build_with_a_timeout() {
    let orchestrator = orchestrator(StubCatalog::delayed(Duration::from_secs(30)), None);

    let err = orchestrator
        .session_resources(&session(None, Some("news"), None))
        .await
        .expect_err("build must time out");
    assert!(matches!(err, AppError::ModuleLoad(_)));
    assert!(err.to_string().contains("during session build"));
    assert!(orchestrator.cache().is_empty().await);
}

#[tokio::test]
async fn anonymous_sessions_share_one_cache_entry() {
    let orchestrator = orchestrator(StubCatalog::new(), None);

    let first = orchestrator
        .session_resources(&session(None, None, None))
        .await
        .expect("build");
    let second = orchestrator
        .session_resources(&session(Some(""), None, None))
        .await
        .expect("cache hit");

    // No credential and an empty credential both map to anonymous.
    assert!(Arc::ptr_eq(&first.handle, &second.handle));
    assert_eq!(orchestrator.cache().len().await, 1);
}
