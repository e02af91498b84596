//! Unit tests for the bounded session cache.
//!
//! All timing tests run on a paused tokio clock and advance time
//! explicitly, so TTL boundaries are exact.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use findata_gateway::mcp::handle::ServerHandle;
use findata_gateway::session::{ClientIdentity, SessionCache, SessionResources};
use findata_gateway::ToolsetMode;

fn resources() -> SessionResources {
    SessionResources {
        handle: Arc::new(ServerHandle::new()),
        engine: None,
        mode: ToolsetMode::AllToolsets,
        toolsets: Arc::new(BTreeSet::new()),
    }
}

fn identity(seed: &str) -> ClientIdentity {
    ClientIdentity::derive(Some(seed))
}

#[tokio::test]
async fn get_returns_the_stored_resources() {
    let cache = SessionCache::new(10, Duration::from_secs(60));
    let id = identity("a");
    let stored = resources();
    cache.set(id.clone(), stored.clone()).await;

    let fetched = cache.get(&id).await.expect("entry present");
    assert!(Arc::ptr_eq(&fetched.handle, &stored.handle));
    cache.stop();
}

#[tokio::test]
async fn get_missing_key_returns_none() {
    let cache = SessionCache::new(10, Duration::from_secs(60));
    assert!(cache.get(&identity("nobody")).await.is_none());
    cache.stop();
}

#[tokio::test]
async fn set_replaces_existing_entry_without_growing() {
    let cache = SessionCache::new(10, Duration::from_secs(60));
    let id = identity("a");
    cache.set(id.clone(), resources()).await;
    let replacement = resources();
    cache.set(id.clone(), replacement.clone()).await;

    assert_eq!(cache.len().await, 1);
    let fetched = cache.get(&id).await.expect("entry present");
    assert!(Arc::ptr_eq(&fetched.handle, &replacement.handle));
    cache.stop();
}

#[tokio::test]
async fn delete_removes_the_entry() {
    let cache = SessionCache::new(10, Duration::from_secs(60));
    let id = identity("a");
    cache.set(id.clone(), resources()).await;

    assert!(cache.delete(&id).await);
    assert!(!cache.delete(&id).await);
    assert!(cache.is_empty().await);
    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn entry_survives_until_exactly_ttl() {
    let cache = SessionCache::new(10, Duration::from_secs(60));
    let id = identity("a");
    cache.set(id.clone(), resources()).await;

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(cache.get(&id).await.is_some(), "age == ttl is not expired");
    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn entry_expires_past_ttl_on_access() {
    let cache = SessionCache::new(10, Duration::from_secs(60));
    let id = identity("a");
    cache.set(id.clone(), resources()).await;

    tokio::time::advance(Duration::from_secs(60) + Duration::from_millis(1)).await;
    assert!(cache.get(&id).await.is_none());
    // Lazy expiry deleted the slot, not just hid it.
    assert!(cache.is_empty().await);
    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn get_refreshes_the_ttl() {
    let cache = SessionCache::new(10, Duration::from_secs(60));
    let id = identity("a");
    cache.set(id.clone(), resources()).await;

    tokio::time::advance(Duration::from_secs(40)).await;
    assert!(cache.get(&id).await.is_some());

    // 40s + 40s past insert, but only 40s past the refreshing get.
    tokio::time::advance(Duration::from_secs(40)).await;
    assert!(cache.get(&id).await.is_some());
    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn full_cache_evicts_the_least_recently_accessed_entry() {
    let cache = SessionCache::new(2, Duration::from_secs(3600));
    let (a, b, c) = (identity("a"), identity("b"), identity("c"));

    cache.set(a.clone(), resources()).await;
    tokio::time::advance(Duration::from_secs(1)).await;
    cache.set(b.clone(), resources()).await;
    tokio::time::advance(Duration::from_secs(1)).await;

    // Touch `a` so `b` becomes the LRU victim.
    assert!(cache.get(&a).await.is_some());
    tokio::time::advance(Duration::from_secs(1)).await;

    cache.set(c.clone(), resources()).await;
    assert_eq!(cache.len().await, 2);
    assert!(cache.get(&a).await.is_some());
    assert!(cache.get(&b).await.is_none());
    assert!(cache.get(&c).await.is_some());
    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn replacing_an_existing_key_never_evicts() {
    let cache = SessionCache::new(2, Duration::from_secs(3600));
    let (a, b) = (identity("a"), identity("b"));

    cache.set(a.clone(), resources()).await;
    cache.set(b.clone(), resources()).await;
    cache.set(a.clone(), resources()).await;

    assert_eq!(cache.len().await, 2);
    assert!(cache.get(&b).await.is_some());
    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn background_sweep_removes_expired_entries() {
    let cache = SessionCache::new(10, Duration::from_secs(60));
    let id = identity("a");
    cache.set(id, resources()).await;

    // Past the ttl and past the ten-minute sweep interval; yield so the
    // sweep task gets a chance to run.
    tokio::time::advance(Duration::from_secs(601)).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    assert!(cache.is_empty().await);
    cache.stop();
}

#[tokio::test(start_paused = true)]
async fn sweep_keeps_live_entries() {
    let cache = SessionCache::new(10, Duration::from_secs(3600));
    let id = identity("a");
    cache.set(id.clone(), resources()).await;

    tokio::time::advance(Duration::from_secs(601)).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    assert!(cache.get(&id).await.is_some());
    cache.stop();
}

#[tokio::test]
async fn stop_is_idempotent() {
    let cache = SessionCache::with_defaults();
    cache.stop();
    cache.stop();
}
