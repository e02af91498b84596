//! Bounded session-resource cache.
//!
//! Maps client identities to session resources with two eviction paths: a
//! size bound that evicts the least-recently-accessed entry on insert, and
//! a TTL enforced both lazily on `get` and by a background sweep every ten
//! minutes. The cache itself never fails; a missing or expired key simply
//! yields `None`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{ClientIdentity, SessionResources};

/// Default maximum number of live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Default session time-to-live.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Interval between background expiry sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

struct CacheSlot {
    resources: SessionResources,
    last_accessed: Instant,
}

type SlotMap = HashMap<ClientIdentity, CacheSlot>;

/// Bounded, time-and-size-evicting map from client identity to session
/// resources.
pub struct SessionCache {
    slots: Arc<Mutex<SlotMap>>,
    max_sessions: usize,
    ttl: Duration,
    cancel: CancellationToken,
}

impl SessionCache {
    /// Create a cache with the given bounds and start its sweep task.
    #[must_use]
    pub fn new(max_sessions: usize, ttl: Duration) -> Self {
        let slots: Arc<Mutex<SlotMap>> = Arc::new(Mutex::new(HashMap::new()));
        let cancel = CancellationToken::new();

        spawn_sweep_task(Arc::clone(&slots), ttl, cancel.clone());

        Self {
            slots,
            max_sessions,
            ttl,
            cancel,
        }
    }

    /// Cache with the default bounds.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS, DEFAULT_TTL)
    }

    /// Look up a session, refreshing its last-access timestamp.
    ///
    /// An entry whose age exceeds the TTL is deleted and `None` is returned
    /// without refreshing.
    pub async fn get(&self, id: &ClientIdentity) -> Option<SessionResources> {
        let mut slots = self.slots.lock().await;
        let now = Instant::now();

        match slots.get_mut(id) {
            Some(slot) if now.duration_since(slot.last_accessed) > self.ttl => {
                slots.remove(id);
                debug!(identity = %id, "session expired on access");
                None
            }
            Some(slot) => {
                slot.last_accessed = now;
                Some(slot.resources.clone())
            }
            None => None,
        }
    }

    /// Insert or replace a session, evicting the least-recently-accessed
    /// entry first when the cache is full.
    pub async fn set(&self, id: ClientIdentity, resources: SessionResources) {
        let mut slots = self.slots.lock().await;
        let now = Instant::now();

        if !slots.contains_key(&id) && slots.len() >= self.max_sessions {
            let victim = slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_accessed)
                .map(|(key, _)| key.clone());
            if let Some(victim) = victim {
                slots.remove(&victim);
                info!(identity = %victim, "evicted least-recently-accessed session");
            }
        }

        slots.insert(
            id,
            CacheSlot {
                resources,
                last_accessed: now,
            },
        );
    }

    /// Remove a session. Returns whether an entry existed.
    pub async fn delete(&self, id: &ClientIdentity) -> bool {
        self.slots.lock().await.remove(id).is_some()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }

    /// Cancel the background sweep task. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SessionCache {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the periodic expiry sweep.
///
/// Each tick removes every entry past the TTL regardless of access pattern.
/// Bounded O(cache-size) work per tick; holds the map lock only for the
/// sweep itself.
fn spawn_sweep_task(slots: Arc<Mutex<SlotMap>>, ttl: Duration, cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        // The first tick completes immediately; skip it so a fresh cache is
        // not swept at construction time.
        interval.tick().await;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("session sweep task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let now = Instant::now();
                    let mut slots = slots.lock().await;
                    let before = slots.len();
                    slots.retain(|_, slot| now.duration_since(slot.last_accessed) <= ttl);
                    let removed = before - slots.len();
                    if removed > 0 {
                        info!(removed, "session sweep removed expired entries");
                    }
                }
            }
        }
    });
}
