//! Backing-store abstraction shared by the cache and the rate limiter.
//!
//! Both resilience components talk to storage through narrow traits so the
//! backing technology can change without touching their logic. The default
//! implementation is [`MemoryStore`], an in-process store with passive TTL
//! expiry. A networked store (Redis, memcached) would implement the same
//! traits.
//!
//! # Features
//!
//! - **Key-Value Operations**: GET / SETEX / DEL / CLEAR with per-key TTL
//! - **Sliding-Window Log**: atomic prune-count-insert for rate limiting
//! - **Bounded Latency**: [`store_timeout`] caps every store call so a slow
//!   backend degrades instead of stalling the request path

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::time::epoch_millis;

/// Default deadline for a single backing-store operation.
///
/// Store calls sit on the request path, so they get a much tighter budget
/// than outbound fetches. A store that cannot answer in this window is
/// treated as unavailable for that call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(500);

/// Runs one store operation under `deadline`, mapping an elapsed timer to
/// [`Error::Storage`].
///
/// Callers that degrade on store failure (cache, rate limiter) wrap every
/// trait call in this so a hung backend costs at most `deadline` per call.
pub async fn store_timeout<T, F>(deadline: Duration, op: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                op,
                timeout_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                "backing store operation timed out"
            );
            Err(Error::storage(format!(
                "store {op} timed out after {}ms",
                deadline.as_millis()
            )))
        }
    }
}

/// Key-value storage with per-key expiry, used by the response cache.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetches the value stored under `key`, or `None` if the key is absent
    /// or its TTL has elapsed.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value and setting
    /// the key to expire after `ttl`.
    async fn set_ex(&self, key: &str, ttl: Duration, value: &str) -> Result<()>;

    /// Removes `key`, reporting whether a live value was present.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every stored key-value entry. Destructive and idempotent.
    async fn clear_all(&self) -> Result<()>;
}

/// Result of one atomic sliding-window update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Whether the attempt was admitted into the window.
    pub admitted: bool,
    /// Timestamps in the window after the update, including this attempt
    /// when it was admitted.
    pub count: u32,
    /// Oldest surviving timestamp, if the window is non-empty.
    pub oldest_ms: Option<i64>,
}

/// Ordered-timestamp storage for sliding-window rate limiting.
#[async_trait]
pub trait SlidingWindowStore: Send + Sync {
    /// Records one attempt against `key` as a single indivisible unit:
    /// discard timestamps at or before `now_ms - window`, admit and insert
    /// `now_ms` only while fewer than `limit` timestamps survive, then
    /// refresh the key's expiry to one full window.
    ///
    /// Rejected attempts leave no timestamp behind, so a client that keeps
    /// probing while over the limit does not push its own recovery further
    /// out.
    async fn record(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
        limit: u32,
    ) -> Result<WindowSnapshot>;
}

#[derive(Debug)]
struct StoredEntry {
    value: String,
    expires_at_ms: i64,
}

#[derive(Debug, Default)]
struct WindowState {
    /// Sorted ascending.
    timestamps: Vec<i64>,
    expires_at_ms: i64,
}

/// In-process store backing both traits.
///
/// Expiry is passive: stale entries are dropped when the key is next read,
/// and stale rate windows are reclaimed on any limiter update. Suitable for
/// a single process; state is lost on restart.
///
/// # Example
///
/// ```rust
/// use brandex_core::store::{KeyValueStore, MemoryStore};
/// use std::time::Duration;
///
/// # async fn example() -> brandex_core::error::Result<()> {
/// let store = MemoryStore::new();
/// store.set_ex("greeting", Duration::from_secs(60), "hello").await?;
/// assert_eq!(store.get("greeting").await?, Some("hello".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, StoredEntry>>,
    windows: Mutex<HashMap<String, WindowState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live key-value entries, counting not-yet-reclaimed expired
    /// ones out.
    pub async fn len(&self) -> usize {
        let now = epoch_millis();
        let entries = self.entries.lock().await;
        entries.values().filter(|e| e.expires_at_ms > now).count()
    }

    /// Whether no live key-value entries exist.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn duration_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at_ms > epoch_millis() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, ttl: Duration, value: &str) -> Result<()> {
        let expires_at_ms = epoch_millis().saturating_add(duration_millis(ttl));
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at_ms,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        match entries.remove(key) {
            Some(entry) => Ok(entry.expires_at_ms > epoch_millis()),
            None => Ok(false),
        }
    }

    async fn clear_all(&self) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        Ok(())
    }
}

#[async_trait]
impl SlidingWindowStore for MemoryStore {
    async fn record(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
        limit: u32,
    ) -> Result<WindowSnapshot> {
        let window_ms = duration_millis(window);
        let mut windows = self.windows.lock().await;

        // Reclaim identities idle for a full window, the moral equivalent of
        // a networked store's key expiry.
        windows.retain(|_, state| state.expires_at_ms > now_ms);

        let state = windows.entry(key.to_string()).or_default();
        let cutoff = now_ms.saturating_sub(window_ms);
        state.timestamps.retain(|&ts| ts > cutoff);

        let admitted = u32::try_from(state.timestamps.len()).unwrap_or(u32::MAX) < limit;
        if admitted {
            let idx = state.timestamps.partition_point(|&ts| ts <= now_ms);
            state.timestamps.insert(idx, now_ms);
        }
        state.expires_at_ms = now_ms.saturating_add(window_ms);

        Ok(WindowSnapshot {
            admitted,
            count: u32::try_from(state.timestamps.len()).unwrap_or(u32::MAX),
            oldest_ms: state.timestamps.first().copied(),
        })
    }
}
