//! Content-addressed response cache with TTL expiry.
//!
//! Keys are derived from request payloads, so two requests for the same work
//! land on the same entry no matter how their JSON happens to be ordered.
//! The cache is an optimization only: when the backing store is unreachable
//! every lookup is a miss, every write is dropped, and callers proceed to do
//! the work themselves.
//!
//! # Features
//!
//! - **Content-Derived Keys**: `namespace:sha256(canonical payload)`
//! - **Graceful Degradation**: store outages never surface to callers
//! - **Bounded Latency**: every store call runs under [`store_timeout`]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{ConfigValidationError, ValidationResult};
use crate::store::{store_timeout, KeyValueStore, MemoryStore, DEFAULT_STORE_TIMEOUT};

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied by [`Cache::set`]. Default: 24 hours.
    pub default_ttl: Duration,

    /// Deadline for a single backing-store operation. Default: 500 ms.
    pub store_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(86_400),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl CacheConfig {
    /// Validates the cache configuration.
    ///
    /// # Validation Rules
    ///
    /// - `default_ttl` must be greater than zero
    /// - `store_timeout` must be greater than zero
    /// - a TTL under a minute or a store timeout over 5 seconds draws a
    ///   warning
    pub fn validate(&self) -> std::result::Result<ValidationResult, ConfigValidationError> {
        let mut warnings = Vec::new();

        if self.default_ttl.is_zero() {
            return Err(ConfigValidationError::invalid(
                "default_ttl",
                "default_ttl must be greater than zero",
            ));
        }

        if self.store_timeout.is_zero() {
            return Err(ConfigValidationError::invalid(
                "store_timeout",
                "store_timeout must be greater than zero",
            ));
        }

        if self.default_ttl < Duration::from_secs(60) {
            warnings.push(format!(
                "default_ttl {:?} is very short, entries will barely outlive the work that produced them",
                self.default_ttl
            ));
        }

        if self.store_timeout > Duration::from_secs(5) {
            warnings.push(format!(
                "store_timeout {:?} is long enough to stall the request path when the store hangs",
                self.store_timeout
            ));
        }

        Ok(ValidationResult::with_warnings(warnings))
    }
}

/// TTL cache over a [`KeyValueStore`].
///
/// Values are JSON documents. Availability of the store is probed once at
/// construction: an unreachable store puts the cache in disabled mode, where
/// all operations are quiet no-ops. Failures after construction are absorbed
/// per call and reported as misses.
///
/// # Example
///
/// ```rust
/// use brandex_core::cache::{Cache, CacheConfig};
/// use serde_json::json;
///
/// # async fn example() {
/// let cache = Cache::in_memory(CacheConfig::default()).await;
///
/// let key = Cache::make_key("brand", &json!({"url": "https://example.com"}));
/// if cache.get(&key).await.is_none() {
///     let result = json!({"name": "Example"});
///     cache.set(&key, &result).await;
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KeyValueStore>,
    config: CacheConfig,
    enabled: bool,
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("enabled", &self.enabled)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Cache {
    /// Connects to a backing store, probing it once.
    ///
    /// A failed probe logs a warning and returns the cache in disabled mode
    /// rather than failing construction; the system runs without caching.
    pub async fn connect(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        let probe = store_timeout(config.store_timeout, "probe", store.get("cache:probe")).await;
        let enabled = match probe {
            Ok(_) => true,
            Err(error) => {
                warn!(%error, "cache store unreachable, running with caching disabled");
                false
            }
        };
        Self {
            store,
            config,
            enabled,
        }
    }

    /// Creates a cache over a fresh in-process [`MemoryStore`].
    pub async fn in_memory(config: CacheConfig) -> Self {
        Self::connect(Arc::new(MemoryStore::new()), config).await
    }

    /// Creates a cache in disabled mode, for deployments that opt out of
    /// caching entirely.
    pub fn disabled(config: CacheConfig) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            config,
            enabled: false,
        }
    }

    /// Whether the construction-time probe succeeded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Derives the cache key for `payload` under `namespace`.
    ///
    /// The payload is serialized with object keys sorted at every depth and
    /// hashed, so logically equal payloads map to the same key. Array order
    /// is preserved; `[1, 2]` and `[2, 1]` are different payloads.
    pub fn make_key(namespace: &str, payload: &Value) -> String {
        let mut canonical = String::new();
        push_canonical(payload, &mut canonical);
        let digest = Sha256::digest(canonical.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        format!("{namespace}:{hex}")
    }

    /// Looks `key` up, returning the stored document on a hit.
    ///
    /// Store errors, timeouts, and undecodable entries all come back as
    /// `None`; an undecodable entry is dropped so it cannot poison later
    /// lookups.
    pub async fn get(&self, key: &str) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        match store_timeout(self.config.store_timeout, "get", self.store.get(key)).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key, "cache hit");
                    Some(value)
                }
                Err(error) => {
                    warn!(key, %error, "dropping undecodable cache entry");
                    let _ = store_timeout(
                        self.config.store_timeout,
                        "delete",
                        self.store.delete(key),
                    )
                    .await;
                    None
                }
            },
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(error) => {
                warn!(key, %error, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Stores `value` under `key` with the configured default TTL.
    ///
    /// Returns whether the write landed; failures are logged and absorbed.
    pub async fn set(&self, key: &str, value: &Value) -> bool {
        self.set_with_ttl(key, value, self.config.default_ttl).await
    }

    /// Stores `value` under `key` with an explicit TTL.
    pub async fn set_with_ttl(&self, key: &str, value: &Value, ttl: Duration) -> bool {
        if !self.enabled {
            return false;
        }
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(key, %error, "cache value failed to serialize, skipping write");
                return false;
            }
        };
        match store_timeout(
            self.config.store_timeout,
            "set",
            self.store.set_ex(key, ttl, &raw),
        )
        .await
        {
            Ok(()) => {
                debug!(key, ttl_secs = ttl.as_secs(), "cache write");
                true
            }
            Err(error) => {
                warn!(key, %error, "cache write failed");
                false
            }
        }
    }

    /// Removes `key`, reporting whether a live entry was present. Failures
    /// are absorbed as `false`.
    pub async fn delete(&self, key: &str) -> bool {
        if !self.enabled {
            return false;
        }
        match store_timeout(self.config.store_timeout, "delete", self.store.delete(key)).await {
            Ok(removed) => removed,
            Err(error) => {
                warn!(key, %error, "cache delete failed");
                false
            }
        }
    }

    /// Removes every cached entry. Administrative operation.
    ///
    /// Returns whether the clear landed. Like every other cache operation
    /// this never raises; a disabled cache or a store failure reports
    /// `false` and the admin surface relays that.
    pub async fn clear_all(&self) -> bool {
        if !self.enabled {
            return false;
        }
        match store_timeout(self.config.store_timeout, "clear", self.store.clear_all()).await {
            Ok(()) => true,
            Err(error) => {
                warn!(%error, "cache clear failed");
                false
            }
        }
    }
}

/// Writes `value` as JSON with object keys sorted at every depth.
///
/// Sorting is done here rather than relying on map iteration order so key
/// derivation stays stable across `serde_json` feature choices.
fn push_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                if let Some(inner) = map.get(*key) {
                    push_canonical(inner, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
