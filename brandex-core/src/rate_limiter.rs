//! Per-identity rate limiting over a sliding-window log.
//!
//! Each identity gets an ordered log of admitted request timestamps in the
//! backing store. A check prunes the log to the trailing window, admits the
//! request while capacity remains, and reports the allowance either way.
//! Counting real timestamps instead of fixed buckets means a burst at the
//! end of one minute cannot combine with a burst at the start of the next
//! to double the effective limit.
//!
//! The limiter fails open: when the store is unreachable the check allows
//! the request and says so in the log. Availability of the service wins
//! over precision of the limit.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ConfigValidationError, ValidationResult};
use crate::store::{store_timeout, MemoryStore, SlidingWindowStore, DEFAULT_STORE_TIMEOUT};
use crate::time::epoch_millis;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum admitted requests per identity per window. Default: 60.
    pub limit: u32,

    /// Length of the trailing window. Default: 1 hour.
    pub window: Duration,

    /// Deadline for the store update backing one check. Default: 500 ms.
    pub store_timeout: Duration,

    /// Prefix for per-identity store keys. Default: `rate:limit`.
    pub key_prefix: String,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            limit: 60,
            window: Duration::from_secs(3_600),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            key_prefix: "rate:limit".to_string(),
        }
    }
}

impl RateLimiterConfig {
    /// Creates a configuration with the given allowance.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            ..Self::default()
        }
    }

    /// Validates the rate limiter configuration.
    ///
    /// # Validation Rules
    ///
    /// - `limit` must be greater than 0
    /// - `window` must be greater than zero
    /// - `key_prefix` must be non-empty
    /// - a sub-second window draws a warning
    pub fn validate(&self) -> std::result::Result<ValidationResult, ConfigValidationError> {
        let mut warnings = Vec::new();

        if self.limit == 0 {
            return Err(ConfigValidationError::invalid(
                "limit",
                "limit must be greater than 0",
            ));
        }

        if self.window.is_zero() {
            return Err(ConfigValidationError::invalid(
                "window",
                "window must be greater than zero",
            ));
        }

        if self.key_prefix.is_empty() {
            return Err(ConfigValidationError::missing("key_prefix"));
        }

        if self.window < Duration::from_secs(1) {
            warnings.push(format!(
                "window {:?} is shorter than a second, the limit will rarely bind",
                self.window
            ));
        }

        Ok(ValidationResult::with_warnings(warnings))
    }
}

/// Outcome of one rate limit check.
///
/// Produced for every check, allowed or not, so callers can always expose
/// the current allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// The configured allowance.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the oldest admitted request ages out, milliseconds since epoch.
    pub reset_at_ms: i64,
    /// True when the store was unreachable and the request was waved
    /// through without being counted. Such a decision advertises zero
    /// remaining allowance since the real count is unknown.
    pub degraded: bool,
}

impl RateLimitDecision {
    /// Reset time in whole seconds since epoch, rounded up so a client
    /// sleeping until it never lands a tick early.
    pub fn reset_at_seconds(&self) -> i64 {
        self.reset_at_ms.div_euclid(1_000)
            + i64::from(self.reset_at_ms.rem_euclid(1_000) > 0)
    }

    /// How long a rejected caller should wait before retrying, measured
    /// from `now_ms`. `None` when the request was allowed.
    pub fn retry_after(&self, now_ms: i64) -> Option<Duration> {
        if self.allowed {
            return None;
        }
        let wait_ms = self.reset_at_ms.saturating_sub(now_ms).max(0);
        Some(Duration::from_millis(u64::try_from(wait_ms).unwrap_or(0)))
    }

    /// The `X-Rate-Limit-*` response header trio, attached to responses on
    /// rate-limited routes whether or not the request was allowed.
    pub fn to_headers(&self) -> [(&'static str, String); 3] {
        [
            ("X-Rate-Limit-Limit", self.limit.to_string()),
            ("X-Rate-Limit-Remaining", self.remaining.to_string()),
            ("X-Rate-Limit-Reset", self.reset_at_seconds().to_string()),
        ]
    }
}

/// Sliding-window rate limiter over a [`SlidingWindowStore`].
///
/// # Example
///
/// ```rust
/// use brandex_core::rate_limiter::{RateLimiter, RateLimiterConfig};
/// use std::time::Duration;
///
/// # async fn example() {
/// let limiter = RateLimiter::in_memory(RateLimiterConfig::new(60, Duration::from_secs(3_600)));
///
/// let decision = limiter.check("client-42").await;
/// if !decision.allowed {
///     // reject the request, decision.reset_at_ms says when to come back
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn SlidingWindowStore>,
    config: RateLimiterConfig,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Creates a limiter over the given store.
    pub fn new(store: Arc<dyn SlidingWindowStore>, config: RateLimiterConfig) -> Self {
        Self { store, config }
    }

    /// Creates a limiter over a fresh in-process [`MemoryStore`].
    pub fn in_memory(config: RateLimiterConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Checks whether `identity` may make a request right now, recording it
    /// when admitted.
    pub async fn check(&self, identity: &str) -> RateLimitDecision {
        self.check_at(identity, epoch_millis()).await
    }

    /// Check against an explicit clock. Separated from [`Self::check`] so
    /// window behavior is testable without waiting out real windows.
    async fn check_at(&self, identity: &str, now_ms: i64) -> RateLimitDecision {
        let key = format!("{}:{}", self.config.key_prefix, identity);
        let window_ms = i64::try_from(self.config.window.as_millis()).unwrap_or(i64::MAX);

        let recorded = store_timeout(
            self.config.store_timeout,
            "record",
            self.store
                .record(&key, now_ms, self.config.window, self.config.limit),
        )
        .await;

        match recorded {
            Ok(snapshot) => {
                let decision = RateLimitDecision {
                    allowed: snapshot.admitted,
                    limit: self.config.limit,
                    remaining: self.config.limit.saturating_sub(snapshot.count),
                    reset_at_ms: snapshot
                        .oldest_ms
                        .unwrap_or(now_ms)
                        .saturating_add(window_ms),
                    degraded: false,
                };
                if decision.allowed {
                    debug!(identity, remaining = decision.remaining, "rate limit check passed");
                } else {
                    warn!(
                        identity,
                        reset_at_ms = decision.reset_at_ms,
                        "rate limit exceeded"
                    );
                }
                decision
            }
            Err(error) => {
                warn!(identity, %error, "rate limit store unavailable, failing open");
                RateLimitDecision {
                    allowed: true,
                    limit: self.config.limit,
                    remaining: 0,
                    reset_at_ms: now_ms.saturating_add(window_ms),
                    degraded: true,
                }
            }
        }
    }
}
