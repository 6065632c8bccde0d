//! Retry policy for outbound fetches.
//!
//! Decides which errors are worth a second attempt and how long to wait
//! before it. The policy is passive: the retrying fetcher drives the loop
//! and asks [`RetryStrategy::should_retry`] / [`RetryStrategy::delay`]
//! between attempts.
//!
//! Transient failures (timeouts, connection resets, upstream 5xx, rate
//! limit pushback) are retried. Everything that would fail the same way
//! again, bad input, auth rejections, parse failures, is not. A breaker
//! rejection is never retried here; the breaker already said when to come
//! back.

use std::time::Duration;

use crate::error::{ConfigValidationError, Error, ValidationResult};

/// How the delay grows across attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    /// Constant delay between attempts.
    Fixed,
    /// Delay doubles each attempt: `base * 2^(attempt-1)`.
    Exponential,
    /// Delay grows linearly: `base * attempt`.
    Linear,
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt. Default: 2, so three attempts
    /// total.
    pub max_retries: u32,
    /// Delay growth curve. Default: exponential.
    pub backoff: BackoffKind,
    /// Base delay in milliseconds. Default: 2000, giving 2 s then 4 s.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay. Default: 30000.
    pub max_delay_ms: u64,
    /// Retry connection-level failures. Default: true.
    pub retry_on_connect: bool,
    /// Retry timeouts. Default: true.
    pub retry_on_timeout: bool,
    /// Retry upstream 5xx responses. Default: true.
    pub retry_on_server_error: bool,
    /// Retry rate limit pushback. Default: true.
    pub retry_on_rate_limit: bool,
    /// Jitter factor in `0.0..=1.0` added on top of each delay so parallel
    /// clients do not retry in lockstep. Default: 0.1.
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: BackoffKind::Exponential,
            base_delay_ms: 2_000,
            max_delay_ms: 30_000,
            retry_on_connect: true,
            retry_on_timeout: true,
            retry_on_server_error: true,
            retry_on_rate_limit: true,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// One cautious retry on connection failures only, for callers that
    /// cannot afford to repeat slow work.
    pub fn conservative() -> Self {
        Self {
            max_retries: 1,
            backoff: BackoffKind::Fixed,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
            retry_on_timeout: false,
            retry_on_server_error: false,
            retry_on_rate_limit: false,
            jitter_factor: 0.0,
            ..Self::default()
        }
    }

    /// Retries everything transient for longer, for background work where
    /// latency matters less than completion.
    pub fn aggressive() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            jitter_factor: 0.2,
            ..Self::default()
        }
    }

    /// Validates the retry configuration.
    ///
    /// # Validation Rules
    ///
    /// - `max_retries` must be <= 10
    /// - `base_delay_ms` must be >= 10
    /// - `jitter_factor` must lie in `0.0..=1.0`
    /// - `max_delay_ms` below `base_delay_ms` draws a warning
    pub fn validate(&self) -> std::result::Result<ValidationResult, ConfigValidationError> {
        let mut warnings = Vec::new();

        if self.max_retries > 10 {
            return Err(ConfigValidationError::too_high(
                "max_retries",
                self.max_retries,
                10,
            ));
        }

        if self.base_delay_ms < 10 {
            return Err(ConfigValidationError::too_low(
                "base_delay_ms",
                self.base_delay_ms,
                10,
            ));
        }

        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigValidationError::invalid(
                "jitter_factor",
                "jitter_factor must lie in 0.0..=1.0",
            ));
        }

        if self.max_delay_ms < self.base_delay_ms {
            warnings.push(format!(
                "max_delay_ms {} is below base_delay_ms {}, every delay will be clamped",
                self.max_delay_ms, self.base_delay_ms
            ));
        }

        Ok(ValidationResult::with_warnings(warnings))
    }
}

/// Retry policy over a [`RetryConfig`].
#[derive(Debug)]
pub struct RetryStrategy {
    config: RetryConfig,
}

impl RetryStrategy {
    /// Creates a strategy with the given configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Whether `error` deserves another attempt.
    ///
    /// `attempt` is the 1-based number of the retry being considered.
    /// Classification looks through [`Error::Context`] wrapping, so an
    /// annotated timeout still retries.
    pub fn should_retry(&self, error: &Error, attempt: u32) -> bool {
        if attempt > self.config.max_retries {
            return false;
        }
        if error.is_circuit_open() || error.as_cancelled().is_some() {
            return false;
        }
        if error.is_timeout() {
            return self.config.retry_on_timeout;
        }
        if error.is_connection_failure() {
            return self.config.retry_on_connect;
        }
        if error.as_rate_limited().is_some() {
            return self.config.retry_on_rate_limit;
        }
        if error.upstream_status().is_some_and(|status| status >= 500) {
            return self.config.retry_on_server_error;
        }
        false
    }

    /// Delay to sleep before retry number `attempt` (1-based).
    ///
    /// Rate limit pushback is never retried in under two seconds, and a
    /// server-provided `retry_after` hint raises the delay further when it
    /// is longer than the computed backoff.
    pub fn delay(&self, attempt: u32, error: &Error) -> Duration {
        let base = match self.config.backoff {
            BackoffKind::Fixed => self.config.base_delay_ms,
            BackoffKind::Exponential => self
                .config
                .base_delay_ms
                .saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1))),
            BackoffKind::Linear => self.config.base_delay_ms.saturating_mul(u64::from(attempt)),
        };

        let mut delay_ms = base.min(self.config.max_delay_ms);

        if error.as_rate_limited().is_some() {
            let hint_ms = error
                .retry_after()
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
                .unwrap_or(0);
            delay_ms = delay_ms.max(2_000).max(hint_ms);
        }

        if self.config.jitter_factor > 0.0 {
            delay_ms = self.apply_jitter(delay_ms);
        }

        Duration::from_millis(delay_ms)
    }

    /// Adds up to `jitter_factor` of random extra delay.
    fn apply_jitter(&self, delay_ms: u64) -> u64 {
        use rand::Rng;
        let mut rng = rand::rngs::ThreadRng::default();
        #[allow(clippy::cast_precision_loss)]
        #[allow(clippy::cast_possible_truncation)]
        #[allow(clippy::cast_sign_loss)]
        let jitter_range = (delay_ms as f64 * self.config.jitter_factor) as u64;
        delay_ms.saturating_add(rng.random_range(0..=jitter_range))
    }

    /// Returns a reference to the retry configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
