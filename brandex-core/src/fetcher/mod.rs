//! Resilient page fetching.
//!
//! The fetcher wraps a [`PageRenderer`] with the retry and circuit-breaker
//! machinery:
//!
//! - Each navigation gets a hard per-attempt timeout.
//! - Transient failures retry per [`RetryStrategy`](crate::retry_strategy::RetryStrategy),
//!   with backoff between attempts.
//! - The whole retried fetch counts as one call against the renderer's
//!   circuit breaker: however many attempts it took, an exhausted fetch
//!   records a single failure and a recovered one records a single success.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use brandex_core::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use brandex_core::fetcher::{FetcherConfig, HttpRenderer, RenderConfig, RetryingFetcher};
//!
//! # async fn demo() -> brandex_core::error::Result<()> {
//! let renderer = Arc::new(HttpRenderer::new(RenderConfig::default())?);
//! let breaker = Arc::new(CircuitBreaker::new("renderer", CircuitBreakerConfig::renderer()));
//! let fetcher = RetryingFetcher::new(renderer, breaker, FetcherConfig::default());
//!
//! let page = fetcher.fetch("https://example.com").await?;
//! println!("landed on {}", page.final_url);
//! # Ok(())
//! # }
//! ```

mod http;
mod renderer;

pub use http::{HttpRenderer, RenderConfig, DEFAULT_MAX_BODY_BYTES};
pub use renderer::{PageRenderer, RenderedPage};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::error::config::{ConfigValidationError, ValidationResult};
use crate::error::{Error, Result};
use crate::retry_strategy::{RetryConfig, RetryStrategy};

/// Backstop timeout for a single render attempt. Slightly above the HTTP
/// renderer's own navigation timeout so the renderer classifies its
/// timeouts first; for renderers without an internal budget this is the
/// only one.
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(35);

/// Configuration for [`RetryingFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Retry policy across attempts.
    pub retry: RetryConfig,
    /// Hard timeout for each individual attempt.
    pub attempt_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl FetcherConfig {
    /// Validates the configuration, including the nested retry policy.
    ///
    /// # Errors
    ///
    /// Returns the first fatal problem found.
    pub fn validate(&self) -> std::result::Result<ValidationResult, ConfigValidationError> {
        let mut result = self.retry.validate()?;
        if self.attempt_timeout.is_zero() {
            return Err(ConfigValidationError::invalid(
                "attempt_timeout",
                "must be greater than zero",
            ));
        }
        if self.attempt_timeout < Duration::from_millis(100) {
            result.add_warning(format!(
                "attempt_timeout of {:?} will abort most real page loads",
                self.attempt_timeout
            ));
        }
        Ok(result)
    }
}

/// Fetches pages through a renderer with retries and breaker accounting.
pub struct RetryingFetcher {
    renderer: Arc<dyn PageRenderer>,
    breaker: Arc<CircuitBreaker>,
    strategy: RetryStrategy,
    attempt_timeout: Duration,
}

impl fmt::Debug for RetryingFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingFetcher")
            .field("breaker", &self.breaker.name())
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

impl RetryingFetcher {
    /// Creates a fetcher guarding `renderer` with `breaker`.
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        breaker: Arc<CircuitBreaker>,
        config: FetcherConfig,
    ) -> Self {
        Self {
            renderer,
            breaker,
            strategy: RetryStrategy::new(config.retry),
            attempt_timeout: config.attempt_timeout,
        }
    }

    /// Returns the circuit breaker guarding the renderer.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Releases the renderer's long-lived resources.
    pub async fn close(&self) -> Result<()> {
        self.renderer.close().await
    }

    /// Fetches `url`, retrying transient failures.
    ///
    /// The breaker is consulted once before the first attempt and records
    /// exactly one outcome for the whole fetch. An open breaker rejects
    /// immediately without touching the renderer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircuitOpen`] when the breaker refuses the call,
    /// otherwise the last attempt's error once retries are exhausted.
    pub async fn fetch(&self, url: &str) -> Result<RenderedPage> {
        self.breaker.allow_request()?;

        match self.attempt_loop(url).await {
            Ok(page) => {
                self.breaker.record_success();
                Ok(page)
            }
            Err(error) => {
                self.breaker.record_failure();
                Err(error.context(format!("Failed to fetch {url}")))
            }
        }
    }

    async fn attempt_loop(&self, url: &str) -> Result<RenderedPage> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.attempt_once(url, attempt).await {
                Ok(page) => {
                    debug!(url, attempt, "fetch completed");
                    return Ok(page);
                }
                Err(error) => {
                    if self.strategy.should_retry(&error, attempt) {
                        let delay = self.strategy.delay(attempt, &error);
                        warn!(
                            url,
                            attempt,
                            delay_ms = delay.as_millis(),
                            error = %error,
                            "fetch attempt failed, retrying after delay"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        warn!(url, attempt, error = %error, "fetch attempt failed, giving up");
                        return Err(error);
                    }
                }
            }
        }
    }

    async fn attempt_once(&self, url: &str, attempt: u32) -> Result<RenderedPage> {
        match tokio::time::timeout(self.attempt_timeout, self.renderer.render(url)).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(format!(
                "attempt {attempt} against {url} exceeded {:?}",
                self.attempt_timeout
            ))),
        }
    }
}
