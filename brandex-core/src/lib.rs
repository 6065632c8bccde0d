//! Brandex Core Library
//!
//! Core library for the brandex extraction service: the resilience
//! components (cache, rate limiter, circuit breaker, retrying fetcher), the
//! error taxonomy, and the pipeline that sequences them around pluggable
//! extraction strategies.
//!
//! # Features
//!
//! - **Graceful Degradation**: cache and rate limiter fail open; extraction
//!   strategies fail individually without aborting the request
//! - **Classified Failures**: every boundary error carries a taxonomy
//!   category, transport status, and trace id (`thiserror`-based)
//! - **Async/Await**: built on tokio; every cross-process call is bounded
//!   by a timeout and cancelable
//! - **Injected Seams**: backing stores, the page renderer, and strategies
//!   are trait objects chosen by the deployment
//!
//! # Example
//!
//! ```rust,no_run
//! use brandex_core::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let pipeline = Pipeline::in_memory(PipelineConfig::default(), vec![]).await?;
//!
//! let response = pipeline
//!     .extract(ExtractRequest::new("https://example.com", "203.0.113.9"))
//!     .await;
//! match response.outcome {
//!     Ok(identity) => println!("{}", serde_json::to_string_pretty(&identity)?),
//!     Err(report) => eprintln!("{}", report.to_boundary()),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Global suppressions; these lints apply broadly across the codebase and
// would require excessive local annotations.
//
// - module_name_repetitions: common library pattern (CacheConfig in cache)
// - missing_errors_doc / missing_panics_doc: too verbose for every Result fn
// - must_use_candidate: not all return values need #[must_use]
// - doc_markdown: technical terms in docs don't need backticks (TTL, UUID)
// - cast_sign_loss / cast_possible_wrap: common in timestamp math (i64 <-> u64)
// - struct_excessive_bools: retry config legitimately has many flags
// - return_self_not_must_use: builder methods return Self without must_use
// - unreadable_literal: timestamps read better without separators
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::unreadable_literal)]

// Re-exports of external dependencies
pub use serde;
pub use serde_json;

// Core modules
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod health;
pub mod logging;
pub mod pipeline;
pub mod rate_limiter;
pub mod retry_strategy;
pub mod secret;
pub mod store;
pub mod strategy;
pub mod time;
pub mod types;

// Re-exports of core types for convenience
pub use cache::{Cache, CacheConfig};
pub use circuit_breaker::{
    BreakerRegistry, BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState,
};
pub use config::PipelineConfig;
pub use error::{
    ContextExt, Error, ErrorCategory, ErrorReport, NetworkError, ParseError, Result,
};
pub use fetcher::{HttpRenderer, PageRenderer, RenderConfig, RenderedPage, RetryingFetcher};
pub use health::{ComponentHealth, HealthConfig, HealthMonitor, HealthStatus, SystemHealth};
pub use pipeline::{Pipeline, PipelineResponse};
pub use rate_limiter::{RateLimitDecision, RateLimiter, RateLimiterConfig};
pub use secret::SecretString;
pub use store::{KeyValueStore, MemoryStore, SlidingWindowStore, WindowSnapshot};
pub use strategy::{ColorSample, Contribution, ExtractionStrategy};
pub use types::{BrandColor, BrandIdentity, ColorRole, ExtractRequest, Logo};
// Re-export CancellationToken for convenient access
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```rust
/// use brandex_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cache::{Cache, CacheConfig};
    pub use crate::circuit_breaker::{
        BreakerRegistry, CircuitBreaker, CircuitBreakerConfig, CircuitState,
    };
    pub use crate::config::PipelineConfig;
    pub use crate::error::{ContextExt, Error, ErrorCategory, ErrorReport, Result};
    pub use crate::fetcher::{
        HttpRenderer, PageRenderer, RenderConfig, RenderedPage, RetryingFetcher,
    };
    pub use crate::health::{HealthConfig, HealthMonitor, HealthStatus, SystemHealth};
    pub use crate::logging::{init_logging, try_init_logging, LogConfig, LogFormat, LogLevel};
    pub use crate::pipeline::{Pipeline, PipelineResponse};
    pub use crate::rate_limiter::{RateLimitDecision, RateLimiter, RateLimiterConfig};
    pub use crate::retry_strategy::{BackoffKind, RetryConfig, RetryStrategy};
    pub use crate::secret::SecretString;
    pub use crate::store::{KeyValueStore, MemoryStore, SlidingWindowStore};
    pub use crate::strategy::{ColorSample, Contribution, ExtractionStrategy};
    pub use crate::time::{epoch_millis, epoch_seconds_f64, iso8601};
    pub use crate::types::{BrandColor, BrandIdentity, ColorRole, ExtractRequest, Logo};
    // Re-export CancellationToken for convenient access
    pub use serde::{Deserialize, Serialize};
    pub use tokio_util::sync::CancellationToken;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "brandex-core");
    }
}
