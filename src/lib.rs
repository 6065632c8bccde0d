//! # Brandex
//!
//! Resilient brand identity extraction: fetch a website, survive its
//! failures, and return its logo, palette, and naming as structured data.
//!
//! ## Features
//!
//! - **Resilience First**: circuit breaker, sliding-window rate limiter,
//!   retrying fetcher, and a TTL cache wired around every outbound call
//! - **Graceful Degradation**: infrastructure failures shrink the result,
//!   they do not fail the request
//! - **Classified Errors**: one taxonomy from internal failure to boundary
//!   response, with trace ids throughout
//! - **Pluggable Extraction**: strategies are trait objects; the default
//!   set scans metadata, images, icons, and CSS
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brandex::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let pipeline =
//!         Pipeline::in_memory(PipelineConfig::default(), default_strategies()).await?;
//!
//!     let response = pipeline
//!         .extract(ExtractRequest::new("https://example.com", "local"))
//!         .await;
//!     match response.outcome {
//!         Ok(identity) => println!("{}", serde_json::to_string_pretty(&identity)?),
//!         Err(report) => eprintln!("{}", report.to_boundary()),
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Re-export core types and traits
pub use brandex_core::{
    error::{Error, ErrorCategory, ErrorReport, Result},
    types::*,
    Cache, CacheConfig, CancellationToken, CircuitBreaker, CircuitBreakerConfig, HealthMonitor,
    Pipeline, PipelineConfig, PipelineResponse, RateLimiter, RateLimiterConfig, SecretString,
};

// Re-export the default extraction strategies
pub use brandex_extractors::{
    default_strategies, ImgTagLogo, InlineStyleColors, LinkIconLogo, MetaTagLogo, StylesheetColors,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use brandex_core::prelude::*;
    pub use brandex_extractors::default_strategies;
}
