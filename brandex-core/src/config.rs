//! Pipeline-level configuration.
//!
//! [`PipelineConfig`] aggregates every component's configuration so a
//! deployment tunes one struct and validates it once at startup.
//! Component-level details live with their components: [`CacheConfig`],
//! [`RateLimiterConfig`], [`FetcherConfig`], [`RenderConfig`],
//! [`HealthConfig`].

use std::time::Duration;

use crate::cache::CacheConfig;
use crate::error::config::{ConfigValidationError, ValidationResult};
use crate::fetcher::{FetcherConfig, RenderConfig};
use crate::health::HealthConfig;
use crate::rate_limiter::RateLimiterConfig;
use crate::secret::SecretString;

/// Default overall budget for one extraction request.
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(60);

/// Top-level configuration for [`Pipeline`](crate::pipeline::Pipeline).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub cache: CacheConfig,
    pub rate_limiter: RateLimiterConfig,
    pub fetcher: FetcherConfig,
    pub render: RenderConfig,
    pub health: HealthConfig,
    /// Overall deadline for one request, covering fetch and extraction.
    /// Rate limiting is checked before the clock starts.
    pub request_deadline: Duration,
    /// Shared secret guarding the administrative cache clear. `None`
    /// disables the operation entirely.
    pub admin_secret: Option<SecretString>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            rate_limiter: RateLimiterConfig::default(),
            fetcher: FetcherConfig::default(),
            render: RenderConfig::default(),
            health: HealthConfig::default(),
            request_deadline: DEFAULT_REQUEST_DEADLINE,
            admin_secret: None,
        }
    }
}

impl PipelineConfig {
    /// Validates this configuration and every nested one.
    ///
    /// # Errors
    ///
    /// Returns the first fatal problem found, carrying the offending field
    /// name. Warnings from all nested configs are merged.
    pub fn validate(&self) -> std::result::Result<ValidationResult, ConfigValidationError> {
        let mut result = self.cache.validate()?;
        result.merge(self.rate_limiter.validate()?);
        result.merge(self.fetcher.validate()?);
        result.merge(self.render.validate()?);
        result.merge(self.health.validate()?);

        if self.request_deadline.is_zero() {
            return Err(ConfigValidationError::invalid(
                "request_deadline",
                "must be greater than zero",
            ));
        }
        if let Some(secret) = &self.admin_secret {
            if secret.is_empty() {
                return Err(ConfigValidationError::invalid(
                    "admin_secret",
                    "must not be empty when set",
                ));
            }
        }

        if self.request_deadline < self.fetcher.attempt_timeout {
            result.add_warning(format!(
                "request_deadline {:?} is shorter than one fetch attempt ({:?})",
                self.request_deadline, self.fetcher.attempt_timeout
            ));
        }
        if self.admin_secret.is_none() {
            result.add_warning("admin_secret unset, administrative cache clear is disabled".to_owned());
        }
        Ok(result)
    }
}
