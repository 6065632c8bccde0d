//! Configuration validation error types.
//!
//! Every tunable config in the crate (`CacheConfig`, `RateLimiterConfig`,
//! `CircuitBreakerConfig`, `RetryConfig`, `RenderConfig`, `PipelineConfig`)
//! exposes a `validate()` method built on these types, so a bad deployment
//! setting fails at startup with a field-level message instead of surfacing
//! as odd runtime behavior.
//!
//! # Example
//!
//! ```rust
//! use brandex_core::error::ConfigValidationError;
//!
//! fn validate_failure_threshold(value: u32) -> Result<(), ConfigValidationError> {
//!     if value == 0 {
//!         return Err(ConfigValidationError::invalid(
//!             "failure_threshold",
//!             "must be at least 1",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Field-level configuration validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// Field value exceeds the maximum allowed value.
    #[error("Field '{field}' value {value} exceeds maximum {max}")]
    ValueTooHigh {
        /// The name of the configuration field.
        field: &'static str,
        /// The actual value that was provided.
        value: String,
        /// The maximum allowed value.
        max: String,
    },

    /// Field value is below the minimum allowed value.
    #[error("Field '{field}' value {value} is below minimum {min}")]
    ValueTooLow {
        /// The name of the configuration field.
        field: &'static str,
        /// The actual value that was provided.
        value: String,
        /// The minimum allowed value.
        min: String,
    },

    /// Field value is invalid for reasons other than range.
    #[error("Field '{field}' has invalid value: {reason}")]
    ValueInvalid {
        /// The name of the configuration field.
        field: &'static str,
        /// The reason why the value is invalid.
        reason: String,
    },

    /// Required field is missing.
    #[error("Required field '{field}' is missing")]
    ValueMissing {
        /// The name of the missing configuration field.
        field: &'static str,
    },
}

impl ConfigValidationError {
    /// Returns the field name associated with this error.
    #[must_use]
    pub fn field_name(&self) -> &'static str {
        match self {
            ConfigValidationError::ValueTooHigh { field, .. }
            | ConfigValidationError::ValueTooLow { field, .. }
            | ConfigValidationError::ValueInvalid { field, .. }
            | ConfigValidationError::ValueMissing { field } => field,
        }
    }

    /// Creates a new `ValueTooHigh` error.
    pub fn too_high<V: fmt::Display, M: fmt::Display>(
        field: &'static str,
        value: V,
        max: M,
    ) -> Self {
        ConfigValidationError::ValueTooHigh {
            field,
            value: value.to_string(),
            max: max.to_string(),
        }
    }

    /// Creates a new `ValueTooLow` error.
    pub fn too_low<V: fmt::Display, M: fmt::Display>(
        field: &'static str,
        value: V,
        min: M,
    ) -> Self {
        ConfigValidationError::ValueTooLow {
            field,
            value: value.to_string(),
            min: min.to_string(),
        }
    }

    /// Creates a new `ValueInvalid` error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigValidationError::ValueInvalid {
            field,
            reason: reason.into(),
        }
    }

    /// Creates a new `ValueMissing` error.
    pub fn missing(field: &'static str) -> Self {
        ConfigValidationError::ValueMissing { field }
    }
}

/// Result of a successful validation, carrying non-fatal warnings.
///
/// Warnings flag settings that are legal but likely unintended: a one-second
/// rate window, a breaker that re-probes every 100 ms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Warnings generated during validation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates a new empty validation result.
    #[must_use]
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Creates a validation result carrying the given warnings.
    #[must_use]
    pub fn with_warnings(warnings: Vec<String>) -> Self {
        Self { warnings }
    }

    /// Adds a warning to the validation result.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Returns `true` if there are no warnings.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Returns `true` if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Merges another validation result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.warnings.extend(other.warnings);
    }
}
