//! # Error handling
//!
//! A single strongly-typed [`Error`] covers every failure the pipeline can
//! produce, and every variant classifies into the fixed taxonomy
//! ([`ErrorCategory`]) with a transport status — see [`ErrorReport`] for the
//! boundary side of that story.
//!
//! Design points, shared across the crate:
//!
//! 1. **Typed variants** via `thiserror`, `#[non_exhaustive]` for forward
//!    compatibility
//! 2. **No panics** on recoverable paths; errors propagate with `?`
//! 3. **Context chains**: [`ContextExt`] wraps errors without hiding them
//!    from classification or retry checks
//! 4. **Compact layout**: large payloads are boxed, messages use
//!    `Cow<'static, str>` so static strings never allocate
//!
//! ## Error hierarchy
//!
//! ```text
//! Error
//! ├── Network        - transport failures while fetching (via NetworkError)
//! ├── CircuitOpen    - a breaker rejected the call without attempting it
//! ├── Timeout        - attempt or deadline timeout
//! ├── Validation     - bad caller input (URL, parameters)
//! ├── Parse          - malformed dependency content (via ParseError)
//! ├── RateLimited    - request budget exceeded
//! ├── Authentication - missing/mismatched secret
//! ├── Authorization  - authenticated but not permitted
//! ├── Resource       - missing or exhausted resource
//! ├── Storage        - backing-store failure (cache / rate window)
//! ├── Config         - invalid configuration (via ConfigValidationError)
//! ├── Cancelled      - cancelled before completion
//! ├── Internal       - anything unrecognized
//! └── Context        - wrapper preserving the chain
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use brandex_core::error::{Error, Result, ContextExt};
//!
//! fn check_target(url: &str) -> Result<()> {
//!     if url.is_empty() {
//!         return Err(Error::validation("URL cannot be empty"));
//!     }
//!     Ok(())
//! }
//!
//! fn handle(err: Error) {
//!     if err.is_retryable() {
//!         // transient: timeout, connection failure, rate limit
//!     }
//!     if err.is_circuit_open() {
//!         // fall back instead of hammering the dependency
//!     }
//!     println!("{}", err.report());
//! }
//! ```

mod context;
mod convert;
mod network;
mod parse;
mod report;

pub mod config;

use std::borrow::Cow;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

pub use config::{ConfigValidationError, ValidationResult};
pub use context::ContextExt;
pub use network::NetworkError;
pub use parse::ParseError;
pub use report::{ErrorCategory, ErrorReport, REDACTED_KEYS};

pub(crate) use convert::truncate_message;

/// Result type alias for all brandex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type for the brandex crates.
///
/// Large variants are boxed to keep the enum small; message fields use
/// `Cow<'static, str>` so static strings carry no allocation.
///
/// # Example
///
/// ```rust
/// use brandex_core::error::Error;
///
/// let err = Error::authentication("Invalid or missing admin token");
/// assert!(err.to_string().contains("admin token"));
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Transport failures while fetching a target. Boxed to reduce enum size.
    #[error("Network error: {0}")]
    Network(Box<NetworkError>),

    /// A circuit breaker rejected the call without attempting it.
    #[error("Circuit breaker '{dependency}' is open")]
    CircuitOpen {
        /// The protected dependency name.
        dependency: Cow<'static, str>,
        /// Time until the breaker will probe recovery, when known.
        retry_in: Option<Duration>,
    },

    /// Operation timed out (single attempt or overall deadline).
    #[error("Timeout: {0}")]
    Timeout(Cow<'static, str>),

    /// Caller input failed validation.
    #[error("Validation error: {0}")]
    Validation(Cow<'static, str>),

    /// A dependency answered with content that could not be understood.
    /// Boxed to reduce enum size.
    #[error("Parse error: {0}")]
    Parse(Box<ParseError>),

    /// Request budget exceeded, with optional retry information.
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        /// Error message.
        message: Cow<'static, str>,
        /// Optional duration to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// Missing or mismatched credentials.
    #[error("Authentication error: {0}")]
    Authentication(Cow<'static, str>),

    /// Authenticated but not permitted to perform the operation.
    #[error("Authorization error: {0}")]
    Authorization(Cow<'static, str>),

    /// A required resource does not exist or is exhausted.
    #[error("Resource error: {0}")]
    Resource(Cow<'static, str>),

    /// A backing store (cache or rate window) failed or timed out.
    #[error("Storage error: {0}")]
    Storage(Cow<'static, str>),

    /// Invalid configuration. Boxed to reduce enum size.
    #[error("Configuration error: {0}")]
    Config(Box<ConfigValidationError>),

    /// The operation was cancelled before completing.
    #[error("Cancelled: {0}")]
    Cancelled(Cow<'static, str>),

    /// Internal failure with no more precise classification.
    #[error("Internal error: {0}")]
    Internal(Cow<'static, str>),

    /// Error with additional context, preserving the chain.
    #[error("{context}")]
    Context {
        /// What operation failed.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    // ==================== Constructors ====================

    /// Creates a network error from a connection-failure message.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(Box::new(NetworkError::ConnectionFailed(msg.into())))
    }

    /// Creates a circuit-open rejection for a dependency.
    ///
    /// `retry_in` is the remaining recovery window, when the breaker knows it.
    pub fn circuit_open(
        dependency: impl Into<Cow<'static, str>>,
        retry_in: Option<Duration>,
    ) -> Self {
        Self::CircuitOpen {
            dependency: dependency.into(),
            retry_in,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Creates a validation error.
    pub fn validation(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for structurally malformed content.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(Box::new(ParseError::Content(msg.into())))
    }

    /// Creates a rate limit error with optional retry duration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use brandex_core::error::Error;
    /// use std::time::Duration;
    ///
    /// let err = Error::rate_limited("Rate limit exceeded", Some(Duration::from_secs(60)));
    /// assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
    /// ```
    pub fn rate_limited(
        message: impl Into<Cow<'static, str>>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Creates an authorization error.
    pub fn authorization(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Creates a resource error.
    pub fn resource(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Resource(msg.into())
    }

    /// Creates a storage error.
    pub fn storage(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates a cancelled error.
    pub fn cancelled(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal(msg.into())
    }

    // ==================== Context ====================

    /// Attaches context to an existing error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use brandex_core::error::Error;
    ///
    /// let err = Error::network("connection refused")
    ///     .context("Failed to render https://example.com");
    /// assert_eq!(err.transport_status(), 502);
    /// ```
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    // ==================== Chain traversal ====================

    /// Iterates the error chain, penetrating context layers.
    fn iter_chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |err| match err {
            Error::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        })
    }

    /// Returns the root cause of the error, skipping context layers.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        self.iter_chain().last().unwrap_or(self)
    }

    /// Renders the full error chain, one cause per line.
    ///
    /// # Example
    ///
    /// ```rust
    /// use brandex_core::error::Error;
    ///
    /// let err = Error::network("connection refused")
    ///     .context("Failed to render page");
    /// let report = err.report();
    /// assert!(report.contains("Caused by:"));
    /// ```
    #[must_use]
    pub fn report(&self) -> String {
        use std::fmt::Write;
        let mut report = String::new();
        report.push_str(&self.to_string());

        let mut current: Option<&(dyn StdError + 'static)> = self.source();
        while let Some(err) = current {
            let _ = write!(report, "\nCaused by: {err}");
            current = err.source();
        }
        report
    }

    // ==================== Predicates (context penetrating) ====================

    /// Checks if this error is inherently transient and worth retrying.
    ///
    /// True for timeouts, connection failures and rate limits. Upstream
    /// failure statuses are judged separately by the retry policy, which
    /// consults [`Error::upstream_status`].
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(ne) => matches!(
                ne.as_ref(),
                NetworkError::Timeout | NetworkError::ConnectionFailed(_)
            ),
            Error::RateLimited { .. } | Error::Timeout(_) => true,
            Error::Context { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Checks if this error is a timeout of any kind.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Network(ne) => matches!(ne.as_ref(), NetworkError::Timeout),
            Error::Context { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Checks if this error is a failure to connect.
    #[must_use]
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Error::Network(ne) => matches!(
                ne.as_ref(),
                NetworkError::ConnectionFailed(_) | NetworkError::Transport(_)
            ),
            Error::Context { source, .. } => source.is_connection_failure(),
            _ => false,
        }
    }

    /// Checks if this error is a circuit-open rejection.
    #[must_use]
    pub fn is_circuit_open(&self) -> bool {
        self.as_circuit_open().is_some()
    }

    /// Returns the dependency name if this is a circuit-open rejection.
    #[must_use]
    pub fn as_circuit_open(&self) -> Option<&str> {
        match self {
            Error::CircuitOpen { dependency, .. } => Some(dependency.as_ref()),
            Error::Context { source, .. } => source.as_circuit_open(),
            _ => None,
        }
    }

    /// Returns the retry delay if one is attached (rate limits and
    /// circuit-open rejections carry one).
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited { retry_after, .. } => *retry_after,
            Error::CircuitOpen { retry_in, .. } => *retry_in,
            Error::Context { source, .. } => source.retry_after(),
            _ => None,
        }
    }

    /// Returns the rate limit message and retry duration, if applicable.
    #[must_use]
    pub fn as_rate_limited(&self) -> Option<(&str, Option<Duration>)> {
        match self {
            Error::RateLimited {
                message,
                retry_after,
            } => Some((message.as_ref(), *retry_after)),
            Error::Context { source, .. } => source.as_rate_limited(),
            _ => None,
        }
    }

    /// Returns the authentication failure message, if applicable.
    #[must_use]
    pub fn as_authentication(&self) -> Option<&str> {
        match self {
            Error::Authentication(msg) => Some(msg.as_ref()),
            Error::Context { source, .. } => source.as_authentication(),
            _ => None,
        }
    }

    /// Returns the cancellation message, if applicable.
    #[must_use]
    pub fn as_cancelled(&self) -> Option<&str> {
        match self {
            Error::Cancelled(msg) => Some(msg.as_ref()),
            Error::Context { source, .. } => source.as_cancelled(),
            _ => None,
        }
    }

    /// Returns the upstream HTTP status if the target responded with one.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::Network(ne) => match ne.as_ref() {
                NetworkError::RequestFailed { status, .. } => Some(*status),
                _ => None,
            },
            Error::Context { source, .. } => source.upstream_status(),
            _ => None,
        }
    }
}
