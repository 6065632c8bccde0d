//! Network-level failure types for the fetch path.

use std::error::Error as StdError;
use thiserror::Error;

/// Transport-layer failures raised while rendering a target.
///
/// Wraps everything the HTTP stack can throw without exposing `reqwest` types
/// in the public API, so the renderer implementation can change without
/// breaking callers.
///
/// # Retryable variants
///
/// [`NetworkError::Timeout`] and [`NetworkError::ConnectionFailed`] are
/// transient and eligible for retry; the remaining variants describe the
/// upstream site misbehaving and are gated by the retry policy's status
/// rules instead.
///
/// # Example
///
/// ```rust
/// use brandex_core::error::NetworkError;
///
/// fn describe(err: &NetworkError) -> String {
///     match err {
///         NetworkError::RequestFailed { status, .. } => format!("upstream returned {status}"),
///         NetworkError::Timeout => "navigation timed out".to_string(),
///         other => other.to_string(),
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NetworkError {
    /// The target responded with a failure status.
    #[error("Request failed with status {status}: {message}")]
    RequestFailed {
        /// HTTP status code returned by the target.
        status: u16,
        /// Upstream error text, truncated server-side.
        message: String,
    },

    /// Navigation or request timed out.
    #[error("Request timeout")]
    Timeout,

    /// Could not connect to the target (refused, DNS, TLS handshake).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The response body exceeded the configured size cap.
    #[error("Response body exceeded {limit} bytes")]
    BodyTooLarge {
        /// Configured maximum body size in bytes.
        limit: usize,
    },

    /// Opaque transport failure, preserving the source for server-side logs.
    #[error("Transport error")]
    Transport(#[source] Box<dyn StdError + Send + Sync + 'static>),
}
