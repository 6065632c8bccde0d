//! Failure classification and the boundary error report.
//!
//! Every failure that crosses the system boundary is first classified into an
//! [`ErrorReport`]: a category from the fixed taxonomy, a transport status, a
//! client-safe message, and whatever request context the caller attached. The
//! report has two serializations with different audiences:
//!
//! - [`ErrorReport::log`] — the full server-side record (cause chain
//!   included), emitted through `tracing` at a severity derived from the
//!   transport status.
//! - [`ErrorReport::to_boundary`] — the client-facing envelope
//!   `{"error": {...}}`, which never includes the cause chain and drops
//!   secret-looking context keys.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Error, NetworkError};
use crate::time::epoch_seconds_f64;

/// Context keys that are never serialized, compared case-insensitively.
pub const REDACTED_KEYS: [&str; 4] = ["password", "token", "secret", "api_key"];

/// The fixed failure taxonomy.
///
/// Every [`Error`] maps to exactly one category; the mapping is total, so
/// classification can never itself fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Transport failures: timeouts, refused connections.
    Network,
    /// A protected dependency is failing or its breaker is open.
    ExternalService,
    /// Backing-store failures (cache store, rate-window store).
    Database,
    /// Caller input or dependency content failed validation.
    Validation,
    /// Missing or mismatched credentials.
    Authentication,
    /// Authenticated but not permitted.
    Authorization,
    /// A required resource does not exist or is exhausted.
    Resource,
    /// The caller exceeded its request budget.
    RateLimit,
    /// Internal failures with no more precise classification.
    Server,
    /// Reserved for failures introduced by future variants.
    Unknown,
}

impl ErrorCategory {
    /// Returns the wire name of the category, as used in envelopes and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::ExternalService => "external_service",
            ErrorCategory::Database => "database",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::Resource => "resource",
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::Server => "server",
            ErrorCategory::Unknown => "unknown",
        }
    }

    /// Default transport status for the category.
    ///
    /// Individual failures may refine this (a timeout is `Network` but
    /// carries 504, not 502); see [`Error::transport_status`].
    #[must_use]
    pub fn default_status(&self) -> u16 {
        match self {
            ErrorCategory::Network | ErrorCategory::ExternalService => 502,
            ErrorCategory::Validation => 400,
            ErrorCategory::Authentication => 401,
            ErrorCategory::Authorization => 403,
            ErrorCategory::Resource => 404,
            ErrorCategory::RateLimit => 429,
            ErrorCategory::Database | ErrorCategory::Server | ErrorCategory::Unknown => 500,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classifies this error into its taxonomy category.
    ///
    /// Total over all variants; context layers are penetrated.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network(ne) => match ne.as_ref() {
                NetworkError::RequestFailed { .. } | NetworkError::BodyTooLarge { .. } => {
                    ErrorCategory::ExternalService
                }
                _ => ErrorCategory::Network,
            },
            Error::CircuitOpen { .. } => ErrorCategory::ExternalService,
            Error::Timeout(_) => ErrorCategory::Network,
            Error::Validation(_) | Error::Config(_) | Error::Parse(_) => ErrorCategory::Validation,
            Error::RateLimited { .. } => ErrorCategory::RateLimit,
            Error::Authentication(_) => ErrorCategory::Authentication,
            Error::Authorization(_) => ErrorCategory::Authorization,
            Error::Resource(_) => ErrorCategory::Resource,
            Error::Storage(_) => ErrorCategory::Database,
            Error::Cancelled(_) | Error::Internal(_) => ErrorCategory::Server,
            Error::Context { source, .. } => source.category(),
            _ => ErrorCategory::Unknown,
        }
    }

    /// Returns the transport status for this error.
    ///
    /// Statuses follow a fixed mapping: validation 400, authentication 401,
    /// parse 422, rate limit 429, circuit open 503, timeout 504, connection
    /// failure and upstream failure statuses 502, everything else 500.
    #[must_use]
    pub fn transport_status(&self) -> u16 {
        match self {
            Error::Network(ne) => match ne.as_ref() {
                NetworkError::Timeout => 504,
                _ => 502,
            },
            Error::CircuitOpen { .. } => 503,
            Error::Timeout(_) => 504,
            Error::Parse(_) => 422,
            Error::Context { source, .. } => source.transport_status(),
            other => other.category().default_status(),
        }
    }
}

/// A fully classified failure, ready to log and to cross the boundary.
///
/// Built once at the point a failure is first classified and not mutated
/// afterwards, except to attach a trace id or extra context fields while the
/// report is still on the server side.
///
/// # Example
///
/// ```rust
/// use brandex_core::error::{Error, ErrorReport};
///
/// let err = Error::timeout("navigation deadline exceeded");
/// let report = ErrorReport::classify(&err)
///     .with_field("url", "https://example.com".into())
///     .with_trace_id("req-1234");
/// assert_eq!(report.status, 504);
/// assert_eq!(report.category.as_str(), "network");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    /// Client-safe message.
    pub message: String,
    /// Taxonomy category.
    pub category: ErrorCategory,
    /// Transport status for the boundary response.
    pub status: u16,
    /// Request context attached by the caller. Secret-looking keys are
    /// dropped at serialization, not here.
    pub context: Map<String, Value>,
    /// Fractional epoch seconds at classification time.
    pub timestamp: f64,
    /// Request trace identifier, attached when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Rendered cause chain. Server-side only; never crosses the boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ErrorReport {
    /// Classifies an error into a report.
    ///
    /// The message is the client-safe phrasing for the failure kind; the raw
    /// error chain is preserved in [`ErrorReport::cause`] for server-side
    /// logs only.
    #[must_use]
    pub fn classify(error: &Error) -> Self {
        Self {
            message: client_message(error).into_owned(),
            category: error.category(),
            status: error.transport_status(),
            context: Map::new(),
            timestamp: epoch_seconds_f64(),
            trace_id: None,
            cause: Some(error.report()),
        }
    }

    /// Builds a report directly from its parts, for failures that never
    /// existed as an [`Error`] value (e.g. a rate-limit rejection assembled
    /// from a decision).
    #[must_use]
    pub fn new(message: impl Into<String>, category: ErrorCategory, status: u16) -> Self {
        Self {
            message: message.into(),
            category,
            status,
            context: Map::new(),
            timestamp: epoch_seconds_f64(),
            trace_id: None,
            cause: None,
        }
    }

    /// Attaches a context field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Attaches the request trace identifier.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Context with secret-looking keys removed.
    ///
    /// Keys are compared case-insensitively against [`REDACTED_KEYS`]; a
    /// matching key is omitted entirely rather than masked.
    #[must_use]
    pub fn redacted_context(&self) -> Map<String, Value> {
        self.context
            .iter()
            .filter(|(key, _)| {
                let lowered = key.to_ascii_lowercase();
                !REDACTED_KEYS.contains(&lowered.as_str())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Emits the full server-side record at a severity derived from the
    /// transport status: >= 500 error, >= 400 warn, otherwise info.
    pub fn log(&self) {
        let context = Value::Object(self.redacted_context());
        let trace_id = self.trace_id.as_deref().unwrap_or("-");
        let cause = self.cause.as_deref().unwrap_or("-");
        if self.status >= 500 {
            tracing::error!(
                category = %self.category,
                status = self.status,
                trace_id = %trace_id,
                %context,
                cause = %cause,
                "{}",
                self.message
            );
        } else if self.status >= 400 {
            tracing::warn!(
                category = %self.category,
                status = self.status,
                trace_id = %trace_id,
                %context,
                cause = %cause,
                "{}",
                self.message
            );
        } else {
            tracing::info!(
                category = %self.category,
                status = self.status,
                trace_id = %trace_id,
                %context,
                "{}",
                self.message
            );
        }
    }

    /// Renders the client-facing envelope.
    ///
    /// Only the message, category, timestamp, trace id and redacted context
    /// fields are exposed; the cause chain and transport status stay
    /// server-side (the status travels as the HTTP response code, not in the
    /// body).
    #[must_use]
    pub fn to_boundary(&self) -> Value {
        let mut body = Map::new();
        body.insert("message".to_string(), json!(self.message));
        body.insert("category".to_string(), json!(self.category.as_str()));
        body.insert("timestamp".to_string(), json!(self.timestamp));
        if let Some(trace_id) = &self.trace_id {
            body.insert("trace_id".to_string(), json!(trace_id));
        }
        for (key, value) in self.redacted_context() {
            body.entry(key).or_insert(value);
        }
        json!({ "error": Value::Object(body) })
    }
}

/// Client-safe phrasing for each failure kind.
///
/// Dependency failures get fixed "try again later" style messages so raw
/// upstream error text never reaches a client; failures describing the
/// caller's own input keep their message.
fn client_message(error: &Error) -> Cow<'_, str> {
    match error {
        Error::Network(ne) => match ne.as_ref() {
            NetworkError::Timeout => Cow::Borrowed("Request timed out"),
            NetworkError::RequestFailed { .. } | NetworkError::BodyTooLarge { .. } => {
                Cow::Borrowed("Upstream service returned an error")
            }
            _ => Cow::Borrowed("Network error connecting to service"),
        },
        Error::CircuitOpen { .. } => {
            Cow::Borrowed("Service temporarily unavailable, please try again later")
        }
        Error::Timeout(_) => Cow::Borrowed("Request timed out"),
        Error::Parse(_) => Cow::Borrowed("Received malformed content from upstream service"),
        Error::Storage(_) => Cow::Borrowed("Internal storage error"),
        Error::Cancelled(_) => Cow::Borrowed("Request was cancelled"),
        Error::Validation(msg)
        | Error::Authentication(msg)
        | Error::Authorization(msg)
        | Error::Resource(msg)
        | Error::Internal(msg) => Cow::Borrowed(msg.as_ref()),
        Error::RateLimited { message, .. } => Cow::Borrowed(message.as_ref()),
        Error::Config(e) => Cow::Owned(e.to_string()),
        Error::Context { source, .. } => Cow::Owned(client_message(source).into_owned()),
        other => Cow::Owned(other.to_string()),
    }
}
