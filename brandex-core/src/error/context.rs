//! Context attachment trait and implementations.

use crate::error::{Error, Result};
use std::fmt;

/// Extension trait for ergonomic error context attachment.
///
/// Works with both `Result<T, E>` (for any `E: Into<Error>`) and `Option<T>`.
/// Use `context()` for static messages and `with_context()` when the message
/// is expensive to build (it is only evaluated on the error path).
///
/// Classification sees through context layers: wrapping a timeout in three
/// contexts still classifies as NETWORK/504.
///
/// # Example
///
/// ```rust
/// use brandex_core::error::{Error, Result, ContextExt};
///
/// fn load_cached(raw: &str) -> Result<serde_json::Value> {
///     serde_json::from_str(raw)
///         .with_context(|| format!("Failed to decode cached entry ({} bytes)", raw.len()))
/// }
///
/// let err = load_cached("not json").unwrap_err();
/// assert_eq!(err.transport_status(), 422);
/// ```
pub trait ContextExt<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds lazy context to an error (only evaluated on error).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ContextExt<T, E> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| e.into().context(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.into().context(f().to_string()))
    }
}

impl<T> ContextExt<T, Error> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::internal(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::internal(f().to_string()))
    }
}
