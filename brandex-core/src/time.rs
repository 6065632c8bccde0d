//! Time utilities.
//!
//! All internal timestamps are `i64` milliseconds since the Unix epoch. Boundary
//! payloads (error envelopes, health reports) use fractional epoch seconds to
//! stay cheap to compare and log.

use chrono::{DateTime, Utc};

/// Returns the current time in milliseconds since the Unix epoch.
///
/// # Example
///
/// ```rust
/// use brandex_core::time::epoch_millis;
///
/// let now = epoch_millis();
/// assert!(now > 0);
/// ```
#[inline]
#[must_use]
pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Returns the current time in whole seconds since the Unix epoch.
#[inline]
#[must_use]
pub fn epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Returns the current time as fractional seconds since the Unix epoch.
///
/// Used for boundary timestamps (error envelopes, health snapshots), where a
/// single JSON number is preferred over a structured datetime.
#[inline]
#[must_use]
pub fn epoch_seconds_f64() -> f64 {
    millis_to_seconds_f64(epoch_millis())
}

/// Converts epoch milliseconds to fractional epoch seconds.
#[inline]
#[must_use]
pub fn millis_to_seconds_f64(millis: i64) -> f64 {
    millis as f64 / 1000.0
}

/// Formats epoch milliseconds as an ISO 8601 UTC string with millisecond
/// precision, e.g. `2024-01-01T12:00:00.000Z`.
///
/// Returns `None` when the timestamp is outside the representable range.
#[must_use]
pub fn iso8601(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}
