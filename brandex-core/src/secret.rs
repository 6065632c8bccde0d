//! Secret handling for operator-supplied credentials.
//!
//! The pipeline carries two kinds of secrets: the administrative token that
//! guards destructive operations (cache clear) and optional API keys for
//! external inference services. Both are wrapped in [`SecretString`], which
//! zeroes its memory on drop and redacts itself in `Debug`/`Display` output so
//! a secret can never leak through logging or error formatting.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string secret that is zeroed on drop and redacted when formatted.
///
/// # Example
///
/// ```rust
/// use brandex_core::secret::SecretString;
///
/// let admin_token = SecretString::new("cl34r-c4ch3");
/// assert_eq!(format!("{admin_token:?}"), "[REDACTED]");
/// assert!(admin_token.matches("cl34r-c4ch3"));
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wraps a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value.
    ///
    /// Use the returned reference immediately; do not persist it.
    #[inline]
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Compares a caller-supplied value against the secret.
    ///
    /// Empty secrets never match, so an unset token cannot be satisfied by an
    /// empty header.
    #[must_use]
    pub fn matches(&self, supplied: &str) -> bool {
        !self.0.is_empty() && self.0 == supplied
    }

    /// Returns the length of the secret.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the secret is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Redacted in both formatting paths so secrets cannot reach log output.
impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
