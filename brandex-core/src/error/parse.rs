//! Parse failures for content returned by dependencies.

use thiserror::Error;

/// Malformed-content failures.
///
/// Raised when a dependency answered but the payload could not be understood:
/// cached JSON that no longer deserializes, an inference response missing its
/// expected fields, or page content that is not text at all. All variants map
/// to the validation category with a 422 transport status.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Content was syntactically valid but structurally wrong.
    #[error("Malformed content: {0}")]
    Content(String),
}
