//! From implementations for converting between error types.

use crate::error::{ConfigValidationError, Error, NetworkError, ParseError};

/// Maximum length for upstream error text carried inside an error value.
/// Keeps a misbehaving site from bloating memory with a huge error body.
pub(crate) const MAX_ERROR_MESSAGE_LEN: usize = 1024;

/// Truncates a message to at most [`MAX_ERROR_MESSAGE_LEN`] bytes, marking
/// the cut. The cut point backs up to a character boundary, so multi-byte
/// text in upstream error bodies never splits mid-character.
pub(crate) fn truncate_message(mut msg: String) -> String {
    if msg.len() > MAX_ERROR_MESSAGE_LEN {
        let mut cut = MAX_ERROR_MESSAGE_LEN;
        while !msg.is_char_boundary(cut) {
            cut -= 1;
        }
        msg.truncate(cut);
        msg.push_str("... (truncated)");
    }
    msg
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Error::Network(Box::new(e))
    }
}

impl From<Box<NetworkError>> for Error {
    fn from(e: Box<NetworkError>) -> Self {
        Error::Network(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(Box::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(Box::new(ParseError::Json(e)))
    }
}

impl From<ConfigValidationError> for Error {
    fn from(e: ConfigValidationError) -> Self {
        Error::Config(Box::new(e))
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Validation(format!("Invalid URL: {e}").into())
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout
        } else if e.is_connect() {
            NetworkError::ConnectionFailed(truncate_message(e.to_string()))
        } else if let Some(status) = e.status() {
            NetworkError::RequestFailed {
                status: status.as_u16(),
                message: truncate_message(e.to_string()),
            }
        } else {
            NetworkError::Transport(Box::new(e))
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(Box::new(NetworkError::from(e)))
    }
}
