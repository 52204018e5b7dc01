//! Error types for CTD issues core.

use std::{error::Error, fmt, io};

/// Error type for CTD issues core operations.
#[derive(Debug)]
pub enum CtdIssuesError {
    /// An underlying I/O error.
    Io(io::Error),
    /// JSON encoding or decoding failed.
    Json(serde_json::Error),
    /// The API credential string could not be used.
    Credentials(String),
    /// An issue template is malformed.
    Template(String),
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for CtdIssuesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::Credentials(message) => write!(f, "invalid credentials: {message}"),
            Self::Template(message) => write!(f, "invalid issue template: {message}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for CtdIssuesError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CtdIssuesError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CtdIssuesError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Convenience result type for CTD issues core.
pub type Result<T> = std::result::Result<T, CtdIssuesError>;
