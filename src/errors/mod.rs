use std::fmt;
use std::io;
use axum::{http::StatusCode, response::{IntoResponse, Response}};

/// Custom error types for the wiki service
#[derive(Debug)]
pub enum WikiError {
    Io(io::Error),
    /// A page or revision the caller asked for does not exist
    NotFound(String),
    /// The version-control executable failed or could not be started
    Gateway { command: String, message: String },
    Validation(String),
    Render(String),
}

impl WikiError {
    pub fn gateway(command: impl Into<String>, message: impl Into<String>) -> Self {
        WikiError::Gateway { command: command.into(), message: message.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WikiError::NotFound(_))
    }
}

impl fmt::Display for WikiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WikiError::Io(e) => write!(f, "I/O error: {}", e),
            WikiError::NotFound(what) => write!(f, "not found: {}", what),
            WikiError::Gateway { command, message } => {
                write!(f, "git {} failed: {}", command, message.trim())
            }
            WikiError::Validation(e) => write!(f, "invalid input: {}", e),
            WikiError::Render(e) => write!(f, "render error: {}", e),
        }
    }
}

impl std::error::Error for WikiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WikiError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WikiError {
    fn from(err: io::Error) -> Self {
        WikiError::Io(err)
    }
}

impl From<time::error::Parse> for WikiError {
    fn from(err: time::error::Parse) -> Self {
        WikiError::Validation(format!("bad timestamp: {}", err))
    }
}

impl From<time::error::Format> for WikiError {
    fn from(err: time::error::Format) -> Self {
        WikiError::Render(format!("timestamp formatting: {}", err))
    }
}

impl IntoResponse for WikiError {
    fn into_response(self) -> Response {
        let status = match &self {
            WikiError::NotFound(_) => StatusCode::NOT_FOUND,
            WikiError::Validation(_) => StatusCode::BAD_REQUEST,
            WikiError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            WikiError::Io(_) | WikiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
