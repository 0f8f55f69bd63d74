//! Error types for session and authentication operations

/// Errors from session and authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("authentication rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid auth response: {0}")]
    InvalidResponse(String),

    #[error("session encode error: {0}")]
    SessionEncode(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("no active session: {0}")]
    NoSession(String),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
