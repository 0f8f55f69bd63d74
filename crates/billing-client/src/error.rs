//! Pipeline error surface
//!
//! `ApiError` is what every pipeline call returns on failure. The backend
//! attaches a structured payload to most error responses; `user_message()`
//! turns whatever arrived into one human sentence: field-level validation
//! messages joined, else the payload message, else the error field, else a
//! fixed status mapping, else the raw transport text.

use serde::Deserialize;

/// Structured error payload from the billing backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendError {
    pub timestamp: Option<String>,
    pub status: Option<u16>,
    pub error: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub path: Option<String>,
    #[serde(default)]
    pub validation_errors: Vec<FieldError>,
}

/// One field-level validation failure inside a backend error payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(default)]
    pub rejected_value: Option<serde_json::Value>,
}

/// Errors surfaced by the request pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success HTTP status that was not recovered by a refresh.
    #[error("request failed with status {status}")]
    Http {
        status: u16,
        backend: Option<BackendError>,
    },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("session store error: {0}")]
    Store(String),

    /// The session could not be recovered: the refresh token was absent or
    /// rejected. The store has been cleared and the logout signal fired.
    #[error("session expired, sign-in required")]
    SessionExpired,
}

impl ApiError {
    /// Build an `Http` error from a status and raw body, parsing the
    /// backend payload when the body is its JSON shape.
    pub fn from_status(status: u16, body: &str) -> Self {
        ApiError::Http {
            status,
            backend: parse_backend(body),
        }
    }

    /// Derive a user-facing message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { status, backend } => {
                if let Some(payload) = backend {
                    if !payload.validation_errors.is_empty() {
                        return payload
                            .validation_errors
                            .iter()
                            .map(|ve| format!("{}: {}", ve.field, ve.message))
                            .collect::<Vec<_>>()
                            .join(", ");
                    }
                    if let Some(message) = &payload.message {
                        return message.clone();
                    }
                    if let Some(error) = &payload.error {
                        return error.clone();
                    }
                }
                status_message(*status).to_owned()
            }
            ApiError::Timeout => "The request timed out. Please try again.".into(),
            ApiError::Network(text) | ApiError::Decode(text) | ApiError::Store(text) => {
                text.clone()
            }
            ApiError::SessionExpired => "Your session has expired. Please login again.".into(),
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Fixed status → sentence mapping for payloads without a usable message.
fn status_message(status: u16) -> &'static str {
    match status {
        400 => "Invalid request. Please check your input.",
        401 => "Authentication failed. Please check your credentials.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        409 => "This resource already exists.",
        422 => "Invalid data provided. Please check your input.",
        429 => "Too many requests. Please try again later.",
        500 => "Server error. Please try again later.",
        502 | 503 | 504 => "Service temporarily unavailable. Please try again later.",
        _ => "An unexpected error occurred",
    }
}

/// Parse a response body as the backend error payload. Returns `None` for
/// bodies that are not its JSON shape (HTML error pages, plain text).
pub fn parse_backend(body: &str) -> Option<BackendError> {
    serde_json::from_str::<BackendError>(body).ok()
}

impl From<billing_auth::Error> for ApiError {
    fn from(err: billing_auth::Error) -> Self {
        match err {
            billing_auth::Error::Rejected { status, body } => ApiError::from_status(status, &body),
            billing_auth::Error::InvalidCredentials(text) => ApiError::Http {
                status: 401,
                backend: parse_backend(&text),
            },
            billing_auth::Error::Http(text) => ApiError::Network(text),
            billing_auth::Error::InvalidResponse(text) => ApiError::Decode(text),
            billing_auth::Error::SessionEncode(text)
            | billing_auth::Error::Io(text)
            | billing_auth::Error::NoSession(text) => ApiError::Store(text),
        }
    }
}
