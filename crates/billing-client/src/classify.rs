//! Failure classification for the response interceptor
//!
//! Distinguishes authentication failures that the pipeline can recover
//! (401 on a protected endpoint, via refresh-then-retry) from failures on
//! the authentication endpoints themselves, which must pass through
//! untouched — refreshing on a failed refresh call would loop, and
//! refreshing on a failed login would corrupt the login error.

/// Paths handled by the authentication service. Failures on these never
/// trigger a refresh attempt, regardless of status code.
pub const AUTH_ENDPOINTS: &[&str] = &["/auth/login", "/auth/register", "/auth/refresh"];

/// Classification of a failed response, driving the pipeline's branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Failure on login/register/refresh — surfaced as-is.
    AuthEndpoint,
    /// 401 on a protected endpoint — candidate for refresh-then-retry.
    AuthRequired,
    /// Domain input rejected (other 4xx) — surfaced as-is.
    Validation,
    /// 5xx from the backend — surfaced as-is.
    Server,
    /// Anything else (unusual status outside 4xx/5xx).
    Transient,
}

/// Whether a request path targets the authentication service.
///
/// Substring match: callers may pass absolute URLs or paths with query
/// strings appended.
pub fn is_auth_endpoint(path: &str) -> bool {
    AUTH_ENDPOINTS.iter().any(|endpoint| path.contains(endpoint))
}

/// Classify a failing response by request path and HTTP status.
pub fn classify(path: &str, status: u16) -> FailureClass {
    if is_auth_endpoint(path) {
        return FailureClass::AuthEndpoint;
    }
    match status {
        401 => FailureClass::AuthRequired,
        400..=499 => FailureClass::Validation,
        500..=599 => FailureClass::Server,
        _ => FailureClass::Transient,
    }
}
