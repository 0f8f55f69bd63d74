//! Authentication service calls
//!
//! Handles the three authentication endpoint interactions:
//! 1. Login (credentials exchange)
//! 2. Registration (account creation, returns a session immediately)
//! 3. Token refresh (exchanging the refresh token for a new pair)
//!
//! All three POST to the auth surface and return the same `AuthResponse`
//! shape. The refresh token travels as a query parameter, matching the
//! platform contract. Failures on these endpoints are surfaced as-is and
//! never trigger the pipeline's refresh logic.

use crate::error::{Error, Result};
use crate::types::{AuthResponse, LoginRequest, RegisterRequest};

/// Exchange credentials for a session via `POST /auth/login`.
pub async fn login(
    client: &reqwest::Client,
    base_url: &str,
    request: &LoginRequest,
) -> Result<AuthResponse> {
    let response = client
        .post(format!("{}/auth/login", base_url.trim_end_matches('/')))
        .json(request)
        .send()
        .await
        .map_err(|e| Error::Http(format!("login request failed: {e}")))?;

    decode_auth_response(response).await
}

/// Create an account and receive a session via `POST /auth/register`.
pub async fn register(
    client: &reqwest::Client,
    base_url: &str,
    request: &RegisterRequest,
) -> Result<AuthResponse> {
    let response = client
        .post(format!("{}/auth/register", base_url.trim_end_matches('/')))
        .json(request)
        .send()
        .await
        .map_err(|e| Error::Http(format!("register request failed: {e}")))?;

    decode_auth_response(response).await
}

/// Exchange a refresh token for a new token pair.
///
/// Called by the refresh coordinator when a protected request comes back
/// 401. The server rotates the pair on every refresh and invalidates the
/// previous one, so the caller must persist the returned tokens before
/// retrying anything.
pub async fn refresh(
    client: &reqwest::Client,
    base_url: &str,
    refresh_token: &str,
) -> Result<AuthResponse> {
    let response = client
        .post(format!("{}/auth/refresh", base_url.trim_end_matches('/')))
        .query(&[("refreshToken", refresh_token)])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        // 401/403 means the refresh token is revoked or invalid
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::InvalidCredentials(format!(
                "refresh token rejected ({status}): {body}"
            )));
        }

        return Err(Error::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<AuthResponse>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("refresh response: {e}")))
}

/// Check the status and decode the auth response body.
///
/// Non-success statuses from login/register carry the backend's own
/// failure payload (wrong password, duplicate email, field validation)
/// and are returned verbatim for the caller to present.
async fn decode_auth_response(response: reqwest::Response) -> Result<AuthResponse> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<AuthResponse>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("auth response: {e}")))
}
