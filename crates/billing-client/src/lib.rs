//! Authenticated client for the billing platform API
//!
//! Wraps a plain HTTP client with the session-aware request pipeline:
//! bearer-token attachment, failure classification, and a one-shot
//! refresh-then-retry recovery for expired access tokens. Typed endpoint
//! modules and a session facade sit on top.
//!
//! Request flow:
//! 1. Caller invokes an endpoint wrapper with an `ApiClient`
//! 2. The pipeline attaches the stored bearer token and transmits
//! 3. A 401 from a protected endpoint hands off to the
//!    `RefreshCoordinator`, which exchanges the refresh token for a new
//!    pair (single-flight across concurrent requests) and replays the
//!    original request once
//! 4. If recovery is impossible the session is cleared and the logout
//!    signal fires; everything else propagates with the backend's error
//!    payload attached

pub mod classify;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod refresh;
pub mod session;
pub mod types;

pub use classify::{AUTH_ENDPOINTS, FailureClass, classify, is_auth_endpoint};
pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use error::{ApiError, BackendError, FieldError};
pub use refresh::{RefreshCoordinator, RefreshState};
pub use session::SessionManager;

// Session primitives from the auth crate, re-exported so front-ends
// depend on one crate.
pub use billing_auth::{
    LoginRequest, RegisterRequest, Role, Session, SessionStore, UserProfile,
};
