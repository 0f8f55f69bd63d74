//! Refresh coordinator state machine
//!
//! Owns the recovery path for authentication failures. States are explicit
//! so tests assert transitions directly instead of inferring them from
//! side effects:
//!
//! Idle → (401 on protected endpoint) → Refreshing → (refresh succeeds)
//! → Idle, or (refresh fails / no refresh token) → LoggedOut. A successful
//! login resets LoggedOut back to Idle.
//!
//! Refreshes are single-flight: one mutex gates the whole exchange, so N
//! concurrent 401s collapse into one network call. A waiter that acquires
//! the gate after another flow already rotated the tokens observes a
//! changed access token in the store and reuses it without a second call.

use std::sync::Arc;

use billing_auth::SessionStore;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::error::ApiError;

/// Observable state of the refresh coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
    LoggedOut,
}

impl RefreshState {
    /// Status label for logging and assertions.
    pub fn label(&self) -> &'static str {
        match self {
            RefreshState::Idle => "idle",
            RefreshState::Refreshing => "refreshing",
            RefreshState::LoggedOut => "logged_out",
        }
    }
}

/// Coordinates token refresh across concurrent request flows.
///
/// Shared behind an `Arc` by the API client and the session facade. The
/// store is the single source of truth for token data; the coordinator
/// never caches tokens itself.
pub struct RefreshCoordinator {
    store: Arc<SessionStore>,
    http: reqwest::Client,
    base_url: String,
    flight: tokio::sync::Mutex<()>,
    state: RwLock<RefreshState>,
    logout_tx: watch::Sender<bool>,
    // Held so sends never fail when every external receiver is dropped
    _logout_rx: watch::Receiver<bool>,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<SessionStore>, http: reqwest::Client, base_url: String) -> Self {
        let (logout_tx, logout_rx) = watch::channel(false);
        Self {
            store,
            http,
            base_url,
            flight: tokio::sync::Mutex::new(()),
            state: RwLock::new(RefreshState::Idle),
            logout_tx,
            _logout_rx: logout_rx,
        }
    }

    /// Current state, for tests and diagnostics.
    pub async fn state(&self) -> RefreshState {
        *self.state.read().await
    }

    /// Receiver that flips to `true` when the session is force-terminated.
    /// The front-end reacts by returning the user to the login surface.
    pub fn logout_events(&self) -> watch::Receiver<bool> {
        self.logout_tx.subscribe()
    }

    /// Return to `Idle` after a successful login/registration.
    pub async fn reset(&self) {
        self.set_state(RefreshState::Idle).await;
        let _ = self.logout_tx.send(false);
    }

    /// Recover from a 401 on a protected endpoint.
    ///
    /// `stale_access` is the bearer token the failing request carried.
    /// Returns the access token to retry with, or `SessionExpired` after
    /// a forced logout (store cleared, logout signal fired).
    pub async fn reauthorize(&self, stale_access: &str) -> Result<String, ApiError> {
        let _flight = self.flight.lock().await;

        // A concurrent flow may have rotated the pair while we waited for
        // the gate — its outcome is reused instead of refreshing again.
        let refresh_token = match self.store.load().await {
            Some(session) if session.access_token != stale_access => {
                debug!("token already rotated by a concurrent refresh");
                return Ok(session.access_token);
            }
            Some(session) => session.refresh_token,
            None => {
                // No refresh token stored: nothing to exchange.
                self.force_logout("401 with no stored refresh token").await;
                return Err(ApiError::SessionExpired);
            }
        };

        self.set_state(RefreshState::Refreshing).await;
        info!("access token rejected, attempting refresh");

        match billing_auth::refresh(&self.http, &self.base_url, &refresh_token).await {
            Ok(response) => {
                // Persist the rotated pair before anyone retries: the
                // server has already invalidated the old one.
                if let Err(e) = self
                    .store
                    .update_tokens(&response.access_token, &response.refresh_token)
                    .await
                {
                    warn!(error = %e, "failed to persist rotated tokens");
                    self.force_logout("rotated tokens could not be persisted")
                        .await;
                    return Err(ApiError::SessionExpired);
                }
                metrics::counter!("auth_refresh_total", "outcome" => "success").increment(1);
                self.set_state(RefreshState::Idle).await;
                info!("token refresh succeeded");
                Ok(response.access_token)
            }
            Err(e) => {
                metrics::counter!("auth_refresh_total", "outcome" => "failure").increment(1);
                warn!(error = %e, "token refresh failed");
                self.force_logout("refresh token rejected or unreachable")
                    .await;
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Terminate the session: clear the store, transition to `LoggedOut`,
    /// and fire the logout signal.
    async fn force_logout(&self, reason: &str) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear session during forced logout");
        }
        self.set_state(RefreshState::LoggedOut).await;
        metrics::counter!("forced_logout_total").increment(1);
        let _ = self.logout_tx.send(true);
        warn!(reason, "session terminated, sign-in required");
    }

    async fn set_state(&self, next: RefreshState) {
        let mut state = self.state.write().await;
        if *state != next {
            debug!(from = state.label(), to = next.label(), "refresh state transition");
            *state = next;
        }
    }
}
