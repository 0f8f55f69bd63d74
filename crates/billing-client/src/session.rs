//! Session facade consumed by front-ends
//!
//! One explicitly-wired object owning the session lifecycle: restore at
//! startup, login/register/logout, profile updates, and the derived
//! flags front-ends render from. Shares the session store and refresh
//! coordinator with the `ApiClient` it was built from, so a forced
//! logout in the pipeline is observable here.
//!
//! The store owns the session; this facade keeps only a transient
//! in-memory copy of the profile for rendering. On a logout event from
//! `logout_events()`, the front-end routes to its login surface and
//! calls `logout()` to drop that copy.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use billing_auth::{LoginRequest, RegisterRequest, Role, Session, SessionStore, UserProfile};
use tokio::sync::{RwLock, watch};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::refresh::RefreshCoordinator;

/// Session lifecycle facade.
pub struct SessionManager {
    store: Arc<SessionStore>,
    http: reqwest::Client,
    base_url: String,
    refresh: Arc<RefreshCoordinator>,
    user: RwLock<Option<UserProfile>>,
    loading: AtomicBool,
}

impl SessionManager {
    /// Build a facade sharing the client's store, HTTP pool, and refresh
    /// coordinator.
    pub fn new(client: &ApiClient) -> Self {
        Self {
            store: client.store().clone(),
            http: client.http().clone(),
            base_url: client.base_url().to_owned(),
            refresh: client.refresh_coordinator().clone(),
            user: RwLock::new(None),
            loading: AtomicBool::new(true),
        }
    }

    /// Restore the session from the store at process start.
    ///
    /// `is_loading()` reports `true` only until this completes. A stored
    /// session that fails to parse was already self-healed by the store,
    /// so restoration simply comes back empty.
    pub async fn restore(&self) -> Option<UserProfile> {
        let session = self.store.load().await;
        let profile = session.map(|s| s.user);
        *self.user.write().await = profile.clone();
        self.loading.store(false, Ordering::Release);
        if let Some(user) = &profile {
            info!(user_id = %user.id, "session restored");
        }
        profile
    }

    /// Authenticate and persist the resulting session as one unit.
    pub async fn login(&self, request: LoginRequest) -> Result<Session, ApiError> {
        let response = billing_auth::login(&self.http, &self.base_url, &request)
            .await
            .map_err(ApiError::from)?;
        self.install(Session::from(response)).await
    }

    /// Create an account; the platform signs the new user in immediately.
    pub async fn register(&self, request: RegisterRequest) -> Result<Session, ApiError> {
        let response = billing_auth::register(&self.http, &self.base_url, &request)
            .await
            .map_err(ApiError::from)?;
        self.install(Session::from(response)).await
    }

    /// Discard the session: clear the store and the in-memory copy.
    /// Idempotent; clearing an empty store is a no-op.
    pub async fn logout(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear session store on logout");
        }
        *self.user.write().await = None;
        info!("logged out");
    }

    /// Persist a profile update into the existing session without
    /// touching the token pair, and refresh the cached copy.
    pub async fn update_user(&self, user: UserProfile) -> Result<(), ApiError> {
        self.store.update_user(&user).await.map_err(ApiError::from)?;
        *self.user.write().await = Some(user);
        Ok(())
    }

    /// Transient profile copy for rendering.
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    pub async fn is_admin(&self) -> bool {
        self.user
            .read()
            .await
            .as_ref()
            .is_some_and(|u| u.role == Role::Admin)
    }

    /// True only during the initial restore-from-store check.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Flips to `true` when the pipeline force-terminates the session.
    pub fn logout_events(&self) -> watch::Receiver<bool> {
        self.refresh.logout_events()
    }

    async fn install(&self, session: Session) -> Result<Session, ApiError> {
        self.store.save(&session).await.map_err(ApiError::from)?;
        *self.user.write().await = Some(session.user.clone());
        self.refresh.reset().await;
        self.loading.store(false, Ordering::Release);
        info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DEFAULT_TIMEOUT;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_body(access: &str, refresh: &str, role: &str) -> serde_json::Value {
        json!({
            "accessToken": access,
            "refreshToken": refresh,
            "tokenType": "Bearer",
            "expiresIn": 3600,
            "user": {
                "id": "u1",
                "email": "a@b.com",
                "fullName": "Ada Byron",
                "role": role,
                "active": true,
                "emailVerified": true,
                "createdAt": "2026-01-15T09:30:00Z"
            }
        })
    }

    async fn manager(server: &MockServer) -> (SessionManager, ApiClient, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SessionStore::new(dir.path().join("session.json")));
        let client = ApiClient::new(server.uri(), DEFAULT_TIMEOUT, store).unwrap();
        let manager = SessionManager::new(&client);
        (manager, client, dir)
    }

    #[tokio::test]
    async fn login_persists_session_and_sets_flags() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "a@b.com", "password": "Secret123!"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("T1", "R1", "USER")))
            .expect(1)
            .mount(&server)
            .await;

        let (manager, client, _dir) = manager(&server).await;
        let session = manager
            .login(LoginRequest {
                email: "a@b.com".into(),
                password: "Secret123!".into(),
            })
            .await
            .unwrap();

        assert_eq!(session.access_token, "T1");
        assert!(manager.is_authenticated().await);
        assert!(!manager.is_admin().await);
        assert!(!manager.is_loading());

        // The store holds exactly the returned pair and profile
        let stored = client.store().load().await.unwrap();
        assert_eq!(stored.access_token, "T1");
        assert_eq!(stored.refresh_token, "R1");
        assert_eq!(stored.user.id, "u1");
    }

    #[tokio::test]
    async fn admin_role_sets_is_admin() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("T1", "R1", "ADMIN")))
            .mount(&server)
            .await;

        let (manager, _client, _dir) = manager(&server).await;
        manager
            .login(LoginRequest {
                email: "ops@corp.io".into(),
                password: "Secret123!".into(),
            })
            .await
            .unwrap();
        assert!(manager.is_admin().await);
    }

    #[tokio::test]
    async fn failed_login_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"message": "Invalid email or password"})),
            )
            .mount(&server)
            .await;

        let (manager, client, _dir) = manager(&server).await;
        let err = manager
            .login(LoginRequest {
                email: "a@b.com".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid email or password");
        assert!(!manager.is_authenticated().await);
        assert!(client.store().load().await.is_none());
    }

    #[tokio::test]
    async fn register_signs_in_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("T1", "R1", "USER")))
            .expect(1)
            .mount(&server)
            .await;

        let (manager, _client, _dir) = manager(&server).await;
        manager
            .register(RegisterRequest {
                email: "a@b.com".into(),
                password: "Secret123!".into(),
                full_name: "Ada Byron".into(),
                phone: None,
                company: None,
            })
            .await
            .unwrap();
        assert!(manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn restore_loads_stored_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("T1", "R1", "USER")))
            .mount(&server)
            .await;

        let (manager, client, dir) = manager(&server).await;
        manager
            .login(LoginRequest {
                email: "a@b.com".into(),
                password: "Secret123!".into(),
            })
            .await
            .unwrap();
        drop(manager);

        // A fresh process: new facade over the same store file
        let store = Arc::new(SessionStore::new(dir.path().join("session.json")));
        let client2 = ApiClient::new(client.base_url(), DEFAULT_TIMEOUT, store).unwrap();
        let manager2 = SessionManager::new(&client2);

        assert!(manager2.is_loading());
        let profile = manager2.restore().await.unwrap();
        assert_eq!(profile.id, "u1");
        assert!(!manager2.is_loading());
        assert!(manager2.is_authenticated().await);
    }

    #[tokio::test]
    async fn restore_with_empty_store_finishes_loading() {
        let server = MockServer::start().await;
        let (manager, _client, _dir) = manager(&server).await;

        assert!(manager.is_loading());
        assert!(manager.restore().await.is_none());
        assert!(!manager.is_loading());
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn logout_clears_store_and_memory() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("T1", "R1", "USER")))
            .mount(&server)
            .await;

        let (manager, client, _dir) = manager(&server).await;
        manager
            .login(LoginRequest {
                email: "a@b.com".into(),
                password: "Secret123!".into(),
            })
            .await
            .unwrap();

        manager.logout().await;
        assert!(!manager.is_authenticated().await);
        assert!(client.store().load().await.is_none());

        // Idempotent
        manager.logout().await;
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn update_user_keeps_tokens_and_refreshes_copy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("T1", "R1", "USER")))
            .mount(&server)
            .await;

        let (manager, client, _dir) = manager(&server).await;
        manager
            .login(LoginRequest {
                email: "a@b.com".into(),
                password: "Secret123!".into(),
            })
            .await
            .unwrap();

        let mut updated = manager.current_user().await.unwrap();
        updated.full_name = "Ada King".into();
        manager.update_user(updated).await.unwrap();

        assert_eq!(manager.current_user().await.unwrap().full_name, "Ada King");
        let stored = client.store().load().await.unwrap();
        assert_eq!(stored.user.full_name, "Ada King");
        assert_eq!(stored.access_token, "T1");
        assert_eq!(stored.refresh_token, "R1");
    }

    #[tokio::test]
    async fn update_user_without_session_errors() {
        let server = MockServer::start().await;
        let (manager, _client, _dir) = manager(&server).await;
        let user = billing_auth::UserProfile {
            id: "u1".into(),
            email: "a@b.com".into(),
            full_name: "Ada Byron".into(),
            phone: None,
            company: None,
            role: Role::User,
            active: true,
            email_verified: true,
            profile_image_url: None,
            created_at: "2026-01-15T09:30:00Z".into(),
            last_login_at: None,
        };
        let err = manager.update_user(user).await.unwrap_err();
        assert!(matches!(err, ApiError::Store(_)));
    }
}
