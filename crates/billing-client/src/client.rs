//! Authenticated request pipeline
//!
//! Layers bearer-token attachment, failure classification, and the
//! one-shot refresh-then-retry recovery over a plain `reqwest::Client`.
//! Callers never observe the intermediate 401: a recoverable request
//! resolves to the retried response, everything else propagates with the
//! backend's error payload attached.
//!
//! Per request:
//! 1. Attach `Authorization: Bearer <access>` if a session is stored
//!    (pure local step, never blocks, never fails)
//! 2. Transmit with the uniform request timeout
//! 3. On 401 from a protected endpoint, hand the stale token to the
//!    refresh coordinator and replay the request once with the new one
//! 4. A failure on the replay, or on any auth endpoint, propagates as-is

use std::sync::Arc;
use std::time::Duration;

use billing_auth::SessionStore;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::classify::{FailureClass, classify};
use crate::error::ApiError;
use crate::refresh::RefreshCoordinator;

/// Uniform upper bound applied to every outbound request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Body attached to an outbound request. Kept replayable so the single
/// retry after a refresh re-issues exactly the same request.
enum Payload {
    Empty,
    Json(serde_json::Value),
    Multipart { file_name: String, bytes: Vec<u8> },
}

/// HTTP client for the billing API with session-aware recovery.
///
/// Cheap to share: the underlying connection pool, the session store, and
/// the refresh coordinator all live behind `Arc`/internal reference
/// counting. Construct once and hand out clones.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<SessionStore>,
    refresh: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Build a client for the given API base URL.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        store: Arc<SessionStore>,
    ) -> common::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| common::Error::Config(format!("building HTTP client: {e}")))?;
        let refresh = Arc::new(RefreshCoordinator::new(
            store.clone(),
            http.clone(),
            base_url.clone(),
        ));
        Ok(Self {
            http,
            base_url,
            store,
            refresh,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn refresh_coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.refresh
    }

    /// The underlying HTTP client, shared with the auth service calls so
    /// login and refresh ride the same pool and timeout.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, &[], Payload::Empty).await?;
        decode(response).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, query, Payload::Empty).await?;
        decode(response).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(Method::POST, path, &[], json_payload(body)?)
            .await?;
        decode(response).await
    }

    /// POST with no body (action endpoints: renew, mark-paid, …).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::POST, path, &[], Payload::Empty).await?;
        decode(response).await
    }

    /// POST with no body and query parameters (cancel with reason, …).
    pub async fn post_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.execute(Method::POST, path, query, Payload::Empty).await?;
        decode(response).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(Method::PUT, path, &[], json_payload(body)?)
            .await?;
        decode(response).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(Method::PATCH, path, &[], json_payload(body)?)
            .await?;
        decode(response).await
    }

    /// PATCH with no body (toggle endpoints).
    pub async fn patch_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::PATCH, path, &[], Payload::Empty).await?;
        decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, &[], Payload::Empty)
            .await?;
        Ok(())
    }

    /// Multipart file upload under the `file` form field.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<T, ApiError> {
        let payload = Payload::Multipart {
            file_name: file_name.to_owned(),
            bytes,
        };
        let response = self.execute(Method::POST, path, &[], payload).await?;
        decode(response).await
    }

    /// Raw byte download (invoice PDFs, stored files).
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(Method::GET, path, &[], Payload::Empty).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("reading download body: {e}")))?;
        Ok(bytes.to_vec())
    }

    /// Run one request through the pipeline, returning the successful
    /// response or the classified error.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        payload: Payload,
    ) -> Result<reqwest::Response, ApiError> {
        let request_id = Uuid::new_v4();

        // Request interceptor: attach the bearer token if a session
        // exists, otherwise send unmodified.
        let bearer = self.store.load().await.map(|s| s.access_token);

        let response = self
            .send_once(&method, path, query, &payload, bearer.as_deref())
            .await?;
        let status = response.status();
        if status.is_success() {
            record_request(&method, status.as_u16());
            debug!(request_id = %request_id, method = %method, path, status = status.as_u16(), "request ok");
            return Ok(response);
        }

        match classify(path, status.as_u16()) {
            FailureClass::AuthRequired => {
                let stale = bearer.unwrap_or_default();
                let token = self.refresh.reauthorize(&stale).await?;

                debug!(request_id = %request_id, path, "replaying request with refreshed token");
                let retry = self
                    .send_once(&method, path, query, &payload, Some(&token))
                    .await?;
                let retry_status = retry.status();
                record_request(&method, retry_status.as_u16());
                if retry_status.is_success() {
                    return Ok(retry);
                }
                // One refresh per request: a failure on the replay
                // propagates unchanged.
                warn!(request_id = %request_id, path, status = retry_status.as_u16(), "replayed request failed");
                Err(http_error(retry).await)
            }
            _ => {
                record_request(&method, status.as_u16());
                debug!(request_id = %request_id, method = %method, path, status = status.as_u16(), "request failed");
                Err(http_error(response).await)
            }
        }
    }

    /// One network transmission. Transport failures map to the timeout /
    /// network classifications; statuses are the caller's concern.
    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, String)],
        payload: &Payload,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method.clone(), url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::Multipart { file_name, bytes } => {
                let part = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone());
                builder.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(e.to_string())
            }
        })
    }
}

fn json_payload<B: Serialize>(body: &B) -> Result<Payload, ApiError> {
    let value = serde_json::to_value(body)
        .map_err(|e| ApiError::Decode(format!("serializing request body: {e}")))?;
    Ok(Payload::Json(value))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// Turn a non-success response into an `Http` error with the backend
/// payload parsed from the body when possible.
async fn http_error(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ApiError::from_status(status, &body)
}

fn record_request(method: &Method, status: u16) {
    metrics::counter!(
        "api_requests_total",
        "method" => method.as_str().to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
}
