//! User account endpoints

use billing_auth::UserProfile;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{Page, UserUpdateRequest};

pub async fn me(client: &ApiClient) -> Result<UserProfile, ApiError> {
    client.get("/users/me").await
}

pub async fn update_me(
    client: &ApiClient,
    request: &UserUpdateRequest,
) -> Result<UserProfile, ApiError> {
    client.put("/users/me", request).await
}

// Admin surface

pub async fn list(client: &ApiClient, page: u32, size: u32) -> Result<Page<UserProfile>, ApiError> {
    client
        .get_query(
            "/users",
            &[("page", page.to_string()), ("size", size.to_string())],
        )
        .await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<UserProfile, ApiError> {
    client.get(&format!("/users/{id}")).await
}

pub async fn update(
    client: &ApiClient,
    id: &str,
    request: &UserUpdateRequest,
) -> Result<UserProfile, ApiError> {
    client.patch(&format!("/users/{id}"), request).await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("/users/{id}")).await
}

pub async fn toggle_active(client: &ApiClient, id: &str) -> Result<UserProfile, ApiError> {
    client.post_empty(&format!("/users/{id}/toggle-active")).await
}
