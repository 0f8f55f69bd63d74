//! Plan catalog endpoints

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{Plan, PlanRequest};

pub async fn list(client: &ApiClient) -> Result<Vec<Plan>, ApiError> {
    client.get("/plans").await
}

pub async fn featured(client: &ApiClient) -> Result<Vec<Plan>, ApiError> {
    client.get("/plans/featured").await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<Plan, ApiError> {
    client.get(&format!("/plans/{id}")).await
}

// Admin surface

pub async fn create(client: &ApiClient, plan: &PlanRequest) -> Result<Plan, ApiError> {
    client.post("/plans", plan).await
}

pub async fn update(client: &ApiClient, id: &str, plan: &PlanRequest) -> Result<Plan, ApiError> {
    client.put(&format!("/plans/{id}"), plan).await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("/plans/{id}")).await
}

pub async fn toggle_active(client: &ApiClient, id: &str) -> Result<Plan, ApiError> {
    client.patch_empty(&format!("/plans/{id}/toggle-active")).await
}
