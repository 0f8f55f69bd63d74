//! Invoice endpoints

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{Invoice, Page};

pub async fn mine(client: &ApiClient) -> Result<Vec<Invoice>, ApiError> {
    client.get("/invoices/my").await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<Invoice, ApiError> {
    client.get(&format!("/invoices/{id}")).await
}

// Admin surface

pub async fn list(client: &ApiClient, page: u32, size: u32) -> Result<Page<Invoice>, ApiError> {
    client
        .get_query(
            "/invoices",
            &[("page", page.to_string()), ("size", size.to_string())],
        )
        .await
}

pub async fn mark_paid(client: &ApiClient, id: &str) -> Result<Invoice, ApiError> {
    client.post_empty(&format!("/invoices/{id}/mark-paid")).await
}

pub async fn cancel(client: &ApiClient, id: &str) -> Result<Invoice, ApiError> {
    client.post_empty(&format!("/invoices/{id}/cancel")).await
}

/// Generate the next invoice for a subscription (invoice computation is
/// entirely server-side).
pub async fn generate(client: &ApiClient, subscription_id: &str) -> Result<Invoice, ApiError> {
    client
        .post_query(
            "/invoices/generate",
            &[("subscriptionId", subscription_id.to_owned())],
        )
        .await
}
