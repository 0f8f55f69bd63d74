//! Usage metering endpoints

use std::collections::HashMap;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{UsageRecord, UsageRequest};

/// Aggregate usage for the caller, keyed by metric name.
pub async fn my_summary(client: &ApiClient) -> Result<HashMap<String, f64>, ApiError> {
    client.get("/usage/my/summary").await
}

pub async fn record(client: &ApiClient, request: &UsageRequest) -> Result<UsageRecord, ApiError> {
    client.post("/usage", request).await
}

pub async fn by_subscription(
    client: &ApiClient,
    subscription_id: &str,
) -> Result<Vec<UsageRecord>, ApiError> {
    client
        .get(&format!("/usage/subscription/{subscription_id}"))
        .await
}
