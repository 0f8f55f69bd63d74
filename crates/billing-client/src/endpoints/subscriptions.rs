//! Subscription lifecycle endpoints

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{Page, Subscription, SubscriptionRequest};

pub async fn mine(client: &ApiClient) -> Result<Vec<Subscription>, ApiError> {
    client.get("/subscriptions/my").await
}

/// The caller's currently active subscription, if any.
pub async fn active(client: &ApiClient) -> Result<Option<Subscription>, ApiError> {
    match client.get("/subscriptions/my/active").await {
        Ok(subscription) => Ok(Some(subscription)),
        Err(err) if err.status() == Some(404) => Ok(None),
        Err(err) => Err(err),
    }
}

pub async fn subscribe(
    client: &ApiClient,
    request: &SubscriptionRequest,
) -> Result<Subscription, ApiError> {
    client.post("/subscriptions", request).await
}

pub async fn cancel(
    client: &ApiClient,
    id: &str,
    reason: Option<&str>,
) -> Result<Subscription, ApiError> {
    let path = format!("/subscriptions/{id}/cancel");
    match reason {
        Some(reason) => {
            client
                .post_query(&path, &[("reason", reason.to_owned())])
                .await
        }
        None => client.post_empty(&path).await,
    }
}

pub async fn change_plan(
    client: &ApiClient,
    id: &str,
    new_plan_id: &str,
) -> Result<Subscription, ApiError> {
    client
        .post_query(
            &format!("/subscriptions/{id}/change-plan"),
            &[("newPlanId", new_plan_id.to_owned())],
        )
        .await
}

pub async fn renew(client: &ApiClient, id: &str) -> Result<Subscription, ApiError> {
    client.post_empty(&format!("/subscriptions/{id}/renew")).await
}

pub async fn set_auto_renew(
    client: &ApiClient,
    id: &str,
    auto_renew: bool,
) -> Result<Subscription, ApiError> {
    client
        .post_query(
            &format!("/subscriptions/{id}/auto-renew"),
            &[("autoRenew", auto_renew.to_string())],
        )
        .await
}

// Admin surface

pub async fn list(
    client: &ApiClient,
    page: u32,
    size: u32,
) -> Result<Page<Subscription>, ApiError> {
    client
        .get_query(
            "/subscriptions",
            &[("page", page.to_string()), ("size", size.to_string())],
        )
        .await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<Subscription, ApiError> {
    client.get(&format!("/subscriptions/{id}")).await
}
