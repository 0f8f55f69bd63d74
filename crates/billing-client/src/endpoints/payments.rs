//! Payment endpoints
//!
//! The checkout flow is simulated client-side and verified server-side:
//! `initiate` opens an order, the front-end runs its mock checkout, and
//! `verify` posts the proof back. This module only moves the payloads.

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{
    Page, Payment, PaymentInitiateRequest, PaymentInitiateResponse, PaymentOrderResponse,
    PaymentRequest, PaymentVerifyRequest,
};

pub async fn initiate(
    client: &ApiClient,
    plan_id: &str,
) -> Result<PaymentInitiateResponse, ApiError> {
    let request = PaymentInitiateRequest {
        plan_id: plan_id.to_owned(),
    };
    client.post("/payments/initiate", &request).await
}

pub async fn verify(
    client: &ApiClient,
    request: &PaymentVerifyRequest,
) -> Result<PaymentOrderResponse, ApiError> {
    client.post("/payments/verify", request).await
}

pub async fn order_status(
    client: &ApiClient,
    order_id: &str,
) -> Result<PaymentOrderResponse, ApiError> {
    client
        .get(&format!("/payments/order/{order_id}/status"))
        .await
}

pub async fn mine(client: &ApiClient, page: u32, size: u32) -> Result<Page<Payment>, ApiError> {
    client
        .get_query(
            "/payments/my",
            &[("page", page.to_string()), ("size", size.to_string())],
        )
        .await
}

pub async fn process(client: &ApiClient, request: &PaymentRequest) -> Result<Payment, ApiError> {
    client.post("/payments", request).await
}

// Admin surface

pub async fn list(client: &ApiClient, page: u32, size: u32) -> Result<Page<Payment>, ApiError> {
    client
        .get_query(
            "/payments",
            &[("page", page.to_string()), ("size", size.to_string())],
        )
        .await
}

pub async fn get(client: &ApiClient, id: &str) -> Result<Payment, ApiError> {
    client.get(&format!("/payments/{id}")).await
}

pub async fn refund(
    client: &ApiClient,
    id: &str,
    reason: Option<&str>,
) -> Result<Payment, ApiError> {
    let path = format!("/payments/{id}/refund");
    match reason {
        Some(reason) => {
            client
                .post_query(&path, &[("reason", reason.to_owned())])
                .await
        }
        None => client.post_empty(&path).await,
    }
}
