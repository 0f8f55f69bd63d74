//! Revenue analytics endpoints (admin surface)

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{DashboardSummary, MonthlyRevenue, PlanPopularity, SubscriptionStats};

pub async fn dashboard(client: &ApiClient) -> Result<DashboardSummary, ApiError> {
    client.get("/analytics/dashboard").await
}

pub async fn monthly_revenue(
    client: &ApiClient,
    months: u32,
) -> Result<Vec<MonthlyRevenue>, ApiError> {
    client
        .get_query("/analytics/monthly-revenue", &[("months", months.to_string())])
        .await
}

pub async fn subscription_stats(client: &ApiClient) -> Result<SubscriptionStats, ApiError> {
    client.get("/analytics/subscription-stats").await
}

pub async fn plan_popularity(client: &ApiClient) -> Result<Vec<PlanPopularity>, ApiError> {
    client.get("/analytics/plan-popularity").await
}
