//! Analytics dashboard endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{error::AppResult, models::session::Capability};

use super::AuthenticatedUser;

/// Relative reporting window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// Since local midnight
    #[default]
    Today,
    /// Last 7 days, today included
    Week,
    /// Last 30 days, today included
    Month,
    /// Trailing 12 calendar months, current month included
    Year,
    AllTime,
}

/// Query parameters for the analytics view
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AnalyticsQuery {
    /// today, week, month, year or all_time (default: today)
    pub window: Option<Window>,
}

/// Derived dashboard data for one window
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub window: Window,
    /// First local day included in the window (absent for all_time)
    pub since: Option<NaiveDate>,
    pub summary: SummaryStats,
    /// Check-ins per day or per month, oldest first
    pub trend: Vec<TrendPoint>,
    /// Share of visits per purpose
    pub by_purpose: Vec<CategoryShare>,
    /// Share of visits per visitor type
    pub by_visitor_type: Vec<CategoryShare>,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct SummaryStats {
    /// Visits checked in during the window
    pub total_visits: i64,
    /// Distinct visitors in the window, by email or else phone
    pub unique_visitors: i64,
    /// Open visits right now, regardless of window
    pub currently_inside: i64,
    /// Mean length of closed visits in the window; null when there are none
    pub average_duration_minutes: Option<i64>,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct TrendPoint {
    /// YYYY-MM-DD or YYYY-MM
    pub key: String,
    /// Display label, e.g. "Jan 05" or "Jan 2024"
    pub label: String,
    pub visits: i64,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct CategoryShare {
    pub name: String,
    pub count: i64,
    /// Rounded share of the window total
    pub percentage: i64,
}

/// Visitor statistics and trends
#[utoipa::path(
    get,
    path = "/visitors/analytics",
    tag = "analytics",
    security(("bearer_auth" = [])),
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Analytics for the window", body = AnalyticsResponse),
        (status = 403, description = "Role may not view analytics")
    )
)]
pub async fn get_analytics(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<AnalyticsResponse>> {
    claims.require(Capability::ViewAnalytics)?;

    let report = state
        .services
        .visitors
        .analytics(query.window.unwrap_or_default())
        .await?;
    Ok(Json(report))
}
