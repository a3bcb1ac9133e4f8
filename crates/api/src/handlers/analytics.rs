//! Page-view counting and the analytics dashboard.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use fellowship_core::record::{ApplicationStatus, RowSource};
use fellowship_core::route_guard::page_view_key;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::admin_applications::load_applications;
use crate::middleware::rbac::RequireStaffOrAnalyst;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct PageViewRequest {
    #[validate(length(min = 1, max = 512))]
    pub path: String,
    /// First visit from this browser.
    #[serde(default)]
    pub new_visitor: bool,
}

#[derive(Debug, Serialize)]
pub struct PageViewRecorded {
    /// Bucket the view was counted under.
    pub path: &'static str,
    pub views: u64,
}

#[derive(Debug, Serialize)]
pub struct ApplicationCounts {
    pub total: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub source: RowSource,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub page_views: BTreeMap<String, u64>,
    pub total_page_views: u64,
    pub visitor_count: u64,
    pub applications: ApplicationCounts,
}

/// POST /api/v1/analytics/page-views
///
/// Public; called by the front end on every navigation. Views are counted
/// per route-table entry, so arbitrary paths cannot grow the counter set.
pub async fn record_page_view(
    State(state): State<AppState>,
    Json(input): Json<PageViewRequest>,
) -> AppResult<Json<DataResponse<PageViewRecorded>>> {
    input.validate()?;
    if !input.path.starts_with('/') {
        return Err(AppError::BadRequest("path must start with '/'".into()));
    }

    let key = page_view_key(&input.path);
    let views = state.analytics.record_page_view(key, input.new_visitor).await?;

    Ok(Json(DataResponse {
        data: PageViewRecorded { path: key, views },
    }))
}

/// GET /api/v1/admin/analytics
///
/// Traffic counters plus application totals per review status.
pub async fn summary(
    RequireStaffOrAnalyst(_user): RequireStaffOrAnalyst,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<AnalyticsSummary>>> {
    let traffic = state.analytics.snapshot().await?;
    let (rows, source) = load_applications(&state, None).await?;

    let mut by_status = BTreeMap::new();
    for status in [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ] {
        by_status.insert(status.as_str(), 0);
    }
    for row in &rows {
        *by_status.entry(row.status.as_str()).or_insert(0) += 1;
    }

    Ok(Json(DataResponse {
        data: AnalyticsSummary {
            page_views: traffic.page_views,
            total_page_views: traffic.total_page_views,
            visitor_count: traffic.visitor_count,
            applications: ApplicationCounts {
                total: rows.len(),
                by_status,
                source,
            },
        },
    }))
}
