//! Opportunities: member listing and admin CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use fellowship_core::content::{Opportunity, OPPORTUNITIES_TABLE};
use fellowship_core::error::CoreError;
use fellowship_platform::{RowQuery, SortOrder};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireMember};
use crate::query::row_id_value;
use crate::response::DataResponse;
use crate::state::AppState;

fn default_active() -> bool {
    true
}

/// Body of create and update. Update replaces every editable column.
#[derive(Debug, Deserialize, Validate)]
pub struct OpportunityInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 200))]
    pub organization: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(url(message = "URL must be a valid URL"))]
    pub url: Option<String>,
    pub deadline: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl OpportunityInput {
    fn to_row(&self) -> serde_json::Value {
        serde_json::json!({
            "title": self.title.trim(),
            "organization": self.organization,
            "description": self.description,
            "url": self.url,
            "deadline": self.deadline,
            "active": self.active,
        })
    }
}

fn decode(row: serde_json::Value) -> AppResult<Opportunity> {
    serde_json::from_value(row)
        .map_err(|e| AppError::InternalError(format!("Opportunity row could not be decoded: {e}")))
}

fn not_found(id: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Opportunity",
        id: id.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Member endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/opportunities
///
/// Active opportunities, soonest deadline first.
pub async fn list_active(
    RequireMember(_user): RequireMember,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Opportunity>>>> {
    let query = RowQuery::new()
        .eq("active", true)
        .order_by("deadline", SortOrder::Asc);
    let rows = state.platform.select(OPPORTUNITIES_TABLE, &query).await?;
    let items = rows.into_iter().map(decode).collect::<AppResult<Vec<_>>>()?;
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// Admin endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/opportunities
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<OpportunityInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let row = state
        .platform
        .insert(OPPORTUNITIES_TABLE, input.to_row())
        .await?;
    let opportunity = decode(row)?;

    tracing::info!(
        opportunity_id = %opportunity.id,
        user_id = %admin.auth.user_id,
        "Opportunity created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: opportunity })))
}

/// PUT /api/v1/admin/opportunities/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<OpportunityInput>,
) -> AppResult<Json<DataResponse<Opportunity>>> {
    input.validate()?;
    let query = RowQuery::new().eq("id", row_id_value(&id));
    let row = state
        .platform
        .update(OPPORTUNITIES_TABLE, &query, input.to_row())
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| not_found(&id))?;

    tracing::info!(opportunity_id = %id, user_id = %admin.auth.user_id, "Opportunity updated");

    Ok(Json(DataResponse { data: decode(row)? }))
}

/// DELETE /api/v1/admin/opportunities/{id}
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let query = RowQuery::new().eq("id", row_id_value(&id));
    let removed = state.platform.delete(OPPORTUNITIES_TABLE, &query).await?;
    if removed == 0 {
        return Err(not_found(&id));
    }

    tracing::info!(opportunity_id = %id, user_id = %admin.auth.user_id, "Opportunity deleted");

    Ok(StatusCode::NO_CONTENT)
}
