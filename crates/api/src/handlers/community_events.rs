//! Community events: member listing and admin CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use fellowship_core::content::{CommunityEvent, EVENTS_TABLE};
use fellowship_core::error::CoreError;
use fellowship_core::types::Timestamp;
use fellowship_platform::{RowQuery, SortOrder};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireMember};
use crate::query::row_id_value;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of create and update. Update replaces every editable column.
#[derive(Debug, Deserialize, Validate)]
pub struct EventInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub starts_at: Timestamp,
    pub ends_at: Option<Timestamp>,
    #[validate(url(message = "RSVP URL must be a valid URL"))]
    pub rsvp_url: Option<String>,
}

impl EventInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.ends_at.is_some_and(|end| end < self.starts_at) {
            return Err(AppError::Core(CoreError::Validation(
                "Event cannot end before it starts".into(),
            )));
        }
        Ok(())
    }

    fn to_row(&self) -> serde_json::Value {
        serde_json::json!({
            "title": self.title.trim(),
            "description": self.description,
            "location": self.location,
            "starts_at": self.starts_at,
            "ends_at": self.ends_at,
            "rsvp_url": self.rsvp_url,
        })
    }
}

fn decode(row: serde_json::Value) -> AppResult<CommunityEvent> {
    serde_json::from_value(row)
        .map_err(|e| AppError::InternalError(format!("Event row could not be decoded: {e}")))
}

fn not_found(id: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Event",
        id: id.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Member endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/events
///
/// Events that have not ended yet, earliest first.
pub async fn list_upcoming(
    RequireMember(_user): RequireMember,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<CommunityEvent>>>> {
    let query = RowQuery::new().order_by("starts_at", SortOrder::Asc);
    let rows = state.platform.select(EVENTS_TABLE, &query).await?;

    let now = Utc::now();
    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        let event = decode(row)?;
        if event.is_upcoming(now) {
            events.push(event);
        }
    }
    Ok(Json(DataResponse { data: events }))
}

// ---------------------------------------------------------------------------
// Admin endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/events
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<EventInput>,
) -> AppResult<impl IntoResponse> {
    input.check()?;
    let row = state.platform.insert(EVENTS_TABLE, input.to_row()).await?;
    let event = decode(row)?;

    tracing::info!(event_id = %event.id, user_id = %admin.auth.user_id, "Event created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}

/// PUT /api/v1/admin/events/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<EventInput>,
) -> AppResult<Json<DataResponse<CommunityEvent>>> {
    input.check()?;
    let query = RowQuery::new().eq("id", row_id_value(&id));
    let row = state
        .platform
        .update(EVENTS_TABLE, &query, input.to_row())
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| not_found(&id))?;

    tracing::info!(event_id = %id, user_id = %admin.auth.user_id, "Event updated");

    Ok(Json(DataResponse { data: decode(row)? }))
}

/// DELETE /api/v1/admin/events/{id}
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let query = RowQuery::new().eq("id", row_id_value(&id));
    if state.platform.delete(EVENTS_TABLE, &query).await? == 0 {
        return Err(not_found(&id));
    }

    tracing::info!(event_id = %id, user_id = %admin.auth.user_id, "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}
