//! Handlers for the caller's own profile (`/me`).

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use fellowship_core::error::CoreError;
use fellowship_core::profile::{Profile, PROFILES_TABLE};
use fellowship_core::roles::Role;
use fellowship_core::route_guard::home_for;
use fellowship_events::bus::PROFILE_UPDATED;
use fellowship_events::{PortalContext, PortalEvent};
use fellowship_platform::RowQuery;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::PortalUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Self-service profile fields. Role and onboarding state are not editable
/// here.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub full_name: Option<String>,
    #[validate(length(max = 2000, message = "Bio must be at most 2000 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 120))]
    pub location: Option<String>,
    #[validate(url(message = "LinkedIn URL must be a valid URL"))]
    pub linkedin_url: Option<String>,
    #[validate(length(max = 512))]
    pub avatar_path: Option<String>,
    #[validate(length(max = 64))]
    pub cohort: Option<String>,
}

impl UpdateProfileRequest {
    /// Present fields as a JSON patch.
    fn into_patch(self) -> Map<String, Value> {
        let mut patch = Map::new();
        let fields = [
            ("full_name", self.full_name),
            ("bio", self.bio),
            ("location", self.location),
            ("linkedin_url", self.linkedin_url),
            ("avatar_path", self.avatar_path),
            ("cohort", self.cohort),
        ];
        for (column, value) in fields {
            if let Some(v) = value {
                patch.insert(column.to_string(), Value::String(v.trim().to_string()));
            }
        }
        patch
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Option<Role>,
    pub onboarding_completed: Option<bool>,
    pub home: &'static str,
    pub profile: Option<Profile>,
}

impl MeResponse {
    fn from_context(context: PortalContext) -> Self {
        let role = context.role();
        Self {
            user_id: context.user_id,
            email: context.email.clone(),
            role,
            onboarding_completed: context.onboarding_completed(),
            home: home_for(role),
            profile: context.profile,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write `patch` to the caller's profile row, creating the row when the
/// identity has none yet. Refreshes the cached context and announces the
/// change.
async fn write_profile(
    state: &AppState,
    user: &PortalUser,
    patch: Map<String, Value>,
) -> AppResult<PortalContext> {
    let user_id = user.auth.user_id;
    let query = RowQuery::new().eq("id", user_id.to_string());

    let row = if user.context.profile.is_some() {
        state
            .platform
            .update(PROFILES_TABLE, &query, Value::Object(patch))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::Core(CoreError::NotFound {
                    entity: "Profile",
                    id: user_id.to_string(),
                })
            })?
    } else {
        let mut row = patch;
        row.insert("id".into(), Value::String(user_id.to_string()));
        row.insert("email".into(), Value::String(user.auth.email.clone()));
        state
            .platform
            .insert(PROFILES_TABLE, Value::Object(row))
            .await?
    };

    let profile: Profile = serde_json::from_value(row).map_err(|e| {
        AppError::InternalError(format!("Profile row could not be decoded: {e}"))
    })?;

    let context = PortalContext {
        user_id,
        email: user.auth.email.clone(),
        profile: Some(profile),
        loaded_at: Utc::now(),
    };
    state.contexts.insert(context.clone()).await;
    state
        .event_bus
        .publish(PortalEvent::new(PROFILE_UPDATED).with_actor(user_id));

    Ok(context)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/me
pub async fn get_me(user: PortalUser) -> AppResult<Json<DataResponse<MeResponse>>> {
    Ok(Json(DataResponse {
        data: MeResponse::from_context(user.context),
    }))
}

/// PATCH /api/v1/me
///
/// Merge the present fields into the caller's profile.
pub async fn update_me(
    user: PortalUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    input.validate()?;
    let patch = input.into_patch();
    if patch.is_empty() {
        return Err(AppError::BadRequest("No profile fields to update".into()));
    }

    let context = write_profile(&state, &user, patch).await?;
    tracing::info!(user_id = %user.auth.user_id, "Profile updated");

    Ok(Json(DataResponse {
        data: MeResponse::from_context(context),
    }))
}

/// POST /api/v1/me/onboarding/complete
///
/// Mark onboarding done, optionally saving profile fields in the same
/// write. Unlocks the routes that require a completed onboarding.
pub async fn complete_onboarding(
    user: PortalUser,
    State(state): State<AppState>,
    input: Option<Json<UpdateProfileRequest>>,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let input = input.map(|Json(body)| body).unwrap_or_default();
    input.validate()?;

    let mut patch = input.into_patch();
    patch.insert("onboarding_completed".into(), Value::Bool(true));

    let context = write_profile(&state, &user, patch).await?;
    tracing::info!(user_id = %user.auth.user_id, "Onboarding completed");

    Ok(Json(DataResponse {
        data: MeResponse::from_context(context),
    }))
}
