//! Route guard decisions for the front end's navigations.

use axum::extract::{Query, State};
use axum::Json;
use fellowship_core::roles::Role;
use fellowship_core::route_guard::{access_for_path, evaluate, GuardDecision};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::MaybeAuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GuardParams {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct GuardResponse {
    pub path: String,
    pub role: Option<Role>,
    pub required_roles: &'static [Role],
    pub require_onboarding: bool,
    #[serde(flatten)]
    pub decision: GuardDecision,
}

/// GET /api/v1/guard?path=
///
/// Evaluate the route table for `path` and the caller. Anonymous callers
/// are evaluated with no role and no profile.
pub async fn check_route(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<GuardParams>,
) -> AppResult<Json<DataResponse<GuardResponse>>> {
    if !params.path.starts_with('/') {
        return Err(AppError::BadRequest(
            "path must be an absolute portal path".into(),
        ));
    }

    let (role, onboarding_completed) = match user {
        Some(user) => {
            let context = state
                .contexts
                .resolve(state.platform.as_ref(), user.user_id, &user.email)
                .await?;
            (context.role(), context.onboarding_completed())
        }
        None => (None, None),
    };

    let access = access_for_path(&params.path);
    let decision = evaluate(role, onboarding_completed, &access);

    tracing::debug!(path = %params.path, role = ?role, decision = ?decision, "Route guard evaluated");

    Ok(Json(DataResponse {
        data: GuardResponse {
            path: params.path,
            role,
            required_roles: access.required_roles,
            require_onboarding: access.require_onboarding,
            decision,
        },
    }))
}
