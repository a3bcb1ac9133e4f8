//! Handlers for the `/auth` resource (sign-in, sign-out).
//!
//! Credentials are checked by the platform. A successful sign-in
//! initializes the caller's portal context; sign-out tears it down.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use fellowship_core::roles::Role;
use fellowship_core::route_guard::home_for;
use fellowship_events::bus::{SESSION_SIGNED_IN, SESSION_SIGNED_OUT};
use fellowship_events::PortalEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/sign-in`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Successful sign-in response.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: SessionUser,
    /// Where the front end should land after signing in.
    pub home: &'static str,
}

/// Public identity info embedded in [`SignInResponse`].
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub role: Option<Role>,
    /// `None` when the identity has no profile yet.
    pub onboarding_completed: Option<bool>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/sign-in
///
/// Exchange email + password for a platform session.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(input): Json<SignInRequest>,
) -> AppResult<Json<SignInResponse>> {
    input.validate()?;

    let session = state
        .platform
        .sign_in(input.email.trim(), &input.password)
        .await?;

    let context = state
        .contexts
        .resolve(state.platform.as_ref(), session.user.id, &session.user.email)
        .await?;
    let role = context.role();

    state.event_bus.publish(
        PortalEvent::new(SESSION_SIGNED_IN)
            .with_actor(session.user.id)
            .with_payload(serde_json::json!({ "email": session.user.email })),
    );

    tracing::info!(user_id = %session.user.id, role = ?role, "User signed in");

    Ok(Json(SignInResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        expires_in: session.expires_in,
        user: SessionUser {
            id: session.user.id,
            email: session.user.email,
            role,
            onboarding_completed: context.onboarding_completed(),
        },
        home: home_for(role),
    }))
}

/// POST /api/v1/auth/sign-out
///
/// End the platform session and drop the portal context.
pub async fn sign_out(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    state.platform.sign_out(&user.access_token).await?;
    state.contexts.remove(user.user_id).await;
    state
        .event_bus
        .publish(PortalEvent::new(SESSION_SIGNED_OUT).with_actor(user.user_id));

    tracing::info!(user_id = %user.user_id, "User signed out");

    Ok(StatusCode::NO_CONTENT)
}
