//! Role-based access control (RBAC) extractors.
//!
//! Roles live in the platform's `profiles` table rather than in the token,
//! so each extractor resolves the caller's [`PortalContext`] first. The
//! context is cached per identity and kept fresh by the session events.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use fellowship_core::error::CoreError;
use fellowship_core::roles::Role;
use fellowship_events::PortalContext;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// A signed-in identity together with its profile context.
#[derive(Debug, Clone)]
pub struct PortalUser {
    pub auth: AuthUser,
    pub context: PortalContext,
}

impl PortalUser {
    pub fn role(&self) -> Option<Role> {
        self.context.role()
    }
}

impl FromRequestParts<AppState> for PortalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let context = state
            .contexts
            .resolve(state.platform.as_ref(), auth.user_id, &auth.email)
            .await?;
        Ok(PortalUser { auth, context })
    }
}

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    allowed: impl Fn(Role) -> bool,
    message: &str,
) -> Result<PortalUser, AppError> {
    let user = PortalUser::from_request_parts(parts, state).await?;
    if !user.role().is_some_and(allowed) {
        return Err(AppError::Core(CoreError::Forbidden(message.into())));
    }
    Ok(user)
}

/// Requires `admin` or `super_admin`. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub PortalUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::is_staff, "Admin role required")
            .await
            .map(RequireAdmin)
    }
}

/// Requires a staff role or `analyst`.
pub struct RequireStaffOrAnalyst(pub PortalUser);

impl FromRequestParts<AppState> for RequireStaffOrAnalyst {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(
            parts,
            state,
            |role| role.is_staff() || role == Role::Analyst,
            "Admin or Analyst role required",
        )
        .await
        .map(RequireStaffOrAnalyst)
    }
}

/// Requires `fellow`, `alumni` or a staff role.
pub struct RequireMember(pub PortalUser);

impl FromRequestParts<AppState> for RequireMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::is_member, "Fellow or Alumni role required")
            .await
            .map(RequireMember)
    }
}

/// Requires any authenticated identity, profile or not.
///
/// Functionally equivalent to [`AuthUser`] but named explicitly for routes
/// where "this requires authentication" should be self-documenting.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
