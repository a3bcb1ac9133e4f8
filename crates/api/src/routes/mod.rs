pub mod admin;
pub mod analytics;
pub mod auth;
pub mod events;
pub mod guard;
pub mod health;
pub mod house;
pub mod intake;
pub mod me;
pub mod opportunities;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/sign-in                                    sign in (public)
/// /auth/sign-out                                   sign out (requires auth)
///
/// /guard?path=                                     route guard decision (optional auth)
///
/// /intake?variant=                                 open session (POST, public)
/// /intake/{id}                                     view, patch draft, discard
/// /intake/{id}/attachments/{kind}                  attach (multipart POST), detach
/// /intake/{id}/advance                             next step (POST)
/// /intake/{id}/retreat                             previous step (POST)
/// /intake/{id}/submit                              run submission pipeline (POST)
///
/// /me                                              own profile, merge fields
/// /me/onboarding/complete                          finish onboarding (POST)
///
/// /house/directory                                 fellows directory (member)
/// /opportunities                                   active opportunities (member)
/// /events                                          upcoming events (member)
///
/// /analytics/page-views                            record page view (POST, public)
///
/// /admin/applications                              list (admin, mirror fallback)
/// /admin/applications/{id}/status                  review status (PATCH)
/// /admin/applications/{id}/documents/{kind}        signed document URL
/// /admin/opportunities                             create (admin)
/// /admin/opportunities/{id}                        update, delete
/// /admin/events                                    create (admin)
/// /admin/events/{id}                               update, delete
/// /admin/analytics                                 dashboard summary (admin, analyst)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Sign-in and sign-out through the platform.
        .nest("/auth", auth::router())
        // Route guard for front-end navigations.
        .nest("/guard", guard::router())
        // Application form sessions.
        .nest("/intake", intake::router())
        // Caller's own profile and onboarding.
        .nest("/me", me::router())
        // Member portal content.
        .nest("/house", house::router())
        .nest("/opportunities", opportunities::member_router())
        .nest("/events", events::member_router())
        // Public traffic counters.
        .nest("/analytics", analytics::router())
        // Back-office.
        .nest("/admin", admin::router())
}
