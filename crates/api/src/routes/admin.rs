//! Route definitions for the back-office (`/admin`).

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::{admin_applications, analytics};
use crate::routes::{events, opportunities};
use crate::state::AppState;

/// Routes mounted at `/admin`. Role checks happen in the handlers'
/// extractors.
///
/// ```text
/// GET   /applications                          -> list_applications
/// PATCH /applications/{id}/status              -> update_status
/// GET   /applications/{id}/documents/{kind}    -> document_link
/// /opportunities                               -> opportunities::admin_router
/// /events                                      -> events::admin_router
/// GET   /analytics                             -> summary (admin, analyst)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/applications", get(admin_applications::list_applications))
        .route(
            "/applications/{id}/status",
            patch(admin_applications::update_status),
        )
        .route(
            "/applications/{id}/documents/{kind}",
            get(admin_applications::document_link),
        )
        .nest("/opportunities", opportunities::admin_router())
        .nest("/events", events::admin_router())
        .route("/analytics", get(analytics::summary))
}
