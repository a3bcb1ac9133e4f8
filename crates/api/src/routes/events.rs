//! Route definitions for community events.
//!
//! - `member_router()` for the portal listing, mounted at `/events`
//! - `admin_router()` for back-office CRUD, mounted at `/admin/events`

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::community_events;
use crate::state::AppState;

/// ```text
/// GET /  -> list_upcoming
/// ```
pub fn member_router() -> Router<AppState> {
    Router::new().route("/", get(community_events::list_upcoming))
}

/// ```text
/// POST   /       -> create
/// PUT    /{id}   -> update
/// DELETE /{id}   -> delete
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(community_events::create))
        .route(
            "/{id}",
            put(community_events::update).delete(community_events::delete),
        )
}
