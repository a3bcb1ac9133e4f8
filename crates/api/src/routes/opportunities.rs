//! Route definitions for opportunities.
//!
//! - `member_router()` for the portal listing, mounted at `/opportunities`
//! - `admin_router()` for back-office CRUD, mounted at `/admin/opportunities`

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::opportunities;
use crate::state::AppState;

/// ```text
/// GET /  -> list_active
/// ```
pub fn member_router() -> Router<AppState> {
    Router::new().route("/", get(opportunities::list_active))
}

/// ```text
/// POST   /       -> create
/// PUT    /{id}   -> update
/// DELETE /{id}   -> delete
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(opportunities::create))
        .route(
            "/{id}",
            put(opportunities::update).delete(opportunities::delete),
        )
}
