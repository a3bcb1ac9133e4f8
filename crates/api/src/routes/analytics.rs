use axum::routing::post;
use axum::Router;

use crate::handlers::analytics;
use crate::state::AppState;

/// Public routes mounted at `/analytics`.
///
/// ```text
/// POST /page-views  -> record_page_view
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/page-views", post(analytics::record_page_view))
}
