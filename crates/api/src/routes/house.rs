use axum::routing::get;
use axum::Router;

use crate::handlers::house;
use crate::state::AppState;

/// Routes mounted at `/house`.
///
/// ```text
/// GET /directory  -> list_directory (member)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/directory", get(house::list_directory))
}
