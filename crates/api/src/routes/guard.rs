use axum::routing::get;
use axum::Router;

use crate::handlers::guard;
use crate::state::AppState;

/// Routes mounted at `/guard`.
///
/// ```text
/// GET /?path=  -> check_route
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(guard::check_route))
}
