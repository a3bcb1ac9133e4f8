use axum::routing::{get, post};
use axum::Router;

use crate::handlers::me;
use crate::state::AppState;

/// Routes mounted at `/me`. All require auth.
///
/// ```text
/// GET   /                       -> get_me
/// PATCH /                       -> update_me
/// POST  /onboarding/complete    -> complete_onboarding
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(me::get_me).patch(me::update_me))
        .route("/onboarding/complete", post(me::complete_onboarding))
}
