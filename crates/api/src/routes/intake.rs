//! Route definitions for the application form.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::intake;
use crate::state::AppState;

/// Multipart framing on top of the largest accepted file.
const ATTACHMENT_BODY_LIMIT: usize = intake::MAX_ATTACHMENT_BYTES + 64 * 1024;

/// Routes mounted at `/intake`. All public: applicants are anonymous.
///
/// ```text
/// POST   /                             -> open_session
/// GET    /{id}                         -> get_session
/// PATCH  /{id}                         -> patch_draft
/// DELETE /{id}                         -> discard_session
/// POST   /{id}/attachments/{kind}      -> attach_document
/// DELETE /{id}/attachments/{kind}      -> detach_document
/// POST   /{id}/advance                 -> advance
/// POST   /{id}/retreat                 -> retreat
/// POST   /{id}/submit                  -> submit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(intake::open_session))
        .route(
            "/{id}",
            get(intake::get_session)
                .patch(intake::patch_draft)
                .delete(intake::discard_session),
        )
        .route(
            "/{id}/attachments/{kind}",
            post(intake::attach_document)
                .delete(intake::detach_document)
                .layer(DefaultBodyLimit::max(ATTACHMENT_BODY_LIMIT)),
        )
        .route("/{id}/advance", post(intake::advance))
        .route("/{id}/retreat", post(intake::retreat))
        .route("/{id}/submit", post(intake::submit))
}
