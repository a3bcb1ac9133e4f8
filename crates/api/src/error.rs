use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fellowship_cache::CacheError;
use fellowship_core::error::CoreError;
use fellowship_core::pipeline::PipelineAbort;
use fellowship_pipeline::SubmitError;
use fellowship_platform::PlatformError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds platform, cache and
/// HTTP-specific variants. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `fellowship_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failed call to the external platform.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// A local cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A required submission step failed.
    #[error(transparent)]
    Submission(PipelineAbort),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Rejected(core) => AppError::Core(core),
            SubmitError::Aborted(abort) => AppError::Submission(abort),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(first_validation_message(&errors)))
    }
}

/// Render the first field error as `field: message`.
fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: invalid value ({})", e.code),
            })
        })
        .unwrap_or_else(|| "Invalid request body".to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Platform errors ---
            AppError::Platform(err) => classify_platform_error(err),

            AppError::Cache(err) => {
                tracing::error!(error = %err, "Local cache error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }

            AppError::Submission(abort) => {
                tracing::error!(step = %abort.step, error = %abort.message, "Submission failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "SUBMISSION_FAILED",
                    "Your application could not be saved. Please try again.".to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a platform error into an HTTP status, error code, and message.
///
/// - `Auth` maps to 401.
/// - `NotFound` and upstream 404s map to 404.
/// - Everything else maps to 502 with a sanitized message.
fn classify_platform_error(err: &PlatformError) -> (StatusCode, &'static str, String) {
    match err {
        PlatformError::Auth(_) => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Invalid email or password".to_string(),
        ),
        PlatformError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{what} not found"),
        ),
        PlatformError::Api { status: 404, .. } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Platform error");
            (
                StatusCode::BAD_GATEWAY,
                "PLATFORM_ERROR",
                "The backend platform is unavailable. Please try again.".to_string(),
            )
        }
    }
}
