//! Handlers for the application form (`/intake`).
//!
//! Each handler drives one operation of the session's step controller.
//! Validation failures come back as 400 with the first failing rule and
//! leave the session on its current step.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fellowship_core::draft::{AttachedFile, DocumentKind, DraftPatch, FormVariant};
use fellowship_core::intake_wizard::StepChange;
use fellowship_core::pipeline::PipelineReport;
use fellowship_pipeline::IntakeView;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::query::VariantParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Largest accepted attachment.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Result of a step transition.
#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub change: StepChange,
    pub session: IntakeView,
}

/// Result of a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub change: StepChange,
    pub record_id: Option<String>,
    /// Every executed step, including best-effort failures.
    pub report: PipelineReport,
    pub session: IntakeView,
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// POST /api/v1/intake?variant=
///
/// Open a session with an empty draft on the first step.
pub async fn open_session(
    State(state): State<AppState>,
    Query(params): Query<VariantParams>,
) -> AppResult<impl IntoResponse> {
    let variant = match params.variant.as_deref() {
        Some(raw) => FormVariant::from_str_opt(raw)?,
        None => FormVariant::default(),
    };
    let view = state.sessions.open(variant).await;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/intake/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<IntakeView>>> {
    let view = state.sessions.view(id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/intake/{id}
pub async fn discard_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.sessions.discard(id).await?;
    tracing::debug!(session_id = %id, "Intake session discarded");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Draft edits
// ---------------------------------------------------------------------------

/// PATCH /api/v1/intake/{id}
///
/// Merge the present fields into the draft. No validation runs here.
pub async fn patch_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<DraftPatch>,
) -> AppResult<Json<DataResponse<IntakeView>>> {
    let ((), view) = state
        .sessions
        .update(id, |wizard| wizard.apply_patch(patch))
        .await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/intake/{id}/attachments/{kind}
///
/// Multipart form with a required `file` field. Replaces any file already
/// attached for `kind`.
pub async fn attach_document(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, String)>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<IntakeView>>> {
    let kind = DocumentKind::from_str_opt(&kind)?;
    let mut file: Option<AttachedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        file = Some(AttachedFile::new(file_name, content_type, data.to_vec()));
    }

    let file = file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    if file.bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    if file.size_bytes > MAX_ATTACHMENT_BYTES {
        return Err(AppError::BadRequest(format!(
            "File exceeds the {} MB limit",
            MAX_ATTACHMENT_BYTES / (1024 * 1024)
        )));
    }

    tracing::debug!(
        session_id = %id,
        kind = kind.as_str(),
        size_bytes = file.size_bytes,
        "Document attached"
    );

    let ((), view) = state
        .sessions
        .update(id, |wizard| wizard.attach(kind, file))
        .await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/intake/{id}/attachments/{kind}
pub async fn detach_document(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, String)>,
) -> AppResult<Json<DataResponse<IntakeView>>> {
    let kind = DocumentKind::from_str_opt(&kind)?;
    let ((), view) = state
        .sessions
        .update(id, |wizard| wizard.detach(kind))
        .await?;
    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// Step transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/intake/{id}/advance
///
/// Validate the current step and move to the next one.
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<StepResponse>>> {
    let (change, session) = state.sessions.update(id, |wizard| wizard.advance()).await?;
    Ok(Json(DataResponse {
        data: StepResponse { change, session },
    }))
}

/// POST /api/v1/intake/{id}/retreat
///
/// Move back one step without validating.
pub async fn retreat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<StepResponse>>> {
    let (change, session) = state.sessions.update(id, |wizard| wizard.retreat()).await?;
    Ok(Json(DataResponse {
        data: StepResponse { change, session },
    }))
}

/// POST /api/v1/intake/{id}/submit
///
/// Run final validation and the submission pipeline. A failed insert
/// returns 502 and leaves the session on its last step, ready to retry.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<SubmitResponse>>> {
    let result = state.sessions.submit(id).await?;
    let session = state.sessions.view(id).await?;

    // The confirmation email keeps running after the response.
    let outcome = result.outcome;
    drop(outcome.confirmation);

    Ok(Json(DataResponse {
        data: SubmitResponse {
            change: result.change,
            record_id: outcome.record_id,
            report: outcome.report,
            session,
        },
    }))
}
