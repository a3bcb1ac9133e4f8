//! Admin review of submitted applications.
//!
//! The list reads both form tables from the platform. When the platform
//! cannot be reached the list is served from the local mirror instead and
//! says so in `source`; status changes and document links always go to the
//! platform.

use axum::extract::{Path, Query, State};
use axum::Json;
use fellowship_core::draft::{DocumentKind, FormVariant};
use fellowship_core::error::CoreError;
use fellowship_core::record::{AdminApplicationRow, ApplicationStatus, RowSource};
use fellowship_core::search::{clamp_limit, clamp_offset};
use fellowship_platform::{PlatformError, RowQuery, SortOrder};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::{row_id_value, VariantParams};
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

/// Lifetime of a document download link.
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub variant: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationList {
    pub items: Vec<AdminApplicationRow>,
    pub total: usize,
    pub source: RowSource,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub variant: FormVariant,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentLink {
    pub url: String,
    pub expires_in: u64,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn parse_variant(raw: Option<&str>) -> AppResult<Option<FormVariant>> {
    raw.map(FormVariant::from_str_opt)
        .transpose()
        .map_err(AppError::from)
}

async fn load_from_platform(
    state: &AppState,
    variants: &[FormVariant],
) -> Result<Vec<AdminApplicationRow>, PlatformError> {
    let query = RowQuery::new().order_by("created_at", SortOrder::Desc);
    let mut rows = Vec::new();
    for &variant in variants {
        let table_rows = state.platform.select(variant.table(), &query).await?;
        rows.extend(
            table_rows
                .iter()
                .map(|row| AdminApplicationRow::from_platform_row(variant, row)),
        );
    }
    Ok(rows)
}

/// Every application of the given variant (both when `None`), newest
/// first, from the platform or, failing that, from the mirror.
pub async fn load_applications(
    state: &AppState,
    variant: Option<FormVariant>,
) -> AppResult<(Vec<AdminApplicationRow>, RowSource)> {
    let variants: Vec<FormVariant> = match variant {
        Some(v) => vec![v],
        None => vec![FormVariant::Fellowship, FormVariant::House],
    };

    let (mut rows, source) = match load_from_platform(state, &variants).await {
        Ok(rows) => (rows, RowSource::Platform),
        Err(e) => {
            tracing::warn!(error = %e, "Application list unavailable on platform, serving local mirror");
            let rows = state
                .mirror
                .admin_rows()
                .await?
                .into_iter()
                .filter(|row| variants.contains(&row.variant))
                .collect();
            (rows, RowSource::Mirror)
        }
    };

    // RFC 3339 strings in UTC order lexicographically.
    rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    Ok((rows, source))
}

async fn find_application(
    state: &AppState,
    variant: FormVariant,
    id: &str,
) -> AppResult<AdminApplicationRow> {
    let query = RowQuery::new().eq("id", row_id_value(id)).page(1, 0);
    state
        .platform
        .select(variant.table(), &query)
        .await?
        .first()
        .map(|row| AdminApplicationRow::from_platform_row(variant, row))
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Application",
                id: id.to_string(),
            })
        })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/applications?variant=&status=&limit=&offset=
pub async fn list_applications(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<ApplicationList>>> {
    let variant = parse_variant(params.variant.as_deref())?;
    let status = params
        .status
        .as_deref()
        .map(ApplicationStatus::from_str_db)
        .transpose()?;

    let (rows, source) = load_applications(&state, variant).await?;
    let filtered: Vec<_> = rows
        .into_iter()
        .filter(|row| status.map_or(true, |s| row.status == s))
        .collect();

    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE) as usize;
    let offset = clamp_offset(params.offset) as usize;
    let total = filtered.len();
    let items = filtered.into_iter().skip(offset).take(limit).collect();

    Ok(Json(DataResponse {
        data: ApplicationList {
            items,
            total,
            source,
        },
    }))
}

/// PATCH /api/v1/admin/applications/{id}/status
///
/// Set the review status on the platform row, then on the mirror copy.
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<DataResponse<AdminApplicationRow>>> {
    let status = ApplicationStatus::from_str_db(&input.status)?;
    let query = RowQuery::new().eq("id", row_id_value(&id));

    let row = state
        .platform
        .update(
            input.variant.table(),
            &query,
            serde_json::json!({ "status": status.as_str() }),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Application",
                id: id.clone(),
            })
        })?;

    if let Err(e) = state.mirror.set_status(&id, status).await {
        tracing::warn!(error = %e, application_id = %id, "Failed to update mirrored status");
    }

    tracing::info!(
        application_id = %id,
        status = status.as_str(),
        user_id = %admin.auth.user_id,
        "Application status updated",
    );

    Ok(Json(DataResponse {
        data: AdminApplicationRow::from_platform_row(input.variant, &row),
    }))
}

/// GET /api/v1/admin/applications/{id}/documents/{kind}?variant=
///
/// A time-limited download link for one uploaded document.
pub async fn document_link(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
    Query(params): Query<VariantParams>,
) -> AppResult<Json<DataResponse<DocumentLink>>> {
    let kind = DocumentKind::from_str_opt(&kind)?;
    let variant = parse_variant(params.variant.as_deref())?.unwrap_or_default();

    let application = find_application(&state, variant, &id).await?;
    let path = application.document_path(kind).ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Document",
            id: format!("{id}/{}", kind.as_str()),
        })
    })?;

    let url = state
        .platform
        .signed_url(&state.config.platform.storage_bucket, path, SIGNED_URL_TTL_SECS)
        .await?;

    Ok(Json(DataResponse {
        data: DocumentLink {
            url,
            expires_in: SIGNED_URL_TTL_SECS,
        },
    }))
}
