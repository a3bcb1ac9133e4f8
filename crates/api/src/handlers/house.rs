//! Fellows directory.

use axum::extract::{Query, State};
use axum::Json;
use fellowship_core::profile::{DirectoryEntry, Profile, PROFILES_TABLE};
use fellowship_core::roles::Role;
use fellowship_core::search::{clamp_limit, clamp_offset};
use fellowship_platform::{RowQuery, SortOrder};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireMember;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Serialize)]
pub struct DirectoryPage {
    pub items: Vec<DirectoryEntry>,
    pub total: usize,
}

/// GET /api/v1/house/directory
///
/// Onboarded fellows and alumni, ordered by name. Rows that fail to decode
/// are skipped with a warning.
pub async fn list_directory(
    RequireMember(_user): RequireMember,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<DirectoryPage>>> {
    let query = RowQuery::new()
        .eq("onboarding_completed", true)
        .order_by("full_name", SortOrder::Asc);
    let rows = state.platform.select(PROFILES_TABLE, &query).await?;

    let members: Vec<DirectoryEntry> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<Profile>(row) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable profile row");
                None
            }
        })
        .filter(|p| matches!(p.portal_role(), Some(Role::Fellow | Role::Alumni)))
        .map(|p| p.directory_entry())
        .collect();

    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE) as usize;
    let offset = clamp_offset(params.offset) as usize;
    let total = members.len();
    let items = members.into_iter().skip(offset).take(limit).collect();

    Ok(Json(DataResponse {
        data: DirectoryPage { items, total },
    }))
}
