//! The [`PlatformClient`] capability trait and its request/response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PlatformError;

// ---------------------------------------------------------------------------
// Row queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Row selection: equality filters, one ordering column and paging.
///
/// The same value addresses rows for `update` and `delete`, where only the
/// filters are used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowQuery {
    pub filters: Vec<(String, serde_json::Value)>,
    pub order: Option<(String, SortOrder)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl RowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `column = value` filter.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order = Some((column.into(), order));
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Whether `row` satisfies every equality filter.
    pub fn matches(&self, row: &serde_json::Value) -> bool {
        self.filters
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// The platform's view of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformUser {
    pub id: Uuid,
    pub email: String,
}

/// A password session issued by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: PlatformUser,
}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// Operations the portal needs from the external platform.
///
/// Implementations must be shareable across tasks; the service holds one
/// as `Arc<dyn PlatformClient>`.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Insert a row and return it as stored (with platform-assigned
    /// columns such as `id` and `created_at`).
    async fn insert(
        &self,
        table: &str,
        row: serde_json::Value,
    ) -> Result<serde_json::Value, PlatformError>;

    async fn select(
        &self,
        table: &str,
        query: &RowQuery,
    ) -> Result<Vec<serde_json::Value>, PlatformError>;

    /// Merge `patch` into every row matching `query`; returns the updated rows.
    async fn update(
        &self,
        table: &str,
        query: &RowQuery,
        patch: serde_json::Value,
    ) -> Result<Vec<serde_json::Value>, PlatformError>;

    /// Delete matching rows; returns how many were removed.
    async fn delete(&self, table: &str, query: &RowQuery) -> Result<usize, PlatformError>;

    /// Store an object; returns its path within the bucket.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, PlatformError>;

    /// Time-limited download URL for a stored object.
    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, PlatformError>;

    /// Invoke a serverless function with a JSON body.
    async fn invoke(
        &self,
        function: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, PlatformError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, PlatformError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), PlatformError>;
}
