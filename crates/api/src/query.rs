//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped with `fellowship_core::search::clamp_limit` /
/// `clamp_offset` before use.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?variant=fellowship|house`, defaulting to the fellowship form.
#[derive(Debug, Default, Deserialize)]
pub struct VariantParams {
    pub variant: Option<String>,
}

/// Filter value for a row id taken from a path segment.
///
/// Platform tables use either integer or UUID keys; numeric ids must be
/// compared as numbers.
pub fn row_id_value(id: &str) -> serde_json::Value {
    match id.parse::<i64>() {
        Ok(n) => serde_json::Value::from(n),
        Err(_) => serde_json::Value::from(id),
    }
}
