//! The `{ "data": ... }` envelope every successful JSON response uses.
//!
//! Sign-in is the one exception: its body is the session itself.

use serde::Serialize;

/// Success envelope. Errors are rendered by [`crate::error::AppError`]
/// as `{ "error", "code" }` instead.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
