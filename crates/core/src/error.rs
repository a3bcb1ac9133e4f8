//! Domain errors shared by every crate in the workspace.
//!
//! Messages carried by [`CoreError::Validation`] are shown to applicants
//! verbatim, so they are written as form hints rather than diagnostics.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: String },

    /// A rule on user input was broken; the message names the rule.
    #[error("{0}")]
    Validation(String),

    /// The request is valid but clashes with the current state, e.g. a
    /// second submit while one is in flight.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not signed in: {0}")]
    Unauthorized(String),

    #[error("not allowed: {0}")]
    Forbidden(String),

    #[error("internal: {0}")]
    Internal(String),
}
