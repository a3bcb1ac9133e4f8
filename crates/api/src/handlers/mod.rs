//! Request handlers.
//!
//! Each submodule groups the handlers of one resource. Persistent work is
//! delegated to the platform client, the intake sessions or the local
//! cache held in [`AppState`](crate::state::AppState); errors map through
//! [`AppError`](crate::error::AppError).

pub mod admin_applications;
pub mod analytics;
pub mod auth;
pub mod community_events;
pub mod guard;
pub mod house;
pub mod intake;
pub mod me;
pub mod opportunities;
