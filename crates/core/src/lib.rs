//! Domain logic for the fellowship portal.
//!
//! Everything in this crate is pure: no I/O, no platform calls. The intake
//! draft, its validation predicates, the step controller, the route guard
//! and the typed pipeline runner all live here so the service and pipeline
//! crates can share them.

pub mod content;
pub mod draft;
pub mod error;
pub mod intake_wizard;
pub mod pipeline;
pub mod profile;
pub mod record;
pub mod roles;
pub mod route_guard;
pub mod search;
pub mod types;
pub mod validation;
