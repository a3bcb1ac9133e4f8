//! Local mirror cache for the fellowship portal.
//!
//! The remote platform is the source of truth. This crate keeps a local,
//! versioned copy of submitted applications (used when the remote list is
//! unavailable) and the page-view and visitor counters.
//!
//! - [`LocalStore`] -- key to JSON-string map, last write wins.
//! - [`ApplicationMirror`] -- schema-versioned application copies.
//! - [`Analytics`] -- page-view and visitor counters.

pub mod analytics;
pub mod error;
pub mod mirror;
pub mod store;

pub use analytics::{Analytics, AnalyticsSnapshot};
pub use error::CacheError;
pub use mirror::{ApplicationMirror, MirroredApplication};
pub use store::{FileStore, LocalStore, MemoryStore};
