//! Client boundary to the external backend-as-a-service platform.
//!
//! The portal owns no database, bucket or mail server. Every persistent
//! operation goes through [`PlatformClient`], which exposes the platform's
//! capabilities (table rows, object storage, serverless functions and
//! password sessions) as named operations returning either data or a
//! [`PlatformError`].
//!
//! - [`RestPlatform`] -- `reqwest` client for the hosted platform.
//! - [`InMemoryPlatform`] -- process-local stand-in with failure injection.
//! - [`claims`] -- access-token claims shared by both implementations.

pub mod claims;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod rest;

pub use client::{AuthSession, PlatformClient, PlatformUser, RowQuery, SortOrder};
pub use config::PlatformConfig;
pub use error::PlatformError;
pub use memory::InMemoryPlatform;
pub use rest::RestPlatform;
