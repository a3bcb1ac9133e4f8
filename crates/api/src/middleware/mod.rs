//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- identity from a platform-issued Bearer token.
//! - [`auth::MaybeAuthUser`] -- the same, but anonymous callers are allowed.
//! - [`rbac::PortalUser`] -- identity plus its profile context.
//! - [`rbac::RequireAdmin`] -- requires `admin` or `super_admin`.
//! - [`rbac::RequireStaffOrAnalyst`] -- staff or `analyst`.
//! - [`rbac::RequireMember`] -- fellows, alumni and staff.
//! - [`rbac::RequireAuth`] -- any signed-in identity.

pub mod auth;
pub mod rbac;
