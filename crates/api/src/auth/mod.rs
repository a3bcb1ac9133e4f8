//! Authentication primitives.
//!
//! - [`jwt`] -- validation of platform-issued access tokens.

pub mod jwt;
