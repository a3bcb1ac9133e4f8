//! Portal roles as stored in the `profiles.role` column.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPER_ADMIN: &str = "super_admin";
pub const ROLE_FELLOW: &str = "fellow";
pub const ROLE_ALUMNI: &str = "alumni";
pub const ROLE_ANALYST: &str = "analyst";

/// A portal role. Identities without a profile have no role at all, which
/// callers model as `Option<Role>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    SuperAdmin,
    Fellow,
    Alumni,
    Analyst,
}

impl Role {
    /// Parse a role string from a profile row.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            ROLE_ADMIN => Ok(Self::Admin),
            ROLE_SUPER_ADMIN => Ok(Self::SuperAdmin),
            ROLE_FELLOW => Ok(Self::Fellow),
            ROLE_ALUMNI => Ok(Self::Alumni),
            ROLE_ANALYST => Ok(Self::Analyst),
            _ => Err(CoreError::Validation(format!(
                "Invalid role '{s}'. Must be one of: admin, super_admin, fellow, alumni, analyst"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::SuperAdmin => ROLE_SUPER_ADMIN,
            Self::Fellow => ROLE_FELLOW,
            Self::Alumni => ROLE_ALUMNI,
            Self::Analyst => ROLE_ANALYST,
        }
    }

    /// Whether the role may use the admin back-office.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }

    /// Whether the role belongs to the fellow community (portal content).
    pub fn is_member(self) -> bool {
        matches!(self, Self::Fellow | Self::Alumni) || self.is_staff()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrip() {
        for role in [
            Role::Admin,
            Role::SuperAdmin,
            Role::Fellow,
            Role::Alumni,
            Role::Analyst,
        ] {
            assert_eq!(Role::from_str_db(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_rejected() {
        assert!(Role::from_str_db("owner").is_err());
        assert!(Role::from_str_db("").is_err());
    }

    #[test]
    fn staff_and_member_sets() {
        assert!(Role::SuperAdmin.is_staff());
        assert!(!Role::Analyst.is_staff());
        assert!(Role::Alumni.is_member());
        assert!(!Role::Analyst.is_member());
    }
}
