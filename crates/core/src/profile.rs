//! Member profiles stored in the platform's `profiles` table.

use serde::{Deserialize, Serialize};

use crate::roles::Role;
use crate::types::EntityId;

pub const PROFILES_TABLE: &str = "profiles";

/// A profile row. `id` equals the platform user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: EntityId,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Raw role column; unknown strings are treated as no role.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub avatar_path: Option<String>,
    #[serde(default)]
    pub cohort: Option<String>,
}

impl Profile {
    /// The parsed portal role, if the column holds a known one.
    pub fn portal_role(&self) -> Option<Role> {
        let raw = self.role.as_deref()?;
        match Role::from_str_db(raw) {
            Ok(role) => Some(role),
            Err(_) => {
                tracing::warn!(profile_id = %self.id, role = raw, "Unknown profile role");
                None
            }
        }
    }

    /// Public fields shown in the fellows directory.
    pub fn directory_entry(&self) -> DirectoryEntry {
        DirectoryEntry {
            id: self.id,
            full_name: self.full_name.clone(),
            role: self.portal_role(),
            bio: self.bio.clone(),
            location: self.location.clone(),
            linkedin_url: self.linkedin_url.clone(),
            cohort: self.cohort.clone(),
        }
    }
}

/// Directory projection of a profile; omits email and onboarding state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEntry {
    pub id: EntityId,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub cohort: Option<String>,
}
