//! Portal content managed from the back-office: opportunities and events.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::Timestamp;

pub const OPPORTUNITIES_TABLE: &str = "opportunities";
pub const EVENTS_TABLE: &str = "events";

/// Accept a row id stored as either a string or an integer.
pub fn deserialize_row_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// A job, internship or program listed for members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    #[serde(deserialize_with = "deserialize_row_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// ISO date (`YYYY-MM-DD`).
    #[serde(default)]
    pub deadline: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub active: bool,
}

/// A community event shown in the member portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityEvent {
    #[serde(deserialize_with = "deserialize_row_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub starts_at: Timestamp,
    #[serde(default)]
    pub ends_at: Option<Timestamp>,
    #[serde(default)]
    pub rsvp_url: Option<String>,
}

impl CommunityEvent {
    /// Not yet over at `now`: ends later, or starts later when open-ended.
    pub fn is_upcoming(&self, now: Timestamp) -> bool {
        self.ends_at.unwrap_or(self.starts_at) >= now
    }
}
