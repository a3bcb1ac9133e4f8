//! Versioned local copies of submitted applications.
//!
//! Stored under the [`MIRROR_KEY`] key as
//! `{ "schema_version": 1, "entries": [...] }`. A payload with any other
//! version (or none) is discarded and logged; it is never migrated. The
//! platform remains the source of truth and the mirror is read only when
//! the remote list cannot be fetched.

use std::sync::Arc;

use fellowship_core::draft::FormVariant;
use fellowship_core::record::{AdminApplicationRow, ApplicationRecord, ApplicationStatus, RowSource};
use fellowship_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::CacheError;
use crate::store::LocalStore;

pub const MIRROR_KEY: &str = "applications";
pub const MIRROR_SCHEMA_VERSION: u32 = 1;

/// Denormalized copy of one submitted application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirroredApplication {
    /// Platform row id, when the insert returned one.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub variant: FormVariant,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub submitted_at: Timestamp,
    #[serde(default)]
    pub resume_path: Option<String>,
    #[serde(default)]
    pub deck_path: Option<String>,
    #[serde(default)]
    pub memo_path: Option<String>,
}

impl MirroredApplication {
    pub fn from_record(id: Option<String>, variant: FormVariant, record: &ApplicationRecord) -> Self {
        Self {
            id,
            variant,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            country: record.country.clone(),
            category: record.category.clone(),
            school: record.school().map(str::to_string),
            status: record.status,
            submitted_at: record.submitted_at,
            resume_path: record.resume_path.clone(),
            deck_path: record.deck_path.clone(),
            memo_path: record.memo_path.clone(),
        }
    }

    /// The admin list line for this copy.
    pub fn to_admin_row(&self) -> AdminApplicationRow {
        AdminApplicationRow {
            id: self.id.clone(),
            variant: self.variant,
            name: format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string(),
            email: self.email.clone(),
            country: self.country.clone(),
            category: self.category.clone(),
            school: self.school.clone(),
            status: self.status,
            submitted_at: Some(self.submitted_at.to_rfc3339()),
            resume_path: self.resume_path.clone(),
            deck_path: self.deck_path.clone(),
            memo_path: self.memo_path.clone(),
            source: RowSource::Mirror,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MirrorEnvelope {
    schema_version: u32,
    entries: Vec<MirroredApplication>,
}

/// Read/append access to the mirrored applications.
#[derive(Clone)]
pub struct ApplicationMirror {
    store: Arc<dyn LocalStore>,
    // Serializes read-modify-write cycles on the mirror key.
    write_lock: Arc<Mutex<()>>,
}

impl ApplicationMirror {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// All mirrored entries, oldest first. Unreadable or foreign-version
    /// payloads are dropped from the store and read as empty.
    pub async fn entries(&self) -> Result<Vec<MirroredApplication>, CacheError> {
        let Some(raw) = self.store.get(MIRROR_KEY).await? else {
            return Ok(Vec::new());
        };

        let discard_reason = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => match value.get("schema_version").and_then(|v| v.as_u64()) {
                Some(v) if v == u64::from(MIRROR_SCHEMA_VERSION) => {
                    match serde_json::from_value::<MirrorEnvelope>(value) {
                        Ok(envelope) => return Ok(envelope.entries),
                        Err(e) => format!("malformed entries: {e}"),
                    }
                }
                Some(v) => format!("schema version {v}"),
                None => "missing schema version".to_string(),
            },
            Err(e) => format!("invalid JSON: {e}"),
        };

        tracing::warn!(
            key = MIRROR_KEY,
            reason = %discard_reason,
            expected_version = MIRROR_SCHEMA_VERSION,
            "Discarding local application mirror"
        );
        self.store.remove(MIRROR_KEY).await?;
        Ok(Vec::new())
    }

    pub async fn append(&self, entry: MirroredApplication) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.entries().await?;
        entries.push(entry);
        self.write(entries).await
    }

    /// Update the status of a mirrored entry by platform id. Returns
    /// whether an entry matched.
    pub async fn set_status(&self, id: &str, status: ApplicationStatus) -> Result<bool, CacheError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.entries().await?;
        let mut matched = false;
        for entry in entries.iter_mut().filter(|e| e.id.as_deref() == Some(id)) {
            entry.status = status;
            matched = true;
        }
        if matched {
            self.write(entries).await?;
        }
        Ok(matched)
    }

    /// Admin list lines, newest first.
    pub async fn admin_rows(&self) -> Result<Vec<AdminApplicationRow>, CacheError> {
        let mut entries = self.entries().await?;
        entries.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(entries.iter().map(MirroredApplication::to_admin_row).collect())
    }

    async fn write(&self, entries: Vec<MirroredApplication>) -> Result<(), CacheError> {
        let envelope = MirrorEnvelope {
            schema_version: MIRROR_SCHEMA_VERSION,
            entries,
        };
        self.store
            .set(MIRROR_KEY, serde_json::to_string(&envelope)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use fellowship_core::draft::{ApplicationDraft, Education};
    use fellowship_core::record::UploadedPaths;

    fn record() -> ApplicationRecord {
        let draft = ApplicationDraft {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.org".into(),
            country: "United Kingdom".into(),
            nationality: "British".into(),
            education: Some(Education::HighSchool {
                high_school: "Home tutoring".into(),
            }),
            graduation_year: "2030".into(),
            category: "Deep Tech".into(),
            project_description: "Analytical engine".into(),
            ..Default::default()
        };
        ApplicationRecord::from_draft(
            &draft,
            UploadedPaths::default(),
            Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap(),
        )
    }

    fn mirror() -> (ApplicationMirror, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ApplicationMirror::new(store.clone()), store)
    }

    #[tokio::test]
    async fn round_trip_keeps_name_and_pending_status() {
        let (mirror, _) = mirror();
        let entry = MirroredApplication::from_record(Some("row-1".into()), FormVariant::Fellowship, &record());
        mirror.append(entry.clone()).await.unwrap();

        let entries = mirror.entries().await.unwrap();
        assert_eq!(entries, vec![entry]);

        let rows = mirror.admin_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ada Lovelace");
        assert_eq!(rows[0].status, ApplicationStatus::Pending);
        assert_eq!(rows[0].school.as_deref(), Some("Home tutoring"));
        assert_eq!(rows[0].source, RowSource::Mirror);
    }

    #[tokio::test]
    async fn missing_status_defaults_to_pending() {
        let (mirror, store) = mirror();
        let raw = serde_json::json!({
            "schema_version": 1,
            "entries": [{
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@example.org",
                "submitted_at": "2026-01-02T03:04:05Z",
            }],
        });
        store.set(MIRROR_KEY, raw.to_string()).await.unwrap();

        let rows = mirror.admin_rows().await.unwrap();
        assert_eq!(rows[0].name, "Grace Hopper");
        assert_eq!(rows[0].status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn foreign_schema_version_is_discarded() {
        let (mirror, store) = mirror();
        store
            .set(MIRROR_KEY, r#"[{"firstName":"legacy"}]"#.into())
            .await
            .unwrap();
        assert!(mirror.entries().await.unwrap().is_empty());
        assert!(store.get(MIRROR_KEY).await.unwrap().is_none());

        store
            .set(MIRROR_KEY, r#"{"schema_version":2,"entries":[]}"#.into())
            .await
            .unwrap();
        assert!(mirror.entries().await.unwrap().is_empty());
        assert!(store.get(MIRROR_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_status_updates_matching_entry() {
        let (mirror, _) = mirror();
        mirror
            .append(MirroredApplication::from_record(Some("a".into()), FormVariant::House, &record()))
            .await
            .unwrap();

        assert!(mirror.set_status("a", ApplicationStatus::Accepted).await.unwrap());
        assert!(!mirror.set_status("zzz", ApplicationStatus::Rejected).await.unwrap());
        assert_eq!(
            mirror.entries().await.unwrap()[0].status,
            ApplicationStatus::Accepted
        );
    }
}
