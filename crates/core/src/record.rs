//! Persistence shapes for submitted applications.
//!
//! A validated draft is flattened into an [`ApplicationRecord`]: the
//! education branch becomes `education_background` plus the branch's
//! columns, "Other" selections resolve to their free-text values, and
//! conditional fields are dropped when their condition is off. The record
//! is then rendered as a row for the variant's table.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::draft::{ApplicationDraft, DocumentKind, Education, FormVariant, OTHER_OPTION};
use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Application status
// ---------------------------------------------------------------------------

/// Review status of a submitted application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewing,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "reviewing" => Ok(Self::Reviewing),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(CoreError::Validation(format!(
                "Invalid application status '{s}'. Must be one of: pending, reviewing, accepted, rejected"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewing => "reviewing",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

// ---------------------------------------------------------------------------
// Storage paths
// ---------------------------------------------------------------------------

/// Storage paths of uploaded documents; `None` when absent or the upload
/// failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedPaths {
    pub resume: Option<String>,
    pub deck: Option<String>,
    pub memo: Option<String>,
}

impl UploadedPaths {
    pub fn set(&mut self, kind: DocumentKind, path: Option<String>) {
        match kind {
            DocumentKind::Resume => self.resume = path,
            DocumentKind::Deck => self.deck = path,
            DocumentKind::Memo => self.memo = path,
        }
    }
}

/// Keep file names storage-safe: ASCII alphanumerics, `.`, `-` and `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(|c: char| c == '.' || c == '_').is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

/// Object path for an uploaded document, namespaced by kind.
pub fn storage_path(kind: DocumentKind, upload_id: Uuid, file_name: &str) -> String {
    format!(
        "{}/{}-{}",
        kind.storage_prefix(),
        upload_id,
        sanitize_file_name(file_name)
    )
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Normalized application row for the `applications` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country: String,
    pub nationality: String,
    pub education_background: String,
    pub university: Option<String>,
    pub major: Option<String>,
    pub preparatory_classes: Option<bool>,
    pub high_school: Option<String>,
    pub graduate_school: Option<String>,
    pub graduate_program: Option<String>,
    pub education_other: Option<String>,
    pub graduation_year: Option<i32>,
    pub category: String,
    pub project_description: String,
    pub building_company: bool,
    pub company_context: Option<String>,
    pub resume_path: Option<String>,
    pub deck_path: Option<String>,
    pub memo_path: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub twitter_url: Option<String>,
    pub video_url: Option<String>,
    pub competitive_profiles: Vec<String>,
    pub status: ApplicationStatus,
    pub submitted_at: Timestamp,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ApplicationRecord {
    /// Flatten a validated draft. Only the chosen education branch fills
    /// its columns; the others stay null.
    pub fn from_draft(draft: &ApplicationDraft, paths: UploadedPaths, submitted_at: Timestamp) -> Self {
        let mut record = Self {
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            email: draft.email.trim().to_lowercase(),
            country: draft.resolved_country().to_string(),
            nationality: draft.nationality.trim().to_string(),
            education_background: String::new(),
            university: None,
            major: None,
            preparatory_classes: None,
            high_school: None,
            graduate_school: None,
            graduate_program: None,
            education_other: None,
            graduation_year: draft.graduation_year.trim().parse().ok(),
            category: draft.category.trim().to_string(),
            project_description: draft.project_description.trim().to_string(),
            building_company: draft.building_company,
            company_context: if draft.building_company {
                non_empty(&draft.company_context)
            } else {
                None
            },
            resume_path: paths.resume,
            deck_path: paths.deck,
            memo_path: paths.memo,
            linkedin_url: non_empty(&draft.linkedin_url),
            github_url: non_empty(&draft.github_url),
            twitter_url: non_empty(&draft.twitter_url),
            video_url: non_empty(&draft.video_url),
            competitive_profiles: draft
                .competitive_profiles
                .iter()
                .filter_map(|url| non_empty(url))
                .collect(),
            status: ApplicationStatus::Pending,
            submitted_at,
        };

        if let Some(education) = &draft.education {
            record.education_background = education.background().to_string();
            match education {
                Education::University {
                    university,
                    other_university,
                    major,
                    preparatory_classes,
                } => {
                    record.university = if university == OTHER_OPTION {
                        non_empty(other_university)
                    } else {
                        non_empty(university)
                    };
                    record.major = non_empty(major);
                    record.preparatory_classes = *preparatory_classes;
                }
                Education::HighSchool { high_school } => {
                    record.high_school = non_empty(high_school);
                }
                Education::GraduateSchool {
                    graduate_school,
                    program,
                } => {
                    record.graduate_school = non_empty(graduate_school);
                    record.graduate_program = non_empty(program);
                }
                Education::Other { description } => {
                    record.education_other = non_empty(description);
                }
            }
        }

        record
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// School line used by views that show a single institution.
    pub fn school(&self) -> Option<&str> {
        self.university
            .as_deref()
            .or(self.graduate_school.as_deref())
            .or(self.high_school.as_deref())
            .or(self.education_other.as_deref())
    }

    /// Render the row for `variant`'s table.
    pub fn to_row(&self, variant: FormVariant) -> Result<serde_json::Value, CoreError> {
        let row = match variant {
            FormVariant::Fellowship => serde_json::to_value(self),
            FormVariant::House => serde_json::to_value(HouseApplicationRow::from(self)),
        };
        row.map_err(|e| CoreError::Internal(format!("Failed to encode application row: {e}")))
    }
}

/// Row shape of the `houseapplications` table, which names its columns
/// differently from `applications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseApplicationRow {
    pub full_name: String,
    pub email: String,
    pub country: String,
    pub nationality: String,
    pub school: Option<String>,
    pub field_of_study: Option<String>,
    pub graduation_year: Option<i32>,
    pub track: String,
    pub pitch: String,
    pub is_founder: bool,
    pub startup_details: Option<String>,
    pub video_link: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub resume_url: Option<String>,
    pub deck_url: Option<String>,
    pub memo_url: Option<String>,
    pub profiles: Vec<String>,
    pub status: ApplicationStatus,
    pub created_at: Timestamp,
}

impl From<&ApplicationRecord> for HouseApplicationRow {
    fn from(r: &ApplicationRecord) -> Self {
        Self {
            full_name: r.full_name(),
            email: r.email.clone(),
            country: r.country.clone(),
            nationality: r.nationality.clone(),
            school: r.school().map(str::to_string),
            field_of_study: r.major.clone().or_else(|| r.graduate_program.clone()),
            graduation_year: r.graduation_year,
            track: r.category.clone(),
            pitch: r.project_description.clone(),
            is_founder: r.building_company,
            startup_details: r.company_context.clone(),
            video_link: r.video_url.clone(),
            linkedin: r.linkedin_url.clone(),
            github: r.github_url.clone(),
            resume_url: r.resume_path.clone(),
            deck_url: r.deck_path.clone(),
            memo_url: r.memo_path.clone(),
            profiles: r.competitive_profiles.clone(),
            status: r.status,
            created_at: r.submitted_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Admin list projection
// ---------------------------------------------------------------------------

/// Where an admin list row was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSource {
    Platform,
    Mirror,
}

/// One line of the admin applications list, identical for both variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminApplicationRow {
    pub id: Option<String>,
    pub variant: FormVariant,
    pub name: String,
    pub email: String,
    pub country: String,
    pub category: String,
    pub school: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: Option<String>,
    pub resume_path: Option<String>,
    pub deck_path: Option<String>,
    pub memo_path: Option<String>,
    pub source: RowSource,
}

fn str_field(row: &serde_json::Value, key: &str) -> Option<String> {
    row.get(key)
        .and_then(serde_json::Value::as_str)
        .and_then(non_empty)
}

impl AdminApplicationRow {
    /// Project a platform row of `variant`'s table. Missing columns become
    /// empty strings or `None`; an unreadable status reads as pending.
    pub fn from_platform_row(variant: FormVariant, row: &serde_json::Value) -> Self {
        let id = row.get("id").and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let status = str_field(row, "status")
            .and_then(|s| ApplicationStatus::from_str_db(&s).ok())
            .unwrap_or_default();

        let (name, category, school, submitted_at, paths) = match variant {
            FormVariant::Fellowship => (
                format!(
                    "{} {}",
                    str_field(row, "first_name").unwrap_or_default(),
                    str_field(row, "last_name").unwrap_or_default()
                )
                .trim()
                .to_string(),
                str_field(row, "category"),
                str_field(row, "university")
                    .or_else(|| str_field(row, "graduate_school"))
                    .or_else(|| str_field(row, "high_school"))
                    .or_else(|| str_field(row, "education_other")),
                str_field(row, "submitted_at").or_else(|| str_field(row, "created_at")),
                ["resume_path", "deck_path", "memo_path"],
            ),
            FormVariant::House => (
                str_field(row, "full_name").unwrap_or_default(),
                str_field(row, "track"),
                str_field(row, "school"),
                str_field(row, "created_at"),
                ["resume_url", "deck_url", "memo_url"],
            ),
        };

        Self {
            id,
            variant,
            name,
            email: str_field(row, "email").unwrap_or_default(),
            country: str_field(row, "country").unwrap_or_default(),
            category: category.unwrap_or_default(),
            school,
            status,
            submitted_at,
            resume_path: str_field(row, paths[0]),
            deck_path: str_field(row, paths[1]),
            memo_path: str_field(row, paths[2]),
            source: RowSource::Platform,
        }
    }

    /// Stored path of one document, if it was uploaded.
    pub fn document_path(&self, kind: DocumentKind) -> Option<&str> {
        match kind {
            DocumentKind::Resume => self.resume_path.as_deref(),
            DocumentKind::Deck => self.deck_path.as_deref(),
            DocumentKind::Memo => self.memo_path.as_deref(),
        }
    }
}
