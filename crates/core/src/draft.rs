//! The in-memory application draft.
//!
//! A draft starts empty when an intake session opens and is mutated by
//! partial patches until it is submitted. Text fields use the empty string
//! as their "not provided" value so the empty draft is exactly
//! `ApplicationDraft::default()`, which is what dirtiness is measured
//! against.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Select value that unlocks the matching free-text field.
pub const OTHER_OPTION: &str = "Other";

// ---------------------------------------------------------------------------
// Form variant
// ---------------------------------------------------------------------------

/// Which application form a session is driving.
///
/// The two variants persist into different tables with different column
/// names and require a different URL at final validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormVariant {
    #[default]
    Fellowship,
    House,
}

impl FormVariant {
    /// Platform table the normalized record is inserted into.
    pub fn table(self) -> &'static str {
        match self {
            Self::Fellowship => "applications",
            Self::House => "houseapplications",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fellowship => "fellowship",
            Self::House => "house",
        }
    }

    pub fn from_str_opt(s: &str) -> Result<Self, CoreError> {
        match s {
            "fellowship" => Ok(Self::Fellowship),
            "house" => Ok(Self::House),
            _ => Err(CoreError::Validation(format!(
                "Invalid form variant '{s}'. Must be one of: fellowship, house"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Education
// ---------------------------------------------------------------------------

/// Education background, one branch per option of the select.
///
/// Serialized with an `education_background` tag whose values are
/// `university`, `highSchool`, `graduateSchool` and `other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "education_background", rename_all = "camelCase")]
pub enum Education {
    University {
        #[serde(default)]
        university: String,
        #[serde(default)]
        other_university: String,
        #[serde(default)]
        major: String,
        #[serde(default)]
        preparatory_classes: Option<bool>,
    },
    HighSchool {
        #[serde(default)]
        high_school: String,
    },
    GraduateSchool {
        #[serde(default)]
        graduate_school: String,
        #[serde(default)]
        program: String,
    },
    Other {
        #[serde(default)]
        description: String,
    },
}

impl Education {
    /// The tag value for this branch.
    pub fn background(&self) -> &'static str {
        match self {
            Self::University { .. } => "university",
            Self::HighSchool { .. } => "highSchool",
            Self::GraduateSchool { .. } => "graduateSchool",
            Self::Other { .. } => "other",
        }
    }
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// Kinds of documents an applicant can attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    Deck,
    Memo,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [Self::Resume, Self::Deck, Self::Memo];

    pub fn from_str_opt(s: &str) -> Result<Self, CoreError> {
        match s {
            "resume" => Ok(Self::Resume),
            "deck" => Ok(Self::Deck),
            "memo" => Ok(Self::Memo),
            _ => Err(CoreError::Validation(format!(
                "Invalid document kind '{s}'. Must be one of: resume, deck, memo"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::Deck => "deck",
            Self::Memo => "memo",
        }
    }

    /// Storage folder that namespaces uploads of this kind.
    pub fn storage_prefix(self) -> &'static str {
        match self {
            Self::Resume => "resumes",
            Self::Deck => "decks",
            Self::Memo => "memos",
        }
    }
}

/// A file held in memory until submission uploads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedFile {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl AttachedFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size_bytes: bytes.len(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attachments {
    pub resume: Option<AttachedFile>,
    pub deck: Option<AttachedFile>,
    pub memo: Option<AttachedFile>,
}

impl Attachments {
    pub fn get(&self, kind: DocumentKind) -> Option<&AttachedFile> {
        match kind {
            DocumentKind::Resume => self.resume.as_ref(),
            DocumentKind::Deck => self.deck.as_ref(),
            DocumentKind::Memo => self.memo.as_ref(),
        }
    }

    /// Replace the file for `kind`; `None` detaches it.
    pub fn set(&mut self, kind: DocumentKind, file: Option<AttachedFile>) {
        let slot = match kind {
            DocumentKind::Resume => &mut self.resume,
            DocumentKind::Deck => &mut self.deck,
            DocumentKind::Memo => &mut self.memo,
        };
        *slot = file;
    }

    pub fn is_empty(&self) -> bool {
        self.resume.is_none() && self.deck.is_none() && self.memo.is_none()
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country: String,
    pub other_country: String,
    pub nationality: String,
    pub education: Option<Education>,
    pub graduation_year: String,
    pub category: String,
    pub project_description: String,
    pub building_company: bool,
    pub company_context: String,
    pub attachments: Attachments,
    pub linkedin_url: String,
    pub github_url: String,
    pub twitter_url: String,
    pub video_url: String,
    pub competitive_profiles: Vec<String>,
}

impl ApplicationDraft {
    /// A draft is dirty when anything differs from the empty draft,
    /// including an attached file.
    pub fn is_dirty(&self) -> bool {
        *self != Self::default()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Country as it should be persisted: the free-text value when the
    /// applicant picked "Other".
    pub fn resolved_country(&self) -> &str {
        if self.country == OTHER_OPTION {
            self.other_country.trim()
        } else {
            self.country.trim()
        }
    }

    pub fn add_competitive_profile(&mut self, url: impl Into<String>) {
        self.competitive_profiles.push(url.into());
    }

    /// Remove the competitive profile at `index`.
    pub fn remove_competitive_profile(&mut self, index: usize) -> Result<String, CoreError> {
        if index >= self.competitive_profiles.len() {
            return Err(CoreError::Validation(format!(
                "No competitive profile at position {index}"
            )));
        }
        Ok(self.competitive_profiles.remove(index))
    }
}

/// Partial update coming from the form's controlled inputs.
///
/// Every present field overwrites the draft's value; `education` replaces
/// the whole branch (switching branches drops the old branch's fields).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraftPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub other_country: Option<String>,
    pub nationality: Option<String>,
    pub education: Option<Education>,
    pub graduation_year: Option<String>,
    pub category: Option<String>,
    pub project_description: Option<String>,
    pub building_company: Option<bool>,
    pub company_context: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub twitter_url: Option<String>,
    pub video_url: Option<String>,
    pub competitive_profiles: Option<Vec<String>>,
}

impl DraftPatch {
    pub fn apply(self, draft: &mut ApplicationDraft) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut draft.first_name, self.first_name);
        set(&mut draft.last_name, self.last_name);
        set(&mut draft.email, self.email);
        set(&mut draft.country, self.country);
        set(&mut draft.other_country, self.other_country);
        set(&mut draft.nationality, self.nationality);
        if let Some(education) = self.education {
            draft.education = Some(education);
        }
        set(&mut draft.graduation_year, self.graduation_year);
        set(&mut draft.category, self.category);
        set(&mut draft.project_description, self.project_description);
        set(&mut draft.building_company, self.building_company);
        set(&mut draft.company_context, self.company_context);
        set(&mut draft.linkedin_url, self.linkedin_url);
        set(&mut draft.github_url, self.github_url);
        set(&mut draft.twitter_url, self.twitter_url);
        set(&mut draft.video_url, self.video_url);
        set(&mut draft.competitive_profiles, self.competitive_profiles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_draft_is_clean() {
        assert!(!ApplicationDraft::default().is_dirty());
    }

    #[test]
    fn any_field_makes_draft_dirty() {
        let mut draft = ApplicationDraft::default();
        draft.nationality = "French".into();
        assert!(draft.is_dirty());
    }

    #[test]
    fn attached_file_makes_draft_dirty() {
        let mut draft = ApplicationDraft::default();
        draft.attachments.set(
            DocumentKind::Resume,
            Some(AttachedFile::new("cv.pdf", "application/pdf", vec![1, 2, 3])),
        );
        assert!(draft.is_dirty());

        draft.attachments.set(DocumentKind::Resume, None);
        assert!(!draft.is_dirty());
    }

    #[test]
    fn patch_overwrites_only_present_fields() {
        let mut draft = ApplicationDraft {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            ..Default::default()
        };
        let patch: DraftPatch = serde_json::from_value(json!({ "last_name": "Byron" })).unwrap();
        patch.apply(&mut draft);
        assert_eq!(draft.first_name, "Ada");
        assert_eq!(draft.last_name, "Byron");
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let parsed: Result<DraftPatch, _> = serde_json::from_value(json!({ "fistName": "x" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn education_branch_uses_camel_case_tag() {
        let patch: DraftPatch = serde_json::from_value(json!({
            "education": {
                "education_background": "graduateSchool",
                "graduate_school": "MIT",
                "program": "EECS"
            }
        }))
        .unwrap();
        let mut draft = ApplicationDraft::default();
        patch.apply(&mut draft);
        let education = draft.education.expect("education set");
        assert_eq!(education.background(), "graduateSchool");
        assert_eq!(
            education,
            Education::GraduateSchool {
                graduate_school: "MIT".into(),
                program: "EECS".into(),
            }
        );
    }

    #[test]
    fn switching_branch_drops_previous_fields() {
        let mut draft = ApplicationDraft {
            education: Some(Education::HighSchool {
                high_school: "Lycée Henri-IV".into(),
            }),
            ..Default::default()
        };
        DraftPatch {
            education: Some(Education::Other {
                description: "Self-taught".into(),
            }),
            ..Default::default()
        }
        .apply(&mut draft);
        assert_eq!(draft.education.unwrap().background(), "other");
    }

    #[test]
    fn resolved_country_prefers_free_text_for_other() {
        let draft = ApplicationDraft {
            country: OTHER_OPTION.into(),
            other_country: " Andorra ".into(),
            ..Default::default()
        };
        assert_eq!(draft.resolved_country(), "Andorra");
    }

    #[test]
    fn competitive_profiles_add_and_remove() {
        let mut draft = ApplicationDraft::default();
        draft.add_competitive_profile("https://codeforces.com/profile/ada");
        draft.add_competitive_profile("https://www.kaggle.com/ada");
        let removed = draft.remove_competitive_profile(0).unwrap();
        assert_eq!(removed, "https://codeforces.com/profile/ada");
        assert_eq!(draft.competitive_profiles.len(), 1);
        assert!(draft.remove_competitive_profile(5).is_err());
    }

    #[test]
    fn attachment_bytes_are_not_serialized() {
        let file = AttachedFile::new("deck.pdf", "application/pdf", vec![0; 16]);
        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["size_bytes"], 16);
        assert!(value.get("bytes").is_none());
    }

    #[test]
    fn document_kind_parsing() {
        for kind in DocumentKind::ALL {
            assert_eq!(DocumentKind::from_str_opt(kind.as_str()).unwrap(), kind);
        }
        assert!(DocumentKind::from_str_opt("photo").is_err());
    }

    #[test]
    fn variant_tables_differ() {
        assert_eq!(FormVariant::Fellowship.table(), "applications");
        assert_eq!(FormVariant::House.table(), "houseapplications");
        assert_eq!(FormVariant::from_str_opt("house").unwrap(), FormVariant::House);
    }
}
