//! Step validation predicates for the application draft.
//!
//! Each predicate is a pure function of the draft and returns every failing
//! reason in rule order. Callers surface only the first one.

use std::sync::LazyLock;

use regex::Regex;

use crate::draft::{ApplicationDraft, Education, FormVariant, OTHER_OPTION};
use crate::error::CoreError;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").expect("valid regex"));

/// Earliest accepted graduation year.
pub const MIN_GRADUATION_YEAR: u16 = 1950;

/// Latest accepted graduation year.
pub const MAX_GRADUATION_YEAR: u16 = 2100;

/// Schools recruiting through the classes préparatoires; applicants from
/// these must say whether they attended them.
pub const PREPARATORY_CLASS_SCHOOLS: &[&str] = &[
    "École Polytechnique",
    "HEC Paris",
    "ESSEC Business School",
    "ESCP Business School",
    "CentraleSupélec",
    "École Normale Supérieure (ENS Paris)",
    "Mines Paris - PSL",
    "École des Ponts ParisTech",
    "Télécom Paris",
    "ENSAE Paris",
];

// ---------------------------------------------------------------------------
// Result type
// ---------------------------------------------------------------------------

/// Ordered outcome of one validation predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepValidation {
    reasons: Vec<String>,
}

impl StepValidation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `reason` unless `ok` holds.
    pub fn check(&mut self, ok: bool, reason: impl Into<String>) -> &mut Self {
        if !ok {
            self.reasons.push(reason.into());
        }
        self
    }

    pub fn merge(&mut self, other: StepValidation) -> &mut Self {
        self.reasons.extend(other.reasons);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn first_reason(&self) -> Option<&str> {
        self.reasons.first().map(String::as_str)
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// Fail fast: convert to an error carrying only the first reason.
    pub fn into_result(self) -> Result<(), CoreError> {
        match self.reasons.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(CoreError::Validation(first)),
        }
    }
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Host part of an absolute URL with the given scheme prefix, lowercased.
fn url_host(url: &str, scheme_prefix: &str) -> Option<String> {
    let url = url.trim();
    if url.chars().any(char::is_whitespace) {
        return None;
    }
    let rest = url.get(..scheme_prefix.len()).and_then(|prefix| {
        prefix
            .eq_ignore_ascii_case(scheme_prefix)
            .then(|| &url[scheme_prefix.len()..])
    })?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if authority.contains('@') {
        return None;
    }
    let host = authority.split(':').next().unwrap_or_default();
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// `true` when `url` is an `https` URL on `domain` or one of its subdomains.
pub fn is_https_on_domain(url: &str, domain: &str) -> bool {
    match url_host(url, "https://") {
        Some(host) => host == domain || host.ends_with(&format!(".{domain}")),
        None => false,
    }
}

/// `true` for any absolute `http` or `https` URL with a host.
pub fn is_http_url(url: &str) -> bool {
    url_host(url, "https://").is_some() || url_host(url, "http://").is_some()
}

/// Whether `university` is one of the schools recruited through
/// preparatory classes. Matches the typed name too, ignoring case.
pub fn requires_preparatory_classes(university: &str) -> bool {
    let university = university.trim();
    PREPARATORY_CLASS_SCHOOLS
        .iter()
        .any(|school| school.eq_ignore_ascii_case(university))
}

pub fn is_valid_graduation_year(year: &str) -> bool {
    let year = year.trim();
    YEAR_RE.is_match(year)
        && year
            .parse::<u16>()
            .map(|y| (MIN_GRADUATION_YEAR..=MAX_GRADUATION_YEAR).contains(&y))
            .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Step predicates
// ---------------------------------------------------------------------------

/// Rules for the personal-information step.
pub fn validate_personal_info(draft: &ApplicationDraft) -> StepValidation {
    let mut v = StepValidation::new();
    v.check(present(&draft.first_name), "First name is required")
        .check(present(&draft.last_name), "Last name is required")
        .check(present(&draft.email), "Email is required");
    if present(&draft.email) {
        v.check(
            is_valid_email(&draft.email),
            "Please enter a valid email address",
        );
    }
    v.check(present(&draft.country), "Country is required");
    if draft.country == OTHER_OPTION {
        v.check(
            present(&draft.other_country),
            "Please specify your country",
        );
    }
    v.check(present(&draft.nationality), "Nationality is required");
    v
}

/// Rules for the education step.
pub fn validate_education(draft: &ApplicationDraft) -> StepValidation {
    let mut v = StepValidation::new();
    match &draft.education {
        None => {
            v.check(false, "Please select your education background");
        }
        Some(Education::University {
            university,
            other_university,
            major,
            preparatory_classes,
        }) => {
            v.check(present(university), "University is required");
            if university == OTHER_OPTION {
                v.check(
                    present(other_university),
                    "Please specify your university",
                );
            }
            v.check(present(major), "Major is required");
            let resolved = if university == OTHER_OPTION {
                other_university
            } else {
                university
            };
            if requires_preparatory_classes(resolved) {
                v.check(
                    preparatory_classes.is_some(),
                    "Please indicate whether you attended preparatory classes",
                );
            }
        }
        Some(Education::HighSchool { high_school }) => {
            v.check(present(high_school), "High school name is required");
        }
        Some(Education::GraduateSchool {
            graduate_school,
            program,
        }) => {
            v.check(present(graduate_school), "Graduate school is required");
            v.check(present(program), "Graduate program is required");
        }
        Some(Education::Other { description }) => {
            v.check(
                present(description),
                "Please describe your education background",
            );
        }
    }
    v.check(
        present(&draft.graduation_year),
        "Graduation year is required",
    );
    if present(&draft.graduation_year) {
        v.check(
            is_valid_graduation_year(&draft.graduation_year),
            format!(
                "Graduation year must be between {MIN_GRADUATION_YEAR} and {MAX_GRADUATION_YEAR}"
            ),
        );
    }
    v
}

/// Rules for the last data-entry step.
pub fn validate_additional(draft: &ApplicationDraft) -> StepValidation {
    let mut v = StepValidation::new();
    v.check(present(&draft.category), "Please select a category")
        .check(
            present(&draft.project_description),
            "Please describe your project",
        );
    if draft.building_company {
        v.check(
            present(&draft.company_context),
            "Please tell us about the company you are building",
        );
    }
    v.check(
        draft.attachments.resume.is_some(),
        "Please attach your resume",
    );
    v
}

/// Cross-field checks run on submit after the per-step predicates.
pub fn validate_final(draft: &ApplicationDraft, variant: FormVariant) -> StepValidation {
    let mut v = StepValidation::new();
    match variant {
        FormVariant::Fellowship => {
            v.check(present(&draft.linkedin_url), "LinkedIn URL is required");
        }
        FormVariant::House => {
            v.check(present(&draft.video_url), "Video URL is required");
        }
    }
    if present(&draft.linkedin_url) {
        v.check(
            is_https_on_domain(&draft.linkedin_url, "linkedin.com"),
            "LinkedIn URL must be an https://linkedin.com link",
        );
    }
    if present(&draft.github_url) {
        v.check(
            is_https_on_domain(&draft.github_url, "github.com"),
            "GitHub URL must be an https://github.com link",
        );
    }
    if present(&draft.video_url) {
        v.check(is_http_url(&draft.video_url), "Video URL must be a valid link");
    }
    for (i, url) in draft.competitive_profiles.iter().enumerate() {
        if present(url) {
            v.check(
                is_http_url(url),
                format!("Competitive profile #{} must be a valid link", i + 1),
            );
        }
    }
    v
}
