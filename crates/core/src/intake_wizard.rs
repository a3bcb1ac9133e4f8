//! Step controller for the multi-step application form.
//!
//! The form walks `PersonalInfo -> Education -> Additional` and leaves the
//! last data-entry step only through a submission, which lands in
//! `Success`. There is no way out of `Success`; a new session starts over
//! with an empty draft.

use serde::{Deserialize, Serialize};

use crate::draft::{ApplicationDraft, AttachedFile, DocumentKind, DraftPatch, FormVariant};
use crate::error::CoreError;
use crate::validation::{self, StepValidation};

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    PersonalInfo,
    Education,
    Additional,
    Success,
}

/// Number of data-entry steps shown in the progress indicator.
pub const DATA_ENTRY_STEPS: u8 = 3;

impl IntakeStep {
    /// 1-based position; `Success` sits after the data-entry steps.
    pub fn to_number(self) -> u8 {
        match self {
            Self::PersonalInfo => 1,
            Self::Education => 2,
            Self::Additional => 3,
            Self::Success => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PersonalInfo => "Personal Information",
            Self::Education => "Education",
            Self::Additional => "Additional Information",
            Self::Success => "Application Submitted",
        }
    }

    fn next_data_step(self) -> Option<Self> {
        match self {
            Self::PersonalInfo => Some(Self::Education),
            Self::Education => Some(Self::Additional),
            Self::Additional | Self::Success => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            Self::Education => Some(Self::PersonalInfo),
            Self::Additional => Some(Self::Education),
            Self::PersonalInfo | Self::Success => None,
        }
    }
}

/// A completed transition. The form scrolls back to the top on every move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepChange {
    pub from: IntakeStep,
    pub to: IntakeStep,
    pub reset_scroll: bool,
}

impl StepChange {
    fn new(from: IntakeStep, to: IntakeStep) -> Self {
        Self {
            from,
            to,
            reset_scroll: true,
        }
    }
}

/// The validation predicate guarding the exit of `step`.
pub fn validate_step(step: IntakeStep, draft: &ApplicationDraft) -> StepValidation {
    match step {
        IntakeStep::PersonalInfo => validation::validate_personal_info(draft),
        IntakeStep::Education => validation::validate_education(draft),
        IntakeStep::Additional => validation::validate_additional(draft),
        IntakeStep::Success => StepValidation::new(),
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Draft plus the form's position and in-flight flag.
#[derive(Debug, Clone)]
pub struct IntakeWizard {
    variant: FormVariant,
    step: IntakeStep,
    draft: ApplicationDraft,
    loading: bool,
}

impl IntakeWizard {
    pub fn new(variant: FormVariant) -> Self {
        Self {
            variant,
            step: IntakeStep::PersonalInfo,
            draft: ApplicationDraft::default(),
            loading: false,
        }
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn ensure_editable(&self) -> Result<(), CoreError> {
        if self.step == IntakeStep::Success {
            return Err(CoreError::Validation(
                "Application already submitted".to_string(),
            ));
        }
        if self.loading {
            return Err(CoreError::Conflict(
                "A submission is in progress".to_string(),
            ));
        }
        Ok(())
    }

    pub fn apply_patch(&mut self, patch: DraftPatch) -> Result<(), CoreError> {
        self.ensure_editable()?;
        patch.apply(&mut self.draft);
        Ok(())
    }

    pub fn attach(&mut self, kind: DocumentKind, file: AttachedFile) -> Result<(), CoreError> {
        self.ensure_editable()?;
        self.draft.attachments.set(kind, Some(file));
        Ok(())
    }

    pub fn detach(&mut self, kind: DocumentKind) -> Result<(), CoreError> {
        self.ensure_editable()?;
        self.draft.attachments.set(kind, None);
        Ok(())
    }

    /// Validate the current step and move forward one step.
    ///
    /// On failure the step is unchanged and the error carries the first
    /// failing rule.
    pub fn advance(&mut self) -> Result<StepChange, CoreError> {
        self.ensure_editable()?;
        let next = self.step.next_data_step().ok_or_else(|| {
            CoreError::Validation(format!(
                "Cannot advance from step '{}'; submit the application instead",
                self.step.label()
            ))
        })?;
        validate_step(self.step, &self.draft).into_result()?;

        let change = StepChange::new(self.step, next);
        self.step = next;
        Ok(change)
    }

    /// Move back one step without validating.
    pub fn retreat(&mut self) -> Result<StepChange, CoreError> {
        self.ensure_editable()?;
        let prev = self.step.previous().ok_or_else(|| {
            CoreError::Validation(format!(
                "Cannot go back from step '{}'",
                self.step.label()
            ))
        })?;

        let change = StepChange::new(self.step, prev);
        self.step = prev;
        Ok(change)
    }

    /// Start a submission.
    ///
    /// Only allowed from the last data-entry step and while no other
    /// submission is running. Runs that step's predicate followed by the
    /// final cross-field checks, then raises the loading flag and returns a
    /// snapshot of the draft for the submission pipeline.
    pub fn begin_submit(&mut self) -> Result<ApplicationDraft, CoreError> {
        self.ensure_editable()?;
        if self.step != IntakeStep::Additional {
            return Err(CoreError::Validation(format!(
                "Cannot submit from step '{}'",
                self.step.label()
            )));
        }

        let mut checks = validate_step(IntakeStep::Additional, &self.draft);
        checks.merge(validation::validate_final(&self.draft, self.variant));
        checks.into_result()?;

        self.loading = true;
        Ok(self.draft.clone())
    }

    /// Finish a successful submission: land on `Success` and drop the draft.
    pub fn complete_submit(&mut self) -> StepChange {
        let change = StepChange::new(self.step, IntakeStep::Success);
        self.step = IntakeStep::Success;
        self.draft = ApplicationDraft::default();
        self.loading = false;
        change
    }

    /// Roll back a failed submission so the applicant can resubmit.
    pub fn fail_submit(&mut self) {
        self.loading = false;
    }
}
