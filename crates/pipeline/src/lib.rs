//! Application intake sessions and the submission pipeline.
//!
//! - [`IntakeSessions`] -- registry of in-progress forms, one
//!   [`IntakeWizard`](fellowship_core::intake_wizard::IntakeWizard) each.
//! - [`SubmissionPipeline`] -- uploads, insert, mirror and confirmation
//!   email for one submitted draft.
//! - [`IntakeConfig`] -- environment configuration for both.

pub mod config;
pub mod session;
pub mod submission;

pub use config::IntakeConfig;
pub use session::{IntakeSession, IntakeSessions, IntakeView, SubmitError, SubmitResult, SubmissionSummary};
pub use submission::{SubmissionOutcome, SubmissionPipeline};
