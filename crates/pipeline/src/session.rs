//! In-progress intake sessions.
//!
//! Each session owns one [`IntakeWizard`] behind a `tokio::sync::Mutex`.
//! A submission raises the wizard's loading flag under the lock, releases
//! the lock while the pipeline runs on a spawned task, then re-locks to
//! land on `Success` or roll back. Edits and duplicate submits arriving
//! meanwhile are rejected by the wizard with a conflict.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fellowship_core::draft::{ApplicationDraft, FormVariant};
use fellowship_core::error::CoreError;
use fellowship_core::intake_wizard::{IntakeStep, IntakeWizard, StepChange, DATA_ENTRY_STEPS};
use fellowship_core::pipeline::{PipelineAbort, PipelineReport};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::submission::{SubmissionOutcome, SubmissionPipeline};

/// One applicant's form.
#[derive(Debug)]
pub struct IntakeSession {
    pub id: Uuid,
    pub wizard: IntakeWizard,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Report of the most recent submission attempt.
    pub last_report: Option<PipelineReport>,
}

impl IntakeSession {
    fn new(variant: FormVariant) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            wizard: IntakeWizard::new(variant),
            created_at: now,
            updated_at: now,
            last_report: None,
        }
    }

    pub fn view(&self) -> IntakeView {
        let step = self.wizard.step();
        IntakeView {
            id: self.id,
            variant: self.wizard.variant(),
            step,
            step_number: step.to_number(),
            step_label: step.label(),
            total_steps: DATA_ENTRY_STEPS,
            draft: self.wizard.draft().clone(),
            dirty: self.wizard.draft().is_dirty(),
            loading: self.wizard.is_loading(),
            last_report: self.last_report.clone(),
        }
    }
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeView {
    pub id: Uuid,
    pub variant: FormVariant,
    pub step: IntakeStep,
    pub step_number: u8,
    pub step_label: &'static str,
    pub total_steps: u8,
    pub draft: ApplicationDraft,
    /// Whether leaving the form would lose input.
    pub dirty: bool,
    pub loading: bool,
    pub last_report: Option<PipelineReport>,
}

/// Passed to the completion hook after a session reaches `Success`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    pub session_id: Uuid,
    pub variant: FormVariant,
    pub record_id: Option<String>,
    pub email: String,
    pub full_name: String,
}

pub type CompletionHook = Arc<dyn Fn(&SubmissionSummary) + Send + Sync>;

#[derive(Debug)]
pub struct SubmitResult {
    pub change: StepChange,
    pub outcome: SubmissionOutcome,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Refused before the pipeline ran (validation, wrong step, in flight).
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// A required pipeline step failed; the session is editable again.
    #[error(transparent)]
    Aborted(#[from] PipelineAbort),
}

/// Registry of live intake sessions.
#[derive(Clone)]
pub struct IntakeSessions {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<IntakeSession>>>>>,
    pipeline: Arc<SubmissionPipeline>,
    on_complete: Option<CompletionHook>,
}

fn not_found(id: Uuid) -> CoreError {
    CoreError::NotFound {
        entity: "IntakeSession",
        id: id.to_string(),
    }
}

impl IntakeSessions {
    pub fn new(pipeline: Arc<SubmissionPipeline>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            pipeline,
            on_complete: None,
        }
    }

    /// Invoke `hook` after every successful submission.
    pub fn with_completion_hook(mut self, hook: CompletionHook) -> Self {
        self.on_complete = Some(hook);
        self
    }

    pub async fn open(&self, variant: FormVariant) -> IntakeView {
        let session = IntakeSession::new(variant);
        let view = session.view();
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::new(Mutex::new(session)));
        tracing::debug!(session_id = %view.id, variant = variant.as_str(), "Intake session opened");
        view
    }

    async fn get(&self, id: Uuid) -> Result<Arc<Mutex<IntakeSession>>, CoreError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    pub async fn view(&self, id: Uuid) -> Result<IntakeView, CoreError> {
        let session = self.get(id).await?;
        let view = session.lock().await.view();
        Ok(view)
    }

    /// Run `f` against the session's wizard and return the resulting view.
    pub async fn update<T, F>(&self, id: Uuid, f: F) -> Result<(T, IntakeView), CoreError>
    where
        F: FnOnce(&mut IntakeWizard) -> Result<T, CoreError>,
    {
        let session = self.get(id).await?;
        let mut guard = session.lock().await;
        let value = f(&mut guard.wizard)?;
        guard.updated_at = Utc::now();
        Ok((value, guard.view()))
    }

    pub async fn discard(&self, id: Uuid) -> Result<(), CoreError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions untouched for longer than `ttl`, skipping any with a
    /// submission in flight. Returns how many were removed.
    pub async fn prune_idle(&self, ttl: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(s) => s.wizard.is_loading() || s.updated_at > cutoff,
            // Locked means in use.
            Err(_) => true,
        });
        before - sessions.len()
    }

    /// Validate, run the submission pipeline, and settle the session.
    ///
    /// The pipeline and the settling run on their own task, so a caller
    /// that stops waiting (client gone, request timeout) still leaves the
    /// session on `Success` or editable again, never stuck loading.
    pub async fn submit(&self, id: Uuid) -> Result<SubmitResult, SubmitError> {
        let session = self.get(id).await?;

        let (variant, draft) = {
            let mut guard = session.lock().await;
            let draft = guard.wizard.begin_submit()?;
            guard.updated_at = Utc::now();
            (guard.wizard.variant(), draft)
        };

        let task = tokio::spawn(settle(
            Arc::clone(&session),
            Arc::clone(&self.pipeline),
            self.on_complete.clone(),
            variant,
            draft,
        ));

        match task.await {
            Ok(result) => result,
            Err(e) => {
                let mut guard = session.lock().await;
                if guard.wizard.is_loading() {
                    guard.wizard.fail_submit();
                }
                tracing::error!(session_id = %id, error = %e, "Submission task failed");
                Err(SubmitError::Rejected(CoreError::Internal(format!(
                    "Submission task failed: {e}"
                ))))
            }
        }
    }
}

/// Run the pipeline for a session already marked loading and land it on
/// `Success` or roll it back.
async fn settle(
    session: Arc<Mutex<IntakeSession>>,
    pipeline: Arc<SubmissionPipeline>,
    on_complete: Option<CompletionHook>,
    variant: FormVariant,
    draft: ApplicationDraft,
) -> Result<SubmitResult, SubmitError> {
    match pipeline.run(variant, &draft).await {
        Ok(outcome) => {
            let (id, change) = {
                let mut guard = session.lock().await;
                guard.last_report = Some(outcome.report.clone());
                guard.updated_at = Utc::now();
                (guard.id, guard.wizard.complete_submit())
            };
            tracing::info!(
                session_id = %id,
                record_id = ?outcome.record_id,
                variant = variant.as_str(),
                "Application submitted"
            );

            if let Some(hook) = &on_complete {
                hook(&SubmissionSummary {
                    session_id: id,
                    variant,
                    record_id: outcome.record_id.clone(),
                    email: outcome.record.email.clone(),
                    full_name: outcome.record.full_name(),
                });
            }
            Ok(SubmitResult { change, outcome })
        }
        Err(abort) => {
            let mut guard = session.lock().await;
            guard.last_report = Some(abort.report.clone());
            guard.updated_at = Utc::now();
            guard.wizard.fail_submit();
            tracing::warn!(session_id = %guard.id, step = %abort.step, "Submission aborted");
            Err(abort.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use fellowship_cache::{ApplicationMirror, MemoryStore};
    use fellowship_core::draft::{AttachedFile, DocumentKind, DraftPatch, Education};
    use fellowship_platform::InMemoryPlatform;

    fn sessions(platform: Arc<InMemoryPlatform>) -> IntakeSessions {
        sessions_with_delay(platform, Duration::ZERO)
    }

    fn sessions_with_delay(platform: Arc<InMemoryPlatform>, settle_delay: Duration) -> IntakeSessions {
        let mirror = ApplicationMirror::new(Arc::new(MemoryStore::new()));
        let pipeline = SubmissionPipeline::new(
            platform,
            mirror,
            "applications",
            "send-confirmation-email",
            settle_delay,
        );
        IntakeSessions::new(Arc::new(pipeline))
    }

    /// Open a session and walk it to the last data-entry step.
    async fn ready_session(sessions: &IntakeSessions) -> Uuid {
        let id = sessions.open(FormVariant::Fellowship).await.id;
        sessions
            .update(id, |w| {
                w.apply_patch(DraftPatch {
                    first_name: Some("Alan".into()),
                    last_name: Some("Turing".into()),
                    email: Some("alan@example.org".into()),
                    country: Some("United Kingdom".into()),
                    nationality: Some("British".into()),
                    education: Some(Education::University {
                        university: "University of Cambridge".into(),
                        other_university: String::new(),
                        major: "Mathematics".into(),
                        preparatory_classes: None,
                    }),
                    graduation_year: Some("2026".into()),
                    category: Some("AI".into()),
                    project_description: Some("Thinking machines".into()),
                    linkedin_url: Some("https://linkedin.com/in/alan".into()),
                    ..Default::default()
                })?;
                w.attach(
                    DocumentKind::Resume,
                    AttachedFile::new("cv.pdf", "application/pdf", b"%PDF".to_vec()),
                )?;
                w.advance()?;
                w.advance()
            })
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn successful_submit_lands_on_success_and_calls_hook() {
        let platform = Arc::new(InMemoryPlatform::new("secret"));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sessions = sessions(platform.clone()).with_completion_hook(Arc::new(move |summary| {
            assert_eq!(summary.email, "alan@example.org");
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let id = ready_session(&sessions).await;

        let result = sessions.submit(id).await.unwrap();
        assert_eq!(result.change.to, IntakeStep::Success);
        assert!(result.change.reset_scroll);

        let view = sessions.view(id).await.unwrap();
        assert_eq!(view.step, IntakeStep::Success);
        assert!(!view.loading);
        assert!(!view.dirty);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn insert_failure_stays_on_additional_without_loading() {
        let platform = Arc::new(InMemoryPlatform::new("secret"));
        platform.fail_table("applications");
        let sessions = sessions(platform.clone());
        let id = ready_session(&sessions).await;

        let err = sessions.submit(id).await.unwrap_err();
        assert_matches!(err, SubmitError::Aborted(ref abort) if abort.step == "insert");

        let view = sessions.view(id).await.unwrap();
        assert_eq!(view.step, IntakeStep::Additional);
        assert!(!view.loading);
        assert!(view.dirty);
        assert!(view.last_report.unwrap().required_failure().is_some());

        // Resubmission is allowed once the platform recovers.
        platform.clear_failures();
        assert!(sessions.submit(id).await.is_ok());
    }

    #[tokio::test]
    async fn upload_failure_still_succeeds_with_null_path() {
        let platform = Arc::new(InMemoryPlatform::new("secret"));
        platform.fail_uploads_with_prefix("resumes/");
        let sessions = sessions(platform.clone());
        let id = ready_session(&sessions).await;

        let result = sessions.submit(id).await.unwrap();
        assert_eq!(result.change.to, IntakeStep::Success);
        assert!(result.outcome.record.resume_path.is_none());
        assert!(platform.rows("applications")[0]["resume_path"].is_null());
    }

    #[tokio::test]
    async fn submit_from_first_step_is_rejected() {
        let sessions = sessions(Arc::new(InMemoryPlatform::new("secret")));
        let id = sessions.open(FormVariant::House).await.id;
        let err = sessions.submit(id).await.unwrap_err();
        assert_matches!(err, SubmitError::Rejected(CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_and_discarded_sessions_are_not_found() {
        let sessions = sessions(Arc::new(InMemoryPlatform::new("secret")));
        assert_matches!(
            sessions.view(Uuid::new_v4()).await,
            Err(CoreError::NotFound { .. })
        );

        let id = sessions.open(FormVariant::Fellowship).await.id;
        sessions.discard(id).await.unwrap();
        assert!(sessions.is_empty().await);
        assert_matches!(sessions.discard(id).await, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn prune_removes_only_idle_sessions() {
        let sessions = sessions(Arc::new(InMemoryPlatform::new("secret")));
        sessions.open(FormVariant::Fellowship).await;
        assert_eq!(sessions.prune_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(sessions.prune_idle(Duration::ZERO).await, 1);
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn abandoned_submit_still_settles_the_session() {
        let platform = Arc::new(InMemoryPlatform::new("secret"));
        let sessions = sessions_with_delay(platform.clone(), Duration::from_millis(200));
        let id = ready_session(&sessions).await;

        // The caller gives up while the settle delay is still running.
        let gave_up = tokio::time::timeout(Duration::from_millis(20), sessions.submit(id)).await;
        assert!(gave_up.is_err());
        assert!(sessions.view(id).await.unwrap().loading);

        tokio::time::sleep(Duration::from_millis(500)).await;

        let view = sessions.view(id).await.unwrap();
        assert_eq!(view.step, IntakeStep::Success);
        assert!(!view.loading);
        assert_eq!(platform.rows("applications").len(), 1);
        assert_eq!(sessions.prune_idle(Duration::ZERO).await, 1);
    }

    #[tokio::test]
    async fn second_submit_in_flight_is_a_conflict() {
        let platform = Arc::new(InMemoryPlatform::new("secret"));
        let sessions = sessions_with_delay(platform.clone(), Duration::from_millis(100));
        let id = ready_session(&sessions).await;

        let (first, second) = tokio::join!(sessions.submit(id), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            sessions.submit(id).await
        });
        assert!(first.is_ok());
        assert_matches!(second, Err(SubmitError::Rejected(CoreError::Conflict(_))));
        assert_eq!(platform.rows("applications").len(), 1);
    }
}
