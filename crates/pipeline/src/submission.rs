//! The submission pipeline for one validated draft.
//!
//! | # | Step                 | Policy      | On failure                      |
//! |---|----------------------|-------------|---------------------------------|
//! | 1 | `upload_{kind}`      | best-effort | path stays null                 |
//! | 2 | `insert`             | required    | abort, nothing else runs        |
//! | 3 | `mirror`             | best-effort | logged                          |
//! | 4 | `confirmation_email` | best-effort | detached, logged by the task    |
//!
//! Final validation runs in the wizard before the pipeline starts.

use std::sync::Arc;
use std::time::Duration;

use fellowship_cache::{ApplicationMirror, MirroredApplication};
use fellowship_core::draft::{ApplicationDraft, DocumentKind, FormVariant};
use fellowship_core::pipeline::{PipelineAbort, PipelineReport, PipelineRunner, StepPolicy};
use fellowship_core::record::{storage_path, ApplicationRecord, UploadedPaths};
use fellowship_platform::{PlatformClient, PlatformError};
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const STEP_INSERT: &str = "insert";
pub const STEP_MIRROR: &str = "mirror";
pub const STEP_CONFIRMATION_EMAIL: &str = "confirmation_email";

/// Name of the upload step for one document kind.
pub fn upload_step(kind: DocumentKind) -> String {
    format!("upload_{}", kind.as_str())
}

/// Result of a pipeline run that got past the insert.
#[derive(Debug)]
pub struct SubmissionOutcome {
    /// Row id assigned by the platform, if it returned one.
    pub record_id: Option<String>,
    pub record: ApplicationRecord,
    pub report: PipelineReport,
    /// The detached confirmation-email task. Dropping it does not cancel it.
    pub confirmation: JoinHandle<Result<serde_json::Value, PlatformError>>,
}

pub struct SubmissionPipeline {
    platform: Arc<dyn PlatformClient>,
    mirror: ApplicationMirror,
    storage_bucket: String,
    confirmation_function: String,
    settle_delay: Duration,
}

impl SubmissionPipeline {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        mirror: ApplicationMirror,
        storage_bucket: impl Into<String>,
        confirmation_function: impl Into<String>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            platform,
            mirror,
            storage_bucket: storage_bucket.into(),
            confirmation_function: confirmation_function.into(),
            settle_delay,
        }
    }

    /// Run every step for `draft`, then wait out the settle delay.
    pub async fn run(
        &self,
        variant: FormVariant,
        draft: &ApplicationDraft,
    ) -> Result<SubmissionOutcome, PipelineAbort> {
        let mut runner = PipelineRunner::new();

        // -- Uploads --
        let mut paths = UploadedPaths::default();
        for kind in DocumentKind::ALL {
            let Some(file) = draft.attachments.get(kind) else {
                continue;
            };
            let path = storage_path(kind, Uuid::new_v4(), &file.file_name);
            let stored = runner
                .best_effort(
                    &upload_step(kind),
                    self.platform.upload(
                        &self.storage_bucket,
                        &path,
                        &file.content_type,
                        file.bytes.clone(),
                    ),
                )
                .await;
            paths.set(kind, stored);
        }

        // -- Insert --
        let record = ApplicationRecord::from_draft(draft, paths, chrono::Utc::now());
        let inserted = runner
            .required(STEP_INSERT, async {
                let row = record.to_row(variant).map_err(|e| e.to_string())?;
                self.platform
                    .insert(variant.table(), row)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await?;
        let record_id = inserted.get("id").and_then(|id| match id {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        tracing::info!(
            variant = variant.as_str(),
            record_id = ?record_id,
            "Application inserted"
        );

        // -- Mirror --
        let entry = MirroredApplication::from_record(record_id.clone(), variant, &record);
        runner
            .best_effort(STEP_MIRROR, self.mirror.append(entry))
            .await;

        // -- Confirmation email --
        let confirmation = self.spawn_confirmation(variant, &record);
        runner.record(STEP_CONFIRMATION_EMAIL, StepPolicy::BestEffort, None);

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        Ok(SubmissionOutcome {
            record_id,
            record,
            report: runner.finish(),
            confirmation,
        })
    }

    fn spawn_confirmation(
        &self,
        variant: FormVariant,
        record: &ApplicationRecord,
    ) -> JoinHandle<Result<serde_json::Value, PlatformError>> {
        let platform = Arc::clone(&self.platform);
        let function = self.confirmation_function.clone();
        let body = serde_json::json!({
            "email": record.email,
            "name": record.full_name(),
            "variant": variant.as_str(),
        });

        tokio::spawn(async move {
            let result = platform.invoke(&function, body).await;
            if let Err(e) = &result {
                tracing::warn!(
                    step = STEP_CONFIRMATION_EMAIL,
                    function = %function,
                    error = %e,
                    "Best-effort pipeline step failed"
                );
            }
            result
        })
    }
}
