//! Runner for sequential pipelines of typed steps.
//!
//! Every step is annotated [`StepPolicy::Required`] or
//! [`StepPolicy::BestEffort`]. A failing required step aborts the run and
//! returns the report so far; a failing best-effort step is logged,
//! recorded and skipped.

use std::fmt::Display;
use std::future::Future;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    Required,
    BestEffort,
}

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub policy: StepPolicy,
    pub error: Option<String>,
}

impl StepRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub steps: Vec<StepRecord>,
}

impl PipelineReport {
    /// Best-effort steps that failed, in execution order.
    pub fn best_effort_failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|s| s.policy == StepPolicy::BestEffort && !s.succeeded())
    }

    pub fn required_failure(&self) -> Option<&StepRecord> {
        self.steps
            .iter()
            .find(|s| s.policy == StepPolicy::Required && !s.succeeded())
    }

    pub fn step(&self, name: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// A required step failed; the pipeline stopped there.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Required step '{step}' failed: {message}")]
pub struct PipelineAbort {
    pub step: String,
    pub message: String,
    pub report: PipelineReport,
}

/// Executes steps in order and keeps the report.
#[derive(Debug, Default)]
pub struct PipelineRunner {
    report: PipelineReport,
}

impl PipelineRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a step whose failure aborts the pipeline.
    pub async fn required<T, E, Fut>(&mut self, name: &str, step: Fut) -> Result<T, PipelineAbort>
    where
        E: Display,
        Fut: Future<Output = Result<T, E>>,
    {
        match step.await {
            Ok(value) => {
                self.record(name, StepPolicy::Required, None);
                Ok(value)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(step = name, error = %message, "Required pipeline step failed");
                self.record(name, StepPolicy::Required, Some(message.clone()));
                Err(PipelineAbort {
                    step: name.to_string(),
                    message,
                    report: self.report.clone(),
                })
            }
        }
    }

    /// Run a step whose failure is logged and tolerated.
    pub async fn best_effort<T, E, Fut>(&mut self, name: &str, step: Fut) -> Option<T>
    where
        E: Display,
        Fut: Future<Output = Result<T, E>>,
    {
        match step.await {
            Ok(value) => {
                self.record(name, StepPolicy::BestEffort, None);
                Some(value)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(step = name, error = %message, "Best-effort pipeline step failed");
                self.record(name, StepPolicy::BestEffort, Some(message));
                None
            }
        }
    }

    /// Record a step executed outside the runner, e.g. a detached task
    /// whose outcome is not awaited.
    pub fn record(&mut self, name: &str, policy: StepPolicy, error: Option<String>) {
        self.report.steps.push(StepRecord {
            name: name.to_string(),
            policy,
            error,
        });
    }

    pub fn finish(self) -> PipelineReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok(v: u32) -> Result<u32, String> {
        Ok(v)
    }

    async fn fail(msg: &str) -> Result<u32, String> {
        Err(msg.to_string())
    }

    #[tokio::test]
    async fn best_effort_failure_continues() {
        let mut runner = PipelineRunner::new();
        let upload = runner.best_effort("upload", fail("bucket missing")).await;
        assert!(upload.is_none());
        let insert = runner.required("insert", ok(7)).await.unwrap();
        assert_eq!(insert, 7);

        let report = runner.finish();
        assert_eq!(report.steps.len(), 2);
        assert!(report.required_failure().is_none());
        let failures: Vec<_> = report.best_effort_failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "upload");
        assert_eq!(failures[0].error.as_deref(), Some("bucket missing"));
    }

    #[tokio::test]
    async fn required_failure_aborts_with_report() {
        let mut runner = PipelineRunner::new();
        runner.best_effort("upload", ok(1)).await;
        let abort = runner.required("insert", fail("duplicate key")).await.unwrap_err();

        assert_eq!(abort.step, "insert");
        assert_eq!(abort.message, "duplicate key");
        assert_eq!(abort.report.steps.len(), 2);
        assert_eq!(
            abort.report.required_failure().map(|s| s.name.as_str()),
            Some("insert")
        );
        assert_eq!(
            abort.to_string(),
            "Required step 'insert' failed: duplicate key"
        );
    }

    #[test]
    fn manual_records_are_kept_in_order() {
        let mut runner = PipelineRunner::new();
        runner.record("notify", StepPolicy::BestEffort, None);
        let report = runner.finish();
        assert!(report.step("notify").unwrap().succeeded());
        assert!(report.step("missing").is_none());
    }
}
