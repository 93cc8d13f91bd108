use std::fmt;

use crate::error::JobError;
use crate::job::{JobSpec, ResolvedJob};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(String),
    Skipped,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "ok",
            Outcome::Failed(_) => "failed",
            Outcome::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// 1-based position in the job list.
    pub index: usize,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    reports: Vec<JobReport>,
}

impl RunSummary {
    pub fn push(&mut self, index: usize, outcome: Outcome) {
        self.reports.push(JobReport { index, outcome });
    }

    pub fn reports(&self) -> &[JobReport] {
        &self.reports
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.reports.iter().map(|r| r.outcome.label()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Succeeded))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} job(s): {} ok, {} failed, {} skipped",
            self.reports.len(),
            self.succeeded(),
            self.failed(),
            self.skipped()
        )
    }
}

/// Receives per-job events from the runner.
pub trait Reporter {
    fn job_started(&self, index: usize, job: &ResolvedJob);
    fn job_succeeded(&self, index: usize, job: &ResolvedJob);
    /// `spec` is `None` when the configuration row itself was malformed.
    fn job_failed(&self, index: usize, spec: Option<&JobSpec>, err: &JobError);
    fn run_aborted(&self, index: usize, spec: Option<&JobSpec>, err: &JobError);
    fn job_skipped(&self, index: usize, spec: Option<&JobSpec>);
}

/// Writes job events to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn job_started(&self, index: usize, job: &ResolvedJob) {
        tracing::info!(
            "job {}: {} {} -> {}",
            index,
            job.kind,
            job.source,
            job.destination.display()
        );
    }

    fn job_succeeded(&self, index: usize, _job: &ResolvedJob) {
        tracing::debug!("job {}: done", index);
    }

    fn job_failed(&self, index: usize, spec: Option<&JobSpec>, err: &JobError) {
        match spec {
            Some(spec) => tracing::error!("job {} failed: {} ({})", index, err, spec),
            None => tracing::error!("job {} failed: {}", index, err),
        }
    }

    fn run_aborted(&self, index: usize, spec: Option<&JobSpec>, err: &JobError) {
        match spec {
            Some(spec) => tracing::error!("job {} aborted the run: {} ({})", index, err, spec),
            None => tracing::error!("job {} aborted the run: {}", index, err),
        }
    }

    fn job_skipped(&self, index: usize, _spec: Option<&JobSpec>) {
        tracing::warn!("job {}: skipped after abort", index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_outcomes() {
        let mut summary = RunSummary::default();
        summary.push(1, Outcome::Succeeded);
        summary.push(2, Outcome::Failed("boom".to_string()));
        summary.push(3, Outcome::Skipped);
        assert_eq!(summary.labels(), vec!["ok", "failed", "skipped"]);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.skipped(), 1);
        assert!(!summary.is_success());
        assert_eq!(summary.to_string(), "3 job(s): 1 ok, 1 failed, 1 skipped");
    }

    #[test]
    fn empty_summary_is_success() {
        let summary = RunSummary::default();
        assert!(summary.is_empty());
        assert!(summary.is_success());
    }
}
