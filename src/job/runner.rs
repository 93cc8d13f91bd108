use std::path::{Path, PathBuf};

use crate::error::JobError;
use crate::job::registry::{CommandKind, Registry};
use crate::job::report::{Outcome, Reporter, RunSummary};
use crate::job::{Failure, JobEntry, JobSpec, ResolvedJob, RunContext};
use crate::template::TemplateResolver;
use crate::types::RunMode;
use crate::util::command::ProcessRunner;
use crate::util::paths::{destination_dir, ensure_dir};

/// Runs jobs strictly in order. A failing job is recorded and the run moves
/// on, except for a failed precondition, which skips everything after it.
pub struct Orchestrator<'a, R> {
    resolver: &'a TemplateResolver,
    registry: &'a Registry<R>,
    reporter: &'a dyn Reporter,
    run_mode: RunMode,
}

impl<'a, R: ProcessRunner> Orchestrator<'a, R> {
    pub fn new(
        resolver: &'a TemplateResolver,
        registry: &'a Registry<R>,
        reporter: &'a dyn Reporter,
        run_mode: RunMode,
    ) -> Self {
        Self {
            resolver,
            registry,
            reporter,
            run_mode,
        }
    }

    pub fn run(&self, jobs: &[JobEntry], ctx: &RunContext) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut aborted = false;
        for (pos, entry) in jobs.iter().enumerate() {
            let index = pos + 1;
            let spec = entry.as_ref().ok();
            if aborted {
                self.reporter.job_skipped(index, spec);
                summary.push(index, Outcome::Skipped);
                continue;
            }
            let result = match entry {
                Ok(spec) => self.run_one(index, spec, ctx),
                Err(err) => Err(Failure::Continue(JobError::Config(err.clone()))),
            };
            let outcome = match result {
                Ok(()) => Outcome::Succeeded,
                Err(Failure::Abort(err)) => {
                    self.reporter.run_aborted(index, spec, &err);
                    aborted = true;
                    Outcome::Failed(err.to_string())
                }
                Err(Failure::Continue(err)) => {
                    self.reporter.job_failed(index, spec, &err);
                    Outcome::Failed(err.to_string())
                }
            };
            summary.push(index, outcome);
        }
        summary
    }

    pub fn run_specs(&self, jobs: &[JobSpec], ctx: &RunContext) -> RunSummary {
        let entries: Vec<JobEntry> = jobs.iter().cloned().map(Ok).collect();
        self.run(&entries, ctx)
    }

    fn run_one(&self, index: usize, spec: &JobSpec, ctx: &RunContext) -> Result<(), Failure> {
        let job = self.resolve(spec, ctx).map_err(Failure::Continue)?;
        self.reporter.job_started(index, &job);
        self.prepare_destination(&job).map_err(Failure::Continue)?;
        self.registry.dispatch(&job)?;
        self.reporter.job_succeeded(index, &job);
        Ok(())
    }

    pub fn resolve(&self, spec: &JobSpec, ctx: &RunContext) -> Result<ResolvedJob, JobError> {
        let source = self.resolver.resolve(&spec.source, &ctx.run_timestamp);
        let destination = self.resolver.resolve(&spec.destination, &ctx.run_timestamp);
        Ok(ResolvedJob {
            kind: CommandKind::parse(&spec.command),
            params: spec.params.clone(),
            source,
            destination: anchor_destination(&destination, ctx.mountpoint.as_deref())?,
        })
    }

    fn prepare_destination(&self, job: &ResolvedJob) -> Result<(), JobError> {
        if job.kind == CommandKind::AssertExists || job.destination.as_os_str().is_empty() {
            return Ok(());
        }
        let Some(dir) = destination_dir(&job.destination) else {
            return Ok(());
        };
        if self.run_mode.dry_run {
            tracing::info!("dry-run: mkdir -p {}", dir.display());
            return Ok(());
        }
        ensure_dir(&dir)
    }
}

/// Joins a relative destination under the mountpoint.
fn anchor_destination(destination: &str, mountpoint: Option<&Path>) -> Result<PathBuf, JobError> {
    let path = Path::new(destination);
    if destination.is_empty() || path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    match mountpoint {
        Some(mountpoint) => Ok(mountpoint.join(path)),
        None => Err(JobError::RelativeDestination(destination.to_string())),
    }
}
