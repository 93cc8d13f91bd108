use std::path::Path;
use std::time::Duration;

use chrono::Local;

use crate::config::jobs::load_jobs;
use crate::config::model::Settings;
use crate::device::{CommandMountTool, LsblkCatalog, MountCoordinator, MountTool, PartitionSource};
use crate::error::Result;
use crate::job::registry::Registry;
use crate::job::report::{RunSummary, TracingReporter};
use crate::job::runner::Orchestrator;
use crate::job::{JobEntry, RunContext};
use crate::template::TemplateResolver;
use crate::types::{DeviceName, RunMode};
use crate::util::command::{ProcessRunner, SystemRunner};

pub struct BackupRequest<'a> {
    pub device: Option<&'a DeviceName>,
    pub jobs_file: Option<&'a Path>,
    pub unmount_after: bool,
}

pub fn run_backup_command(
    request: &BackupRequest<'_>,
    settings: &Settings,
    run_mode: RunMode,
) -> Result<RunSummary> {
    let coordinator = MountCoordinator::new(
        LsblkCatalog,
        CommandMountTool::from_settings(&settings.mount)?,
    );
    let runner = SystemRunner::new(run_mode)
        .with_timeout(settings.command_timeout_secs.map(Duration::from_secs));
    run_backup(
        request,
        settings,
        run_mode,
        &coordinator,
        runner,
        &TemplateResolver::from_env(),
    )
}

/// Loads the jobs, brings the device up when one is given, runs everything
/// and unmounts afterwards if asked to.
pub fn run_backup<C, M, R>(
    request: &BackupRequest<'_>,
    settings: &Settings,
    run_mode: RunMode,
    coordinator: &MountCoordinator<C, M>,
    runner: R,
    resolver: &TemplateResolver,
) -> Result<RunSummary>
where
    C: PartitionSource,
    M: MountTool,
    R: ProcessRunner,
{
    let argv: Vec<String> = std::env::args().collect();
    tracing::info!("backup start: {}", argv.join(" "));
    let run_timestamp = Local::now().fixed_offset();

    let jobs: Vec<JobEntry> = match request.jobs_file {
        Some(path) => load_jobs(path)?,
        None => settings.device_jobs().into_iter().map(Ok).collect(),
    };
    tracing::debug!("loaded {} job(s)", jobs.len());
    if jobs.is_empty() {
        tracing::warn!("no jobs configured");
    }

    let mountpoint = match request.device {
        Some(device) => {
            coordinator.reset(device);
            Some(coordinator.ensure_mounted(device)?)
        }
        None => None,
    };
    let ctx = RunContext {
        run_timestamp,
        mountpoint,
    };

    let registry = Registry::new(settings.transfer.clone(), runner);
    let orchestrator = Orchestrator::new(resolver, &registry, &TracingReporter, run_mode);
    let summary = orchestrator.run(&jobs, &ctx);

    if request.unmount_after || settings.mount.unmount_after_run {
        if let Some(device) = request.device {
            if let Err(err) = coordinator.unmount(device) {
                tracing::error!("post-run unmount failed: {}", err);
            }
        }
    }

    tracing::info!("backup done: {}", summary);
    Ok(summary)
}
