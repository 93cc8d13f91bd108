pub mod registry;
pub mod report;
pub mod runner;

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};

use crate::error::{ConfigError, JobError};
use crate::job::registry::CommandKind;

pub const DEFAULT_COMMAND: &str = "rsync";

/// One configured job. `source` and `destination` are templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub command: String,
    pub params: String,
    pub source: String,
    pub destination: String,
}

impl JobSpec {
    /// An empty command means a transfer.
    pub fn new(command: &str, params: &str, source: &str, destination: &str) -> Self {
        let command = command.trim();
        Self {
            command: if command.is_empty() {
                DEFAULT_COMMAND.to_string()
            } else {
                command.to_string()
            },
            params: params.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
        }
    }

    pub fn transfer(params: &str, source: &str, destination: &str) -> Self {
        Self::new(DEFAULT_COMMAND, params, source, destination)
    }
}

impl fmt::Display for JobSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "command={:?} params={:?} source={:?} destination={:?}",
            self.command, self.params, self.source, self.destination
        )
    }
}

/// A job read from configuration; a malformed row stays an error so the
/// runner can report it in place.
pub type JobEntry = std::result::Result<JobSpec, ConfigError>;

/// A [`JobSpec`] with concrete paths for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJob {
    pub kind: CommandKind,
    pub params: String,
    pub source: String,
    pub destination: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_timestamp: DateTime<FixedOffset>,
    /// Set only once the device is confirmed mounted.
    pub mountpoint: Option<PathBuf>,
}

/// How a failed job affects the rest of the run.
#[derive(Debug)]
pub enum Failure {
    /// Stop the run; remaining jobs are skipped.
    Abort(JobError),
    /// Record the failure and carry on with the next job.
    Continue(JobError),
}
