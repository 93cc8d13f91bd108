use std::path::PathBuf;

use serde::Deserialize;

use crate::job::JobSpec;

// https://serverfault.com/questions/470046/rsync-from-linux-host-to-fat32
pub const DEFAULT_TRANSFER_PARAMS: &str = "-rtD --modify-window=1 --size-only";
pub const DEFAULT_TRANSFER_PROGRAM: &str = "rsync";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub transfer: TransferSettings,
    pub mount: MountSettings,
    pub log_file: Option<PathBuf>,
    pub command_timeout_secs: Option<u64>,
    /// Device-mode job list. Falls back to [`default_device_jobs`] when unset.
    pub jobs: Option<Vec<StaticJob>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferSettings {
    pub program: String,
    pub privileged: bool,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_TRANSFER_PROGRAM.to_string(),
            privileged: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MountMethod {
    /// `udiskie-mount /dev/<device>`; udiskie picks the mountpoint.
    #[default]
    Udiskie,
    /// `mount /dev/<device> <mountpoint>`.
    System,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct MountSettings {
    pub method: MountMethod,
    pub mountpoint: Option<PathBuf>,
    pub privileged: bool,
    pub unmount_after_run: bool,
}

/// `(params, source, destination)` entry of the device-mode job list.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StaticJob {
    #[serde(default = "default_params")]
    pub params: String,
    pub source: String,
    pub destination: String,
}

fn default_params() -> String {
    DEFAULT_TRANSFER_PARAMS.to_string()
}

impl StaticJob {
    pub fn new(params: &str, source: &str, destination: &str) -> Self {
        Self {
            params: params.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
        }
    }

    pub fn to_spec(&self) -> JobSpec {
        JobSpec::transfer(&self.params, &self.source, &self.destination)
    }
}

/// Built-in device-mode jobs. Sources end in `/` so rsync copies contents;
/// destinations are relative to the device mountpoint and rotate by weekday.
pub fn default_device_jobs() -> Vec<StaticJob> {
    vec![
        StaticJob::new(DEFAULT_TRANSFER_PARAMS, "/tmp/logs/", "backup/logs/%w/"),
        StaticJob::new(DEFAULT_TRANSFER_PARAMS, "~/zettelkasten/", "backup/zettelkasten/%w/"),
        StaticJob::new(DEFAULT_TRANSFER_PARAMS, "~/.ssh/", "backup/.ssh/%w/"),
        StaticJob::new(DEFAULT_TRANSFER_PARAMS, "~/tax/", "backup/tax/%w/"),
    ]
}

impl Settings {
    pub fn device_jobs(&self) -> Vec<JobSpec> {
        match &self.jobs {
            Some(jobs) => jobs.iter().map(StaticJob::to_spec).collect(),
            None => default_device_jobs().iter().map(StaticJob::to_spec).collect(),
        }
    }
}
