use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StashError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Device(DeviceError),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device {0} not found")]
    NotFound(String),
    #[error("device {device} already mounted on {}", mountpoint.display())]
    AlreadyMounted { device: String, mountpoint: PathBuf },
    #[error("mount {0}")]
    MountFailed(String),
    #[error("umount {0}")]
    UmountFailed(String),
    #[error("lsblk {0}")]
    Catalog(String),
}

impl DeviceError {
    /// Remediation line shown to the operator next to the error.
    pub fn hint(&self) -> Option<String> {
        match self {
            DeviceError::NotFound(device) => Some(format!("Is device {} plugged in?", device)),
            DeviceError::AlreadyMounted { device, .. } => {
                Some(format!("Unmount {} and try again.", device))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("row {row}: {message}")]
    Row { row: usize, message: String },
    #[error("{0}")]
    Invalid(String),
}

/// Failure of a single job. Never fatal to the process on its own.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("precondition failed: {} does not exist", .0.display())]
    PreconditionFailed(PathBuf),
    #[error("{program} failed with exit code {code}")]
    Exit { program: String, code: i32 },
    #[error("{program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("wait for {program}: {source}")]
    Wait { program: String, source: io::Error },
    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },
    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("destination {0} is relative but no device is mounted")]
    RelativeDestination(String),
    #[error("{0}")]
    Config(ConfigError),
}

pub type Result<T> = std::result::Result<T, StashError>;

impl StashError {
    pub fn message(msg: impl Into<String>) -> Self {
        StashError::Message(msg.into())
    }
}

impl From<DeviceError> for StashError {
    fn from(err: DeviceError) -> Self {
        StashError::Device(err)
    }
}

impl From<ConfigError> for StashError {
    fn from(err: ConfigError) -> Self {
        StashError::Config(err)
    }
}

impl From<ConfigError> for JobError {
    fn from(err: ConfigError) -> Self {
        JobError::Config(err)
    }
}
