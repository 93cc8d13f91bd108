pub mod backup;

use std::process::ExitCode;

use crate::error::{DeviceError, StashError};

pub fn exit_code_for_device_error(err: &DeviceError) -> u8 {
    match err {
        DeviceError::NotFound(_) => 10,
        DeviceError::AlreadyMounted { .. } => 11,
        DeviceError::MountFailed(_) | DeviceError::UmountFailed(_) => 12,
        DeviceError::Catalog(_) => 13,
    }
}

pub fn exit_code_for(err: &StashError) -> u8 {
    match err {
        StashError::Device(device) => exit_code_for_device_error(device),
        StashError::Config(_) => 2,
        StashError::Message(_) | StashError::Io(_) => 1,
    }
}

/// Logs a fatal error with its remediation hint and picks the exit code.
pub fn exit_for_error(err: &StashError) -> ExitCode {
    tracing::error!("{}", err);
    if let StashError::Device(device) = err {
        if let Some(hint) = device.hint() {
            tracing::error!("{}", hint);
        }
    }
    ExitCode::from(exit_code_for(err))
}
