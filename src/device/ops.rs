use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::config::model::{MountMethod, MountSettings};
use crate::error::{ConfigError, DeviceError, Result, StashError};
use crate::types::DeviceName;
use crate::util::command::{command_line, privileged_command};

pub trait MountTool {
    fn mount(&self, device: &DeviceName) -> Result<()>;
    fn unmount(&self, device: &DeviceName) -> Result<()>;
}

impl<T: MountTool + ?Sized> MountTool for &T {
    fn mount(&self, device: &DeviceName) -> Result<()> {
        (**self).mount(device)
    }

    fn unmount(&self, device: &DeviceName) -> Result<()> {
        (**self).unmount(device)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Method {
    Udiskie,
    System { mountpoint: PathBuf },
}

/// Mounts through `udiskie-mount`/`udiskie-umount` or plain `mount`/`umount`.
#[derive(Debug, Clone)]
pub struct CommandMountTool {
    method: Method,
    privileged: bool,
}

impl CommandMountTool {
    pub fn from_settings(settings: &MountSettings) -> Result<Self> {
        let method = match (settings.method, &settings.mountpoint) {
            (MountMethod::Udiskie, _) => Method::Udiskie,
            (MountMethod::System, Some(mountpoint)) => Method::System {
                mountpoint: mountpoint.clone(),
            },
            (MountMethod::System, None) => {
                return Err(ConfigError::Invalid(
                    "mount method system requires a mountpoint".to_string(),
                )
                .into())
            }
        };
        Ok(Self {
            method,
            privileged: settings.privileged,
        })
    }

    fn mount_command(&self, device: &DeviceName) -> Command {
        match &self.method {
            Method::Udiskie => {
                let mut cmd = privileged_command("udiskie-mount", self.privileged);
                cmd.arg(device.dev_path());
                cmd
            }
            Method::System { mountpoint } => {
                let mut cmd = privileged_command("mount", self.privileged);
                cmd.arg(device.dev_path()).arg(mountpoint);
                cmd
            }
        }
    }

    fn unmount_command(&self, device: &DeviceName) -> Command {
        let program = match self.method {
            Method::Udiskie => "udiskie-umount",
            Method::System { .. } => "umount",
        };
        let mut cmd = privileged_command(program, self.privileged);
        cmd.arg(device.dev_path());
        cmd
    }
}

fn run_silent(mut cmd: Command) -> std::result::Result<(), String> {
    tracing::debug!("exec: {}", command_line(&cmd));
    let status = cmd
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| e.to_string())?;
    if !status.success() {
        return Err(format!("failed with exit code {}", status.code().unwrap_or(1)));
    }
    Ok(())
}

impl MountTool for CommandMountTool {
    fn mount(&self, device: &DeviceName) -> Result<()> {
        run_silent(self.mount_command(device))
            .map_err(|e| StashError::from(DeviceError::MountFailed(format!("{}: {}", device, e))))
    }

    fn unmount(&self, device: &DeviceName) -> Result<()> {
        run_silent(self.unmount_command(device))
            .map_err(|e| StashError::from(DeviceError::UmountFailed(format!("{}: {}", device, e))))
    }
}
