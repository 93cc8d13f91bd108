use std::path::PathBuf;

use crate::device::catalog::{MountState, PartitionSource};
use crate::device::ops::MountTool;
use crate::error::{DeviceError, Result};
use crate::types::DeviceName;

/// Takes a device from "unknown" to "mounted at a known path", or explains
/// why it could not. One mount attempt per call, no retries.
pub struct MountCoordinator<C, M> {
    catalog: C,
    tool: M,
}

impl<C: PartitionSource, M: MountTool> MountCoordinator<C, M> {
    pub fn new(catalog: C, tool: M) -> Self {
        Self { catalog, tool }
    }

    pub fn ensure_mounted(&self, device: &DeviceName) -> Result<PathBuf> {
        let partitions = self.catalog.list_partitions()?;
        match partitions.get(device.as_str()) {
            None => Err(DeviceError::NotFound(device.to_string()).into()),
            // An existing mount may not be where we expect; refuse it.
            Some(MountState::Mounted(mountpoint)) => Err(DeviceError::AlreadyMounted {
                device: device.to_string(),
                mountpoint: mountpoint.clone(),
            }
            .into()),
            Some(MountState::Unmounted) => {
                self.tool.mount(device)?;
                let partitions = self.catalog.list_partitions()?;
                match partitions.get(device.as_str()) {
                    Some(MountState::Mounted(mountpoint)) => {
                        tracing::info!("Device {} mounted on {}", device, mountpoint.display());
                        Ok(mountpoint.clone())
                    }
                    Some(MountState::Unmounted) | None => Err(DeviceError::MountFailed(format!(
                        "{} is still not mounted after mount call",
                        device
                    ))
                    .into()),
                }
            }
        }
    }

    /// Unmounts `device` if it is mounted. Absent or unmounted devices are left alone.
    pub fn unmount(&self, device: &DeviceName) -> Result<()> {
        let partitions = self.catalog.list_partitions()?;
        match partitions.get(device.as_str()) {
            Some(MountState::Mounted(mountpoint)) => {
                self.tool.unmount(device)?;
                tracing::info!("Device {} unmounted from {}", device, mountpoint.display());
            }
            Some(MountState::Unmounted) | None => {
                tracing::debug!("device {} not mounted, skip umount", device);
            }
        }
        Ok(())
    }

    /// Best-effort unmount before a run starts.
    pub fn reset(&self, device: &DeviceName) {
        if let Err(err) = self.unmount(device) {
            tracing::warn!("reset of {} failed: {}", device, err);
        }
    }
}
