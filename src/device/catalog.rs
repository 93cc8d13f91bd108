use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::error::{DeviceError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    pub mountpoint: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountState {
    Unmounted,
    Mounted(PathBuf),
}

impl MountState {
    pub fn mountpoint(&self) -> Option<&Path> {
        match self {
            MountState::Unmounted => None,
            MountState::Mounted(path) => Some(path),
        }
    }
}

/// Snapshot of partitions known to the system. A name missing from the table
/// means the device was not reported at all, which is not the same as
/// [`MountState::Unmounted`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionTable {
    entries: BTreeMap<String, MountState>,
}

impl PartitionTable {
    pub fn get(&self, name: &str) -> Option<&MountState> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn insert(&mut self, partition: Partition) {
        let state = match partition.mountpoint {
            Some(path) if !path.as_os_str().is_empty() => MountState::Mounted(path),
            _ => MountState::Unmounted,
        };
        self.entries.insert(partition.name, state);
    }
}

impl FromIterator<Partition> for PartitionTable {
    fn from_iter<I: IntoIterator<Item = Partition>>(iter: I) -> Self {
        let mut table = PartitionTable::default();
        for partition in iter {
            table.insert(partition);
        }
        table
    }
}

/// Source of partition snapshots. Every call must query the system afresh.
pub trait PartitionSource {
    fn list_partitions(&self) -> Result<PartitionTable>;
}

impl<T: PartitionSource + ?Sized> PartitionSource for &T {
    fn list_partitions(&self) -> Result<PartitionTable> {
        (**self).list_partitions()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LsblkCatalog;

impl PartitionSource for LsblkCatalog {
    fn list_partitions(&self) -> Result<PartitionTable> {
        let output = Command::new("lsblk")
            .arg("-J")
            .output()
            .map_err(|e| DeviceError::Catalog(format!("spawn: {}", e)))?;
        if !output.status.success() {
            return Err(DeviceError::Catalog(format!(
                "failed with exit code {}: {}",
                output.status.code().unwrap_or(1),
                String::from_utf8_lossy(&output.stderr).trim()
            ))
            .into());
        }
        let table = parse_lsblk(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(partitions = table.len(), "lsblk catalog refreshed");
        Ok(table)
    }
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    #[serde(default)]
    blockdevices: Vec<LsblkNode>,
}

#[derive(Debug, Deserialize)]
struct LsblkNode {
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    mountpoint: Option<String>,
    // util-linux >= 2.37 reports a list instead of a single mountpoint.
    #[serde(default)]
    mountpoints: Vec<Option<String>>,
    #[serde(default)]
    children: Vec<LsblkNode>,
}

impl LsblkNode {
    fn is(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    fn mounted_at(&self) -> Option<PathBuf> {
        self.mountpoint
            .iter()
            .chain(self.mountpoints.iter().flatten())
            .find(|m| !m.is_empty())
            .map(PathBuf::from)
    }
}

/// Flattens `lsblk -J` output into partitions of type `part` found under
/// nodes of type `disk`.
pub fn parse_lsblk(json: &str) -> Result<PartitionTable> {
    let doc: LsblkOutput = serde_json::from_str(json)
        .map_err(|e| DeviceError::Catalog(format!("parse output: {}", e)))?;
    let partitions = doc
        .blockdevices
        .iter()
        .filter(|node| node.is("disk"))
        .flat_map(|disk| disk.children.iter())
        .filter(|child| child.is("part"))
        .map(|part| Partition {
            name: part.name.clone(),
            mountpoint: part.mounted_at(),
        });
    Ok(partitions.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StashError;

    const LEGACY: &str = r#"{
       "blockdevices": [
          {"name": "sda", "maj:min": "8:0", "rm": false, "size": "238.5G", "ro": false, "type": "disk", "mountpoint": null,
             "children": [
                {"name": "sda1", "maj:min": "8:1", "rm": false, "size": "512M", "ro": false, "type": "part", "mountpoint": "/boot/efi"},
                {"name": "sda2", "maj:min": "8:2", "rm": false, "size": "238G", "ro": false, "type": "part", "mountpoint": "/"}
             ]
          },
          {"name": "sdb", "maj:min": "8:16", "rm": true, "size": "14.9G", "ro": false, "type": "disk", "mountpoint": null,
             "children": [
                {"name": "sdb1", "maj:min": "8:17", "rm": true, "size": "14.9G", "ro": false, "type": "part", "mountpoint": null}
             ]
          },
          {"name": "sr0", "maj:min": "11:0", "rm": true, "size": "1024M", "ro": false, "type": "rom", "mountpoint": null},
          {"name": "sdc", "maj:min": "8:32", "rm": true, "size": "7.5G", "ro": false, "type": "disk", "mountpoint": null}
       ]
    }"#;

    #[test]
    fn legacy_output_lists_every_partition() {
        let table = parse_lsblk(LEGACY).expect("parse");
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["sda1", "sda2", "sdb1"]);
        assert_eq!(
            table.get("sda1"),
            Some(&MountState::Mounted(PathBuf::from("/boot/efi")))
        );
        assert_eq!(table.get("sdb1"), Some(&MountState::Unmounted));
        assert_eq!(table.get("sdc"), None);
        assert_eq!(table.get("sr0"), None);
    }

    #[test]
    fn mountpoints_array_is_supported() {
        let json = r#"{"blockdevices": [
            {"name": "nvme0n1", "type": "disk", "mountpoints": [null],
             "children": [
                {"name": "nvme0n1p1", "type": "part", "mountpoints": [null, "/mnt/stick"]},
                {"name": "nvme0n1p2", "type": "part", "mountpoints": [null]},
                {"name": "nvme0n1p3", "type": "part"}
             ]}
        ]}"#;
        let table = parse_lsblk(json).expect("parse");
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get("nvme0n1p1").and_then(MountState::mountpoint),
            Some(Path::new("/mnt/stick"))
        );
        assert_eq!(table.get("nvme0n1p2"), Some(&MountState::Unmounted));
        assert_eq!(table.get("nvme0n1p3"), Some(&MountState::Unmounted));
    }

    #[test]
    fn nested_non_partition_children_are_ignored() {
        let json = r#"{"blockdevices": [
            {"name": "sda", "type": "disk", "children": [
                {"name": "sda1", "type": "part", "mountpoint": null, "children": [
                    {"name": "luks-1", "type": "crypt", "mountpoint": "/home"}
                ]},
                {"name": "md0", "type": "raid1", "mountpoint": "/data"}
            ]}
        ]}"#;
        let table = parse_lsblk(json).expect("parse");
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["sda1"]);
    }

    #[test]
    fn empty_document_is_an_empty_table() {
        assert!(parse_lsblk("{}").expect("parse").is_empty());
        assert!(parse_lsblk(r#"{"blockdevices": []}"#).expect("parse").is_empty());
    }

    #[test]
    fn garbage_is_a_catalog_error() {
        let err = parse_lsblk("NAME MAJ:MIN RM SIZE").unwrap_err();
        assert!(matches!(err, StashError::Device(DeviceError::Catalog(_))));
    }
}
