use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Partition name as reported by lsblk, e.g. `sdb1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceName(String);

impl DeviceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn dev_path(&self) -> String {
        format!("/dev/{}", self.0)
    }
}

impl FromStr for DeviceName {
    type Err = String;

    /// Accepts `sdb1` as well as `/dev/sdb1`; only the final component is kept.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = Path::new(s.trim())
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if name.is_empty() || name == "." || name == ".." {
            return Err(format!("invalid device name {:?}", s));
        }
        Ok(DeviceName(name))
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    pub dry_run: bool,
    pub verbose: bool,
}
