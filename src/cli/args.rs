use std::path::PathBuf;

use clap::Parser;

use crate::types::DeviceName;

#[derive(Parser, Debug)]
#[command(
    name = "stashdrive",
    version,
    about = "Unattended backups to a removable drive"
)]
pub struct Cli {
    /// Partition to mount and back up to, e.g. `sdb1`
    #[arg(long, short = 'd')]
    pub device: Option<DeviceName>,

    /// CSV job table (`command,params,source,destination`)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Settings file [default: /etc/stashdrive.yaml when present]
    #[arg(long, short = 's')]
    pub settings: Option<PathBuf>,

    /// Unmount the device once all jobs have run
    #[arg(long)]
    pub unmount_after: bool,

    /// Log job commands without running them
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    pub fn has_jobs(&self) -> bool {
        self.device.is_some() || self.config.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn device_flag_accepts_dev_paths() {
        let cli = Cli::try_parse_from(["stashdrive", "--device", "/dev/sdb1", "--dry-run"]).unwrap();
        assert_eq!(cli.device.as_ref().map(DeviceName::as_str), Some("sdb1"));
        assert!(cli.dry_run);
        assert!(cli.has_jobs());
    }

    #[test]
    fn no_flags_means_no_jobs() {
        let cli = Cli::try_parse_from(["stashdrive"]).unwrap();
        assert!(!cli.has_jobs());
    }

    #[test]
    fn short_flags() {
        let cli = Cli::try_parse_from(["stashdrive", "-c", "jobs.csv", "-s", "s.yaml", "-v"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("jobs.csv")));
        assert_eq!(cli.settings, Some(PathBuf::from("s.yaml")));
        assert!(cli.verbose);
    }
}
