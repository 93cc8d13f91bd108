use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::model::{MountMethod, Settings};
use crate::error::{ConfigError, Result, StashError};

pub const SETTINGS_FILE: &str = "/etc/stashdrive.yaml";

/// Loads settings from `path`, or from [`SETTINGS_FILE`] when it exists.
/// Without either, built-in defaults apply.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => read_settings(path)?,
        None if Path::new(SETTINGS_FILE).exists() => read_settings(Path::new(SETTINGS_FILE))?,
        None => Settings::default(),
    };
    validate(&settings)?;
    Ok(settings)
}

fn read_settings(path: &Path) -> Result<Settings> {
    let mut contents = String::new();
    File::open(path)
        .map_err(StashError::Io)?
        .read_to_string(&mut contents)
        .map_err(StashError::Io)?;
    parse_settings(&contents).map_err(|e| match e {
        ConfigError::Parse { message, .. } => ConfigError::Parse {
            path: path.display().to_string(),
            message,
        }
        .into(),
        other => other.into(),
    })
}

pub fn parse_settings(contents: &str) -> std::result::Result<Settings, ConfigError> {
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
        path: "<settings>".to_string(),
        message: e.to_string(),
    })
}

fn validate(settings: &Settings) -> std::result::Result<(), ConfigError> {
    if settings.transfer.program.trim().is_empty() {
        return Err(ConfigError::Invalid("transfer program is empty".to_string()));
    }
    match (&settings.mount.method, &settings.mount.mountpoint) {
        (MountMethod::System, None) => {
            return Err(ConfigError::Invalid(
                "mount method system requires a mountpoint".to_string(),
            ))
        }
        (_, Some(mountpoint)) if !mountpoint.is_absolute() => {
            return Err(ConfigError::Invalid(format!(
                "mountpoint {} must be absolute",
                mountpoint.display()
            )))
        }
        _ => {}
    }
    if settings.command_timeout_secs == Some(0) {
        return Err(ConfigError::Invalid(
            "commandTimeoutSecs must be greater than zero".to_string(),
        ));
    }
    if let Some(jobs) = &settings.jobs {
        for (idx, job) in jobs.iter().enumerate() {
            if job.source.trim().is_empty() || job.destination.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "job {}: source and destination are required",
                    idx + 1
                )));
            }
        }
    }
    Ok(())
}
