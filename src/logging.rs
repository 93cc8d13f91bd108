//! Tracing setup for the binary.
//!
//! Lines go to stdout and, when a log file is configured, to that file as
//! well. The file writer is non-blocking; keep the returned [`LogGuard`]
//! alive until the process is about to exit so buffered lines get flushed.
//!
//! The log file is rotated at startup once it reaches [`MAX_LOG_BYTES`]:
//! `stashdrive.log` moves to `stashdrive.log.1`, older copies shift up by one
//! and anything past [`MAX_BACKUPS`] is removed.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Size at which the log file is rotated.
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
/// Rotated copies kept next to the active log file.
pub const MAX_BACKUPS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("log file path {0} has no file name")]
    NoFileName(PathBuf),
    #[error("failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to open log file {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to rotate log file {path}: {source}")]
    Rotate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
}

/// Flushes the file sink on drop.
#[must_use]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<LogGuard, LoggingError> {
    let timer = ChronoLocal::new(TIME_FORMAT.to_string());
    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_timer(timer.clone())
        .with_writer(std::io::stdout);

    let mut rotated = false;
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            rotated = rotate_if_full(path, MAX_LOG_BYTES, MAX_BACKUPS)?;
            ensure_file_exists(&dir, path)?;
            let (writer, guard) = tracing_appender::non_blocking(rolling::never(&dir, name));
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_timer(timer)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = Registry::default()
        .with(build_env_filter(verbose))
        .with(stdout_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;

    if let Some(path) = log_file {
        if rotated {
            tracing::info!("rotated log file {}", path.display());
        }
        tracing::debug!("logging to {}", path.display());
    }
    Ok(LogGuard { _file: guard })
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn split_log_path(path: &Path) -> Result<(PathBuf, OsString), LoggingError> {
    let name = path
        .file_name()
        .ok_or_else(|| LoggingError::NoFileName(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name.to_os_string()))
}

fn ensure_file_exists(dir: &Path, path: &Path) -> Result<(), LoggingError> {
    fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn rotate_err(path: &Path) -> impl FnOnce(std::io::Error) -> LoggingError {
    let path = path.to_path_buf();
    move |source| LoggingError::Rotate { path, source }
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

/// Shifts `path` to `path.1` (and `path.1` to `path.2`, ...) once it holds at
/// least `max_bytes`, dropping the copy that would become `path.{backups+1}`.
/// Returns whether a rotation happened.
fn rotate_if_full(path: &Path, max_bytes: u64, backups: usize) -> Result<bool, LoggingError> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(LoggingError::Rotate {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if size < max_bytes {
        return Ok(false);
    }
    if backups == 0 {
        fs::remove_file(path).map_err(rotate_err(path))?;
        return Ok(true);
    }
    let oldest = backup_path(path, backups);
    if oldest.exists() {
        fs::remove_file(&oldest).map_err(rotate_err(&oldest))?;
    }
    for n in (1..backups).rev() {
        let from = backup_path(path, n);
        if from.exists() {
            fs::rename(&from, backup_path(path, n + 1)).map_err(rotate_err(&from))?;
        }
    }
    fs::rename(path, backup_path(path, 1)).map_err(rotate_err(path))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn split_uses_current_dir_for_bare_names() {
        let (dir, name) = split_log_path(Path::new("stashdrive.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, OsString::from("stashdrive.log"));
    }

    #[test]
    fn split_rejects_directory_like_paths() {
        assert!(matches!(
            split_log_path(Path::new("/")),
            Err(LoggingError::NoFileName(_))
        ));
    }

    #[test]
    fn log_file_and_parents_are_created() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("var/log/stashdrive.log");
        let (dir, _) = split_log_path(&path).unwrap();
        ensure_file_exists(&dir, &path).unwrap();
        assert!(path.is_file());
        ensure_file_exists(&dir, &path).unwrap();
    }

    #[test]
    fn small_log_is_not_rotated() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("stashdrive.log");
        assert!(!rotate_if_full(&path, 16, 5).unwrap());
        fs::write(&path, b"short").unwrap();
        assert!(!rotate_if_full(&path, 16, 5).unwrap());
        assert!(path.is_file());
        assert!(!backup_path(&path, 1).exists());
    }

    #[test]
    fn rotation_keeps_a_bounded_number_of_copies() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("stashdrive.log");
        for run in 0..8 {
            fs::write(&path, format!("run {} with enough bytes", run)).unwrap();
            assert!(rotate_if_full(&path, 16, 5).unwrap());
        }
        assert!(!path.exists());
        for n in 1..=5 {
            let copy = fs::read_to_string(backup_path(&path, n)).unwrap();
            assert_eq!(copy, format!("run {} with enough bytes", 8 - n));
        }
        assert!(!backup_path(&path, 6).exists());
        let files = fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(files, 5);
    }
}
