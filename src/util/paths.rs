use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::JobError;

/// Directory a destination needs before the transfer runs: the destination
/// itself when it ends in `/`, its parent otherwise.
pub fn destination_dir(dest: &Path) -> Option<PathBuf> {
    if ends_with_separator(dest) {
        return Some(dest.to_path_buf());
    }
    dest.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

pub fn ends_with_separator(path: &Path) -> bool {
    path.to_string_lossy().ends_with('/')
}

/// Creates `dir` and its parents. Another process creating it first counts as success.
pub fn ensure_dir(dir: &Path) -> Result<(), JobError> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(source) => Err(JobError::Io {
            op: "create",
            path: dir.to_path_buf(),
            source,
        }),
    }
}
