//! Small filesystem helpers shared by the collector and the local dump transport.

use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Open a file for reading.
///
/// When `follow_symlinks` is false a symlinked path is rejected instead of
/// silently reading its target.
pub fn safe_open_file(path: &Path, follow_symlinks: bool) -> Result<File> {
    if !follow_symlinks {
        let metadata = std::fs::symlink_metadata(path)?;
        if metadata.file_type().is_symlink() {
            return Err(Error::Validation(format!(
                "Refusing to open symlink: {}",
                path.display()
            )));
        }
    }

    Ok(File::open(path)?)
}

/// Create (or truncate) a file for writing.
///
/// When `follow_symlinks` is false an existing symlink at `path` is rejected so
/// a link document can never be written through it.
pub fn safe_create_file(path: &Path, follow_symlinks: bool) -> Result<File> {
    if !follow_symlinks {
        if let Ok(metadata) = std::fs::symlink_metadata(path) {
            if metadata.file_type().is_symlink() {
                return Err(Error::Validation(format!(
                    "Refusing to write through symlink: {}",
                    path.display()
                )));
            }
        }
    }

    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

/// Treat empty or whitespace-only configuration values as unset.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
