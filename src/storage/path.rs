//! Path validation performed before any file I/O

use crate::recorder::channel::{RecordingError, RecordingResult};
use std::path::Path;

/// Validate that `path` names a file whose parent directory exists
pub fn validate_path(path: &Path) -> RecordingResult<()> {
    if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
        return Err(RecordingError::PathError(
            "The path cannot be empty".to_string(),
        ));
    }

    if path.is_dir() {
        return Err(RecordingError::PathError(format!(
            "'{}' is a directory, not a file",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(RecordingError::PathError(format!(
                "The directory '{}' does not exist",
                parent.display()
            )));
        }
    }

    Ok(())
}

/// Like [`validate_path`], and additionally rejects an existing read-only file
pub fn validate_writable_path(path: &Path) -> RecordingResult<()> {
    validate_path(path)?;

    if let Ok(metadata) = std::fs::metadata(path) {
        if metadata.permissions().readonly() {
            return Err(RecordingError::PathError(format!(
                "'{}' is not writable",
                path.display()
            )));
        }
    }

    Ok(())
}
