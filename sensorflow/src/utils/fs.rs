//! Filesystem helpers shared by the stages.

use crate::errors::{Result, SensorError};
use std::path::Path;
use uuid::Uuid;

/// Creates the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| SensorError::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Writes `bytes` to `path` so readers see either the old file or the new
/// one, never a partial write.
///
/// The content goes to a temporary file in the same directory first and is
/// then renamed over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    std::fs::write(&staging, bytes).map_err(|e| SensorError::io(&staging, e))?;
    std::fs::rename(&staging, path).map_err(|e| {
        // Best effort; the rename error is what matters.
        let _ = std::fs::remove_file(&staging);
        SensorError::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_parent_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a").join("b").join("file.csv");

        ensure_parent_dir(&target).unwrap();
        assert!(tmp.path().join("a").join("b").is_dir());

        // Idempotent.
        ensure_parent_dir(&target).unwrap();
    }

    #[test]
    fn test_ensure_parent_dir_bare_file_name() {
        ensure_parent_dir(Path::new("report.yaml")).unwrap();
    }

    #[test]
    fn test_write_atomic_replaces_and_leaves_no_staging_file() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("v1").join("model.json");

        write_atomic(&target, b"first").unwrap();
        write_atomic(&target, b"second").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"second");
        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("v1")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
