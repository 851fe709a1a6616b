//! Staging directory management

use eyre::{Context, Result};
use std::path::Path;

/// Create `path` and any missing parents.
///
/// An existing directory is fine; anything else that stops the directory from
/// existing afterwards (a file in the way, missing permissions) is an error.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;
    log::trace!("Directory ready: {}", path.display());
    Ok(())
}

/// Empty `path`, creating it if missing
pub fn reset_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to clear directory {}", path.display()))?;
    }
    ensure_dir(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_nested() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("processed/ABC/D202204.Extract");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_existing_directory_is_ok() {
        let temp = TempDir::new().unwrap();
        ensure_dir(temp.path()).unwrap();
        ensure_dir(temp.path()).unwrap();
        assert!(temp.path().is_dir());
    }

    #[test]
    fn test_file_in_the_way_fails() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("downloaded");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = ensure_dir(&blocker).unwrap_err();
        assert!(err.to_string().contains("Failed to create directory"));
        // A parent that is a file also fails
        assert!(ensure_dir(blocker.join("child")).is_err());
    }

    #[test]
    fn test_reset_dir_removes_stale_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("extracted/abc");
        ensure_dir(dir.join("Data/Extracts")).unwrap();
        std::fs::write(dir.join("Data/Extracts/old.hyper"), b"").unwrap();

        reset_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_reset_dir_creates_missing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("fresh");
        reset_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }
}
