//! File system operations (read, write, directory, delete).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context("Failed to read file to string")
    }

    #[tracing::instrument(skip(self, contents))]
    pub(crate) fn write_impl(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).context("Failed to write to file")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn create_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context("Failed to create directory")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_file_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).context("Failed to remove file")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_dir_impl(&self, path: &Path) -> bool {
        path.is_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_dir_impl(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::read_dir(path)?.map(|entry| Ok(entry?.path())).collect()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn canonicalize_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).context("Failed to canonicalize path")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        let runtime = RealRuntime;

        runtime.write(&path, b"content").unwrap();
        assert_eq!(runtime.read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_read_missing_file_fails() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        assert!(runtime.read_to_string(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_remove_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("victim");
        let runtime = RealRuntime;

        runtime.write(&path, b"x").unwrap();
        assert!(runtime.exists(&path));
        runtime.remove_file(&path).unwrap();
        assert!(!runtime.exists(&path));
    }

    #[test]
    fn test_read_dir_lists_entries() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        runtime.write(&dir.path().join("a"), b"").unwrap();
        runtime.write(&dir.path().join("b"), b"").unwrap();

        let mut entries = runtime.read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_is_dir() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        assert!(runtime.is_dir(dir.path()));
        assert!(!runtime.is_dir(&dir.path().join("nope")));
    }
}
