//! Per-invocation scratch directories.

use faas_core::Language;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tracing::{debug, warn};

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "faas-exec-";

/// A uniquely named directory owned by one invocation.
///
/// The directory is removed when the workspace is closed or dropped.
/// [`close`](Self::close) reports removal failures in the log; dropping
/// ignores them.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a workspace under `root`, or the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        debug!(path = %dir.path().display(), "created workspace");
        Ok(Self { dir })
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `source` as the entry file for `language` and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub async fn write_source(&self, language: Language, source: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(language.source_file_name());
        tokio::fs::write(&path, source).await?;
        Ok(path)
    }

    /// Removes the directory and everything in it.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!(path = %path.display(), error = %e, "failed to remove workspace");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workspace_lifecycle() {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(Some(root.path())).unwrap();
        let path = workspace.path().to_path_buf();

        assert!(path.starts_with(root.path()));
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(WORKSPACE_PREFIX)
        );

        let script = workspace
            .write_source(Language::Python, "print(1)\n")
            .await
            .unwrap();
        assert_eq!(script, path.join("function.py"));
        assert_eq!(std::fs::read_to_string(&script).unwrap(), "print(1)\n");

        workspace.close();
        assert!(!path.exists());
    }

    #[test]
    fn test_workspaces_are_distinct() {
        let a = Workspace::create(None).unwrap();
        let b = Workspace::create(None).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_drop_removes_directory() {
        let workspace = Workspace::create(None).unwrap();
        let path = workspace.path().to_path_buf();
        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_root_fails() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("absent");
        assert!(Workspace::create(Some(&missing)).is_err());
    }
}
