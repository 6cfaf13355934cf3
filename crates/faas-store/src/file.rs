//! File-backed store.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── functions/
//! │   └── <function-id>.json
//! └── executions/
//!     └── <function-id>/
//!         └── <execution-id>.json
//! ```
//!
//! Documents are written to a temporary sibling and renamed into place, so
//! readers never observe a partial file.

use async_trait::async_trait;
use faas_core::traits::FunctionStore;
use faas_core::{Error, ExecutionRecord, Function, FunctionId, Result, TenantId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const FUNCTIONS_DIR: &str = "functions";
const EXECUTIONS_DIR: &str = "executions";
const EXTENSION: &str = "json";

/// Store that keeps one JSON document per entity.
///
/// # Examples
///
/// ```
/// use faas_core::traits::FunctionStore;
/// use faas_core::FunctionId;
/// use faas_store::FileStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> faas_core::Result<()> {
/// let dir = tempfile::tempdir().unwrap();
/// let store = FileStore::open(dir.path()).await?;
/// assert!(store.find_function(&FunctionId::new()).await?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens the store at `root`, creating its directories if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageError`] if the directories cannot be created.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for dir in [FUNCTIONS_DIR, EXECUTIONS_DIR] {
            let path = root.join(dir);
            fs::create_dir_all(&path)
                .await
                .map_err(|e| Error::storage(format!("cannot create {}", path.display()), e))?;
        }
        debug!(root = %root.display(), "opened file store");
        Ok(Self { root })
    }

    /// Data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn function_path(&self, id: &FunctionId) -> PathBuf {
        self.root
            .join(FUNCTIONS_DIR)
            .join(format!("{id}.{EXTENSION}"))
    }

    fn executions_dir(&self, id: &FunctionId) -> PathBuf {
        self.root.join(EXECUTIONS_DIR).join(id.to_string())
    }
}

async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &bytes)
        .await
        .map_err(|e| Error::storage(format!("cannot write {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::storage(format!("cannot move {} into place", path.display()), e))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            Error::storage(format!("corrupt document {}", path.display()), e)
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::storage(format!("cannot read {}", path.display()), e)),
    }
}

/// Paths of the `.json` documents in `dir`; empty if `dir` does not exist.
async fn documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::storage(format!("cannot list {}", dir.display()), e)),
    };
    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::storage(format!("cannot list {}", dir.display()), e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == EXTENSION) {
            paths.push(path);
        }
    }
    Ok(paths)
}

async fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut values = Vec::new();
    for path in documents(dir).await? {
        // A document removed between listing and reading is skipped.
        if let Some(value) = read_json(&path).await? {
            values.push(value);
        }
    }
    Ok(values)
}

#[async_trait]
impl FunctionStore for FileStore {
    async fn save_function(&self, function: &Function) -> Result<()> {
        write_json(&self.function_path(&function.id), function).await
    }

    async fn find_function(&self, id: &FunctionId) -> Result<Option<Function>> {
        read_json(&self.function_path(id)).await
    }

    async fn find_functions_by_tenant(&self, tenant: &TenantId) -> Result<Vec<Function>> {
        let mut owned: Vec<Function> = read_all::<Function>(&self.root.join(FUNCTIONS_DIR))
            .await?
            .into_iter()
            .filter(|f| f.is_owned_by(tenant))
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn delete_function(&self, id: &FunctionId) -> Result<bool> {
        let path = self.function_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(format!("cannot remove {}", path.display()), e)),
        }
    }

    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()> {
        let dir = self.executions_dir(&record.function_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::storage(format!("cannot create {}", dir.display()), e))?;
        write_json(&dir.join(format!("{}.{EXTENSION}", record.id)), record).await
    }

    async fn find_executions_by_function(&self, id: &FunctionId) -> Result<Vec<ExecutionRecord>> {
        read_all(&self.executions_dir(id)).await
    }

    async fn delete_executions_by_function(&self, id: &FunctionId) -> Result<usize> {
        let dir = self.executions_dir(id);
        let count = documents(&dir).await?.len();
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(count),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to remove execution history");
                Err(Error::storage(format!("cannot remove {}", dir.display()), e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("data")).await.unwrap();
        assert!(store.root().join(FUNCTIONS_DIR).is_dir());
        assert!(store.root().join(EXECUTIONS_DIR).is_dir());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let id = FunctionId::new();
        std::fs::write(store.function_path(&id), b"{not json").unwrap();

        let err = store.find_function(&id).await.unwrap_err();
        assert!(err.is_storage_error());
    }

    #[tokio::test]
    async fn test_non_json_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join(FUNCTIONS_DIR).join("notes.txt"), b"x").unwrap();

        let listed = store
            .find_functions_by_tenant(&TenantId::new("acme"))
            .await
            .unwrap();
        assert!(listed.is_empty());
    }
}
