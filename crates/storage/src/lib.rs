//! pipewatch registry persistence.
//!
//! [`JsonFileStore`] implements [`pipeline::RegistryStore`] over a single JSON
//! document mapping channel ids to pipeline id lists:
//!
//! ```json
//! {"C024BE91L": [123, 1234]}
//! ```
//!
//! Loading accepts every historical shape understood by
//! [`pipeline::StoredRegistry`]; saving always writes the canonical shape.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File layout and I/O error mapping live here. The
//! [`pipeline`] crate sees only [`pipeline::RegistryStore`].

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use pipeline::{Registry, RegistryStore, StorageError, StoredRegistry};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info};

pub const DEFAULT_STORAGE_PATH: &str = "monitored_pipelines.json";

/// File-backed registry store with atomic replace on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, err: std::io::Error) -> StorageError {
        StorageError::Io {
            location: self.path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Write to a sibling temp file, flush it to disk, then rename over the
    /// target so readers never observe a partial document.
    async fn atomic_write(&self, contents: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await.map_err(|e| self.io_error(e))?;
        file.write_all(contents)
            .await
            .map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        drop(file);

        if let Err(err) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.io_error(err));
        }
        Ok(())
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_PATH)
    }
}

#[async_trait]
impl RegistryStore for JsonFileStore {
    async fn load(&self) -> Result<Option<StoredRegistry>, StorageError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no registry file yet");
                return Ok(None);
            }
            Err(err) => return Err(self.io_error(err)),
        };

        let stored: StoredRegistry = serde_json::from_str(&data)
            .map_err(|err| StorageError::Malformed(format!("{}: {err}", self.path.display())))?;
        debug!(path = %self.path.display(), shape = ?stored.shape(), "registry file read");
        Ok(Some(stored))
    }

    async fn save(&self, registry: &Registry) -> Result<(), StorageError> {
        let json = serde_json::to_vec(registry)
            .map_err(|err| StorageError::Malformed(err.to_string()))?;
        self.atomic_write(&json).await?;
        debug!(path = %self.path.display(), bytes = json.len(), "registry file written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{ChannelId, PipelineId, StoredShape};

    fn channel(id: &str) -> ChannelId {
        ChannelId::new(id).unwrap()
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("monitored_pipelines.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("registry.json"));

        let mut registry = Registry::new();
        registry.insert(&channel("C1"), PipelineId::new(7));
        registry.insert(&channel("C1"), PipelineId::new(3));
        registry.insert(&channel("C2"), PipelineId::new(42));
        store.save(&registry).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"C1":[7,3],"C2":[42]}"#);

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.shape(), StoredShape::Canonical);
        assert!(!dir.path().join("nested").join("registry.json.tmp").exists());
    }

    #[tokio::test]
    async fn save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let store = JsonFileStore::new(&path);

        assert_eq!(
            store.load().await.unwrap().unwrap().shape(),
            StoredShape::FlatList
        );

        store.save(&Registry::seeded(&channel("C9"))).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"C9":[123,1234]}"#
        );
    }

    #[tokio::test]
    async fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Malformed(_)));
    }

    #[tokio::test]
    async fn unwritable_location_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let store = JsonFileStore::new(blocker.join("registry.json"));
        let err = store.save(&Registry::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
