//! Disk-backed object store.
//!
//! Objects live under a rooted directory at their bucket name, e.g.
//! `{root}/cdn/{identifier}`, with the expiry marker in a JSON sidecar at
//! `{path}.meta`. Writes are atomic (temp file + rename) so a crashed or
//! disconnected upload never leaves a partial object visible.

use crate::error::{Error, Result};
use crate::storage::{ObjectStore, UploadCredential};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, trace};

/// Configuration for disk-backed storage.
#[derive(Debug, Clone)]
pub struct DiskObjectStoreConfig {
    /// Root directory objects are stored under.
    pub root_dir: PathBuf,
}

impl Default for DiskObjectStoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(".hostcast/objects"),
        }
    }
}

/// Statistics about storage operations.
#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    /// Total number of objects written.
    pub objects_stored: u64,
    /// Total bytes written.
    pub bytes_stored: u64,
    /// Total number of read streams opened.
    pub reads_opened: u64,
}

/// Expiry sidecar contents.
#[derive(Debug, Serialize, Deserialize)]
struct ObjectMeta {
    expires_at_ms: u64,
}

/// Disk-backed [`ObjectStore`].
pub struct DiskObjectStore {
    config: DiskObjectStoreConfig,
    stats: parking_lot::RwLock<StorageStats>,
}

impl DiskObjectStore {
    /// Create a new disk object store.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub async fn new(config: DiskObjectStoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.root_dir)
            .await
            .map_err(|e| Error::Storage(format!("failed to create object root: {e}")))?;

        debug!("Initialized disk object store at {:?}", config.root_dir);

        Ok(Self {
            config,
            stats: parking_lot::RwLock::new(StorageStats::default()),
        })
    }

    /// Get storage statistics.
    #[must_use]
    pub fn stats(&self) -> StorageStats {
        self.stats.read().clone()
    }

    /// Get the root directory.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.config.root_dir
    }

    fn object_path(&self, object_name: &str) -> Result<PathBuf> {
        // Object names come from our own identifier generator, but a store
        // must still refuse anything that could escape its root.
        if object_name.is_empty()
            || object_name.starts_with('/')
            || object_name.split('/').any(|part| part == ".." || part.is_empty())
        {
            return Err(Error::Storage(format!(
                "invalid object name: {object_name}"
            )));
        }
        Ok(self.config.root_dir.join(object_name))
    }

    fn meta_path(path: &Path) -> PathBuf {
        let mut meta = path.as_os_str().to_owned();
        meta.push(".meta");
        PathBuf::from(meta)
    }
}

#[async_trait]
impl ObjectStore for DiskObjectStore {
    async fn create_upload(
        &self,
        object_name: &str,
        declared_size: u64,
        ttl: Duration,
    ) -> Result<UploadCredential> {
        let path = self.object_path(object_name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("failed to create object directory: {e}")))?;
        }

        trace!(
            "Issued upload credential for {object_name} ({declared_size} bytes, ttl {}s)",
            ttl.as_secs()
        );

        Ok(UploadCredential {
            upload_url: format!("file://{}", path.display()),
            expires_at: SystemTime::now() + ttl,
        })
    }

    async fn put(&self, object_name: &str, content: &[u8]) -> Result<()> {
        let path = self.object_path(object_name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("failed to create object directory: {e}")))?;
        }

        // Atomic write: temp file + rename
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Storage(format!("failed to create temp file: {e}")))?;
        file.write_all(content)
            .await
            .map_err(|e| Error::Storage(format!("failed to write object: {e}")))?;
        file.flush()
            .await
            .map_err(|e| Error::Storage(format!("failed to flush object: {e}")))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| Error::Storage(format!("failed to commit object: {e}")))?;

        {
            let mut stats = self.stats.write();
            stats.objects_stored += 1;
            stats.bytes_stored += content.len() as u64;
        }

        debug!("Stored object {object_name} ({} bytes)", content.len());
        Ok(())
    }

    async fn read(&self, object_name: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>> {
        let path = self.object_path(object_name)?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| Error::Storage(format!("failed to open {object_name}: {e}")))?;

        {
            let mut stats = self.stats.write();
            stats.reads_opened += 1;
        }

        Ok(Box::new(file))
    }

    async fn size(&self, object_name: &str) -> Result<u64> {
        let path = self.object_path(object_name)?;
        let meta = fs::metadata(&path)
            .await
            .map_err(|e| Error::Storage(format!("failed to stat {object_name}: {e}")))?;
        Ok(meta.len())
    }

    async fn exists(&self, object_name: &str) -> bool {
        match self.object_path(object_name) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn set_expiry(&self, object_name: &str, expires_at: SystemTime) -> Result<()> {
        let path = self.object_path(object_name)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::Storage(format!(
                "cannot set expiry on missing object: {object_name}"
            )));
        }

        let expires_at_ms = expires_at
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::Storage(format!("expiry predates epoch: {e}")))?
            .as_millis();
        let meta = ObjectMeta {
            expires_at_ms: u64::try_from(expires_at_ms)
                .map_err(|_| Error::Storage("expiry out of range".to_string()))?,
        };
        let body = serde_json::to_vec(&meta)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        fs::write(Self::meta_path(&path), body)
            .await
            .map_err(|e| Error::Storage(format!("failed to write expiry marker: {e}")))?;

        debug!(
            "Set expiry marker for {object_name} to {} ms",
            meta.expires_at_ms
        );
        Ok(())
    }

    async fn expiry(&self, object_name: &str) -> Result<Option<SystemTime>> {
        let path = self.object_path(object_name)?;
        let meta_path = Self::meta_path(&path);
        if !fs::try_exists(&meta_path).await.unwrap_or(false) {
            return Ok(None);
        }
        let body = fs::read(&meta_path)
            .await
            .map_err(|e| Error::Storage(format!("failed to read expiry marker: {e}")))?;
        let meta: ObjectMeta =
            serde_json::from_slice(&body).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Some(
            UNIX_EPOCH + Duration::from_millis(meta.expires_at_ms),
        ))
    }
}
