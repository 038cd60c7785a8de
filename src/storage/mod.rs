//! Object storage collaborator.
//!
//! The service never talks to a bucket directly; it goes through the
//! [`ObjectStore`] trait, which exposes exactly what the upload lifecycle
//! needs: a time-boxed write credential, byte streams in and out, and the
//! expiry/garbage-collection marker. Partial uploads from disconnected
//! clients are the store's problem to discard; the core only ever
//! advertises bytes it has hashed and size-verified itself.

mod disk;
mod event;

pub use disk::{DiskObjectStore, DiskObjectStoreConfig, StorageStats};
pub use event::ObjectCreated;

use crate::error::Result;
use async_trait::async_trait;
use std::time::{Duration, SystemTime};
use tokio::io::AsyncRead;

/// A time-boxed credential permitting one client upload to a specific
/// object name.
#[derive(Debug, Clone)]
pub struct UploadCredential {
    /// URL the client uploads the object bytes to.
    pub upload_url: String,
    /// When the credential stops being accepted.
    pub expires_at: SystemTime,
}

/// Abstraction over the storage bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Issue a write credential for `object_name`, valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot provision the upload slot.
    async fn create_upload(
        &self,
        object_name: &str,
        declared_size: u64,
        ttl: Duration,
    ) -> Result<UploadCredential>;

    /// Write an object's bytes directly (the synchronous upload path).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; a failed write leaves no
    /// partial object behind.
    async fn put(&self, object_name: &str, content: &[u8]) -> Result<()>;

    /// Open a read stream over an object's bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or cannot be opened.
    async fn read(&self, object_name: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>>;

    /// Size of a stored object in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist.
    async fn size(&self, object_name: &str) -> Result<u64>;

    /// Whether an object exists.
    async fn exists(&self, object_name: &str) -> bool;

    /// Set the object's expiry/garbage-collection marker.
    ///
    /// The reaper must never collect an object before this instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or the marker cannot
    /// be persisted.
    async fn set_expiry(&self, object_name: &str, expires_at: SystemTime) -> Result<()>;

    /// Read back the object's expiry marker, if one is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist.
    async fn expiry(&self, object_name: &str) -> Result<Option<SystemTime>>;
}
