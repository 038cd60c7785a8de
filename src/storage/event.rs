//! Storage change notifications.

use serde::{Deserialize, Serialize};

/// Notification that an object landed in the bucket.
///
/// Mirrors the bucket collaborator's object-finalize event; only the
/// fields the advertisement trigger consumes are modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectCreated {
    /// Bucket the object landed in.
    pub bucket: String,
    /// Full object name, including any folder prefix.
    pub name: String,
    /// Object size in bytes as reported by the bucket.
    pub size: u64,
    /// Metadata generation counter.
    #[serde(default)]
    pub metageneration: u64,
    /// Creation timestamp, as reported by the bucket.
    #[serde(default)]
    pub time_created: String,
    /// Last-update timestamp, as reported by the bucket.
    #[serde(default)]
    pub updated: String,
    /// Delivery id of the notification itself.
    #[serde(default)]
    pub event_id: String,
}

impl ObjectCreated {
    /// The object identifier: the final path segment of the object name.
    #[must_use]
    pub fn object_identifier(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}
