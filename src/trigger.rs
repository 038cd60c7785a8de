//! Event-driven advertisement trigger.
//!
//! When the bucket reports a new object under the hosting prefix, the
//! trigger re-hashes the stored bytes and calls the admin-authenticated
//! advertise operation. Objects outside the prefix are ignored; that is a
//! no-op, not an error.

use crate::api::AdvertiseRequest;
use crate::content::hash_reader;
use crate::error::{Error, Result};
use crate::service::HostService;
use crate::storage::{ObjectCreated, ObjectStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reacts to storage change events by advertising new hosted objects.
pub struct AdvertisementTrigger {
    objects: Arc<dyn ObjectStore>,
    service: Arc<HostService>,
    hosting_prefix: String,
    admin_token: String,
}

impl AdvertisementTrigger {
    /// Create a trigger bound to a service.
    #[must_use]
    pub fn new(objects: Arc<dyn ObjectStore>, service: Arc<HostService>) -> Self {
        let config = service.config();
        let hosting_prefix = format!("{}/", config.hosting_prefix);
        let admin_token = config.admin_token.clone();
        Self {
            objects,
            service,
            hosting_prefix,
            admin_token,
        }
    }

    /// Handle an object-created notification.
    ///
    /// Returns `Ok(None)` for objects outside the hosting prefix, and the
    /// content identifier URL of the published advertisement otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be read, the hashed byte
    /// count disagrees with the event's size, or the advertise operation
    /// fails. No advertisement is published in any of those cases.
    pub async fn handle_object_created(&self, event: &ObjectCreated) -> Result<Option<String>> {
        if !event.name.starts_with(&self.hosting_prefix) {
            debug!("Ignoring object outside hosting prefix: {}", event.name);
            return Ok(None);
        }

        info!(
            "New hosted object {} ({} bytes, event {})",
            event.name, event.size, event.event_id
        );

        let reader = self.objects.read(&event.name).await?;
        let (content_id, byte_count) = hash_reader(reader).await?;

        // The advertised size is the count of bytes actually hashed; a
        // disagreement with the event means a torn or mutated object.
        if byte_count != event.size {
            warn!(
                "Object {} hashed to {byte_count} bytes but event reports {}",
                event.name, event.size
            );
            return Err(Error::Storage(format!(
                "size mismatch for {}: hashed {byte_count}, event {}",
                event.name, event.size
            )));
        }

        let file_hash = content_id.to_url();
        let request = AdvertiseRequest {
            admin_token: self.admin_token.clone(),
            file_hash: file_hash.clone(),
            object_identifier: event.object_identifier().to_string(),
            file_size: byte_count,
        };
        self.service
            .handle_advertise(request)
            .await
            .map_err(|e| Error::Broadcast(format!("advertise call failed: {e}")))?;

        Ok(Some(file_hash))
    }
}
