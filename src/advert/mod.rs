//! Advertisement assembly and publication.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Advertiser                         │
//! ├──────────────────────────────────────────────────────────┤
//! │  advertise(content_id, object, size, retention)          │
//! │        │                                                 │
//! │        ▼                                                 │
//! │  AdvertisementBuilder ──▶ AdvertisementRecord            │
//! │        │                                                 │
//! │        ▼                                                 │
//! │  BroadcastClient ──▶ LedgerSubmitter ──▶ broadcast id    │
//! │        │                    └─▶ Broadcaster (best-effort)│
//! │        ▼                                                 │
//! │  ObjectStore.set_expiry(advertised expiry + margin)      │
//! │  InvoiceStore.record_advertisement(broadcast id)         │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod broadcast;
mod builder;
mod keys;
mod record;

pub use broadcast::{
    BroadcastClient, BroadcastId, Broadcaster, HttpBroadcaster, LedgerSubmitter, WalletSubmitter,
};
pub use builder::AdvertisementBuilder;
pub use keys::PublisherKey;
pub use record::{AdvertisementRecord, ADVERTISEMENT_PROTOCOL_MARKER, ADVERTISE_TAG};

use crate::error::Result;
use crate::content::ContentId;
use crate::invoice::InvoiceStore;
use crate::storage::ObjectStore;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use tracing::{info, warn};

/// End-to-end advertisement pipeline shared by the upload and trigger
/// paths: build the record, publish it, then stretch the storage object's
/// expiry marker past the advertised window.
pub struct Advertiser {
    builder: AdvertisementBuilder,
    client: BroadcastClient,
    objects: Arc<dyn ObjectStore>,
    invoices: Arc<dyn InvoiceStore>,
    hosting_prefix: String,
    safety_margin: Duration,
}

impl Advertiser {
    /// Create the pipeline.
    #[must_use]
    pub fn new(
        builder: AdvertisementBuilder,
        client: BroadcastClient,
        objects: Arc<dyn ObjectStore>,
        invoices: Arc<dyn InvoiceStore>,
        hosting_prefix: String,
        safety_margin: Duration,
    ) -> Self {
        Self {
            builder,
            client,
            objects,
            invoices,
            hosting_prefix,
            safety_margin,
        }
    }

    /// Advertise a hosted object and extend its storage lifetime.
    ///
    /// Returns the durable broadcast id. Callable again for the same
    /// object on renewal; each call produces a fresh record whose expiry
    /// is computed now.
    ///
    /// # Errors
    ///
    /// Returns an error if record assembly, ledger submission or the
    /// expiry extension fails. Bridge fan-out failures are not errors.
    pub async fn advertise(
        &self,
        content_id: ContentId,
        object_identifier: &str,
        retrieval_url: String,
        content_length: u64,
        retention_minutes: u64,
    ) -> Result<BroadcastId> {
        let record = self.builder.build(
            content_id,
            retrieval_url,
            retention_minutes,
            content_length,
        )?;
        let expiry_ms = record.expiry_ms;

        let broadcast_id = self.client.publish(&record).await?;

        // The object must outlive the advertised window; the marker gets a
        // fixed safety margin past the advertised expiry.
        let object_name = format!("{}/{}", self.hosting_prefix, object_identifier);
        let marker = UNIX_EPOCH + Duration::from_millis(expiry_ms) + self.safety_margin;
        self.objects.set_expiry(&object_name, marker).await?;

        if let Err(e) = self
            .invoices
            .record_advertisement(object_identifier, &broadcast_id)
        {
            // The broadcast is already durable; a bookkeeping miss must not
            // fail the operation.
            warn!("Could not record advertisement for {object_identifier}: {e}");
        }

        info!(
            "Advertised {object_identifier} until {} (+{}s margin, broadcast {broadcast_id})",
            expiry_ms / 1000,
            self.safety_margin.as_secs()
        );

        Ok(broadcast_id)
    }
}
