//! Advertisement record assembly.

use crate::advert::AdvertisementRecord;
use crate::content::ContentId;
use crate::error::{Error, Result};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Assembles broadcast-ready advertisement records.
///
/// Building a record has no side effects; it does not touch the ledger.
/// The expiry is always computed here, at build time, from the retention
/// window — never carried over from quote time — so a renewal broadcast
/// naturally gets a later expiry.
#[derive(Debug, Clone)]
pub struct AdvertisementBuilder {
    publisher_address: String,
}

impl AdvertisementBuilder {
    /// Create a builder publishing under the given ledger address.
    #[must_use]
    pub fn new(publisher_address: String) -> Self {
        Self { publisher_address }
    }

    /// The address records are published under.
    #[must_use]
    pub fn publisher_address(&self) -> &str {
        &self.publisher_address
    }

    /// Build the advertisement record for a hosted object.
    ///
    /// # Errors
    ///
    /// Returns an error if the system clock reads before the epoch.
    pub fn build(
        &self,
        content_id: ContentId,
        retrieval_url: String,
        retention_minutes: u64,
        content_length: u64,
    ) -> Result<AdvertisementRecord> {
        let now_ms = epoch_ms_now()?;
        let expiry_ms = now_ms.saturating_add(retention_minutes.saturating_mul(60_000));

        debug!(
            "Built advertisement for {} (expires {expiry_ms} ms, {content_length} bytes)",
            content_id.to_url()
        );

        Ok(AdvertisementRecord {
            publisher_address: self.publisher_address.clone(),
            content_id,
            retrieval_url,
            expiry_ms,
            content_length,
        })
    }
}

/// Milliseconds since the Unix epoch.
fn epoch_ms_now() -> Result<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Broadcast(format!("system clock predates epoch: {e}")))?;
    u64::try_from(elapsed.as_millis())
        .map_err(|_| Error::Broadcast("system clock out of range".to_string()))
}
