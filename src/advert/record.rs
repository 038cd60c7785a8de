//! The on-ledger advertisement record.
//!
//! Downstream resolvers parse the record positionally, so the field order
//! is fixed and non-negotiable: protocol marker, publisher address, raw
//! content digest, the `advertise` tag, retrieval URL, expiry in seconds
//! as a decimal string, content length as a decimal string. The record is
//! embedded as a zero-value, data-only output.

use crate::content::ContentId;
use serde::{Deserialize, Serialize};

/// Well-known marker identifying availability advertisements on the
/// ledger.
pub const ADVERTISEMENT_PROTOCOL_MARKER: &str = "1UHRPYnMHPuQ5Tgb3AF8JXqwKkmZVy5hG";

/// Advertisement type tag.
pub const ADVERTISE_TAG: &str = "advertise";

/// A published, time-bounded claim that specific content is retrievable at
/// a specific URL until a specific expiry.
///
/// Records are never mutated; a renewal is a new record with a later
/// expiry, superseding the previous broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisementRecord {
    /// Ledger address of the publishing service.
    pub publisher_address: String,
    /// Canonical identifier of the advertised content.
    pub content_id: ContentId,
    /// URL the content is retrievable from.
    pub retrieval_url: String,
    /// Absolute expiry in milliseconds since the epoch.
    pub expiry_ms: u64,
    /// Content length in bytes.
    pub content_length: u64,
}

impl AdvertisementRecord {
    /// Expiry in whole seconds since the epoch, as carried on the wire.
    #[must_use]
    pub const fn expiry_secs(&self) -> u64 {
        self.expiry_ms / 1000
    }

    /// The ordered wire fields of the data output.
    #[must_use]
    pub fn wire_fields(&self) -> Vec<Vec<u8>> {
        vec![
            ADVERTISEMENT_PROTOCOL_MARKER.as_bytes().to_vec(),
            self.publisher_address.as_bytes().to_vec(),
            self.content_id.as_bytes().to_vec(),
            ADVERTISE_TAG.as_bytes().to_vec(),
            self.retrieval_url.as_bytes().to_vec(),
            self.expiry_secs().to_string().into_bytes(),
            self.content_length.to_string().into_bytes(),
        ]
    }
}
