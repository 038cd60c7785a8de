//! The payment gate for direct uploads.
//!
//! Every step is a hard gate; failing any of them aborts with no side
//! effect beyond the reported error. The invoice claim is the idempotency
//! boundary: it happens only after the free checks pass, and a failure
//! anywhere after it releases the claim so the client can retry.

use crate::advert::{Advertiser, BroadcastId};
use crate::config::ServiceConfig;
use crate::content::{ContentHasher, ContentId};
use crate::invoice::{ClaimOutcome, Invoice, InvoiceStore};
use crate::storage::ObjectStore;
use crate::upload::PaymentVerifier;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a direct upload was refused.
#[derive(Debug, Error)]
pub enum GateError {
    /// The reference number does not match a redeemable invoice.
    #[error("unknown or already fulfilled reference number")]
    UnknownReference,
    /// The uploaded byte count differs from the invoiced size.
    #[error("uploaded {actual} bytes but the invoice declares {declared}")]
    SizeMismatch {
        /// Size the invoice was quoted for.
        declared: u64,
        /// Bytes actually received.
        actual: u64,
    },
    /// The submitted payment did not verify.
    #[error("payment rejected: {0}")]
    Payment(String),
    /// A collaborator failed mid-flight.
    #[error(transparent)]
    Internal(#[from] crate::Error),
}

/// Result of a completed direct upload.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// Public retrieval URL, now live.
    pub public_url: String,
    /// Canonical content identifier of the stored bytes.
    pub content_id: ContentId,
    /// Broadcast id of the published advertisement.
    pub broadcast_id: BroadcastId,
}

/// Validates and completes direct uploads against their invoices.
pub struct PaymentGate {
    config: ServiceConfig,
    invoices: Arc<dyn InvoiceStore>,
    objects: Arc<dyn ObjectStore>,
    verifier: Arc<dyn PaymentVerifier>,
    advertiser: Arc<Advertiser>,
}

impl PaymentGate {
    /// Create a payment gate.
    #[must_use]
    pub fn new(
        config: ServiceConfig,
        invoices: Arc<dyn InvoiceStore>,
        objects: Arc<dyn ObjectStore>,
        verifier: Arc<dyn PaymentVerifier>,
        advertiser: Arc<Advertiser>,
    ) -> Self {
        Self {
            config,
            invoices,
            objects,
            verifier,
            advertiser,
        }
    }

    /// Receive an upload: validate it against its invoice, store it, and
    /// advertise it.
    ///
    /// The caller has already established that the payload, reference and
    /// payment fields are present.
    ///
    /// # Errors
    ///
    /// Returns the first failing gate. Until the invoice claim succeeds no
    /// state changes; after it, any failure releases the claim.
    pub async fn receive_upload(
        &self,
        reference_number: &str,
        transaction_hex: &str,
        bytes: Bytes,
    ) -> Result<UploadReceipt, GateError> {
        // Free checks first: nothing is consumed until they all pass.
        let Some((invoice, file)) = self.invoices.find(reference_number) else {
            debug!("Upload with unknown reference {reference_number}");
            return Err(GateError::UnknownReference);
        };

        let actual = bytes.len() as u64;
        if file.declared_size != actual {
            debug!(
                "Size mismatch for {reference_number}: declared {}, got {actual}",
                file.declared_size
            );
            return Err(GateError::SizeMismatch {
                declared: file.declared_size,
                actual,
            });
        }

        let payment_txid = self
            .verifier
            .verify(&invoice, transaction_hex)
            .await
            .map_err(|e| GateError::Payment(e.to_string()))?;

        // Idempotency boundary: exactly one concurrent upload wins the
        // claim; a resubmission after success lands here too.
        let invoice = match self.invoices.claim(reference_number) {
            ClaimOutcome::Claimed(invoice) => invoice,
            ClaimOutcome::NotFound => return Err(GateError::UnknownReference),
            ClaimOutcome::AlreadyClaimed => {
                debug!("Rejected duplicate redemption of {reference_number}");
                return Err(GateError::UnknownReference);
            }
        };

        match self
            .complete(&invoice, &file.object_identifier, &bytes)
            .await
        {
            Ok(receipt) => {
                self.invoices
                    .fulfill(reference_number, &payment_txid, &receipt.broadcast_id)?;
                info!(
                    "Fulfilled invoice {reference_number}: {} now live at {}",
                    receipt.content_id.to_url(),
                    receipt.public_url
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!("Upload {reference_number} failed after claim, releasing: {e}");
                self.invoices.release(reference_number);
                Err(GateError::Internal(e))
            }
        }
    }

    /// Store, hash and advertise the verified bytes.
    async fn complete(
        &self,
        invoice: &Invoice,
        object_identifier: &str,
        bytes: &Bytes,
    ) -> crate::Result<UploadReceipt> {
        self.objects.put(&invoice.storage_path, bytes).await?;

        let mut hasher = ContentHasher::new();
        hasher.update(bytes);
        let (content_id, _) = hasher.finish();

        let public_url = self.config.public_url(object_identifier);
        let broadcast_id = self
            .advertiser
            .advertise(
                content_id,
                object_identifier,
                public_url.clone(),
                bytes.len() as u64,
                invoice.retention_minutes,
            )
            .await?;

        Ok(UploadReceipt {
            public_url,
            content_id,
            broadcast_id,
        })
    }
}
