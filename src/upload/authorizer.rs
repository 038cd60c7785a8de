//! Quote-phase upload authorization.
//!
//! Validates a quote request, prices it, reserves an upload slot in
//! storage and persists the unpaid invoice the later upload must redeem.

use crate::config::ServiceConfig;
use crate::invoice::{generate_reference, FileRecord, Invoice, InvoiceState, InvoiceStore};
use crate::pricing::PriceQuoter;
use crate::storage::{ObjectStore, UploadCredential};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Raw quote inputs as received from the client, field presence intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteInput {
    /// Declared file size in bytes.
    pub file_size: Option<i64>,
    /// Requested hosting window in minutes.
    pub retention_minutes: Option<i64>,
}

/// Why a quote request was refused.
#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// Size missing, non-positive, or over the configured cap.
    #[error("file size must be a positive integer within the size cap")]
    InvalidSize,
    /// No retention period supplied.
    #[error("a retention period is required")]
    MissingRetention,
    /// Retention below the configured floor.
    #[error("retention period must be at least {min} minutes")]
    RetentionTooShort {
        /// The configured minimum.
        min: u64,
    },
    /// A collaborator failed while provisioning the slot.
    #[error(transparent)]
    Internal(#[from] crate::Error),
}

/// A successfully authorized upload slot.
#[derive(Debug, Clone)]
pub struct AuthorizedUpload {
    /// Reference the client must echo when redeeming the slot.
    pub reference_number: String,
    /// Time-boxed write credential.
    pub credential: UploadCredential,
    /// Future public retrieval URL; valid only after upload and
    /// advertisement complete.
    pub public_url: String,
    /// Quoted price in ledger units.
    pub amount: u64,
}

/// Authorizes uploads: validation, pricing, slot reservation, invoice.
pub struct UploadAuthorizer {
    config: ServiceConfig,
    quoter: PriceQuoter,
    objects: Arc<dyn ObjectStore>,
    invoices: Arc<dyn InvoiceStore>,
    next_file_id: AtomicU64,
}

impl UploadAuthorizer {
    /// Create an authorizer.
    #[must_use]
    pub fn new(
        config: ServiceConfig,
        quoter: PriceQuoter,
        objects: Arc<dyn ObjectStore>,
        invoices: Arc<dyn InvoiceStore>,
    ) -> Self {
        Self {
            config,
            quoter,
            objects,
            invoices,
            next_file_id: AtomicU64::new(1),
        }
    }

    /// Authorize an upload slot for the given quote inputs.
    ///
    /// Validation order is part of the contract: size validity, size cap,
    /// retention presence, retention floor.
    ///
    /// # Errors
    ///
    /// Returns the specific [`AuthorizeError`] for the first failing
    /// check, or `Internal` if a collaborator fails.
    pub async fn authorize(&self, input: QuoteInput) -> Result<AuthorizedUpload, AuthorizeError> {
        let file_size = match input.file_size {
            Some(size) if size > 0 => size.unsigned_abs(),
            _ => return Err(AuthorizeError::InvalidSize),
        };
        if file_size > self.config.max_object_size {
            return Err(AuthorizeError::InvalidSize);
        }

        let Some(retention) = input.retention_minutes else {
            return Err(AuthorizeError::MissingRetention);
        };
        let min = self.config.min_retention_minutes;
        if retention <= 0 || retention.unsigned_abs() < min {
            return Err(AuthorizeError::RetentionTooShort { min });
        }
        let retention_minutes = retention.unsigned_abs();

        let amount = self.quoter.quote(file_size, retention_minutes)?;

        let object_identifier = generate_object_identifier();
        let object_name = self.config.object_name(&object_identifier);
        let credential = self
            .objects
            .create_upload(
                &object_name,
                file_size,
                Duration::from_secs(self.config.upload_credential_ttl_secs),
            )
            .await?;

        let file_id = self.next_file_id.fetch_add(1, Ordering::Relaxed);
        let reference_number = generate_reference();
        let invoice = Invoice {
            reference_number: reference_number.clone(),
            file_id,
            quoted_amount: amount,
            storage_path: object_name,
            retention_minutes,
            payment_txid: None,
            advertisement_txid: None,
            state: InvoiceState::Unpaid,
        };
        let file = FileRecord {
            file_id,
            object_identifier: object_identifier.clone(),
            declared_size: file_size,
        };
        self.invoices.create(invoice, file)?;

        info!(
            "Authorized upload {reference_number}: {file_size} bytes for \
             {retention_minutes} min at {amount} units"
        );
        debug!("Upload slot for {reference_number} is object {object_identifier}");

        Ok(AuthorizedUpload {
            reference_number,
            credential,
            public_url: self.config.public_url(&object_identifier),
            amount,
        })
    }
}

/// Generate a fresh object identifier: 128 bits of randomness, Base58.
#[must_use]
pub fn generate_object_identifier() -> String {
    let bytes: [u8; 16] = rand::random();
    bs58::encode(bytes).into_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::invoice::MemoryInvoiceStore;
    use crate::storage::{DiskObjectStore, DiskObjectStoreConfig};
    use tempfile::TempDir;

    async fn create_test_authorizer() -> (UploadAuthorizer, Arc<MemoryInvoiceStore>, TempDir) {
        let temp_dir = TempDir::new().expect("create temp dir");
        let objects = Arc::new(
            DiskObjectStore::new(DiskObjectStoreConfig {
                root_dir: temp_dir.path().to_path_buf(),
            })
            .await
            .expect("create store"),
        );
        let invoices = Arc::new(MemoryInvoiceStore::new());
        let config = ServiceConfig {
            hosting_domain: "https://files.example.net".to_string(),
            min_retention_minutes: 30,
            ..ServiceConfig::default()
        };
        let quoter = PriceQuoter::new(config.pricing.clone()).expect("quoter");
        let authorizer =
            UploadAuthorizer::new(config, quoter, objects, Arc::clone(&invoices) as _);
        (authorizer, invoices, temp_dir)
    }

    fn input(file_size: i64, retention: i64) -> QuoteInput {
        QuoteInput {
            file_size: Some(file_size),
            retention_minutes: Some(retention),
        }
    }

    #[tokio::test]
    async fn test_authorize_success() {
        let (authorizer, invoices, _temp) = create_test_authorizer().await;

        let authorized = authorizer.authorize(input(1000, 60)).await.expect("authorize");
        assert!(authorized.amount > 0);
        assert!(authorized.credential.upload_url.starts_with("file://"));
        assert!(authorized
            .public_url
            .starts_with("https://files.example.net/cdn/"));

        let (invoice, file) = invoices.find(&authorized.reference_number).expect("stored");
        assert_eq!(invoice.state, InvoiceState::Unpaid);
        assert_eq!(invoice.quoted_amount, authorized.amount);
        assert_eq!(file.declared_size, 1000);
        assert!(authorized.public_url.ends_with(&file.object_identifier));
    }

    #[tokio::test]
    async fn test_rejects_missing_and_negative_size() {
        let (authorizer, _, _temp) = create_test_authorizer().await;

        let result = authorizer
            .authorize(QuoteInput {
                file_size: None,
                retention_minutes: Some(60),
            })
            .await;
        assert!(matches!(result, Err(AuthorizeError::InvalidSize)));

        let result = authorizer.authorize(input(-5, 60)).await;
        assert!(matches!(result, Err(AuthorizeError::InvalidSize)));

        let result = authorizer.authorize(input(0, 60)).await;
        assert!(matches!(result, Err(AuthorizeError::InvalidSize)));
    }

    #[tokio::test]
    async fn test_rejects_oversize() {
        let (authorizer, _, _temp) = create_test_authorizer().await;
        let result = authorizer.authorize(input(11_000_000_001, 60)).await;
        assert!(matches!(result, Err(AuthorizeError::InvalidSize)));
    }

    #[tokio::test]
    async fn test_rejects_missing_retention() {
        let (authorizer, _, _temp) = create_test_authorizer().await;
        let result = authorizer
            .authorize(QuoteInput {
                file_size: Some(1000),
                retention_minutes: None,
            })
            .await;
        assert!(matches!(result, Err(AuthorizeError::MissingRetention)));
    }

    #[tokio::test]
    async fn test_retention_floor_is_exact() {
        let (authorizer, _, _temp) = create_test_authorizer().await;

        let result = authorizer.authorize(input(1000, 29)).await;
        assert!(matches!(
            result,
            Err(AuthorizeError::RetentionTooShort { min: 30 })
        ));

        // At the floor is accepted.
        assert!(authorizer.authorize(input(1000, 30)).await.is_ok());
    }

    #[tokio::test]
    async fn test_validation_order_size_first() {
        let (authorizer, _, _temp) = create_test_authorizer().await;
        // Both size and retention invalid: size wins.
        let result = authorizer
            .authorize(QuoteInput {
                file_size: Some(-1),
                retention_minutes: None,
            })
            .await;
        assert!(matches!(result, Err(AuthorizeError::InvalidSize)));
    }

    #[test]
    fn test_object_identifiers_are_unique() {
        let a = generate_object_identifier();
        let b = generate_object_identifier();
        assert_ne!(a, b);
        // Base58 of 16 bytes.
        assert!(a.len() >= 16 && a.len() <= 23);
    }
}
