//! Service handlers for the payment-gated hosting surface.
//!
//! `HostService` owns every collaborator and exposes one method per
//! operation: quote, direct upload, admin advertise. The embedding HTTP
//! framework deserializes bodies into the [`crate::api`] types, calls the
//! matching handler, and renders the returned value or [`ApiError`] with
//! its HTTP status class. Handlers catch every collaborator failure and
//! convert it to the structured error shape; internal details are logged,
//! never exposed.

use crate::advert::{
    AdvertisementBuilder, Advertiser, BroadcastClient, Broadcaster, LedgerSubmitter, PublisherKey,
};
use crate::api::{
    AdvertiseRequest, AdvertiseResponse, ApiError, DirectUploadRequest, DirectUploadResponse,
    ErrorCode, QuoteRequest, QuoteResponse,
};
use crate::config::{ServiceConfig, MIN_ADMIN_TOKEN_LEN};
use crate::content::ContentId;
use crate::error::Result;
use crate::invoice::InvoiceStore;
use crate::pricing::PriceQuoter;
use crate::storage::ObjectStore;
use crate::upload::{
    AuthorizeError, GateError, PaymentGate, PaymentVerifier, QuoteInput, UploadAuthorizer,
};
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

/// The assembled hosting service.
pub struct HostService {
    config: ServiceConfig,
    authorizer: UploadAuthorizer,
    gate: PaymentGate,
    advertiser: Arc<Advertiser>,
    invoices: Arc<dyn InvoiceStore>,
}

impl HostService {
    /// Wire up the service from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the pricing
    /// parameters are unusable, or the publisher key cannot be loaded.
    pub fn new(
        config: ServiceConfig,
        objects: Arc<dyn ObjectStore>,
        invoices: Arc<dyn InvoiceStore>,
        submitter: Arc<dyn LedgerSubmitter>,
        bridges: Arc<dyn Broadcaster>,
        verifier: Arc<dyn PaymentVerifier>,
    ) -> Result<Self> {
        config.validate()?;

        let publisher = PublisherKey::from_config(&config.publisher)?;
        info!("Publishing advertisements as {}", publisher.address());

        let quoter = PriceQuoter::new(config.pricing.clone())?;
        let builder = AdvertisementBuilder::new(publisher.address().to_string());
        let client = BroadcastClient::new(
            submitter,
            bridges,
            Duration::from_secs(config.broadcast.timeout_secs),
        );
        let advertiser = Arc::new(Advertiser::new(
            builder,
            client,
            Arc::clone(&objects),
            Arc::clone(&invoices),
            config.hosting_prefix.clone(),
            Duration::from_secs(config.expiry_safety_margin_secs),
        ));
        let authorizer = UploadAuthorizer::new(
            config.clone(),
            quoter,
            Arc::clone(&objects),
            Arc::clone(&invoices),
        );
        let gate = PaymentGate::new(
            config.clone(),
            Arc::clone(&invoices),
            objects,
            verifier,
            Arc::clone(&advertiser),
        );

        Ok(Self {
            config,
            authorizer,
            gate,
            advertiser,
            invoices,
        })
    }

    /// The service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The shared advertisement pipeline.
    #[must_use]
    pub fn advertiser(&self) -> &Arc<Advertiser> {
        &self.advertiser
    }

    /// Handle a quote request: validate, price, and reserve a slot.
    ///
    /// # Errors
    ///
    /// Returns the specific validation code, or `ERR_INTERNAL_UPLOAD` if a
    /// collaborator fails.
    pub async fn handle_quote(&self, request: QuoteRequest) -> std::result::Result<QuoteResponse, ApiError> {
        let file_size = match request.file_size {
            None => None,
            Some(number) => match number.as_i64() {
                Some(value) => Some(value),
                None => {
                    return Err(ApiError::new(
                        ErrorCode::InvalidSize,
                        "The file size must be a positive integer.",
                    ))
                }
            },
        };
        let retention_minutes = match request.retention_period {
            None => None,
            Some(number) => match number.as_i64() {
                Some(value) => Some(value),
                None => {
                    return Err(ApiError::new(
                        ErrorCode::InvalidRetentionPeriod,
                        "The retention period must be an integer number of minutes.",
                    ))
                }
            },
        };

        let authorized = self
            .authorizer
            .authorize(QuoteInput {
                file_size,
                retention_minutes,
            })
            .await
            .map_err(|e| match e {
                AuthorizeError::InvalidSize => ApiError::new(
                    ErrorCode::InvalidSize,
                    format!(
                        "The file size must be a positive integer of at most {} bytes.",
                        self.config.max_object_size
                    ),
                ),
                AuthorizeError::MissingRetention => ApiError::new(
                    ErrorCode::NoRetentionPeriod,
                    "You must specify the number of minutes to host the file.",
                ),
                AuthorizeError::RetentionTooShort { min } => ApiError::new(
                    ErrorCode::InvalidRetentionPeriod,
                    format!("The retention period must be >= {min} minutes."),
                ),
                AuthorizeError::Internal(inner) => {
                    error!("Quote failed internally: {inner}");
                    ApiError::new(
                        ErrorCode::InternalUpload,
                        "An internal error occurred while handling upload.",
                    )
                }
            })?;

        Ok(QuoteResponse {
            status: "success".to_string(),
            upload_url: authorized.credential.upload_url,
            public_url: authorized.public_url,
            reference_number: authorized.reference_number,
            amount: authorized.amount,
            description: "File can now be uploaded.".to_string(),
        })
    }

    /// Handle a direct multipart upload through the payment gate.
    ///
    /// # Errors
    ///
    /// Returns the first failing gate's code; no side effect accompanies
    /// any error.
    pub async fn handle_direct_upload(
        &self,
        request: DirectUploadRequest,
    ) -> std::result::Result<DirectUploadResponse, ApiError> {
        let Some(bytes) = request.file else {
            return Err(ApiError::new(ErrorCode::FileMissing, "The file is missing."));
        };
        let Some(reference_number) = request.reference_number else {
            return Err(ApiError::new(
                ErrorCode::NoRef,
                "Missing reference number. Request a quote to generate one.",
            ));
        };
        let Some(transaction_hex) = request.transaction_hex else {
            return Err(ApiError::new(
                ErrorCode::NoTx,
                "Provide a signed, broadcast-ready transaction paying for this file to be hosted.",
            ));
        };

        let receipt = self
            .gate
            .receive_upload(&reference_number, &transaction_hex, bytes)
            .await
            .map_err(|e| match e {
                GateError::UnknownReference => ApiError::new(
                    ErrorCode::BadRef,
                    "The reference number you provided cannot be found.",
                ),
                GateError::SizeMismatch { .. } => ApiError::new(
                    ErrorCode::SizeMismatch,
                    "The size of the file uploaded does not match the size in the invoice.",
                ),
                GateError::Payment(reason) => {
                    warn!("Payment rejected for {reference_number}: {reason}");
                    ApiError::new(
                        ErrorCode::PaymentInvalid,
                        "The payment transaction could not be verified.",
                    )
                }
                GateError::Internal(inner) => {
                    error!("Direct upload failed internally: {inner}");
                    ApiError::new(
                        ErrorCode::Internal,
                        "An internal error occurred while processing the upload.",
                    )
                }
            })?;

        Ok(DirectUploadResponse {
            public_url: receipt.public_url,
            hash: receipt.content_id.to_url(),
            published: true,
        })
    }

    /// Handle an admin advertise request.
    ///
    /// # Errors
    ///
    /// Returns `ERR_UNAUTHORIZED` on a token mismatch before anything else
    /// runs; collaborator failures map to `ERR_INTERNAL`.
    pub async fn handle_advertise(
        &self,
        request: AdvertiseRequest,
    ) -> std::result::Result<AdvertiseResponse, ApiError> {
        if !self.admin_token_matches(&request.admin_token) {
            return Err(ApiError::new(
                ErrorCode::Unauthorized,
                "Failed to advertise hosting commitment.",
            ));
        }

        let content_id = ContentId::from_url(&request.file_hash).map_err(|e| {
            error!("Advertise request carried a bad content hash: {e}");
            ApiError::new(
                ErrorCode::Internal,
                "An internal error occurred while processing the request.",
            )
        })?;

        // The retention window comes from the invoice that reserved this
        // object, so the advertised expiry matches what was purchased.
        let Some((invoice, _file)) = self.invoices.find_by_object(&request.object_identifier)
        else {
            error!(
                "Advertise request for unknown object {}",
                request.object_identifier
            );
            return Err(ApiError::new(
                ErrorCode::Internal,
                "An internal error occurred while processing the request.",
            ));
        };

        let public_url = self.config.public_url(&request.object_identifier);
        self.advertiser
            .advertise(
                content_id,
                &request.object_identifier,
                public_url,
                request.file_size,
                invoice.retention_minutes,
            )
            .await
            .map_err(|e| {
                error!(
                    "Advertisement failed for {}: {e}",
                    request.object_identifier
                );
                ApiError::new(
                    ErrorCode::Internal,
                    "An internal error occurred while processing the request.",
                )
            })?;

        Ok(AdvertiseResponse {
            status: "success".to_string(),
        })
    }

    /// Constant-time admin token check.
    ///
    /// Tokens at or under the minimum length are treated as unset and
    /// match nothing.
    fn admin_token_matches(&self, provided: &str) -> bool {
        let expected = self.config.admin_token.as_bytes();
        if expected.len() <= MIN_ADMIN_TOKEN_LEN {
            return false;
        }
        expected.ct_eq(provided.as_bytes()).into()
    }
}
