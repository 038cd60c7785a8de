//! # hostcast
//!
//! Payment-gated content hosting with ledger-anchored availability
//! advertisements.
//!
//! A client asks for a price quote to host a file for a bounded window,
//! pays the resulting invoice, and uploads the bytes. The service computes
//! a deterministic content identifier from the exact byte sequence and
//! broadcasts an ordered advertisement record on a public ledger binding
//! {content hash, retrieval URL, expiry, content length}, then stretches
//! the storage object's garbage-collection marker past the advertised
//! window.
//!
//! ## Architecture
//!
//! - [`pricing::PriceQuoter`] — deterministic, monotonic price function
//! - [`upload::UploadAuthorizer`] — quote validation, invoice + upload slot
//! - [`upload::PaymentGate`] — hard-gated direct upload path
//! - [`content`] — streaming SHA-256 and the canonical identifier URL
//! - [`advert`] — record assembly, ledger submission, bridge fan-out
//! - [`trigger::AdvertisementTrigger`] — storage-event-driven path
//! - [`service::HostService`] — one handler per surface operation
//!
//! Storage buckets, the wallet that assembles transactions, and the bridge
//! mirrors are collaborators behind the [`storage::ObjectStore`],
//! [`advert::LedgerSubmitter`] and [`advert::Broadcaster`] traits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hostcast::api::QuoteRequest;
//! use hostcast::advert::{HttpBroadcaster, WalletSubmitter};
//! use hostcast::config::ServiceConfig;
//! use hostcast::invoice::MemoryInvoiceStore;
//! use hostcast::service::HostService;
//! use hostcast::storage::{DiskObjectStore, DiskObjectStoreConfig};
//! use hostcast::upload::RawTxVerifier;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::from_file("hostcast.toml".as_ref())?;
//! let timeout = Duration::from_secs(config.broadcast.timeout_secs);
//! let service = HostService::new(
//!     config.clone(),
//!     Arc::new(DiskObjectStore::new(DiskObjectStoreConfig::default()).await?),
//!     Arc::new(MemoryInvoiceStore::new()),
//!     Arc::new(WalletSubmitter::new(config.broadcast.wallet_url.clone(), timeout)?),
//!     Arc::new(HttpBroadcaster::new(config.broadcast.bridges.clone(), timeout)?),
//!     Arc::new(RawTxVerifier::new()),
//! )?;
//! let quote = service
//!     .handle_quote(serde_json::from_str::<QuoteRequest>(
//!         r#"{"fileSize": 1000, "retentionPeriod": 60}"#,
//!     )?)
//!     .await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod advert;
pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod invoice;
pub mod pricing;
pub mod service;
pub mod storage;
pub mod trigger;
pub mod upload;

pub use advert::{AdvertisementRecord, Advertiser, BroadcastId, Broadcaster, LedgerSubmitter};
pub use api::{ApiError, ErrorCode};
pub use config::ServiceConfig;
pub use content::{ContentHasher, ContentId};
pub use error::{Error, Result};
pub use invoice::{Invoice, InvoiceStore, MemoryInvoiceStore};
pub use pricing::PriceQuoter;
pub use service::HostService;
pub use storage::{DiskObjectStore, ObjectCreated, ObjectStore};
pub use trigger::AdvertisementTrigger;
pub use upload::{PaymentGate, PaymentVerifier, UploadAuthorizer};
