//! End-to-end tests of the quote / upload / advertise lifecycle.
//!
//! The ledger and bridge collaborators are fakes so every path, including
//! partial failure, is exercised without a network.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use bytes::Bytes;
use hostcast::advert::{AdvertisementRecord, BroadcastId, Broadcaster, LedgerSubmitter};
use hostcast::api::{AdvertiseRequest, DirectUploadRequest, ErrorCode, QuoteRequest};
use hostcast::config::{PublisherConfig, ServiceConfig};
use hostcast::content::ContentId;
use hostcast::invoice::{InvoiceState, InvoiceStore, MemoryInvoiceStore};
use hostcast::service::HostService;
use hostcast::storage::{DiskObjectStore, DiskObjectStoreConfig, ObjectCreated, ObjectStore};
use hostcast::trigger::AdvertisementTrigger;
use hostcast::upload::RawTxVerifier;
use hostcast::{Error, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const ADMIN_TOKEN: &str = "integration-test-admin-token";
const SIGNING_KEY_HEX: &str = "2bfe58ab6d9fd575bdc3a624e4825dd2b375d8f2eeddd58cd34d6a4b94ace5ab";

/// Ledger fake: returns sequential broadcast ids, optionally failing.
struct FakeSubmitter {
    fail: AtomicBool,
    submitted: Mutex<Vec<AdvertisementRecord>>,
}

impl FakeSubmitter {
    fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn submissions(&self) -> usize {
        self.submitted.lock().len()
    }
}

#[async_trait]
impl LedgerSubmitter for FakeSubmitter {
    async fn submit(&self, record: &AdvertisementRecord) -> Result<BroadcastId> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Broadcast("ledger offline".to_string()));
        }
        let mut submitted = self.submitted.lock();
        submitted.push(record.clone());
        Ok(format!("broadcast-{}", submitted.len()))
    }
}

/// Bridge fake: records announcements, optionally failing.
struct FakeBroadcaster {
    fail: AtomicBool,
    announced: Mutex<Vec<String>>,
}

impl FakeBroadcaster {
    fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            announced: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Broadcaster for FakeBroadcaster {
    async fn announce(&self, broadcast_id: &str, _record: &AdvertisementRecord) -> Result<()> {
        self.announced.lock().push(broadcast_id.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Broadcast("all bridges down".to_string()));
        }
        Ok(())
    }
}

struct Harness {
    service: Arc<HostService>,
    objects: Arc<DiskObjectStore>,
    invoices: Arc<MemoryInvoiceStore>,
    submitter: Arc<FakeSubmitter>,
    bridges: Arc<FakeBroadcaster>,
    _temp: TempDir,
}

impl Harness {
    async fn setup() -> Self {
        let temp = TempDir::new().expect("temp dir");
        let objects = Arc::new(
            DiskObjectStore::new(DiskObjectStoreConfig {
                root_dir: temp.path().to_path_buf(),
            })
            .await
            .expect("object store"),
        );
        let invoices = Arc::new(MemoryInvoiceStore::new());
        let submitter = Arc::new(FakeSubmitter::new());
        let bridges = Arc::new(FakeBroadcaster::new());

        let config = ServiceConfig {
            hosting_domain: "https://files.example.net".to_string(),
            admin_token: ADMIN_TOKEN.to_string(),
            min_retention_minutes: 30,
            publisher: PublisherConfig {
                signing_key_hex: Some(SIGNING_KEY_HEX.to_string()),
                signing_key_path: None,
            },
            ..ServiceConfig::default()
        };

        let service = Arc::new(
            HostService::new(
                config,
                Arc::clone(&objects) as Arc<dyn ObjectStore>,
                Arc::clone(&invoices) as Arc<dyn InvoiceStore>,
                Arc::clone(&submitter) as Arc<dyn LedgerSubmitter>,
                Arc::clone(&bridges) as Arc<dyn Broadcaster>,
                Arc::new(RawTxVerifier::new()),
            )
            .expect("service"),
        );

        Self {
            service,
            objects,
            invoices,
            submitter,
            bridges,
            _temp: temp,
        }
    }

    async fn quote(&self, file_size: i64, retention: i64) -> hostcast::api::QuoteResponse {
        self.service
            .handle_quote(QuoteRequest {
                file_size: Some(file_size.into()),
                retention_period: Some(retention.into()),
            })
            .await
            .expect("quote should succeed")
    }

    fn upload_request(reference: &str, bytes: &[u8]) -> DirectUploadRequest {
        DirectUploadRequest {
            file: Some(Bytes::copy_from_slice(bytes)),
            reference_number: Some(reference.to_string()),
            transaction_hex: Some("ab".repeat(120)),
        }
    }

    fn object_identifier(public_url: &str) -> String {
        public_url.rsplit('/').next().expect("nonempty").to_string()
    }
}

fn epoch_ms(time: SystemTime) -> u64 {
    u64::try_from(time.duration_since(UNIX_EPOCH).expect("epoch").as_millis()).expect("range")
}

#[tokio::test]
async fn quote_succeeds_with_upload_slot() {
    let harness = Harness::setup().await;

    let response = harness.quote(1000, 60).await;
    assert_eq!(response.status, "success");
    // Default pricing: base 546 + one size unit x one time unit x rate 5.
    assert_eq!(response.amount, 551);
    assert!(response.upload_url.starts_with("file://"));
    assert!(response
        .public_url
        .starts_with("https://files.example.net/cdn/"));
    assert!(!response.reference_number.is_empty());

    let (invoice, file) = harness
        .invoices
        .find(&response.reference_number)
        .expect("invoice persisted");
    assert_eq!(invoice.state, InvoiceState::Unpaid);
    assert_eq!(file.declared_size, 1000);
}

#[tokio::test]
async fn quote_rejects_negative_size() {
    let harness = Harness::setup().await;
    let error = harness
        .service
        .handle_quote(QuoteRequest {
            file_size: Some((-5i64).into()),
            retention_period: Some(60i64.into()),
        })
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::InvalidSize);
    assert_eq!(error.code.http_status(), 400);
}

#[tokio::test]
async fn quote_rejects_non_integer_size() {
    let harness = Harness::setup().await;
    let error = harness
        .service
        .handle_quote(QuoteRequest {
            file_size: serde_json::Number::from_f64(3.5),
            retention_period: Some(60i64.into()),
        })
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::InvalidSize);
}

#[tokio::test]
async fn quote_rejects_oversized_file() {
    let harness = Harness::setup().await;
    let error = harness
        .service
        .handle_quote(QuoteRequest {
            file_size: Some(11_000_000_001i64.into()),
            retention_period: Some(60i64.into()),
        })
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::InvalidSize);
}

#[tokio::test]
async fn quote_rejects_missing_retention() {
    let harness = Harness::setup().await;
    let error = harness
        .service
        .handle_quote(QuoteRequest {
            file_size: Some(1000i64.into()),
            retention_period: None,
        })
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::NoRetentionPeriod);
    assert_eq!(error.code.http_status(), 400);
}

#[tokio::test]
async fn retention_floor_is_exact() {
    let harness = Harness::setup().await;

    for below in [1i64, 15, 29] {
        let error = harness
            .service
            .handle_quote(QuoteRequest {
                file_size: Some(1000i64.into()),
                retention_period: Some(below.into()),
            })
            .await
            .expect_err("below the floor must fail");
        assert_eq!(error.code, ErrorCode::InvalidRetentionPeriod);
    }

    // Accepted exactly at the floor and above it.
    harness.quote(1000, 30).await;
    harness.quote(1000, 31).await;
}

#[tokio::test]
async fn upload_rejects_missing_fields() {
    let harness = Harness::setup().await;

    let error = harness
        .service
        .handle_direct_upload(DirectUploadRequest::default())
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::FileMissing);

    let error = harness
        .service
        .handle_direct_upload(DirectUploadRequest {
            file: Some(Bytes::from_static(b"data")),
            ..DirectUploadRequest::default()
        })
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::NoRef);

    let error = harness
        .service
        .handle_direct_upload(DirectUploadRequest {
            file: Some(Bytes::from_static(b"data")),
            reference_number: Some("abc".to_string()),
            transaction_hex: None,
        })
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::NoTx);
}

#[tokio::test]
async fn upload_rejects_unknown_reference() {
    let harness = Harness::setup().await;
    let error = harness
        .service
        .handle_direct_upload(Harness::upload_request("abc", b"data"))
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::BadRef);
    assert_eq!(harness.submitter.submissions(), 0);
}

#[tokio::test]
async fn upload_rejects_size_mismatch_and_preserves_invoice() {
    let harness = Harness::setup().await;
    let quote = harness.quote(500, 60).await;

    let error = harness
        .service
        .handle_direct_upload(Harness::upload_request(
            &quote.reference_number,
            &vec![0u8; 400],
        ))
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::SizeMismatch);
    assert_eq!(harness.submitter.submissions(), 0);

    // The invoice survives unpaid and the correct upload still redeems it.
    let (invoice, _) = harness.invoices.find(&quote.reference_number).expect("invoice");
    assert_eq!(invoice.state, InvoiceState::Unpaid);

    let response = harness
        .service
        .handle_direct_upload(Harness::upload_request(
            &quote.reference_number,
            &vec![0u8; 500],
        ))
        .await
        .expect("correct size succeeds");
    assert!(response.published);
}

#[tokio::test]
async fn upload_rejects_invalid_payment() {
    let harness = Harness::setup().await;
    let quote = harness.quote(4, 60).await;

    let error = harness
        .service
        .handle_direct_upload(DirectUploadRequest {
            file: Some(Bytes::from_static(b"data")),
            reference_number: Some(quote.reference_number.clone()),
            transaction_hex: Some("not hex at all".to_string()),
        })
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::PaymentInvalid);

    let (invoice, _) = harness.invoices.find(&quote.reference_number).expect("invoice");
    assert_eq!(invoice.state, InvoiceState::Unpaid);
}

#[tokio::test]
async fn successful_upload_publishes_and_fulfills() {
    let harness = Harness::setup().await;
    let content = b"the hosted file bytes";
    let quote = harness.quote(content.len() as i64, 60).await;

    let response = harness
        .service
        .handle_direct_upload(Harness::upload_request(&quote.reference_number, content))
        .await
        .expect("upload succeeds");

    assert!(response.published);
    assert_eq!(response.public_url, quote.public_url);
    assert_eq!(response.hash, ContentId::of(content).to_url());

    // The bytes are stored under the hosting prefix.
    let object_identifier = Harness::object_identifier(&quote.public_url);
    let object_name = format!("cdn/{object_identifier}");
    assert!(harness.objects.exists(&object_name).await);

    // Exactly one ledger submission, mirrored to the bridges.
    assert_eq!(harness.submitter.submissions(), 1);
    assert_eq!(harness.bridges.announced.lock().as_slice(), ["broadcast-1"]);

    // The record binds the identifier, URL and length together.
    let record = harness.submitter.submitted.lock()[0].clone();
    assert_eq!(record.content_id, ContentId::of(content));
    assert_eq!(record.retrieval_url, quote.public_url);
    assert_eq!(record.content_length, content.len() as u64);

    // The invoice is paid with both transactions recorded.
    let (invoice, _) = harness.invoices.find(&quote.reference_number).expect("invoice");
    assert!(invoice.is_paid());
    assert!(invoice.payment_txid.is_some());
    assert_eq!(invoice.advertisement_txid.as_deref(), Some("broadcast-1"));
}

#[tokio::test]
async fn consumed_reference_cannot_be_redeemed_twice() {
    let harness = Harness::setup().await;
    let content = b"upload once";
    let quote = harness.quote(content.len() as i64, 60).await;

    harness
        .service
        .handle_direct_upload(Harness::upload_request(&quote.reference_number, content))
        .await
        .expect("first upload succeeds");

    let error = harness
        .service
        .handle_direct_upload(Harness::upload_request(&quote.reference_number, content))
        .await
        .expect_err("second redemption must fail");
    assert_eq!(error.code, ErrorCode::BadRef);

    // No duplicate advertisement, no double paid transition.
    assert_eq!(harness.submitter.submissions(), 1);
}

#[tokio::test]
async fn advertised_expiry_bounds_storage_expiry() {
    let harness = Harness::setup().await;
    let content = b"expiring bytes";
    let retention_minutes = 60u64;
    let quote = harness.quote(content.len() as i64, retention_minutes as i64).await;

    let before = SystemTime::now();
    harness
        .service
        .handle_direct_upload(Harness::upload_request(&quote.reference_number, content))
        .await
        .expect("upload succeeds");
    let after = SystemTime::now();

    let object_name = format!("cdn/{}", Harness::object_identifier(&quote.public_url));
    let marker = harness
        .objects
        .expiry(&object_name)
        .await
        .expect("expiry readable")
        .expect("marker set");

    // Marker is at least the advertised window plus the 300 s margin.
    let window_ms = retention_minutes * 60_000 + 300_000;
    assert!(epoch_ms(marker) >= epoch_ms(before) + window_ms);
    assert!(epoch_ms(marker) <= epoch_ms(after) + window_ms);
}

#[tokio::test]
async fn bridge_failure_does_not_fail_the_upload() {
    let harness = Harness::setup().await;
    harness.bridges.fail.store(true, Ordering::SeqCst);

    let content = b"mirrored anyway";
    let quote = harness.quote(content.len() as i64, 60).await;
    let response = harness
        .service
        .handle_direct_upload(Harness::upload_request(&quote.reference_number, content))
        .await
        .expect("ledger success is enough");
    assert!(response.published);
    assert_eq!(harness.submitter.submissions(), 1);
}

#[tokio::test]
async fn ledger_failure_releases_the_invoice_for_retry() {
    let harness = Harness::setup().await;
    harness.submitter.fail.store(true, Ordering::SeqCst);

    let content = b"retry me";
    let quote = harness.quote(content.len() as i64, 60).await;
    let error = harness
        .service
        .handle_direct_upload(Harness::upload_request(&quote.reference_number, content))
        .await
        .expect_err("ledger failure fails the upload");
    assert_eq!(error.code, ErrorCode::Internal);
    assert_eq!(error.code.http_status(), 500);

    // Nothing was published and the invoice is redeemable again.
    let (invoice, _) = harness.invoices.find(&quote.reference_number).expect("invoice");
    assert_eq!(invoice.state, InvoiceState::Unpaid);

    harness.submitter.fail.store(false, Ordering::SeqCst);
    let response = harness
        .service
        .handle_direct_upload(Harness::upload_request(&quote.reference_number, content))
        .await
        .expect("retry succeeds once the ledger recovers");
    assert!(response.published);
}

#[tokio::test]
async fn advertise_rejects_bad_admin_token() {
    let harness = Harness::setup().await;
    let error = harness
        .service
        .handle_advertise(AdvertiseRequest {
            admin_token: "wrong-token-entirely".to_string(),
            file_hash: ContentId::of(b"x").to_url(),
            object_identifier: "anything".to_string(),
            file_size: 1,
        })
        .await
        .expect_err("must fail");
    assert_eq!(error.code, ErrorCode::Unauthorized);
    assert_eq!(error.code.http_status(), 401);
    // No ledger submission was attempted.
    assert_eq!(harness.submitter.submissions(), 0);
}

#[tokio::test]
async fn trigger_advertises_objects_under_the_hosting_prefix() {
    let harness = Harness::setup().await;
    let trigger = AdvertisementTrigger::new(
        Arc::clone(&harness.objects) as Arc<dyn ObjectStore>,
        Arc::clone(&harness.service),
    );

    // Reserve a slot, then simulate the client uploading straight to
    // storage with its credential.
    let content = b"uploaded out of band";
    let quote = harness.quote(content.len() as i64, 45).await;
    let object_identifier = Harness::object_identifier(&quote.public_url);
    let object_name = format!("cdn/{object_identifier}");
    harness.objects.put(&object_name, content).await.expect("put");

    let event = ObjectCreated {
        bucket: "hostcast".to_string(),
        name: object_name.clone(),
        size: content.len() as u64,
        metageneration: 1,
        time_created: String::new(),
        updated: String::new(),
        event_id: "ev-1".to_string(),
    };
    let published = trigger
        .handle_object_created(&event)
        .await
        .expect("trigger succeeds")
        .expect("object matched the prefix");
    assert_eq!(published, ContentId::of(content).to_url());

    // The advertisement went out and was recorded against the invoice.
    assert_eq!(harness.submitter.submissions(), 1);
    let (invoice, _) = harness.invoices.find(&quote.reference_number).expect("invoice");
    assert_eq!(invoice.advertisement_txid.as_deref(), Some("broadcast-1"));

    // The storage marker covers the advertised window.
    let marker = harness
        .objects
        .expiry(&object_name)
        .await
        .expect("readable")
        .expect("marker set");
    assert!(marker > SystemTime::now() + Duration::from_secs(45 * 60));
}

#[tokio::test]
async fn trigger_ignores_objects_outside_the_prefix() {
    let harness = Harness::setup().await;
    let trigger = AdvertisementTrigger::new(
        Arc::clone(&harness.objects) as Arc<dyn ObjectStore>,
        Arc::clone(&harness.service),
    );

    let event = ObjectCreated {
        bucket: "hostcast".to_string(),
        name: "static/logo.png".to_string(),
        size: 10,
        metageneration: 1,
        time_created: String::new(),
        updated: String::new(),
        event_id: "ev-2".to_string(),
    };
    let outcome = trigger.handle_object_created(&event).await.expect("no-op");
    assert!(outcome.is_none());
    assert_eq!(harness.submitter.submissions(), 0);
}

#[tokio::test]
async fn trigger_rejects_size_disagreement() {
    let harness = Harness::setup().await;
    let trigger = AdvertisementTrigger::new(
        Arc::clone(&harness.objects) as Arc<dyn ObjectStore>,
        Arc::clone(&harness.service),
    );

    let content = b"short";
    let quote = harness.quote(content.len() as i64, 45).await;
    let object_name = format!("cdn/{}", Harness::object_identifier(&quote.public_url));
    harness.objects.put(&object_name, content).await.expect("put");

    let event = ObjectCreated {
        bucket: "hostcast".to_string(),
        name: object_name,
        size: 9999,
        metageneration: 1,
        time_created: String::new(),
        updated: String::new(),
        event_id: "ev-3".to_string(),
    };
    assert!(trigger.handle_object_created(&event).await.is_err());
    assert_eq!(harness.submitter.submissions(), 0);
}

#[tokio::test]
async fn renewal_supersedes_with_later_expiry() {
    let harness = Harness::setup().await;
    let content = b"renew me";
    let quote = harness.quote(content.len() as i64, 60).await;

    harness
        .service
        .handle_direct_upload(Harness::upload_request(&quote.reference_number, content))
        .await
        .expect("upload succeeds");

    let object_identifier = Harness::object_identifier(&quote.public_url);
    tokio::time::sleep(Duration::from_millis(5)).await;

    // Re-advertise the same object through the admin path.
    harness
        .service
        .handle_advertise(AdvertiseRequest {
            admin_token: ADMIN_TOKEN.to_string(),
            file_hash: ContentId::of(content).to_url(),
            object_identifier: object_identifier.clone(),
            file_size: content.len() as u64,
        })
        .await
        .expect("renewal succeeds");

    let submitted = harness.submitter.submitted.lock();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].content_id, submitted[1].content_id);
    assert!(submitted[1].expiry_ms > submitted[0].expiry_ms);

    let (invoice, _) = harness.invoices.find(&quote.reference_number).expect("invoice");
    assert_eq!(invoice.advertisement_txid.as_deref(), Some("broadcast-2"));
}
