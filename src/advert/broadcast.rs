//! Ledger submission and bridge fan-out.
//!
//! Publishing is at-least-once: the ledger submission produces the durable
//! broadcast id, and bridge fan-out after it is best-effort. A bridge
//! failure after a successful submission is logged, never surfaced as a
//! publish failure, and a retried fan-out is idempotent because bridges
//! key on the broadcast id.

use crate::advert::AdvertisementRecord;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Durable reference to a ledger submission.
pub type BroadcastId = String;

/// Ledger collaborator: funds, signs and assembles the low-level
/// transaction carrying the record's wire fields, then submits it.
#[async_trait]
pub trait LedgerSubmitter: Send + Sync {
    /// Submit the record to the ledger network.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be assembled or
    /// submitted; in that case nothing was durably published.
    async fn submit(&self, record: &AdvertisementRecord) -> Result<BroadcastId>;
}

/// Mirror collaborator: fans a finished broadcast out to auxiliary lookup
/// services.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Announce an already-submitted broadcast to the bridges.
    ///
    /// # Errors
    ///
    /// Returns an error only if no bridge could be reached; callers treat
    /// this as non-fatal.
    async fn announce(&self, broadcast_id: &str, record: &AdvertisementRecord) -> Result<()>;
}

/// Publishes advertisement records through the ledger and bridges.
pub struct BroadcastClient {
    submitter: Arc<dyn LedgerSubmitter>,
    bridges: Arc<dyn Broadcaster>,
    submit_timeout: Duration,
}

impl BroadcastClient {
    /// Create a broadcast client.
    #[must_use]
    pub fn new(
        submitter: Arc<dyn LedgerSubmitter>,
        bridges: Arc<dyn Broadcaster>,
        submit_timeout: Duration,
    ) -> Self {
        Self {
            submitter,
            bridges,
            submit_timeout,
        }
    }

    /// Publish a record: ledger submission, then bridge fan-out.
    ///
    /// # Errors
    ///
    /// Returns an error only if the ledger submission itself fails or
    /// times out. Bridge failures are logged and swallowed: once the
    /// ledger has the record, the publish succeeded.
    pub async fn publish(&self, record: &AdvertisementRecord) -> Result<BroadcastId> {
        let broadcast_id = tokio::time::timeout(self.submit_timeout, self.submitter.submit(record))
            .await
            .map_err(|_| {
                Error::Broadcast(format!(
                    "ledger submission timed out after {}s",
                    self.submit_timeout.as_secs()
                ))
            })??;

        info!(
            "Published advertisement for {} (broadcast {broadcast_id})",
            record.content_id.to_url()
        );

        if let Err(e) = self.bridges.announce(&broadcast_id, record).await {
            warn!("Bridge fan-out failed for broadcast {broadcast_id}: {e}");
        }

        Ok(broadcast_id)
    }
}

/// Wire request the wallet collaborator accepts.
#[derive(Debug, Serialize)]
struct WalletRequest {
    note: String,
    outputs: Vec<WalletOutput>,
}

/// One requested transaction output.
#[derive(Debug, Serialize)]
struct WalletOutput {
    /// Hex-encoded data fields, in record order.
    script_fields: Vec<String>,
    /// Zero: the advertisement output carries data, not value.
    amount: u64,
}

/// Wallet collaborator response.
#[derive(Debug, Deserialize)]
struct WalletResponse {
    txid: String,
}

/// [`LedgerSubmitter`] backed by an HTTP wallet service.
pub struct WalletSubmitter {
    client: reqwest::Client,
    endpoint: String,
}

impl WalletSubmitter {
    /// Create a submitter against the wallet endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hostcast/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Broadcast(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl LedgerSubmitter for WalletSubmitter {
    async fn submit(&self, record: &AdvertisementRecord) -> Result<BroadcastId> {
        let request = WalletRequest {
            note: "Content availability advertisement".to_string(),
            outputs: vec![WalletOutput {
                script_fields: record.wire_fields().iter().map(hex::encode).collect(),
                amount: 0,
            }],
        };

        let response = self
            .client
            .post(format!("{}/transaction", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Broadcast(format!("wallet submission failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Broadcast(format!(
                "wallet rejected submission: HTTP {}",
                response.status()
            )));
        }

        let body: WalletResponse = response
            .json()
            .await
            .map_err(|e| Error::Broadcast(format!("malformed wallet response: {e}")))?;

        debug!("Wallet assembled transaction {}", body.txid);
        Ok(body.txid)
    }
}

/// Bridge announcement payload.
#[derive(Debug, Serialize)]
struct BridgeAnnouncement<'a> {
    broadcast_id: &'a str,
    record: &'a AdvertisementRecord,
}

/// [`Broadcaster`] that POSTs announcements to each configured bridge.
pub struct HttpBroadcaster {
    client: reqwest::Client,
    bridges: Vec<String>,
}

impl HttpBroadcaster {
    /// Create a fan-out broadcaster over the given bridge endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(bridges: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hostcast/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Broadcast(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, bridges })
    }
}

#[async_trait]
impl Broadcaster for HttpBroadcaster {
    async fn announce(&self, broadcast_id: &str, record: &AdvertisementRecord) -> Result<()> {
        if self.bridges.is_empty() {
            return Ok(());
        }

        let payload = BridgeAnnouncement {
            broadcast_id,
            record,
        };

        let mut reached = 0usize;
        for bridge in &self.bridges {
            let result = self
                .client
                .post(format!("{bridge}/announce"))
                .json(&payload)
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => reached += 1,
                Ok(response) => {
                    warn!("Bridge {bridge} rejected broadcast {broadcast_id}: HTTP {}",
                        response.status());
                }
                Err(e) => {
                    warn!("Bridge {bridge} unreachable for broadcast {broadcast_id}: {e}");
                }
            }
        }

        if reached == 0 {
            return Err(Error::Broadcast(format!(
                "no bridge accepted broadcast {broadcast_id}"
            )));
        }
        debug!("Announced broadcast {broadcast_id} to {reached} bridge(s)");
        Ok(())
    }
}
