//! Payment verification.
//!
//! Verification is a required gate: an upload is never accepted on the
//! strength of a reference number alone. The trait seam lets deployments
//! plug in a settlement-level verifier (on-chain lookup through the wallet
//! collaborator) while tests substitute fakes.

use crate::error::{Error, Result};
use crate::invoice::Invoice;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Verifies that a submitted payment covers an invoice.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Verify `transaction_hex` as payment for `invoice`.
    ///
    /// Returns the payment transaction id on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is malformed, insufficient, or
    /// not broadcastable; the upload is rejected in that case.
    async fn verify(&self, invoice: &Invoice, transaction_hex: &str) -> Result<String>;
}

/// Minimum plausible size of a serialized payment transaction, in bytes.
const MIN_TX_BYTES: usize = 60;

/// Structural payment verifier.
///
/// Enforces that the submitted payment is a well-formed transaction and
/// derives its id (double SHA-256 of the raw bytes, reversed, hex).
/// Whether the transaction's outputs actually settle the quoted amount is
/// checked by the wallet collaborator when the deployment wires in a
/// settlement-aware implementation of [`PaymentVerifier`]; this one is the
/// floor every deployment gets.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTxVerifier;

impl RawTxVerifier {
    /// Create a structural verifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentVerifier for RawTxVerifier {
    async fn verify(&self, invoice: &Invoice, transaction_hex: &str) -> Result<String> {
        let raw = hex::decode(transaction_hex)
            .map_err(|e| Error::Payment(format!("payment is not valid hex: {e}")))?;
        if raw.len() < MIN_TX_BYTES {
            return Err(Error::Payment(format!(
                "payment transaction too small: {} bytes",
                raw.len()
            )));
        }

        let txid = txid_of(&raw);
        debug!(
            "Structurally verified payment {txid} for invoice {} ({} units quoted)",
            invoice.reference_number, invoice.quoted_amount
        );
        Ok(txid)
    }
}

/// Transaction id: double SHA-256 of the raw bytes, byte-reversed, hex.
fn txid_of(raw: &[u8]) -> String {
    let first = Sha256::digest(raw);
    let second = Sha256::digest(first);
    let mut bytes: Vec<u8> = second.to_vec();
    bytes.reverse();
    hex::encode(bytes)
}
