//! Invoices and file records.
//!
//! An invoice binds a price quote to a single permitted upload. It is
//! created unpaid at quote time, atomically claimed by at most one upload,
//! and marked paid exactly once. The invoice store is the only shared
//! mutable state in the service and is the source of truth for whether an
//! upload slot has been consumed.

mod store;

pub use store::{ClaimOutcome, InvoiceStore, MemoryInvoiceStore};

use serde::{Deserialize, Serialize};

/// Lifecycle state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    /// Created at quote time; upload slot not yet consumed.
    Unpaid,
    /// Claimed by an in-flight upload; not yet fulfilled.
    Claimed,
    /// Payment recorded and advertisement broadcast; terminal.
    Paid,
}

/// A server-side record binding a price quote to one permitted upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique server-generated reference the client echoes at upload time.
    pub reference_number: String,
    /// Key of the associated [`FileRecord`].
    pub file_id: u64,
    /// Quoted price in ledger units.
    pub quoted_amount: u64,
    /// Object name within the bucket, e.g. `cdn/<identifier>`.
    pub storage_path: String,
    /// Number of minutes of hosting purchased.
    pub retention_minutes: u64,
    /// Transaction id of the recorded payment, once fulfilled.
    pub payment_txid: Option<String>,
    /// Broadcast id of the most recent advertisement for this object.
    pub advertisement_txid: Option<String>,
    /// Current lifecycle state.
    pub state: InvoiceState,
}

impl Invoice {
    /// Whether this invoice has been consumed by a completed upload.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.state == InvoiceState::Paid
    }
}

/// Immutable record of the file an invoice was quoted for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Key linking back to the invoice.
    pub file_id: u64,
    /// Random URL-safe object identifier (128 bits, Base58).
    pub object_identifier: String,
    /// Declared size in bytes; the uploaded byte count must equal this.
    pub declared_size: u64,
}

/// Generate a fresh invoice reference number.
///
/// 12 random bytes rendered as Base58; unique for any realistic invoice
/// volume.
#[must_use]
pub fn generate_reference() -> String {
    let bytes: [u8; 12] = rand::random();
    bs58::encode(bytes).into_string()
}
