//! Invoice persistence with atomic claim semantics.
//!
//! Two concurrent uploads must never both consume one invoice, so the
//! find-unpaid-then-mark step is a single guarded transition behind the
//! store's lock rather than separate read and write calls. No store method
//! holds the lock across an await point; claimed invoices are returned by
//! value so broadcast calls run lock-free.

use crate::error::{Error, Result};
use crate::invoice::{FileRecord, Invoice, InvoiceState};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Outcome of an atomic claim attempt.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// The invoice was unpaid and is now claimed by this caller.
    Claimed(Invoice),
    /// No invoice exists under the given reference.
    NotFound,
    /// The invoice was already claimed or fulfilled.
    AlreadyClaimed,
}

/// Store of invoices and their file records.
///
/// Implementations must make [`claim`] atomic with respect to concurrent
/// callers: exactly one claim on an unpaid invoice succeeds.
///
/// [`claim`]: InvoiceStore::claim
pub trait InvoiceStore: Send + Sync {
    /// Persist a freshly minted unpaid invoice and its file record.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference or object identifier collides with
    /// an existing record.
    fn create(&self, invoice: Invoice, file: FileRecord) -> Result<()>;

    /// Look up an invoice and its file record by reference number.
    fn find(&self, reference: &str) -> Option<(Invoice, FileRecord)>;

    /// Look up an invoice and its file record by object identifier.
    fn find_by_object(&self, object_identifier: &str) -> Option<(Invoice, FileRecord)>;

    /// Atomically claim an unpaid invoice for an in-flight upload.
    fn claim(&self, reference: &str) -> ClaimOutcome;

    /// Return a claimed invoice to the unpaid state.
    ///
    /// Used when an upload fails after the claim but before fulfillment, so
    /// the client can retry; a no-op for unknown or paid invoices.
    fn release(&self, reference: &str);

    /// Mark a claimed invoice paid, recording the payment transaction and
    /// the advertisement broadcast id.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is unknown or not currently claimed.
    fn fulfill(&self, reference: &str, payment_txid: &str, advertisement_txid: &str) -> Result<()>;

    /// Record the broadcast id of a (re-)advertisement for an object.
    ///
    /// # Errors
    ///
    /// Returns an error if no invoice exists for the object identifier.
    fn record_advertisement(&self, object_identifier: &str, advertisement_txid: &str)
        -> Result<()>;
}

#[derive(Debug)]
struct Entry {
    invoice: Invoice,
    file: FileRecord,
}

/// In-memory invoice store.
///
/// The single source of truth for invoice state within one service
/// process. All transitions happen under one write lock, which is never
/// held across an await point.
#[derive(Debug, Default)]
pub struct MemoryInvoiceStore {
    entries: RwLock<HashMap<String, Entry>>,
    by_object: RwLock<HashMap<String, String>>,
}

impl MemoryInvoiceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of invoices currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl InvoiceStore for MemoryInvoiceStore {
    fn create(&self, invoice: Invoice, file: FileRecord) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.contains_key(&invoice.reference_number) {
            return Err(Error::Invoice(format!(
                "reference collision: {}",
                invoice.reference_number
            )));
        }
        let mut by_object = self.by_object.write();
        if by_object.contains_key(&file.object_identifier) {
            return Err(Error::Invoice(format!(
                "object identifier collision: {}",
                file.object_identifier
            )));
        }

        debug!(
            "Created unpaid invoice {} for object {} ({} bytes, {} min)",
            invoice.reference_number, file.object_identifier, file.declared_size,
            invoice.retention_minutes
        );

        by_object.insert(
            file.object_identifier.clone(),
            invoice.reference_number.clone(),
        );
        entries.insert(invoice.reference_number.clone(), Entry { invoice, file });
        Ok(())
    }

    fn find(&self, reference: &str) -> Option<(Invoice, FileRecord)> {
        self.entries
            .read()
            .get(reference)
            .map(|entry| (entry.invoice.clone(), entry.file.clone()))
    }

    fn find_by_object(&self, object_identifier: &str) -> Option<(Invoice, FileRecord)> {
        let reference = self.by_object.read().get(object_identifier)?.clone();
        self.find(&reference)
    }

    fn claim(&self, reference: &str) -> ClaimOutcome {
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(reference) else {
            return ClaimOutcome::NotFound;
        };
        match entry.invoice.state {
            InvoiceState::Unpaid => {
                entry.invoice.state = InvoiceState::Claimed;
                debug!("Claimed invoice {reference}");
                ClaimOutcome::Claimed(entry.invoice.clone())
            }
            InvoiceState::Claimed | InvoiceState::Paid => ClaimOutcome::AlreadyClaimed,
        }
    }

    fn release(&self, reference: &str) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(reference) {
            if entry.invoice.state == InvoiceState::Claimed {
                entry.invoice.state = InvoiceState::Unpaid;
                debug!("Released claim on invoice {reference}");
            }
        }
    }

    fn fulfill(&self, reference: &str, payment_txid: &str, advertisement_txid: &str) -> Result<()> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(reference)
            .ok_or_else(|| Error::Invoice(format!("unknown reference: {reference}")))?;
        if entry.invoice.state != InvoiceState::Claimed {
            return Err(Error::Invoice(format!(
                "invoice {reference} is not claimed (state: {:?})",
                entry.invoice.state
            )));
        }
        entry.invoice.state = InvoiceState::Paid;
        entry.invoice.payment_txid = Some(payment_txid.to_string());
        entry.invoice.advertisement_txid = Some(advertisement_txid.to_string());
        debug!("Fulfilled invoice {reference} (payment {payment_txid})");
        Ok(())
    }

    fn record_advertisement(
        &self,
        object_identifier: &str,
        advertisement_txid: &str,
    ) -> Result<()> {
        let reference = self
            .by_object
            .read()
            .get(object_identifier)
            .cloned()
            .ok_or_else(|| Error::Invoice(format!("unknown object: {object_identifier}")))?;
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&reference)
            .ok_or_else(|| Error::Invoice(format!("unknown reference: {reference}")))?;
        entry.invoice.advertisement_txid = Some(advertisement_txid.to_string());
        Ok(())
    }
}
