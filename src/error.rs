//! Error types for hostcast.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hostcast.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Content identifier encoding or decoding error.
    #[error("content identifier error: {0}")]
    ContentId(String),

    /// Object storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invoice store error.
    #[error("invoice error: {0}")]
    Invoice(String),

    /// Payment verification error.
    #[error("payment error: {0}")]
    Payment(String),

    /// Pricing error.
    #[error("pricing error: {0}")]
    Pricing(String),

    /// Ledger submission or bridge broadcast error.
    #[error("broadcast error: {0}")]
    Broadcast(String),

    /// Signing key error.
    #[error("key error: {0}")]
    Key(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
