//! Request and response shapes of the service surface.
//!
//! The HTTP framework itself is an external collaborator; these are the
//! typed bodies it moves. Every failure is rendered as the structured
//! error shape — `{status: "error", code, description}` plus an HTTP
//! status class — so no raw error ever escapes to the wire.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Quote-phase request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Declared file size in bytes. Kept as a raw JSON number so that
    /// non-integer values are rejected with the proper code rather than a
    /// deserialization failure.
    #[serde(default)]
    pub file_size: Option<serde_json::Number>,
    /// Requested hosting window in minutes.
    #[serde(default)]
    pub retention_period: Option<serde_json::Number>,
}

/// Quote-phase success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    /// Always `"success"`.
    pub status: String,
    /// Where to upload the bytes, valid for a bounded window.
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
    /// Where the content will be retrievable once advertised.
    #[serde(rename = "publicURL")]
    pub public_url: String,
    /// Reference to echo when redeeming the slot.
    pub reference_number: String,
    /// Quoted price in ledger units.
    pub amount: u64,
    /// Human-readable summary.
    pub description: String,
}

/// Direct-upload request: multipart file bytes plus form fields.
#[derive(Debug, Clone, Default)]
pub struct DirectUploadRequest {
    /// The uploaded file bytes.
    pub file: Option<Bytes>,
    /// Invoice reference from the quote phase.
    pub reference_number: Option<String>,
    /// Signed, broadcast-ready payment transaction, hex-encoded.
    pub transaction_hex: Option<String>,
}

/// Direct-upload success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectUploadResponse {
    /// Live public retrieval URL.
    #[serde(rename = "publicURL")]
    pub public_url: String,
    /// Canonical content identifier URL.
    pub hash: String,
    /// Always true on success.
    pub published: bool,
}

/// Admin advertise request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertiseRequest {
    /// Shared admin secret.
    pub admin_token: String,
    /// Canonical content identifier URL of the object.
    pub file_hash: String,
    /// Object identifier within the hosting prefix.
    pub object_identifier: String,
    /// Size of the object in bytes.
    pub file_size: u64,
}

/// Admin advertise success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertiseResponse {
    /// Always `"success"`.
    pub status: String,
}

/// Machine-readable error codes of the service surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// File size missing, non-integer, non-positive, or over the cap.
    #[serde(rename = "ERR_INVALID_SIZE")]
    InvalidSize,
    /// No retention period supplied.
    #[serde(rename = "ERR_NO_RETENTION_PERIOD")]
    NoRetentionPeriod,
    /// Retention period below the configured floor or not an integer.
    #[serde(rename = "ERR_INVALID_RETENTION_PERIOD")]
    InvalidRetentionPeriod,
    /// Internal failure while authorizing an upload.
    #[serde(rename = "ERR_INTERNAL_UPLOAD")]
    InternalUpload,
    /// No file bytes in the upload.
    #[serde(rename = "ERR_FILE_MISSING")]
    FileMissing,
    /// No reference number in the upload.
    #[serde(rename = "ERR_NO_REF")]
    NoRef,
    /// No payment transaction in the upload.
    #[serde(rename = "ERR_NO_TX")]
    NoTx,
    /// Unknown or already fulfilled reference number.
    #[serde(rename = "ERR_BAD_REF")]
    BadRef,
    /// Uploaded byte count differs from the invoiced size.
    #[serde(rename = "ERR_SIZE_MISMATCH")]
    SizeMismatch,
    /// The payment transaction did not verify.
    #[serde(rename = "ERR_PAYMENT_INVALID")]
    PaymentInvalid,
    /// Admin token mismatch.
    #[serde(rename = "ERR_UNAUTHORIZED")]
    Unauthorized,
    /// Internal failure; details are logged, not exposed.
    #[serde(rename = "ERR_INTERNAL")]
    Internal,
}

impl ErrorCode {
    /// The wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidSize => "ERR_INVALID_SIZE",
            Self::NoRetentionPeriod => "ERR_NO_RETENTION_PERIOD",
            Self::InvalidRetentionPeriod => "ERR_INVALID_RETENTION_PERIOD",
            Self::InternalUpload => "ERR_INTERNAL_UPLOAD",
            Self::FileMissing => "ERR_FILE_MISSING",
            Self::NoRef => "ERR_NO_REF",
            Self::NoTx => "ERR_NO_TX",
            Self::BadRef => "ERR_BAD_REF",
            Self::SizeMismatch => "ERR_SIZE_MISMATCH",
            Self::PaymentInvalid => "ERR_PAYMENT_INVALID",
            Self::Unauthorized => "ERR_UNAUTHORIZED",
            Self::Internal => "ERR_INTERNAL",
        }
    }

    /// The HTTP status the embedding framework should respond with.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::InternalUpload | Self::Internal => 500,
            _ => 400,
        }
    }
}

/// A handler-level failure in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable description; internal details never appear here.
    pub description: String,
}

impl ApiError {
    /// Create an error with the code's canonical description.
    #[must_use]
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// The structured wire body.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            status: "error".to_string(),
            code: self.code.as_str().to_string(),
            description: self.description.clone(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.description)
    }
}

impl std::error::Error for ApiError {}

/// The serialized error shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `"error"`.
    pub status: String,
    /// Machine-readable code.
    pub code: String,
    /// Human-readable description.
    pub description: String,
}
