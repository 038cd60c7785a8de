//! Configuration for the hostcast service.
//!
//! Every deployment knob lives here as an explicit, immutable value handed
//! to each component at construction: admin shared secret, public hosting
//! domain, retention floor, object size cap, pricing parameters, publisher
//! signing key and broadcast endpoints.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Public domain files are served from (no trailing slash),
    /// e.g. `https://files.example.net`.
    #[serde(default = "default_hosting_domain")]
    pub hosting_domain: String,

    /// Storage bucket name.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Folder prefix within the bucket under which hosted objects live.
    /// Only objects under this prefix are ever advertised.
    #[serde(default = "default_hosting_prefix")]
    pub hosting_prefix: String,

    /// Shared secret for the admin advertise operation.
    ///
    /// Must be longer than [`MIN_ADMIN_TOKEN_LEN`] characters or every
    /// admin request is rejected.
    #[serde(default)]
    pub admin_token: String,

    /// Minimum number of minutes a client must purchase.
    #[serde(default = "default_min_retention_minutes")]
    pub min_retention_minutes: u64,

    /// Hard cap on object size in bytes, checked at quote time.
    #[serde(default = "default_max_object_size")]
    pub max_object_size: u64,

    /// Validity window of an upload write credential, in seconds.
    #[serde(default = "default_upload_credential_ttl")]
    pub upload_credential_ttl_secs: u64,

    /// Seconds added to the advertised expiry when setting the storage
    /// object's garbage-collection marker, so the object can never be
    /// reaped while an advertisement still claims it is retrievable.
    #[serde(default = "default_expiry_safety_margin")]
    pub expiry_safety_margin_secs: u64,

    /// Pricing parameters.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Publisher signing key configuration.
    #[serde(default)]
    pub publisher: PublisherConfig,

    /// Ledger submission and bridge fan-out configuration.
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

/// Minimum admin token length; shorter tokens are treated as unset.
pub const MIN_ADMIN_TOKEN_LEN: usize = 10;

/// Parameters of the deterministic price function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat fee charged on every invoice, in ledger units.
    #[serde(default = "default_base_fee")]
    pub base_fee: u64,

    /// Price per (size unit x time unit), in ledger units.
    #[serde(default = "default_unit_rate")]
    pub unit_rate: u64,

    /// Size unit in bytes; sizes are billed in ceiling units of this.
    #[serde(default = "default_size_unit_bytes")]
    pub size_unit_bytes: u64,

    /// Time unit in minutes; retention is billed in ceiling units of this.
    #[serde(default = "default_time_unit_minutes")]
    pub time_unit_minutes: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fee: default_base_fee(),
            unit_rate: default_unit_rate(),
            size_unit_bytes: default_size_unit_bytes(),
            time_unit_minutes: default_time_unit_minutes(),
        }
    }
}

/// Publisher signing key configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Hex-encoded 32-byte secp256k1 secret key.
    ///
    /// If unset, `signing_key_path` is read instead.
    #[serde(default)]
    pub signing_key_hex: Option<String>,

    /// Path to a file holding the hex-encoded secret key.
    #[serde(default)]
    pub signing_key_path: Option<PathBuf>,
}

/// Ledger submission and bridge fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Endpoint of the wallet collaborator that funds, signs and assembles
    /// the advertisement transaction.
    #[serde(default = "default_wallet_url")]
    pub wallet_url: String,

    /// Bridge endpoints the finished broadcast is mirrored to.
    #[serde(default)]
    pub bridges: Vec<String>,

    /// Timeout applied to every outbound broadcast call, in seconds.
    #[serde(default = "default_broadcast_timeout")]
    pub timeout_secs: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            wallet_url: default_wallet_url(),
            bridges: Vec::new(),
            timeout_secs: default_broadcast_timeout(),
        }
    }
}

fn default_hosting_domain() -> String {
    "http://localhost:8080".to_string()
}

fn default_bucket() -> String {
    "hostcast".to_string()
}

fn default_hosting_prefix() -> String {
    "cdn".to_string()
}

const fn default_min_retention_minutes() -> u64 {
    30
}

const fn default_max_object_size() -> u64 {
    11_000_000_000
}

const fn default_upload_credential_ttl() -> u64 {
    3600
}

const fn default_expiry_safety_margin() -> u64 {
    300
}

const fn default_base_fee() -> u64 {
    546
}

const fn default_unit_rate() -> u64 {
    5
}

const fn default_size_unit_bytes() -> u64 {
    1_000_000
}

const fn default_time_unit_minutes() -> u64 {
    60
}

fn default_wallet_url() -> String {
    "http://localhost:3301".to_string()
}

const fn default_broadcast_timeout() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            hosting_domain: default_hosting_domain(),
            bucket: default_bucket(),
            hosting_prefix: default_hosting_prefix(),
            admin_token: String::new(),
            min_retention_minutes: default_min_retention_minutes(),
            max_object_size: default_max_object_size(),
            upload_credential_ttl_secs: default_upload_credential_ttl(),
            expiry_safety_margin_secs: default_expiry_safety_margin(),
            pricing: PricingConfig::default(),
            publisher: PublisherConfig::default(),
            broadcast: BroadcastConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Object name within the bucket for a given object identifier.
    #[must_use]
    pub fn object_name(&self, object_identifier: &str) -> String {
        format!("{}/{}", self.hosting_prefix, object_identifier)
    }

    /// Public retrieval URL for a given object identifier.
    ///
    /// The URL is deterministic at quote time but only becomes valid once
    /// upload and advertisement complete.
    #[must_use]
    pub fn public_url(&self, object_identifier: &str) -> String {
        format!(
            "{}/{}/{}",
            self.hosting_domain, self.hosting_prefix, object_identifier
        )
    }

    /// Check that the configuration is usable for serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the admin token is too short, the hosting domain
    /// is empty, or no signing key source is configured.
    pub fn validate(&self) -> crate::Result<()> {
        if self.admin_token.len() <= MIN_ADMIN_TOKEN_LEN {
            return Err(crate::Error::Config(format!(
                "admin token must be longer than {MIN_ADMIN_TOKEN_LEN} characters"
            )));
        }
        if self.hosting_domain.is_empty() {
            return Err(crate::Error::Config(
                "hosting domain must be set".to_string(),
            ));
        }
        if self.publisher.signing_key_hex.is_none() && self.publisher.signing_key_path.is_none() {
            return Err(crate::Error::Config(
                "publisher signing key must be configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a development preset with a throwaway admin token.
    ///
    /// Only suitable for local testing.
    #[must_use]
    pub fn development() -> Self {
        Self {
            admin_token: "development-admin-token".to_string(),
            min_retention_minutes: 0,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
