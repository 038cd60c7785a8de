//! Publisher signing key and address derivation.
//!
//! The service holds one long-lived secp256k1 key. Its ledger address is
//! derived deterministically from the compressed public key and appears as
//! the second field of every advertisement; the wallet collaborator uses
//! the same key material to sign the assembled transaction.

use crate::config::PublisherConfig;
use crate::error::{Error, Result};
use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey};
use sha2::{Digest, Sha256};

/// Version byte of the publisher address encoding.
const ADDRESS_VERSION: u8 = 0x00;

/// The service's long-lived publisher key.
pub struct PublisherKey {
    signing_key: SigningKey,
    address: String,
}

impl PublisherKey {
    /// Load the key from configuration.
    ///
    /// Prefers the inline hex key; falls back to the key file.
    ///
    /// # Errors
    ///
    /// Returns an error if no key source is configured or the material is
    /// not a valid 32-byte secp256k1 secret.
    pub fn from_config(config: &PublisherConfig) -> Result<Self> {
        if let Some(hex_key) = &config.signing_key_hex {
            return Self::from_hex(hex_key);
        }
        if let Some(path) = &config.signing_key_path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Key(format!("failed to read key file: {e}")))?;
            return Self::from_hex(content.trim());
        }
        Err(Error::Key("no signing key configured".to_string()))
    }

    /// Parse a hex-encoded 32-byte secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex is malformed or not a valid scalar.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key)
            .map_err(|e| Error::Key(format!("invalid key hex: {e}")))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| Error::Key(format!("invalid secret key: {e}")))?;
        let address = derive_address(&signing_key);
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let address = derive_address(&signing_key);
        Self {
            signing_key,
            address,
        }
    }

    /// The publisher's ledger address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Sign a message, returning a DER-encoded ECDSA signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_der().as_bytes().to_vec()
    }

    /// Hex encoding of the secret key, for key files.
    #[must_use]
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}

impl std::fmt::Debug for PublisherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material through Debug.
        f.debug_struct("PublisherKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derive the ledger address from a signing key.
///
/// Base58Check over a version byte and the first 20 bytes of
/// `SHA-256(compressed public key)`.
fn derive_address(signing_key: &SigningKey) -> String {
    let public = signing_key.verifying_key().to_sec1_bytes();
    let digest = Sha256::digest(&public);
    let mut payload = [0u8; 21];
    payload[0] = ADDRESS_VERSION;
    payload[1..].copy_from_slice(&digest[..20]);
    bs58::encode(payload).with_check().into_string()
}
