//! Canonical content identifier and its URL rendering.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Version prefix of the content identifier URL scheme.
///
/// The canonical URL is `Base58Check(CONTENT_URL_VERSION || digest)`; the
/// prefix pins the scheme so future digest changes remain distinguishable.
pub const CONTENT_URL_VERSION: [u8; 2] = [0xce, 0x00];

/// A 32-byte SHA-256 content digest.
///
/// Renders to, and parses from, the canonical advertisement URL. The
/// rendering is a pure function of the digest, so it doubles as a lookup
/// key for byte-identical content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Wrap a raw digest.
    #[must_use]
    pub const fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// Compute the identifier of an in-memory byte sequence.
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// The raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the canonical URL string.
    #[must_use]
    pub fn to_url(&self) -> String {
        let mut payload = [0u8; 34];
        payload[..2].copy_from_slice(&CONTENT_URL_VERSION);
        payload[2..].copy_from_slice(&self.0);
        bs58::encode(payload).with_check().into_string()
    }

    /// Parse a canonical URL string back into the raw digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid Base58Check, carries the
    /// wrong version prefix, or does not contain a 32-byte digest.
    pub fn from_url(url: &str) -> Result<Self> {
        let payload = bs58::decode(url)
            .with_check(None)
            .into_vec()
            .map_err(|e| Error::ContentId(format!("invalid content URL: {e}")))?;
        if payload.len() != 34 {
            return Err(Error::ContentId(format!(
                "invalid content URL payload length: {}",
                payload.len()
            )));
        }
        if payload[..2] != CONTENT_URL_VERSION {
            return Err(Error::ContentId(format!(
                "unsupported content URL version: {}",
                hex::encode(&payload[..2])
            )));
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&payload[2..]);
        Ok(Self(digest))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", hex::encode(self.0))
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_url())
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let url = String::deserialize(deserializer)?;
        Self::from_url(&url).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // Known SHA256 hash of "hello world"
        let id = ContentId::of(b"hello world");
        assert_eq!(
            hex::encode(id.as_bytes()),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_url_round_trip() {
        let id = ContentId::of(b"round trip me");
        let url = id.to_url();
        let parsed = ContentId::from_url(&url).expect("parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_url_is_deterministic() {
        let a = ContentId::of(b"same bytes");
        let b = ContentId::of(b"same bytes");
        assert_eq!(a.to_url(), b.to_url());
    }

    #[test]
    fn test_different_content_different_url() {
        let a = ContentId::of(b"content a");
        let b = ContentId::of(b"content b");
        assert_ne!(a.to_url(), b.to_url());
    }

    #[test]
    fn test_rejects_corrupted_url() {
        let mut url = ContentId::of(b"payload").to_url();
        // Flip the last character to break the checksum
        let last = url.pop().expect("nonempty");
        url.push(if last == '1' { '2' } else { '1' });
        assert!(ContentId::from_url(&url).is_err());
    }

    #[test]
    fn test_rejects_wrong_version() {
        let mut payload = [0u8; 34];
        payload[0] = 0xAB;
        payload[1] = 0xCD;
        let url = bs58::encode(payload).with_check().into_string();
        let result = ContentId::from_url(&url);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("version"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(ContentId::from_url("not a content url").is_err());
        assert!(ContentId::from_url("").is_err());
    }
}
