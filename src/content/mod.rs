//! Content addressing for hosted objects.
//!
//! An object's identity is the SHA-256 digest of its exact byte sequence,
//! rendered as a versioned Base58Check URL. Two byte-identical files always
//! yield the same identifier regardless of how they were uploaded.

mod hasher;
mod identifier;

pub use hasher::{hash_reader, ContentHasher};
pub use identifier::{ContentId, CONTENT_URL_VERSION};
