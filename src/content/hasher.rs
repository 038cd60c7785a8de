//! Streaming content hashing.
//!
//! Objects can be multiple gigabytes; the hasher consumes a stream in
//! fixed-size chunks and never buffers the whole object. The digest is only
//! observable after the stream is fully consumed: a read error aborts the
//! pipeline with no partial identifier.

use crate::content::ContentId;
use crate::error::Result;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read buffer size for streaming hashing.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Incremental content hasher.
///
/// Feeding the same byte sequence always produces the same identifier;
/// the hasher itself is single-use and is consumed by [`finish`].
///
/// [`finish`]: ContentHasher::finish
pub struct ContentHasher {
    digest: Sha256,
    bytes_hashed: u64,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher {
    /// Create a fresh hasher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            digest: Sha256::new(),
            bytes_hashed: 0,
        }
    }

    /// Feed a chunk of bytes.
    pub fn update(&mut self, chunk: &[u8]) {
        self.digest.update(chunk);
        self.bytes_hashed += chunk.len() as u64;
    }

    /// Number of bytes fed so far.
    #[must_use]
    pub const fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }

    /// Consume the hasher, returning the identifier and the byte count.
    #[must_use]
    pub fn finish(self) -> (ContentId, u64) {
        let result = self.digest.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&result);
        (ContentId::from_digest(bytes), self.bytes_hashed)
    }
}

/// Hash an async byte stream to completion.
///
/// Returns the content identifier and the total number of bytes read, only
/// after the reader reports end-of-stream.
///
/// # Errors
///
/// Returns an error if any read fails; no identifier is produced in that
/// case.
pub async fn hash_reader<R>(mut reader: R) -> Result<(ContentId, u64)>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = ContentHasher::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    #[test]
    fn test_incremental_matches_one_shot() {
        let content = b"chunked content, hashed in pieces";
        let mut hasher = ContentHasher::new();
        for chunk in content.chunks(7) {
            hasher.update(chunk);
        }
        let (id, count) = hasher.finish();
        assert_eq!(id, ContentId::of(content));
        assert_eq!(count, content.len() as u64);
    }

    #[tokio::test]
    async fn test_hash_reader_matches_one_shot() {
        let content = vec![0x5A; 300 * 1024];
        let (id, count) = hash_reader(content.as_slice()).await.expect("hash");
        assert_eq!(id, ContentId::of(&content));
        assert_eq!(count, content.len() as u64);
    }

    #[tokio::test]
    async fn test_hash_reader_empty() {
        let (id, count) = hash_reader(&[][..]).await.expect("hash");
        assert_eq!(id, ContentId::of(b""));
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_hash_reader_repeatable() {
        let content = b"restartable stream";
        let (first, _) = hash_reader(&content[..]).await.expect("first");
        let (second, _) = hash_reader(&content[..]).await.expect("second");
        assert_eq!(first, second);
    }

    /// Reader that yields some bytes and then fails.
    struct FailingReader {
        remaining: usize,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.remaining == 0 {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "stream broke",
                )));
            }
            let n = self.remaining.min(buf.remaining());
            buf.put_slice(&vec![1u8; n]);
            self.remaining = 0;
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_read_error_aborts_without_identifier() {
        let reader = FailingReader { remaining: 16 };
        let result = hash_reader(reader).await;
        assert!(result.is_err());
    }
}
