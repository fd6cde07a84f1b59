//! Streaming content hashing.
//!
//! One algorithm (SHA-256, lowercase hex) for every digest in the system:
//! evidence content, ledger entry hashes, and transfer signatures all go
//! through `sha2` and `hex` so outputs are comparable across components.
//!
//! Content is read in 8 KiB chunks so arbitrarily large evidence files never
//! have to fit in memory. Hashing is the one CPU/I-O heavy step in the core;
//! callers that need it off the request path can wrap these functions — the
//! ordering contract (hash first, ledger append second) is theirs to keep.

use std::io::Read;

use sha2::{Digest, Sha256};

use custodia_contracts::error::{CustodyError, CustodyResult};

/// Read granularity for streaming digests.
const CHUNK_SIZE: usize = 8192;

/// Digest an entire byte stream.
///
/// Returns the lowercase 64-character hex SHA-256 of everything `reader`
/// yields, or `CustodyError::Hashing` if the stream fails mid-read.
pub fn digest_reader<R: Read + ?Sized>(reader: &mut R) -> CustodyResult<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf).map_err(|e| CustodyError::Hashing {
            reason: format!("failed to read content stream: {e}"),
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Digest an in-memory byte slice.
pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{digest_bytes, digest_reader};

    /// FIPS 180-2 test vector for SHA-256("abc").
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn digest_bytes_matches_known_vector() {
        assert_eq!(digest_bytes(b"abc"), ABC_SHA256);
    }

    #[test]
    fn digest_reader_matches_digest_bytes() {
        let mut cursor = Cursor::new(b"abc".to_vec());
        assert_eq!(digest_reader(&mut cursor).unwrap(), ABC_SHA256);
    }

    /// Chunk boundaries must not affect the digest.
    #[test]
    fn digest_is_chunking_invariant() {
        // Larger than one 8 KiB chunk, not a multiple of the chunk size.
        let data = vec![0xA7u8; 20_000];
        let mut cursor = Cursor::new(data.clone());
        assert_eq!(digest_reader(&mut cursor).unwrap(), digest_bytes(&data));
    }

    #[test]
    fn empty_stream_digests_to_empty_input_hash() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert_eq!(digest_reader(&mut cursor).unwrap(), digest_bytes(b""));
    }
}
