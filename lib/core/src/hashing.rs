//! Stable 64-bit fingerprints.
//!
//! Everything that must agree across processes and platforms (tie-break
//! jitter, corpus identity in persisted artifacts, memo-cache keys, the
//! hashing embedder's buckets) goes through here. The construction is
//! versioned: SHA-256 over the parts joined by `0x1f`, first eight bytes read
//! little-endian. Changing it invalidates persisted artifacts, so bump
//! [`FINGERPRINT_VERSION`] alongside any change.

use sha2::{Digest, Sha256};

pub const FINGERPRINT_VERSION: u32 = 1;

const PART_SEPARATOR: u8 = 0x1f;

/// Fingerprint an ordered list of string parts.
///
/// `["ab", "c"]` and `["a", "bc"]` hash differently.
pub fn fingerprint64<S: AsRef<str>>(parts: &[S]) -> u64 {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([PART_SEPARATOR]);
        }
        hasher.update(part.as_ref().as_bytes());
    }
    truncate(&hasher.finalize())
}

/// Hex SHA-256 of a byte buffer, used for artifact checksums
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn truncate(digest: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Map a fingerprint into `[0, 1)` using its top 53 bits
#[inline]
pub fn unit_interval(hash: u64) -> f64 {
    (hash >> 11) as f64 / (1u64 << 53) as f64
}
