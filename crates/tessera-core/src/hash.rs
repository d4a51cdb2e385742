//! Stable content hashing for block values.
//!
//! Hashes depend only on the encoded bytes of a value, never on the block
//! encoding that holds them, so a dictionary-encoded value and its plain
//! counterpart land in the same hash bucket.

use blake3::Hasher;

/// Hash reported for a null position.
pub const NULL_HASH: u64 = 0;

/// 64-bit value hash used by joins and aggregations: the first eight bytes
/// of the blake3 digest, little-endian.
pub fn value_hash(bytes: &[u8]) -> u64 {
    let mut h = Hasher::new();
    h.update(bytes);
    let digest = h.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}
