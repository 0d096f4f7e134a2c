//! Stable hashing.
//!
//! Values produced here are persisted (derived-data keys, path ids, asset type keys),
//! so they must not depend on per-process random state. Everything is derived from
//! BLAKE3 and truncated.

/// Hash `bytes` into a stable 64-bit value.
pub fn stable_hash64(bytes: &[u8]) -> u64 {
    let digest = blake3::hash(bytes);
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(out)
}

/// Hash `bytes` into a stable 128-bit value, returned as `(high, low)` halves.
pub fn stable_hash128(bytes: &[u8]) -> (u64, u64) {
    let digest = blake3::hash(bytes);
    let bytes = digest.as_bytes();
    let mut high = [0u8; 8];
    let mut low = [0u8; 8];
    high.copy_from_slice(&bytes[..8]);
    low.copy_from_slice(&bytes[8..16]);
    (u64::from_le_bytes(high), u64::from_le_bytes(low))
}

/// Hash several byte slices as one message, with a separator between parts so
/// that `["ab", "c"]` and `["a", "bc"]` do not collide.
pub fn stable_hash128_parts(parts: &[&[u8]]) -> (u64, u64) {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let bytes = digest.as_bytes();
    let mut high = [0u8; 8];
    let mut low = [0u8; 8];
    high.copy_from_slice(&bytes[..8]);
    low.copy_from_slice(&bytes[8..16]);
    (u64::from_le_bytes(high), u64::from_le_bytes(low))
}
