use crate::Hash;
use sha2::{Digest, Sha256};

/// Double SHA-256, the XDAG block identity function.
#[inline]
pub fn hash_twice(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    Hash::from_bytes(second.into())
}

/// Double SHA-256 over the concatenation of two buffers without allocating
/// the joined message. Used by the signature engine for `data ++ pubkey`
/// digests.
#[inline]
pub fn hash_twice_concat(prefix: &[u8], suffix: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(prefix);
    hasher.update(suffix);
    let first = hasher.finalize();
    let second = Sha256::digest(first);
    Hash::from_bytes(second.into())
}
