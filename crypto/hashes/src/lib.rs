mod hashers;

pub use hashers::{hash_twice, hash_twice_concat};

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::str::{self, FromStr};

pub const HASH_SIZE: usize = 32;

/// A 32-byte block hash. The canonical storage form is the "low" variant
/// with its first 8 bytes zeroed, matching the 24-byte effective key space
/// of packed link addresses.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; HASH_SIZE]);

    #[inline]
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// # Panics
    /// Panics if `bytes` length is not exactly `HASH_SIZE`.
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Hash(bytes.try_into().expect("hash slice must be exactly 32 bytes"))
    }

    /// The hash with its first 8 bytes zeroed, used as the canonical
    /// lookup/dedup key everywhere in storage.
    #[inline]
    pub fn low(&self) -> Hash {
        let mut low = self.0;
        low[..8].fill(0);
        Hash(low)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }
}

impl From<Hash> for [u8; HASH_SIZE] {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut hex = [0u8; HASH_SIZE * 2];
        hex::encode_to_slice(self.0, &mut hex).expect("the output is exactly twice the size of the input");
        f.write_str(str::from_utf8(&hex).expect("hex is always valid UTF-8"))
    }
}

impl Debug for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(hash_str: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(hash_str, &mut bytes)?;
        Ok(Hash(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_basics() {
        let hash_str = "8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3af";
        let hash = Hash::from_str(hash_str).unwrap();
        assert_eq!(hash_str, hash.to_string());
        let hash2 = Hash::from_str(hash_str).unwrap();
        assert_eq!(hash, hash2);

        let hash3 = Hash::from_str("8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3ab").unwrap();
        assert_ne!(hash2, hash3);

        let odd_str = "8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3a";
        let short_str = "8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3";

        assert_eq!(Hash::from_str(odd_str), Err(hex::FromHexError::OddLength));
        assert_eq!(Hash::from_str(short_str), Err(hex::FromHexError::InvalidStringLength));
    }

    #[test]
    fn test_hash_low() {
        let hash = Hash::from_str("8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3af").unwrap();
        let low = hash.low();
        assert_eq!(&low.as_bytes()[..8], &[0u8; 8]);
        assert_eq!(&low.as_bytes()[8..], &hash.as_bytes()[8..]);
        assert_eq!(low, low.low());
        assert!(!low.is_zero());
        assert!(Hash::ZERO.is_zero());
    }

    #[test]
    fn test_hash_twice() {
        // sha256(sha256("")) is a fixed, externally checkable vector
        let hash = hash_twice(&[]);
        assert_eq!(hash.to_string(), "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456");

        let concat = hash_twice_concat(b"foo", b"bar");
        assert_eq!(concat, hash_twice(b"foobar"));
    }
}
