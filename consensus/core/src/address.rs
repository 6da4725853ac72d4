use crate::errors::{BlockError, BlockResult};
use crate::field::{Field, FieldType};
use xdag_hashes::Hash;

/// A block link: the referenced block's low hash, a transfer amount and
/// the link's field tag.
///
/// The packed 32-byte form carries only `hash_low[8..32]` (24 bytes) plus
/// the little-endian amount; the first 8 hash bytes are zero by
/// construction of low hashes, so packing is lossless. Unlike the original
/// implementation's lazy parse/pack duality, both views are resolved
/// eagerly: construction from a field unpacks immediately and `to_field`
/// re-packs from the resolved state, so there is no dirty-flag state to
/// race on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    hash_low: Hash,
    amount: u64,
    field_type: FieldType,
}

impl Address {
    /// Unpacks a field slot tagged `field_type` (IN or OUT in practice).
    pub fn from_field(field: &Field, field_type: FieldType) -> Self {
        let mut hash = [0u8; 32];
        hash[8..32].copy_from_slice(&field.0[0..24]);
        let amount = u64::from_le_bytes(field.0[24..32].try_into().expect("amount is exactly 8 bytes"));
        Self { hash_low: Hash::from_bytes(hash), amount, field_type }
    }

    /// A zero-amount output link to a known block, used for pending
    /// outputs and ref/max-diff-link pointers.
    pub fn from_hash_low(hash_low: Hash) -> BlockResult<Self> {
        Self::from_amount(hash_low, FieldType::Out, 0)
    }

    pub fn from_amount(hash_low: Hash, field_type: FieldType, amount: u64) -> BlockResult<Self> {
        if hash_low.is_zero() {
            return Err(BlockError::ZeroHash);
        }
        Ok(Self { hash_low: hash_low.low(), amount, field_type })
    }

    /// Re-packs the 32-byte wire form.
    pub fn to_field(&self) -> Field {
        let mut data = [0u8; 32];
        data[0..24].copy_from_slice(&self.hash_low.as_bytes()[8..32]);
        data[24..32].copy_from_slice(&self.amount.to_le_bytes());
        Field(data)
    }

    #[inline]
    pub fn hash_low(&self) -> Hash {
        self.hash_low
    }

    #[inline]
    pub fn amount(&self) -> u64 {
        self.amount
    }

    #[inline]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Block(A) Hash[{}]", self.hash_low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xdag_hashes::hash_twice;

    #[test]
    fn test_pack_parse_round_trip() {
        let hash_low = hash_twice(b"some block").low();
        let addr = Address::from_amount(hash_low, FieldType::In, 10 << 24).unwrap();
        let reparsed = Address::from_field(&addr.to_field(), FieldType::In);
        assert_eq!(reparsed.hash_low(), hash_low);
        assert_eq!(reparsed.amount(), 10 << 24);
        assert_eq!(reparsed.to_field(), addr.to_field());
    }

    #[test]
    fn test_full_hash_is_lowered() {
        let full = hash_twice(b"some block");
        let addr = Address::from_amount(full, FieldType::Out, 7).unwrap();
        assert_eq!(addr.hash_low(), full.low());
    }

    #[test]
    fn test_zero_hash_rejected() {
        assert_eq!(Address::from_hash_low(Hash::ZERO), Err(BlockError::ZeroHash));
        assert_eq!(Address::from_amount(Hash::ZERO, FieldType::In, 1), Err(BlockError::ZeroHash));
    }
}
