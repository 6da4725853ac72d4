use crate::XDAG_FIELD_SIZE;
use serde::{Deserialize, Serialize};

/// Semantic tag of a field slot. The discriminants are the wire nibble
/// values carried in the block's 64-bit type word and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FieldType {
    Nonce = 0,
    Head = 1,
    In = 2,
    Out = 3,
    SignIn = 4,
    SignOut = 5,
    PublicKeyEven = 6,
    PublicKeyOdd = 7,
    HeadTest = 8,
    Remark = 9,
    Reserve1 = 10,
    Reserve2 = 11,
    Reserve3 = 12,
    Reserve4 = 13,
    Reserve5 = 14,
    Reserve6 = 15,
}

impl FieldType {
    /// Decodes a 4-bit nibble. Total: every nibble value is a valid tag.
    #[inline]
    pub fn from_nibble(nibble: u8) -> FieldType {
        match nibble & 0x0f {
            0 => FieldType::Nonce,
            1 => FieldType::Head,
            2 => FieldType::In,
            3 => FieldType::Out,
            4 => FieldType::SignIn,
            5 => FieldType::SignOut,
            6 => FieldType::PublicKeyEven,
            7 => FieldType::PublicKeyOdd,
            8 => FieldType::HeadTest,
            9 => FieldType::Remark,
            10 => FieldType::Reserve1,
            11 => FieldType::Reserve2,
            12 => FieldType::Reserve3,
            13 => FieldType::Reserve4,
            14 => FieldType::Reserve5,
            _ => FieldType::Reserve6,
        }
    }

    #[inline]
    pub fn nibble(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn is_signature(self) -> bool {
        matches!(self, FieldType::SignIn | FieldType::SignOut)
    }
}

/// A 32-byte field slot. The type tag is never stored alongside the
/// payload; it always comes from the owning block's type word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field(pub [u8; XDAG_FIELD_SIZE]);

impl Field {
    pub const ZERO: Field = Field([0u8; XDAG_FIELD_SIZE]);

    /// Wrapping sum of the field's four little-endian u64 words, the unit
    /// of the block checksum fed into the storage sum trees.
    #[inline]
    pub fn word_sum(&self) -> u64 {
        let mut sum = 0u64;
        for chunk in self.0.chunks_exact(8) {
            sum = sum.wrapping_add(u64::from_le_bytes(chunk.try_into().expect("chunks are exactly 8 bytes")));
        }
        sum
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; XDAG_FIELD_SIZE]
    }
}

impl AsRef<[u8]> for Field {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Field {
    fn default() -> Self {
        Field::ZERO
    }
}
