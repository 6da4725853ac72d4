use crate::errors::{BlockError, BlockResult};
use crate::field::{Field, FieldType};
use crate::{XDAG_BLOCK_FIELDS, XDAG_BLOCK_SIZE, XDAG_FIELD_SIZE};

/// A block in its canonical 512-byte form: 16 consecutive 32-byte fields.
///
/// Field 0 is the header: bytes `[0:8)` transport header (opaque
/// passthrough), `[8:16)` the 64-bit type word, `[16:24)` the timestamp in
/// little-endian milliseconds, `[24:32)` the fee. Every other slot's
/// meaning is given by its nibble in the type word.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct XdagBlock {
    data: [u8; XDAG_BLOCK_SIZE],
    sum: u64,
}

impl XdagBlock {
    pub fn new(data: [u8; XDAG_BLOCK_SIZE]) -> Self {
        let mut block = Self { data, sum: 0 };
        block.sum = (0..XDAG_BLOCK_FIELDS).map(|i| block.field(i).word_sum()).fold(0u64, u64::wrapping_add);
        block
    }

    /// Decodes a raw buffer. Any length other than 512 bytes is malformed
    /// input, fatal for this block only.
    pub fn try_from_slice(raw: &[u8]) -> BlockResult<Self> {
        let data: [u8; XDAG_BLOCK_SIZE] = raw.try_into().map_err(|_| BlockError::BadRawLength(raw.len()))?;
        Ok(Self::new(data))
    }

    #[inline]
    pub fn data(&self) -> &[u8; XDAG_BLOCK_SIZE] {
        &self.data
    }

    /// Running checksum: wrapping sum of all 16 fields' word sums.
    #[inline]
    pub fn sum(&self) -> u64 {
        self.sum
    }

    /// # Panics
    /// Panics if `n >= 16`.
    #[inline]
    pub fn field(&self, n: usize) -> Field {
        let start = n * XDAG_FIELD_SIZE;
        Field(self.data[start..start + XDAG_FIELD_SIZE].try_into().expect("field slots are exactly 32 bytes"))
    }

    #[inline]
    pub fn transport_header(&self) -> u64 {
        u64::from_le_bytes(self.data[0..8].try_into().expect("header words are exactly 8 bytes"))
    }

    #[inline]
    pub fn type_word(&self) -> u64 {
        u64::from_le_bytes(self.data[8..16].try_into().expect("header words are exactly 8 bytes"))
    }

    #[inline]
    pub fn timestamp(&self) -> u64 {
        u64::from_le_bytes(self.data[16..24].try_into().expect("header words are exactly 8 bytes"))
    }

    #[inline]
    pub fn fee(&self) -> u64 {
        u64::from_le_bytes(self.data[24..32].try_into().expect("header words are exactly 8 bytes"))
    }

    /// Type of the field at position `n`, recomputed from the type word.
    #[inline]
    pub fn field_type(&self, n: usize) -> FieldType {
        field_type_at(self.type_word(), n)
    }
}

/// Nibble at position `n` of a type word.
#[inline]
pub fn field_type_at(type_word: u64, n: usize) -> FieldType {
    FieldType::from_nibble(((type_word >> (n * 4)) & 0x0f) as u8)
}

impl std::fmt::Debug for XdagBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "XdagBlock {{ type_word: {:016x}, timestamp: {:#x}, sum: {:#x} }}", self.type_word(), self.timestamp(), self.sum)
    }
}
