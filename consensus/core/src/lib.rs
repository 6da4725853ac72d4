pub mod address;
pub mod block;
pub mod errors;
pub mod field;
pub mod info;
pub mod network;
pub mod pow;
pub mod raw;
pub mod sign;
pub mod state;
pub mod stats;
pub mod wallet;

/// Number of 32-byte fields per block.
pub const XDAG_BLOCK_FIELDS: usize = 16;
/// Size of a block's canonical wire/storage form.
pub const XDAG_BLOCK_SIZE: usize = 512;
/// Size of a single field slot.
pub const XDAG_FIELD_SIZE: usize = 32;
/// Index of the last field slot, reserved for the mining nonce.
pub const MAX_LINKS: usize = 15;

/// A compact ECDSA signature, `r ‖ s`, occupying two field slots.
pub type Signature = [u8; XDAG_FIELD_SIZE * 2];
