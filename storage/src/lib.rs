//! Persistent block storage: the block store with its time buckets,
//! height and ownership indices, the hierarchical sum trees used for
//! cheap divergence detection between peers, and the orphan pool.

mod block_store;
mod orphan_pool;
mod sums;

pub use block_store::BlockStore;
pub use orphan_pool::OrphanPool;
pub use sums::SumPair;

/// Single-byte key-space prefixes of the `index` namespace. The values
/// are wire-compatible with existing on-disk stores and must not change.
pub const SETTING_STATS: u8 = 0x10;
pub const TIME_HASH_INFO: u8 = 0x20;
pub const HASH_BLOCK_INFO: u8 = 0x30;
pub const SUMS_BLOCK_INFO: u8 = 0x40;
pub const OURS_BLOCK_INFO: u8 = 0x50;
pub const SETTING_TOP_STATUS: u8 = 0x60;
pub const SNAPSHOT_BOOT: u8 = 0x70;
pub const BLOCK_HEIGHT: u8 = 0x80;

/// Orphan entries live under this prefix in their own namespace.
pub const ORPHAN_PREFIX: u8 = 0x00;

/// Width of one time bucket in timestamp units (~64 s epochs).
pub const TIME_BUCKET_MS: u64 = 0x10000;

/// Leaf file name of every sum-tree table.
pub const SUMS_FILE_NAME: &str = "sums.dat";
