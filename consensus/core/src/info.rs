use crate::field::Field;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use xdag_hashes::Hash;

bitflags! {
    /// Lifecycle flags a block accumulates as the DAG engine confirms it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct BlockFlags: u16 {
        /// Accepted main block.
        const MAIN = 0x01;
        /// Member of the current main chain.
        const MAIN_CHAIN = 0x02;
        /// Amounts have been applied.
        const APPLIED = 0x04;
        /// Referenced by a main block.
        const MAIN_REF = 0x08;
        /// Referenced by some block (no longer an orphan).
        const REF = 0x10;
        /// Created by a locally held key.
        const OURS = 0x20;
        /// Held in the extra (pre-connect) pool.
        const EXTRA = 0x40;
        /// Carries a remark field.
        const REMARK = 0x80;
    }
}

/// Snapshot payload attached to blocks restored from a chain snapshot.
/// `pubkey` selects whether `data` is a compressed public key or the
/// block's raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub pubkey: bool,
    pub data: Vec<u8>,
}

/// Persisted block metadata, decoupled from the raw 512 bytes. Created
/// when a block is first validated; mutated as it gains confirmations;
/// never deleted, only re-flagged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockInfo {
    pub type_word: u64,
    pub flags: BlockFlags,
    pub height: u64,
    pub difficulty: u128,
    pub ref_link: Option<Hash>,
    pub max_diff_link: Option<Hash>,
    pub fee: u64,
    pub remark: Option<Field>,
    pub hash: Hash,
    pub hash_low: Hash,
    pub amount: u64,
    pub timestamp: u64,
    pub snapshot: Option<SnapshotInfo>,
}

impl BlockInfo {
    /// Identity-and-progress equality, the subset the original compares:
    /// two infos describe the same confirmed block state.
    pub fn same_state(&self, other: &BlockInfo) -> bool {
        self.type_word == other.type_word
            && self.flags == other.flags
            && self.height == other.height
            && self.amount == other.amount
            && self.timestamp == other.timestamp
            && self.hash == other.hash
    }
}
