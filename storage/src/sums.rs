//! Hierarchical checksum sums.
//!
//! For every saved block a `(checksum, size)` pair is accumulated into
//! 256-slot tables at four time granularities, so two nodes can find the
//! first bucket where their block sets diverge by exchanging 256 bytes
//! per round instead of full block lists. The tables are additive sums,
//! not a Merkle tree: divergence detection, not tamper evidence.

use crate::block_store::BlockStore;
use crate::{SUMS_BLOCK_INFO, SUMS_FILE_NAME};
use xdag_database::prelude::{KvStore, StoreError, StoreResult};

/// One 16-byte table slot: a running checksum and the byte size it covers,
/// both little-endian on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SumPair {
    pub sum: u64,
    pub size: u64,
}

const SLOT_SIZE: usize = 16;
const TABLE_SLOTS: usize = 256;
const TABLE_SIZE: usize = TABLE_SLOTS * SLOT_SIZE;

/// Bits a query range may consist of: a single power of two between
/// 2^20 (sixteen time buckets) and 2^48 (the whole representable span),
/// stepping a nibble at a time.
const RANGE_MASK: u64 = 0xFFFE_EEEE_EEEF_FFFF;

/// Table key inside the index namespace: the sums prefix, the nested
/// 2-hex-digit directory path and the leaf file name.
fn table_key(timestamp: u64, depth: usize) -> Vec<u8> {
    let mut key = vec![SUMS_BLOCK_INFO];
    for i in 0..depth {
        let dir = format!("{:02x}/", (timestamp >> (40 - 8 * i)) & 0xff);
        key.extend_from_slice(dir.as_bytes());
    }
    key.extend_from_slice(SUMS_FILE_NAME.as_bytes());
    key
}

fn read_slot(table: &[u8], slot: usize) -> SumPair {
    let off = slot * SLOT_SIZE;
    SumPair {
        sum: u64::from_le_bytes(table[off..off + 8].try_into().expect("slot halves are exactly 8 bytes")),
        size: u64::from_le_bytes(table[off + 8..off + 16].try_into().expect("slot halves are exactly 8 bytes")),
    }
}

fn write_slot(table: &mut [u8], slot: usize, pair: SumPair) {
    let off = slot * SLOT_SIZE;
    table[off..off + 8].copy_from_slice(&pair.sum.to_le_bytes());
    table[off + 8..off + 16].copy_from_slice(&pair.size.to_le_bytes());
}

impl<S: KvStore> BlockStore<S> {
    fn sum_table(&self, key: &[u8]) -> StoreResult<Vec<u8>> {
        match self.index().get(key)? {
            Some(table) if table.len() == TABLE_SIZE => Ok(table),
            Some(table) => Err(StoreError::DataInconsistency(format!("sum table has length {}", table.len()))),
            None => Ok(vec![0u8; TABLE_SIZE]),
        }
    }

    /// Accumulates one block's checksum and size at all four
    /// granularities. Each level's slot is the next byte of the
    /// timestamp, each level's table sits one directory deeper.
    pub(crate) fn update_sum(&self, timestamp: u64, sum: u64, size: u64) -> StoreResult<()> {
        for depth in 0..4 {
            let key = table_key(timestamp, depth);
            let mut table = self.sum_table(&key)?;
            let slot = ((timestamp >> (40 - 8 * depth)) & 0xff) as usize;
            let old = read_slot(&table, slot);
            write_slot(&mut table, slot, SumPair { sum: old.sum.wrapping_add(sum), size: old.size.wrapping_add(size) });
            self.index().put(&key, &table)?;
        }
        Ok(())
    }

    /// Sums over `[start, end)` split into 16 equal sub-ranges.
    ///
    /// The range must be a single power of two acceptable to the table
    /// layout (see `RANGE_MASK`); anything else yields `None`, the
    /// caller's cue that the query is malformed rather than empty. A
    /// missing table reads as all-zero sums.
    pub fn load_sum(&self, start: u64, end: u64) -> StoreResult<Option<[SumPair; 16]>> {
        let Some(range) = end.checked_sub(start) else {
            return Ok(None);
        };
        if range == 0 || range & (range - 1) != 0 || range & RANGE_MASK != 0 {
            return Ok(None);
        }
        let mut level: i32 = -6;
        let mut rest = range;
        while rest != 0 {
            rest >>= 4;
            level += 1;
        }
        // coarser ranges read shallower tables
        let depth = match level {
            ..=1 => 3,
            2..=3 => 2,
            4..=5 => 1,
            _ => 0,
        };
        let table = self.sum_table(&table_key(start, depth))?;

        let mut out = [SumPair::default(); 16];
        if level & 1 == 1 {
            // odd level: the whole table covers the range, fold 16:1
            for i in 0..TABLE_SLOTS {
                let pair = read_slot(&table, i);
                out[i >> 4].sum = out[i >> 4].sum.wrapping_add(pair.sum);
                out[i >> 4].size = out[i >> 4].size.wrapping_add(pair.size);
            }
        } else {
            // even level: sixteen consecutive slots, aligned to the range
            let base = ((start >> ((level + 4) * 4)) & 0xf0) as usize;
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = read_slot(&table, base + i);
            }
        }
        Ok(Some(out))
    }
}
