use crate::{BLOCK_HEIGHT, HASH_BLOCK_INFO, OURS_BLOCK_INFO, SETTING_STATS, SETTING_TOP_STATUS, SNAPSHOT_BOOT, TIME_BUCKET_MS, TIME_HASH_INFO};
use log::{debug, warn};
use xdag_consensus_core::block::Block;
use xdag_consensus_core::info::BlockInfo;
use xdag_consensus_core::raw::XdagBlock;
use xdag_consensus_core::stats::{XdagStats, XdagTopStatus};
use xdag_database::prelude::{KvStore, StoreError, StoreResult};
use xdag_hashes::Hash;

/// The block store, backed by three independent ordered KV namespaces:
/// `index` (metadata, indices, sums, settings), `time` (bucket
/// membership) and `block` (raw 512-byte payloads keyed by low hash).
///
/// Writes are independent per-key puts with no cross-key atomicity; the
/// single block-processing pipeline is the only writer, and recovery
/// after a crash re-derives metadata from raw payloads elsewhere.
pub struct BlockStore<S: KvStore> {
    index: S,
    time: S,
    block: S,
}

impl<S: KvStore> BlockStore<S> {
    pub fn new(index: S, time: S, block: S) -> Self {
        Self { index, time, block }
    }

    /// Opens all three namespaces as a unit.
    pub fn init(&self) -> StoreResult<()> {
        self.index.init()?;
        self.time.init()?;
        self.block.init()
    }

    /// Wipes all three namespaces as a unit.
    pub fn reset(&self) -> StoreResult<()> {
        self.index.reset()?;
        self.time.reset()?;
        self.block.reset()
    }

    pub fn close(&self) {
        self.index.close();
        self.time.close();
        self.block.close();
    }

    pub(crate) fn index(&self) -> &S {
        &self.index
    }

    /// Time-bucket key: prefix, big-endian bucket number, then the low
    /// hash when addressing a single member.
    fn time_key(timestamp: u64, hash_low: Option<&Hash>) -> Vec<u8> {
        let mut key = Vec::with_capacity(41);
        key.push(TIME_HASH_INFO);
        key.extend_from_slice(&(timestamp >> 16).to_be_bytes());
        if let Some(hash_low) = hash_low {
            key.extend_from_slice(hash_low.as_bytes());
        }
        key
    }

    fn info_key(hash_low: &Hash) -> Vec<u8> {
        let mut key = Vec::with_capacity(33);
        key.push(HASH_BLOCK_INFO);
        key.extend_from_slice(hash_low.as_bytes());
        key
    }

    fn height_key(height: u64) -> Vec<u8> {
        let mut key = Vec::with_capacity(9);
        key.push(BLOCK_HEIGHT);
        key.extend_from_slice(&height.to_be_bytes());
        key
    }

    fn ours_key(key_index: u32, hash_low: &Hash) -> Vec<u8> {
        let mut key = Vec::with_capacity(37);
        key.push(OURS_BLOCK_INFO);
        key.extend_from_slice(&key_index.to_be_bytes());
        key.extend_from_slice(hash_low.as_bytes());
        key
    }

    /// Persists a sealed block: time-bucket membership, raw payload, sum
    /// trees, metadata and (for main blocks) the height index. Four
    /// independent puts; a crash in between leaves a partial record the
    /// boot-time recovery path tolerates.
    pub fn save_block(&self, block: &Block) -> StoreResult<()> {
        let hash_low = block.hash_low();
        if hash_low.is_zero() {
            return Err(StoreError::DataInconsistency("refusing to save an unsealed block".into()));
        }
        let raw = block.xdag_block().map_err(|e| StoreError::DataInconsistency(e.to_string()))?;

        self.time.put(&Self::time_key(block.timestamp(), Some(&hash_low)), &[])?;
        // re-saving the same payload must not double-count in the sums
        if !self.has_block(&hash_low)? {
            self.update_sum(block.timestamp(), raw.sum(), raw.data().len() as u64)?;
        }
        self.block.put(hash_low.as_bytes(), raw.data())?;
        self.save_block_info(block.info())
    }

    /// Metadata-only write, also used on its own when the DAG engine
    /// re-flags an already-stored block.
    pub fn save_block_info(&self, info: &BlockInfo) -> StoreResult<()> {
        self.index.put(&Self::info_key(&info.hash_low), &bincode::serialize(info)?)?;
        if info.height > 0 {
            let key = Self::height_key(info.height);
            if let Some(existing) = self.index.get(&key)? {
                if existing != info.hash_low.as_bytes() {
                    debug!("height {} reassigned from {} to {}", info.height, hex::encode(&existing), info.hash_low);
                }
            }
            self.index.put(&key, info.hash_low.as_bytes())?;
        }
        Ok(())
    }

    pub fn get_block_info(&self, hash_low: &Hash) -> StoreResult<Option<BlockInfo>> {
        match self.index.get(&Self::info_key(hash_low))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn has_block(&self, hash_low: &Hash) -> StoreResult<bool> {
        Ok(self.index.get(&Self::info_key(hash_low))?.is_some())
    }

    /// Fetches and re-parses the raw 512-byte payload. A stored payload
    /// that no longer decodes is a store inconsistency, not absence.
    pub fn get_raw_block(&self, hash_low: &Hash) -> StoreResult<Option<Block>> {
        let Some(bytes) = self.block.get(hash_low.as_bytes())? else {
            return Ok(None);
        };
        let xdag = XdagBlock::try_from_slice(&bytes)
            .map_err(|e| StoreError::DataInconsistency(format!("corrupt raw payload for {}: {}", hash_low, e)))?;
        let block = Block::from_xdag(xdag)
            .map_err(|e| StoreError::DataInconsistency(format!("undecodable raw payload for {}: {}", hash_low, e)))?;
        Ok(Some(block))
    }

    /// Looks a block up by low hash. With `raw` set the full payload is
    /// fetched and re-parsed and the stored metadata attached; otherwise
    /// the result is metadata-only with links/keys/signatures absent.
    ///
    /// Metadata without a raw payload is a reportable inconsistency,
    /// logged and treated as not found.
    pub fn get_block_by_hash(&self, hash_low: &Hash, raw: bool) -> StoreResult<Option<Block>> {
        let Some(info) = self.get_block_info(hash_low)? else {
            return Ok(None);
        };
        if !raw {
            return Ok(Some(Block::from_info(info)));
        }
        match self.get_raw_block(hash_low)? {
            Some(mut block) => {
                *block.info_mut() = info;
                Ok(Some(block))
            }
            None => {
                warn!("block {} has metadata but no raw payload", hash_low);
                Ok(None)
            }
        }
    }

    pub fn get_block_by_height(&self, height: u64, raw: bool) -> StoreResult<Option<Block>> {
        let Some(bytes) = self.index.get(&Self::height_key(height))? else {
            return Ok(None);
        };
        if bytes.len() != 32 {
            return Err(StoreError::DataInconsistency(format!("height {} index entry has length {}", height, bytes.len())));
        }
        self.get_block_by_hash(&Hash::from_slice(&bytes), raw)
    }

    /// All blocks whose timestamps fall in `[start, end)`, visited in
    /// fixed bucket strides. Only stride-aligned buckets are scanned, so
    /// `end` should sit on a stride boundary above `start` or trailing
    /// partial buckets are skipped.
    pub fn get_blocks_used_time(&self, start: u64, end: u64) -> StoreResult<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut ts = start;
        while ts < end {
            for (key, _) in self.time.prefix_scan(&Self::time_key(ts, None))? {
                if key.len() != 41 {
                    continue;
                }
                let hash_low = Hash::from_slice(&key[9..41]);
                if let Some(block) = self.get_block_by_hash(&hash_low, true)? {
                    blocks.push(block);
                }
            }
            ts += TIME_BUCKET_MS;
        }
        Ok(blocks)
    }

    /// Records that `hash_low` was produced by the locally-held key at
    /// `key_index`.
    pub fn save_our_block(&self, key_index: u32, hash_low: &Hash) -> StoreResult<()> {
        self.index.put(&Self::ours_key(key_index, hash_low), &[])
    }

    pub fn remove_our_block(&self, key_index: u32, hash_low: &Hash) -> StoreResult<()> {
        self.index.delete(&Self::ours_key(key_index, hash_low))
    }

    /// First recorded block for a key index, if any.
    pub fn get_our_block(&self, key_index: u32) -> StoreResult<Option<Hash>> {
        let mut prefix = Vec::with_capacity(5);
        prefix.push(OURS_BLOCK_INFO);
        prefix.extend_from_slice(&key_index.to_be_bytes());
        let pairs = self.index.prefix_scan(&prefix)?;
        Ok(pairs.first().filter(|(key, _)| key.len() == 37).map(|(key, _)| Hash::from_slice(&key[5..37])))
    }

    /// Enumerates every `(key_index, hash_low)` ownership record.
    pub fn our_blocks(&self) -> StoreResult<Vec<(u32, Hash)>> {
        let mut ours = Vec::new();
        for (key, _) in self.index.prefix_scan(&[OURS_BLOCK_INFO])? {
            if key.len() != 37 {
                warn!("malformed ownership key of length {}", key.len());
                continue;
            }
            let key_index = u32::from_be_bytes(key[1..5].try_into().map_err(|_| {
                StoreError::DataInconsistency("ownership key index is not 4 bytes".into())
            })?);
            ours.push((key_index, Hash::from_slice(&key[5..37])));
        }
        Ok(ours)
    }

    pub fn save_stats(&self, stats: &XdagStats) -> StoreResult<()> {
        self.index.put(&[SETTING_STATS], &bincode::serialize(stats)?)
    }

    pub fn get_stats(&self) -> StoreResult<Option<XdagStats>> {
        match self.index.get(&[SETTING_STATS])? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn save_top_status(&self, status: &XdagTopStatus) -> StoreResult<()> {
        self.index.put(&[SETTING_TOP_STATUS], &bincode::serialize(status)?)
    }

    pub fn get_top_status(&self) -> StoreResult<Option<XdagTopStatus>> {
        match self.index.get(&[SETTING_TOP_STATUS])? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Marks the store as having been bootstrapped from a snapshot.
    pub fn set_snapshot_boot(&self) -> StoreResult<()> {
        self.index.put(&[SNAPSHOT_BOOT], &[1])
    }

    pub fn is_snapshot_boot(&self) -> StoreResult<bool> {
        Ok(matches!(self.index.get(&[SNAPSHOT_BOOT])?.as_deref(), Some([1])))
    }
}
