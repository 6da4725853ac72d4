use crate::ORPHAN_PREFIX;
use log::warn;
use xdag_consensus_core::address::Address;
use xdag_database::prelude::{KvStore, StoreResult};
use xdag_hashes::Hash;

/// Counter key, deliberately above every orphan entry in key order.
const ORPHAN_SIZE_KEY: [u8; 8] = [0xff; 8];

/// Unreferenced blocks waiting to be linked by a new block, stored as
/// `prefix ‖ hashLow → LE64(timestamp)` plus a big-endian size counter.
///
/// The counter is maintained by blind increment/decrement and is not
/// transactional with the entry writes; a crash mid-operation can leave
/// it out of step with the actual entries until [`OrphanPool::recount`]
/// runs.
pub struct OrphanPool<S: KvStore> {
    store: S,
}

impl<S: KvStore> OrphanPool<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn init(&self) -> StoreResult<()> {
        self.store.init()
    }

    pub fn reset(&self) -> StoreResult<()> {
        self.store.reset()
    }

    pub fn close(&self) {
        self.store.close();
    }

    fn orphan_key(hash_low: &Hash) -> Vec<u8> {
        let mut key = Vec::with_capacity(33);
        key.push(ORPHAN_PREFIX);
        key.extend_from_slice(hash_low.as_bytes());
        key
    }

    pub fn size(&self) -> StoreResult<u64> {
        match self.store.get(&ORPHAN_SIZE_KEY)? {
            Some(bytes) if bytes.len() == 8 => {
                Ok(u64::from_be_bytes(bytes.as_slice().try_into().expect("counter is exactly 8 bytes")))
            }
            Some(bytes) => {
                warn!("orphan counter has length {}, treating as zero", bytes.len());
                Ok(0)
            }
            None => Ok(0),
        }
    }

    fn set_size(&self, size: u64) -> StoreResult<()> {
        self.store.put(&ORPHAN_SIZE_KEY, &size.to_be_bytes())
    }

    pub fn contains_key(&self, hash_low: &Hash) -> StoreResult<bool> {
        Ok(self.store.get(&Self::orphan_key(hash_low))?.is_some())
    }

    pub fn add_orphan(&self, hash_low: &Hash, timestamp: u64) -> StoreResult<()> {
        self.store.put(&Self::orphan_key(hash_low), &timestamp.to_le_bytes())?;
        self.set_size(self.size()?.wrapping_add(1))
    }

    /// Removes an orphan and decrements the counter. The caller is
    /// responsible for only deleting entries that exist; the counter is
    /// not checked against actual cardinality here.
    pub fn delete_by_hash(&self, hash_low: &Hash) -> StoreResult<()> {
        self.store.delete(&Self::orphan_key(hash_low))?;
        self.set_size(self.size()?.wrapping_sub(1))
    }

    /// Up to `n` orphan addresses whose stored timestamp is strictly
    /// below `send_time`. Entries whose value has vanished between the
    /// scan and the read were deleted concurrently and are skipped.
    pub fn get_orphan(&self, n: usize, send_time: u64) -> StoreResult<Vec<Address>> {
        let mut addresses = Vec::new();
        for (key, _) in self.store.prefix_scan(&[ORPHAN_PREFIX])? {
            if addresses.len() >= n {
                break;
            }
            if key.len() != 33 {
                continue;
            }
            let Some(value) = self.store.get(&key)? else {
                continue;
            };
            if value.len() != 8 {
                warn!("orphan entry with a {}-byte timestamp, skipping", value.len());
                continue;
            }
            let timestamp = u64::from_le_bytes(value.as_slice().try_into().expect("timestamp is exactly 8 bytes"));
            if timestamp >= send_time {
                continue;
            }
            match Address::from_hash_low(Hash::from_slice(&key[1..33])) {
                Ok(address) => addresses.push(address),
                Err(e) => warn!("unusable orphan entry: {}", e),
            }
        }
        Ok(addresses)
    }

    /// Rebuilds the counter from actual entry cardinality, the recovery
    /// path for counter drift after a crash.
    pub fn recount(&self) -> StoreResult<u64> {
        let count = self.store.prefix_scan(&[ORPHAN_PREFIX])?.iter().filter(|(key, _)| key.len() == 33).count() as u64;
        self.set_size(count)?;
        Ok(count)
    }
}
