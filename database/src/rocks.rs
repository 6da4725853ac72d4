use crate::errors::{StoreError, StoreResult};
use crate::kv::KvStore;
use log::debug;
use parking_lot::RwLock;
use rocksdb::{DBWithThreadMode, Direction, IteratorMode, MultiThreaded, ReadOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// The DB type used for XDAG stores
pub type DB = DBWithThreadMode<MultiThreaded>;

/// A rocksdb-backed `KvStore` namespace. Each namespace owns its own
/// directory under the node's database root, so the three block-store
/// namespaces can be wiped independently.
pub struct RocksKvStore {
    name: String,
    path: PathBuf,
    db: RwLock<Option<Arc<DB>>>,
}

impl RocksKvStore {
    pub fn new(name: impl Into<String>, db_root: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let path = db_root.into().join(&name);
        Self { name, path, db: RwLock::new(None) }
    }

    fn open(&self) -> StoreResult<Arc<DB>> {
        let mut options = rocksdb::Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, &self.path)?;
        Ok(Arc::new(db))
    }

    fn handle(&self) -> StoreResult<Arc<DB>> {
        self.db.read().clone().ok_or_else(|| StoreError::NotOpen(self.name.clone()))
    }
}

impl KvStore for RocksKvStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_alive(&self) -> bool {
        self.db.read().is_some()
    }

    fn init(&self) -> StoreResult<()> {
        let mut guard = self.db.write();
        if guard.is_none() {
            *guard = Some(self.open()?);
            debug!("opened rocksdb namespace {} at {}", self.name, self.path.display());
        }
        Ok(())
    }

    fn reset(&self) -> StoreResult<()> {
        let mut guard = self.db.write();
        // The handle must be dropped before destroy can reclaim the directory
        *guard = None;
        if self.path.exists() {
            DB::destroy(&rocksdb::Options::default(), &self.path)?;
        }
        *guard = Some(self.open()?);
        Ok(())
    }

    fn close(&self) {
        *self.db.write() = None;
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        Ok(self.handle()?.put(key, value)?)
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.handle()?.get(key)?)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        Ok(self.handle()?.delete(key)?)
    }

    fn keys(&self) -> StoreResult<Vec<Vec<u8>>> {
        let db = self.handle()?;
        let mut keys = Vec::new();
        for item in db.iterator(IteratorMode::Start) {
            let (key, _) = item?;
            keys.push(key.into_vec());
        }
        Ok(keys)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let db = self.handle()?;
        let mut read_opts = ReadOptions::default();
        read_opts.set_iterate_range(rocksdb::PrefixRange(prefix));
        let mut pairs = Vec::new();
        for item in db.iterator_opt(IteratorMode::From(prefix, Direction::Forward), read_opts) {
            let (key, value) = item?;
            pairs.push((key.into_vec(), value.into_vec()));
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, RocksKvStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksKvStore::new("test", dir.path());
        store.init().unwrap();
        (dir, store)
    }

    #[test]
    fn test_basic_ops() {
        let (_dir, store) = temp_store();
        assert!(store.is_alive());
        assert_eq!(store.get(b"missing").unwrap(), None);

        store.put(b"alpha", b"1").unwrap();
        store.put(b"beta", b"2").unwrap();
        assert_eq!(store.get(b"alpha").unwrap(), Some(b"1".to_vec()));

        store.delete(b"alpha").unwrap();
        assert_eq!(store.get(b"alpha").unwrap(), None);
        assert_eq!(store.keys().unwrap(), vec![b"beta".to_vec()]);
    }

    #[test]
    fn test_prefix_scan_is_ordered_and_bounded() {
        let (_dir, store) = temp_store();
        store.put(&[0x20, 0x02], b"b").unwrap();
        store.put(&[0x20, 0x01], b"a").unwrap();
        store.put(&[0x21, 0x00], b"other").unwrap();

        let pairs = store.prefix_scan(&[0x20]).unwrap();
        assert_eq!(pairs, vec![(vec![0x20, 0x01], b"a".to_vec()), (vec![0x20, 0x02], b"b".to_vec())]);
    }

    #[test]
    fn test_reset_wipes() {
        let (_dir, store) = temp_store();
        store.put(b"k", b"v").unwrap();
        store.reset().unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
        assert!(store.is_alive());
    }

    #[test]
    fn test_closed_store_errors() {
        let (_dir, store) = temp_store();
        store.close();
        assert!(!store.is_alive());
        assert!(matches!(store.put(b"k", b"v"), Err(StoreError::NotOpen(_))));
    }
}
