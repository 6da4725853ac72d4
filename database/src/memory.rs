use crate::errors::{StoreError, StoreResult};
use crate::kv::KvStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory ordered `KvStore`, used by unit tests and light tooling.
/// `BTreeMap` gives the same key-ordered prefix-scan semantics as the
/// rocksdb engine.
pub struct MemoryKvStore {
    name: String,
    map: RwLock<Option<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryKvStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), map: RwLock::new(Some(BTreeMap::new())) }
    }

    fn not_open(&self) -> StoreError {
        StoreError::NotOpen(self.name.clone())
    }
}

impl KvStore for MemoryKvStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_alive(&self) -> bool {
        self.map.read().is_some()
    }

    fn init(&self) -> StoreResult<()> {
        let mut guard = self.map.write();
        if guard.is_none() {
            *guard = Some(BTreeMap::new());
        }
        Ok(())
    }

    fn reset(&self) -> StoreResult<()> {
        *self.map.write() = Some(BTreeMap::new());
        Ok(())
    }

    fn close(&self) {
        *self.map.write() = None;
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut guard = self.map.write();
        let map = guard.as_mut().ok_or_else(|| self.not_open())?;
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let guard = self.map.read();
        let map = guard.as_ref().ok_or_else(|| self.not_open())?;
        Ok(map.get(key).cloned())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        let mut guard = self.map.write();
        let map = guard.as_mut().ok_or_else(|| self.not_open())?;
        map.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<Vec<u8>>> {
        let guard = self.map.read();
        let map = guard.as_ref().ok_or_else(|| self.not_open())?;
        Ok(map.keys().cloned().collect())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let guard = self.map.read();
        let map = guard.as_ref().ok_or_else(|| self.not_open())?;
        Ok(map
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}
