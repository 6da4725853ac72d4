use crate::errors::StoreResult;

/// An ordered byte-string KV namespace.
///
/// This is the seam between the block store and the concrete engine:
/// the store layer only ever issues point reads/writes and prefix scans,
/// and never assumes cross-key atomicity. Absence is `Ok(None)`, never an
/// error; engine failures are fatal `StoreError`s.
pub trait KvStore: Send + Sync {
    fn name(&self) -> &str;

    fn is_alive(&self) -> bool;

    /// Opens the underlying engine. Idempotent.
    fn init(&self) -> StoreResult<()>;

    /// Wipes all data and reinitializes.
    fn reset(&self) -> StoreResult<()>;

    fn close(&self);

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    fn delete(&self, key: &[u8]) -> StoreResult<()>;

    fn keys(&self) -> StoreResult<Vec<Vec<u8>>>;

    /// All `(key, value)` pairs whose key starts with `prefix`, in key order.
    fn prefix_scan(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;
}
