mod errors;
mod kv;
mod memory;
mod rocks;

pub mod prelude {
    pub use super::errors::{StoreError, StoreResult};
    pub use super::kv::KvStore;
    pub use super::memory::MemoryKvStore;
    pub use super::rocks::RocksKvStore;
}
