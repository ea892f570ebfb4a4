//! Object store abstraction plus an in-memory backend.
//!
//! Entries are keyed by identifier. Each write bumps a per-key version so a
//! read-then-write on one key can detect interleaved writers through
//! [`ObjectStore::compare_and_set`].

mod mem_store;

pub use mem_store::MemStore;
pub use remcall_types::StoredObject;

use remcall_types::{CodecError, Uid};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;
pub type DynStore = Arc<dyn ObjectStore>;

/// Monotonic write counter attached to a stored entry.
pub type Version = u64;

/// Stored object together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub object: StoredObject,
    pub version: Version,
}

/// Trait implemented by all object stores.
///
/// Single-key reads and writes are linearizable; nothing spans keys.
pub trait ObjectStore: Send + Sync {
    fn get_versioned(&self, id: &Uid) -> StoreResult<Option<Versioned>>;

    /// Upsert under `object.id`, overwriting any existing entry.
    fn set(&self, object: StoredObject) -> StoreResult<Version>;

    /// Write only if the key is still at `expected` (`None` means absent).
    fn compare_and_set(
        &self,
        object: StoredObject,
        expected: Option<Version>,
    ) -> StoreResult<Version>;

    fn remove(&self, id: &Uid) -> StoreResult<Option<StoredObject>>;

    fn ids(&self) -> StoreResult<Vec<Uid>>;

    fn get(&self, id: &Uid) -> StoreResult<Option<StoredObject>> {
        Ok(self.get_versioned(id)?.map(|entry| entry.object))
    }

    fn contains(&self, id: &Uid) -> StoreResult<bool> {
        Ok(self.get_versioned(id)?.is_some())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("write conflict on {id}: expected version {expected:?}, found {found:?}")]
    Conflict {
        id: Uid,
        expected: Option<Version>,
        found: Option<Version>,
    },
    #[error("store lock poisoned during {0}")]
    Poisoned(&'static str),
    #[error("fixture decode error: {0}")]
    Codec(#[from] CodecError),
}
