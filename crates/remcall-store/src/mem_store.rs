use crate::{ObjectStore, StoreError, StoreResult, StoredObject, Version, Versioned};
use remcall_types::{Uid, cbor};
use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

#[derive(Clone, Default)]
pub struct MemStore {
    entries: Arc<RwLock<HashMap<Uid, Entry>>>,
    clock: Arc<AtomicU64>,
}

#[derive(Clone)]
struct Entry {
    object: StoredObject,
    version: Version,
}

impl std::fmt::Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.entries.read().map(|guard| guard.len()).ok();
        f.debug_struct("MemStore").field("entries", &len).finish()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_objects(objects: impl IntoIterator<Item = StoredObject>) -> StoreResult<Self> {
        let store = Self::new();
        for object in objects {
            store.set(object)?;
        }
        Ok(store)
    }

    /// Load a JSON array of stored objects.
    pub fn from_json(text: &str) -> StoreResult<Self> {
        let objects: Vec<StoredObject> = cbor::from_json(text)?;
        Self::from_objects(objects)
    }

    /// All objects ordered by identifier.
    pub fn snapshot(&self) -> StoreResult<Vec<StoredObject>> {
        let guard = self
            .entries
            .read()
            .map_err(|_| StoreError::Poisoned("snapshot"))?;
        let mut objects: Vec<_> = guard.values().map(|entry| entry.object.clone()).collect();
        objects.sort_by_key(|object| object.id);
        Ok(objects)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_version(&self) -> Version {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl ObjectStore for MemStore {
    fn get_versioned(&self, id: &Uid) -> StoreResult<Option<Versioned>> {
        let guard = self
            .entries
            .read()
            .map_err(|_| StoreError::Poisoned("get"))?;
        Ok(guard.get(id).map(|entry| Versioned {
            object: entry.object.clone(),
            version: entry.version,
        }))
    }

    fn set(&self, object: StoredObject) -> StoreResult<Version> {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| StoreError::Poisoned("set"))?;
        let version = self.next_version();
        guard.insert(object.id, Entry { object, version });
        Ok(version)
    }

    fn compare_and_set(
        &self,
        object: StoredObject,
        expected: Option<Version>,
    ) -> StoreResult<Version> {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| StoreError::Poisoned("compare_and_set"))?;
        let found = guard.get(&object.id).map(|entry| entry.version);
        if found != expected {
            return Err(StoreError::Conflict {
                id: object.id,
                expected,
                found,
            });
        }
        let version = self.next_version();
        guard.insert(object.id, Entry { object, version });
        Ok(version)
    }

    fn remove(&self, id: &Uid) -> StoreResult<Option<StoredObject>> {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| StoreError::Poisoned("remove"))?;
        Ok(guard.remove(id).map(|entry| entry.object))
    }

    fn ids(&self) -> StoreResult<Vec<Uid>> {
        let guard = self
            .entries
            .read()
            .map_err(|_| StoreError::Poisoned("ids"))?;
        Ok(guard.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remcall_types::{AccessSet, Value};

    fn object(value: i64) -> StoredObject {
        StoredObject::new(Uid::generate(), Value::Int(value), AccessSet::new())
    }

    #[test]
    fn set_overwrites_and_bumps_version() {
        let store = MemStore::new();
        let first = object(1);
        let id = first.id;
        let v1 = store.set(first).expect("set");
        let mut second = object(2);
        second.id = id;
        let v2 = store.set(second).expect("set");
        assert!(v2 > v1);
        let loaded = store.get(&id).expect("get").expect("present");
        assert_eq!(loaded.data, Value::Int(2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn compare_and_set_detects_interleaved_writer() {
        let store = MemStore::new();
        let obj = object(1);
        let id = obj.id;
        store.set(obj.clone()).expect("set");
        let read = store.get_versioned(&id).expect("get").expect("present");

        store.set(obj.clone()).expect("interleaved write");

        let err = store
            .compare_and_set(read.object.clone(), Some(read.version))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { id: conflict, .. } if conflict == id));

        let fresh = store.get_versioned(&id).expect("get").expect("present");
        store
            .compare_and_set(fresh.object, Some(fresh.version))
            .expect("cas with fresh version");
    }

    #[test]
    fn compare_and_set_on_absent_key() {
        let store = MemStore::new();
        let obj = object(5);
        store.compare_and_set(obj.clone(), None).expect("insert");
        assert!(store.compare_and_set(obj, None).is_err());
    }

    #[test]
    fn missing_entries_are_absent_not_errors() {
        let store = MemStore::new();
        assert!(store.get(&Uid::generate()).expect("get").is_none());
        assert!(!store.contains(&Uid::generate()).expect("contains"));
        assert!(store.remove(&Uid::generate()).expect("remove").is_none());
    }
}
