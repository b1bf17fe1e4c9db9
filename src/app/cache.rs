// CarScope - app/cache.rs
//
// Explicit cache of loaded listing tables, keyed by store identity.
//
// A store whose file changes (size or modification time) has a new
// identity, so a stale table is never served for it. Failed loads are not
// cached. Tables are shared behind `Arc` because every consumer only reads.

use crate::app::loader::{Store, StoreIdentity};
use crate::core::model::ListingTable;
use crate::util::error::LoadError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Loaded tables by store identity.
#[derive(Debug, Default)]
pub struct ListingCache {
    entries: HashMap<StoreIdentity, Arc<ListingTable>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for the store's current identity, loading it
    /// on a miss. Older versions of the same store file are evicted.
    pub fn get_or_load<S: Store + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<Arc<ListingTable>, LoadError> {
        let identity = store.identity();
        if let Some(table) = self.entries.get(&identity) {
            tracing::debug!(store = %identity.path.display(), "Listing cache hit");
            return Ok(Arc::clone(table));
        }

        tracing::debug!(store = %identity.path.display(), "Listing cache miss");
        let table = Arc::new(store.load()?);
        self.invalidate_path(&identity.path);
        self.entries.insert(identity, Arc::clone(&table));
        Ok(table)
    }

    /// Drop one cached version. Returns true if it was present.
    pub fn invalidate(&mut self, identity: &StoreIdentity) -> bool {
        self.entries.remove(identity).is_some()
    }

    /// Drop every cached version of the store at `path`.
    pub fn invalidate_path(&mut self, path: &Path) -> usize {
        let before = self.entries.len();
        self.entries.retain(|identity, _| identity.path != path);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Listing;
    use std::cell::Cell;
    use std::path::PathBuf;

    /// In-memory store that counts loads and can be told to fail or change.
    struct FakeStore {
        path: PathBuf,
        version: Cell<u64>,
        loads: Cell<usize>,
        fail: Cell<bool>,
    }

    impl FakeStore {
        fn new(path: &str) -> Self {
            Self {
                path: PathBuf::from(path),
                version: Cell::new(1),
                loads: Cell::new(0),
                fail: Cell::new(false),
            }
        }
    }

    impl Store for FakeStore {
        fn identity(&self) -> StoreIdentity {
            StoreIdentity {
                path: self.path.clone(),
                len: self.version.get(),
                ..Default::default()
            }
        }

        fn load(&self) -> Result<ListingTable, LoadError> {
            self.loads.set(self.loads.get() + 1);
            if self.fail.get() {
                return Err(LoadError::StoreUnavailable {
                    path: self.path.clone(),
                    reason: "offline".to_string(),
                    source: None,
                });
            }
            let rows = (0..self.version.get())
                .map(|i| Listing {
                    price: Some(i as i64),
                    ..Default::default()
                })
                .collect();
            Ok(ListingTable::with_stored_columns(rows))
        }
    }

    #[test]
    fn test_second_load_is_a_hit() {
        let store = FakeStore::new("a.sqlite");
        let mut cache = ListingCache::new();
        let first = cache.get_or_load(&store).unwrap();
        let second = cache.get_or_load(&store).unwrap();
        assert_eq!(store.loads.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_store_reloads_and_evicts_old_version() {
        let store = FakeStore::new("a.sqlite");
        let mut cache = ListingCache::new();
        assert_eq!(cache.get_or_load(&store).unwrap().len(), 1);

        store.version.set(3);
        assert_eq!(cache.get_or_load(&store).unwrap().len(), 3);
        assert_eq!(store.loads.get(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let store = FakeStore::new("a.sqlite");
        store.fail.set(true);
        let mut cache = ListingCache::new();
        assert!(cache.get_or_load(&store).is_err());
        assert!(cache.is_empty());

        store.fail.set(false);
        assert!(cache.get_or_load(&store).is_ok());
        assert_eq!(store.loads.get(), 2);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let a = FakeStore::new("a.sqlite");
        let b = FakeStore::new("b.sqlite");
        let mut cache = ListingCache::new();
        cache.get_or_load(&a).unwrap();
        cache.get_or_load(&b).unwrap();
        assert_eq!(cache.len(), 2);

        assert!(cache.invalidate(&a.identity()));
        assert!(!cache.invalidate(&a.identity()));
        cache.get_or_load(&a).unwrap();
        assert_eq!(a.loads.get(), 2);
        assert_eq!(b.loads.get(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
