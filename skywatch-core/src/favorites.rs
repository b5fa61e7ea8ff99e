use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{error::StorageError, model::Location, storage::KeyValueStore};

/// Storage key holding the serialized favorites list.
pub const FAVORITES_KEY: &str = "favorites";

/// User-curated places, deduplicated by `(name, country)`, in insertion order.
///
/// Every mutation writes the whole resulting list to storage before it is
/// applied in memory. If the write fails the in-memory list is left as it was
/// and the error is returned.
#[derive(Debug)]
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStore>,
    entries: Mutex<Vec<Location>>,
}

impl FavoritesStore {
    /// Read the persisted list once. Missing or unreadable data yields an
    /// empty list.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let entries = match storage.get(FAVORITES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Location>>(&raw) {
                Ok(stored) => dedup(stored),
                Err(e) => {
                    warn!("Ignoring corrupt favorites: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read favorites: {e}");
                Vec::new()
            }
        };

        debug!(count = entries.len(), "favorites loaded");
        Self { storage, entries: Mutex::new(entries) }
    }

    /// Remove `location` if present, otherwise append it.
    /// Returns whether it is a favorite afterwards.
    pub fn toggle(&self, location: &Location) -> Result<bool, StorageError> {
        let mut now_favorite = false;
        self.mutate(|entries| {
            if let Some(pos) = entries.iter().position(|f| f.same_place(location)) {
                entries.remove(pos);
            } else {
                entries.push(location.clone());
                now_favorite = true;
            }
            true
        })?;
        Ok(now_favorite)
    }

    /// Append `location` unless it is already present. Returns whether it was added.
    pub fn add(&self, location: &Location) -> Result<bool, StorageError> {
        self.mutate(|entries| {
            if entries.iter().any(|f| f.same_place(location)) {
                return false;
            }
            entries.push(location.clone());
            true
        })
    }

    /// Remove `location` if present. Returns whether anything was removed.
    pub fn remove(&self, location: &Location) -> Result<bool, StorageError> {
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|f| !f.same_place(location));
            entries.len() != before
        })
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.mutate(|entries| {
            let changed = !entries.is_empty();
            entries.clear();
            changed
        })?;
        Ok(())
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.entries.lock().iter().any(|f| f.same_place(location))
    }

    pub fn list(&self) -> Vec<Location> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Apply `f` to a copy and, if it reports a change, persist the copy and
    /// swap it in. The lock is held throughout so read-modify-persist never
    /// interleaves.
    fn mutate(&self, f: impl FnOnce(&mut Vec<Location>) -> bool) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        if !f(&mut next) {
            return Ok(false);
        }

        let raw = serde_json::to_string(&next)?;
        self.storage.set(FAVORITES_KEY, &raw)?;

        *entries = next;
        Ok(true)
    }
}

fn dedup(stored: Vec<Location>) -> Vec<Location> {
    let mut out: Vec<Location> = Vec::with_capacity(stored.len());
    for location in stored {
        if !out.iter().any(|f| f.same_place(&location)) {
            out.push(location);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        storage::{FileStore, MemoryStore},
        testing::{paris, tokyo},
    };

    fn names(store: &FavoritesStore) -> Vec<String> {
        store.list().iter().map(Location::label).collect()
    }

    #[derive(Debug, Default)]
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[derive(Debug, Default)]
    struct UnreadableStore;

    impl KeyValueStore for UnreadableStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(std::io::Error::other("disk on fire").into())
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn toggle_twice_is_a_no_op() {
        let store = FavoritesStore::load(Arc::new(MemoryStore::new()));
        store.toggle(&tokyo()).expect("toggle");
        let before = store.list();

        assert!(store.toggle(&paris()).expect("toggle"));
        assert!(!store.toggle(&paris()).expect("toggle"));
        assert_eq!(store.list(), before);
    }

    #[test]
    fn toggle_distinct_locations_keeps_insertion_order() {
        let store = FavoritesStore::load(Arc::new(MemoryStore::new()));
        store.toggle(&paris()).expect("toggle");
        store.toggle(&tokyo()).expect("toggle");

        assert_eq!(names(&store), vec!["Paris, France", "Tokyo, Japan"]);
    }

    #[test]
    fn toggle_matches_by_name_and_country_only() {
        let store = FavoritesStore::load(Arc::new(MemoryStore::new()));
        store.toggle(&paris()).expect("toggle");

        let moved = Location::new("Paris", "France", 0.0, 0.0);
        assert!(!store.toggle(&moved).expect("toggle"));
        assert!(store.is_empty());
    }

    #[test]
    fn add_and_remove_are_idempotent() {
        let store = FavoritesStore::load(Arc::new(MemoryStore::new()));
        assert!(store.add(&paris()).expect("add"));
        assert!(!store.add(&paris()).expect("add"));
        assert_eq!(store.len(), 1);

        assert!(!store.remove(&tokyo()).expect("remove absent"));
        assert!(store.remove(&paris()).expect("remove"));
        assert!(!store.contains(&paris()));
    }

    #[test]
    fn every_mutation_is_persisted() {
        let storage = Arc::new(MemoryStore::new());
        let store = FavoritesStore::load(storage.clone());

        store.toggle(&paris()).expect("toggle");
        let raw = storage.get(FAVORITES_KEY).expect("get").expect("written");
        assert!(raw.contains("Paris"));

        store.toggle(&tokyo()).expect("toggle");
        store.toggle(&paris()).expect("toggle off");
        let raw = storage.get(FAVORITES_KEY).expect("get").expect("written");
        assert!(!raw.contains("Paris"));
        assert!(raw.contains("Tokyo"));

        store.clear().expect("clear");
        assert_eq!(storage.get(FAVORITES_KEY).expect("get").as_deref(), Some("[]"));
    }

    #[test]
    fn reload_yields_identical_ordered_set_with_coordinates() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let store = FavoritesStore::load(Arc::new(FileStore::in_dir(dir.path())));
            store.toggle(&paris()).expect("toggle");
            store.toggle(&tokyo()).expect("toggle");
        }

        let reloaded = FavoritesStore::load(Arc::new(FileStore::in_dir(dir.path())));
        let list = reloaded.list();
        assert_eq!(list, vec![paris(), tokyo()]);
        assert_eq!(list[0].lat(), paris().lat());
        assert_eq!(list[1].lon(), tokyo().lon());
    }

    #[test]
    fn corrupt_or_unreadable_storage_starts_empty() {
        let corrupt = FavoritesStore::load(Arc::new(MemoryStore::with_entry(FAVORITES_KEY, "{oops")));
        assert!(corrupt.is_empty());

        let unreadable = FavoritesStore::load(Arc::new(UnreadableStore));
        assert!(unreadable.is_empty());
    }

    #[test]
    fn stored_duplicates_collapse_first_wins() {
        let raw = r#"[
            {"name":"Paris","country":"France","lat":1.0,"lon":1.0},
            {"name":"Paris","country":"France","lat":2.0,"lon":2.0}
        ]"#;
        let store = FavoritesStore::load(Arc::new(MemoryStore::with_entry(FAVORITES_KEY, raw)));
        let list = store.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].lat(), 1.0);
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let store = FavoritesStore::load(Arc::new(ReadOnlyStore));
        assert!(store.toggle(&paris()).is_err());
        assert!(store.is_empty());
    }
}
