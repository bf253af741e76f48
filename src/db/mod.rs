//! In-memory record stores.
//!
//! Handlers never touch a map directly; they go through the [`Store`] trait so
//! a persistent backend can replace [`MemoryStore`] without touching them.
//! Every check-then-set a handler needs is done inside a single
//! [`Store::modify`] call, which holds the store's write lock for the duration
//! of the closure.

mod models;
mod seeders;

pub use models::*;
pub use seeders::*;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("a record with this key already exists")]
    Duplicate,
}

/// Keys that a store can allocate on its own.
pub trait StoreKey: Ord + Clone + Send + Sync + 'static {
    /// Pick a key for which `taken` returns false.
    fn next_free(taken: &dyn Fn(&Self) -> bool) -> Self;
}

/// Integer ids: the lowest non-negative id not currently in use.
impl StoreKey for u64 {
    fn next_free(taken: &dyn Fn(&Self) -> bool) -> Self {
        let mut id = 0;
        while taken(&id) {
            id += 1;
        }
        id
    }
}

/// String ids: random UUID v4, redrawn on the (unlikely) collision.
impl StoreKey for String {
    fn next_free(taken: &dyn Fn(&Self) -> bool) -> Self {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !taken(&id) {
                return id;
            }
        }
    }
}

/// Allocate the next key in a map owned by a record (per-user notes, expenses...).
pub fn next_key<K: StoreKey, V>(map: &BTreeMap<K, V>) -> K {
    K::next_free(&|key| map.contains_key(key))
}

pub trait Store<K: StoreKey, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;

    fn contains(&self, key: &K) -> bool;

    /// Insert a new record, failing if the key is already present.
    fn insert(&self, key: K, value: V) -> Result<(), StoreError>;

    /// Insert or replace, returning the previous record.
    fn put(&self, key: K, value: V) -> Option<V>;

    fn remove(&self, key: &K) -> Option<V>;

    /// Records matching `filter`, in key order.
    fn scan(&self, filter: &dyn Fn(&K, &V) -> bool) -> Vec<V>;

    /// Mutate a record in place under the write lock. Returns false if absent.
    fn modify(&self, key: &K, f: &mut dyn FnMut(&mut V)) -> bool;

    /// Allocate a fresh key and store the record built for it.
    fn insert_next(&self, build: &mut dyn FnMut(&K) -> V) -> V;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: StoreKey, V> dyn Store<K, V> + '_ {
    /// [`Store::modify`] for closures that produce a value.
    pub fn update<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut f = Some(f);
        let mut result = None;
        self.modify(key, &mut |value| {
            if let Some(f) = f.take() {
                result = Some(f(value));
            }
        });
        result
    }

    pub fn all(&self) -> Vec<V> {
        self.scan(&|_, _| true)
    }
}

pub type SharedStore<K, V> = Arc<dyn Store<K, V>>;

/// Process-lifetime store over an ordered map.
pub struct MemoryStore<K, V> {
    records: RwLock<BTreeMap<K, V>>,
}

impl<K: StoreKey, V: Clone + Send + Sync + 'static> MemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn shared() -> SharedStore<K, V> {
        Arc::new(Self::new())
    }
}

impl<K: StoreKey, V: Clone + Send + Sync + 'static> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StoreKey, V: Clone + Send + Sync + 'static> Store<K, V> for MemoryStore<K, V> {
    fn get(&self, key: &K) -> Option<V> {
        self.records.read().get(key).cloned()
    }

    fn contains(&self, key: &K) -> bool {
        self.records.read().contains_key(key)
    }

    fn insert(&self, key: K, value: V) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.contains_key(&key) {
            return Err(StoreError::Duplicate);
        }
        records.insert(key, value);
        Ok(())
    }

    fn put(&self, key: K, value: V) -> Option<V> {
        self.records.write().insert(key, value)
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.records.write().remove(key)
    }

    fn scan(&self, filter: &dyn Fn(&K, &V) -> bool) -> Vec<V> {
        self.records
            .read()
            .iter()
            .filter(|(key, value)| filter(key, value))
            .map(|(_, value)| value.clone())
            .collect()
    }

    fn modify(&self, key: &K, f: &mut dyn FnMut(&mut V)) -> bool {
        match self.records.write().get_mut(key) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    fn insert_next(&self, build: &mut dyn FnMut(&K) -> V) -> V {
        let mut records = self.records.write();
        let key = next_key(&records);
        let value = build(&key);
        records.insert(key, value.clone());
        value
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }
}

/// A flag that may go from unset to set exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OneShot(bool);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("already claimed")]
pub struct AlreadyClaimed;

impl OneShot {
    pub fn is_set(&self) -> bool {
        self.0
    }

    pub fn claim(&mut self) -> Result<(), AlreadyClaimed> {
        if self.0 {
            return Err(AlreadyClaimed);
        }
        self.0 = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(store: &dyn Store<u64, (u64, &'static str)>) -> Vec<u64> {
        store.all().into_iter().map(|(id, _)| id).collect()
    }

    #[test]
    fn test_u64_keys_start_at_zero_and_fill_gaps() {
        let store: SharedStore<u64, (u64, &'static str)> = MemoryStore::shared();
        for name in ["a", "b", "c"] {
            store.insert_next(&mut |id| (*id, name));
        }
        assert_eq!(ids(store.as_ref()), vec![0, 1, 2]);

        store.remove(&1);
        let fourth = store.insert_next(&mut |id| (*id, "d"));
        assert_eq!(fourth.0, 1);

        let fifth = store.insert_next(&mut |id| (*id, "e"));
        assert_eq!(fifth.0, 3);
    }

    #[test]
    fn test_next_key_for_nested_maps() {
        let mut map = BTreeMap::new();
        assert_eq!(next_key::<u64, ()>(&map), 0);
        map.insert(0u64, ());
        map.insert(2u64, ());
        assert_eq!(next_key(&map), 1);
    }

    #[test]
    fn test_string_keys_are_uuids() {
        let store: SharedStore<String, String> = MemoryStore::shared();
        let a = store.insert_next(&mut |id| id.clone());
        let b = store.insert_next(&mut |id| id.clone());
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let store: SharedStore<String, u32> = MemoryStore::shared();
        store.insert("alice".to_string(), 1).unwrap();
        assert_eq!(store.insert("alice".to_string(), 2), Err(StoreError::Duplicate));
        assert_eq!(store.get(&"alice".to_string()), Some(1));
    }

    #[test]
    fn test_update_reports_missing_keys() {
        let store: SharedStore<u64, u32> = MemoryStore::shared();
        store.put(7, 10);

        assert_eq!(store.update(&7, |v| {
            *v += 1;
            *v
        }), Some(11));
        assert_eq!(store.update(&8, |v| *v), None);
        assert_eq!(store.get(&7), Some(11));
    }

    #[test]
    fn test_scan_filters_in_key_order() {
        let store: SharedStore<u64, u64> = MemoryStore::shared();
        for n in [5, 1, 3, 2] {
            store.put(n, n * 10);
        }
        assert_eq!(store.scan(&|_, v| *v >= 20), vec![20, 30, 50]);
    }

    #[test]
    fn test_one_shot_claims_once() {
        let mut flag = OneShot::default();
        assert!(!flag.is_set());
        assert_eq!(flag.claim(), Ok(()));
        assert!(flag.is_set());
        assert_eq!(flag.claim(), Err(AlreadyClaimed));
        assert_eq!(serde_json::to_value(flag).unwrap(), serde_json::json!(true));
    }
}
