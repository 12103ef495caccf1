//! Observable key-ordered sequence with unique keys.
//!
//! Entries live in insertion order in a vector; a companion `FxHashMap`
//! maps every key to its current position. Structural primitives re-index
//! only the positions they shift, so an insert or remove at `index` costs
//! `O(len - index)` index updates.

use std::fmt;
use std::hash::Hash;
use std::ops::Range;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::smallvec;

use crate::change::{ChangeObserver, CollectionChange, FnObserver, Items, Observers};
use crate::error::{check_range, ReconcileError, ReconcileResult};
use crate::reconcile::{KeyedReconciler, KeyedStats};

use super::{KeyedStore, StoreView};

/// Ordered `(key, value)` sequence raising one notification per mutation
/// primitive.
///
/// # Example
///
/// ```
/// use tola_reconcile::KeyedOrderedStore;
///
/// let mut store = KeyedOrderedStore::new();
/// store.push("a", 1).unwrap();
/// store.push("b", 2).unwrap();
///
/// let stats = store.update(&[("b", 2), ("a", 1)]).unwrap();
/// assert_eq!(stats.moved, 1);
/// assert_eq!(store.keys().collect::<Vec<_>>(), vec![&"b", &"a"]);
/// ```
pub struct KeyedOrderedStore<K, V> {
    entries: Arc<Vec<(K, V)>>,
    index: FxHashMap<K, usize>,
    observers: Observers<(K, V)>,
}

impl<K, V> KeyedOrderedStore<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            index: FxHashMap::default(),
            observers: Observers::new(),
        }
    }

    /// Create a store from `entries`, rejecting repeated keys.
    pub fn from_entries(entries: Vec<(K, V)>) -> ReconcileResult<Self> {
        let mut index = FxHashMap::default();
        index.reserve(entries.len());
        for (pos, (key, _)) in entries.iter().enumerate() {
            if index.insert(key.clone(), pos).is_some() {
                return Err(ReconcileError::duplicate_key(pos));
            }
        }
        Ok(Self {
            entries: Arc::new(entries),
            index,
            observers: Observers::new(),
        })
    }

    /// Register an observer.
    pub fn subscribe(&mut self, observer: impl ChangeObserver<(K, V)> + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Register a closure called with every collection change.
    pub fn on_change(&mut self, f: impl FnMut(&CollectionChange<(K, V)>) + 'static) {
        self.observers.push(Box::new(FnObserver(f)));
    }

    /// Read-only view sharing this store's storage.
    pub fn view(&self) -> StoreView<(K, V)> {
        StoreView::new(&self.entries)
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Entry at `index`.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get(index).map(|(k, v)| (k, v))
    }

    /// Iterate over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Iterate over the values in order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Copy the entries out.
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.entries.to_vec()
    }

    /// Insert a new entry at `index`.
    pub fn insert(&mut self, index: usize, key: K, value: V) -> ReconcileResult<()> {
        self.insert_range(index, [(key, value)])
    }

    /// Append a new entry.
    pub fn push(&mut self, key: K, value: V) -> ReconcileResult<()> {
        let len = self.entries.len();
        self.insert(len, key, value)
    }

    /// Remove the entry under `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let pos = *self.index.get(key)?;
        let value = self.entries[pos].1.clone();
        self.remove_range(pos, 1).ok()?;
        Some(value)
    }

    /// Move the entry under `key` to `new_index`. Returns `false` if the key
    /// is absent.
    pub fn move_key(&mut self, key: &K, new_index: usize) -> ReconcileResult<bool> {
        let Some(&pos) = self.index.get(key) else {
            return Ok(false);
        };
        self.move_range(pos, new_index, 1)?;
        Ok(true)
    }

    /// Overwrite the value under `key`, returning the previous one.
    pub fn set_value(&mut self, key: &K, value: V) -> ReconcileResult<Option<V>> {
        let Some(&pos) = self.index.get(key) else {
            return Ok(None);
        };
        let mut previous = None;
        self.modify_entry(pos, |_, slot| previous = Some(std::mem::replace(slot, value)))?;
        Ok(previous)
    }

    /// Reconcile with `target`, overwriting retained values.
    pub fn update(&mut self, target: &[(K, V)]) -> ReconcileResult<KeyedStats> {
        KeyedReconciler::new().update(self, target)
    }

    /// Reconcile with `target`, copying key state through `key_updater`.
    pub fn update_keys(
        &mut self,
        target: &[(K, V)],
        key_updater: impl FnMut(&mut K, &K),
    ) -> ReconcileResult<KeyedStats> {
        KeyedReconciler::new()
            .with_key_updater(key_updater)
            .update(self, target)
    }

    /// Reconcile with `target`, merging retained values through `value_updater`.
    pub fn update_values(
        &mut self,
        target: &[(K, V)],
        value_updater: impl FnMut(&mut V, &V),
    ) -> ReconcileResult<KeyedStats> {
        KeyedReconciler::new()
            .with_value_updater(value_updater)
            .update(self, target)
    }

    /// Reconcile with `target` using both updaters.
    pub fn update_with(
        &mut self,
        target: &[(K, V)],
        key_updater: impl FnMut(&mut K, &K),
        value_updater: impl FnMut(&mut V, &V),
    ) -> ReconcileResult<KeyedStats> {
        KeyedReconciler::new()
            .with_key_updater(key_updater)
            .with_value_updater(value_updater)
            .update(self, target)
    }

    /// Check that the key index is a bijection onto `0..len`.
    pub fn index_is_consistent(&self) -> bool {
        self.index.len() == self.entries.len()
            && self
                .entries
                .iter()
                .enumerate()
                .all(|(pos, (key, _))| self.index.get(key) == Some(&pos))
    }

    fn storage(&mut self) -> &mut Vec<(K, V)> {
        Arc::make_mut(&mut self.entries)
    }

    /// Point every key in `range` at its current position.
    fn reindex(&mut self, range: Range<usize>) {
        for pos in range {
            let key = &self.entries[pos].0;
            match self.index.get_mut(key) {
                Some(slot) => *slot = pos,
                None => {
                    self.index.insert(key.clone(), pos);
                }
            }
        }
    }
}

impl<K, V> KeyedStore<K, V> for KeyedOrderedStore<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    #[inline]
    fn entries(&self) -> &[(K, V)] {
        &self.entries
    }

    #[inline]
    fn index_of(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    fn insert_range(
        &mut self,
        index: usize,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> ReconcileResult<()> {
        check_range(index, 0, self.entries.len())?;
        let block: Items<(K, V)> = entries.into_iter().collect();
        if block.is_empty() {
            return Ok(());
        }

        let mut seen = FxHashSet::default();
        for (offset, (key, _)) in block.iter().enumerate() {
            if self.index.contains_key(key) || !seen.insert(key) {
                return Err(ReconcileError::duplicate_key(index + offset));
            }
        }

        let storage = self.storage();
        storage.splice(index..index, block.iter().cloned());
        let len = storage.len();
        self.reindex(index..len);
        debug_assert!(self.index_is_consistent());

        self.observers.count_changed(len);
        self.observers.notify(CollectionChange::Add { index, items: block });
        Ok(())
    }

    fn remove_range(&mut self, index: usize, count: usize) -> ReconcileResult<()> {
        check_range(index, count, self.entries.len())?;
        if count == 0 {
            return Ok(());
        }

        let storage = self.storage();
        let block: Items<(K, V)> = storage.drain(index..index + count).collect();
        let len = storage.len();
        for (key, _) in &block {
            self.index.remove(key);
        }
        self.reindex(index..len);
        debug_assert!(self.index_is_consistent());

        self.observers.count_changed(len);
        self.observers.notify(CollectionChange::Remove { index, items: block });
        Ok(())
    }

    fn set_range(
        &mut self,
        index: usize,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> ReconcileResult<()> {
        let block: Items<(K, V)> = entries.into_iter().collect();
        let count = block.len();
        check_range(index, count, self.entries.len())?;
        if count == 0 {
            return Ok(());
        }

        let replaced = index..index + count;
        let mut seen = FxHashSet::default();
        for (offset, (key, _)) in block.iter().enumerate() {
            let outside = self
                .index
                .get(key)
                .is_some_and(|pos| !replaced.contains(pos));
            if outside || !seen.insert(key) {
                return Err(ReconcileError::duplicate_key(index + offset));
            }
        }

        let storage = self.storage();
        let old_items: Items<(K, V)> = storage[replaced.clone()]
            .iter_mut()
            .zip(block.iter().cloned())
            .map(|(slot, entry)| std::mem::replace(slot, entry))
            .collect();
        for (key, _) in &old_items {
            self.index.remove(key);
        }
        self.reindex(replaced);
        debug_assert!(self.index_is_consistent());

        self.observers.notify(CollectionChange::Replace {
            index,
            old_items,
            new_items: block,
        });
        Ok(())
    }

    fn modify_entry(&mut self, index: usize, f: impl FnOnce(&mut K, &mut V)) -> ReconcileResult<()> {
        check_range(index, 1, self.entries.len())?;

        let (key, value) = &mut self.storage()[index];
        let old = (key.clone(), value.clone());
        f(key, value);
        let new = (key.clone(), value.clone());

        if new.0 != old.0 {
            if self.index.contains_key(&new.0) {
                self.storage()[index] = old;
                return Err(ReconcileError::duplicate_key(index));
            }
            self.index.remove(&old.0);
            self.index.insert(new.0.clone(), index);
        }
        debug_assert!(self.index_is_consistent());

        self.observers.notify(CollectionChange::Replace {
            index,
            old_items: smallvec![old],
            new_items: smallvec![new],
        });
        Ok(())
    }

    fn move_range(&mut self, old_index: usize, new_index: usize, count: usize) -> ReconcileResult<()> {
        let len = self.entries.len();
        check_range(old_index, count, len)?;
        check_range(new_index, count, len)?;
        if old_index == new_index || count == 0 {
            return Ok(());
        }

        let storage = self.storage();
        let block: Items<(K, V)> = storage.drain(old_index..old_index + count).collect();
        storage.splice(new_index..new_index, block.iter().cloned());
        self.reindex(old_index.min(new_index)..old_index.max(new_index) + count);
        debug_assert!(self.index_is_consistent());

        self.observers.notify(CollectionChange::Move {
            old_index,
            new_index,
            items: block,
        });
        Ok(())
    }

    fn clear(&mut self) {
        let was_empty = self.entries.is_empty();
        self.entries = Arc::new(Vec::new());
        self.index.clear();

        if !was_empty {
            self.observers.count_changed(0);
        }
        self.observers.notify(CollectionChange::Reset);
    }
}

impl<K, V> Default for KeyedOrderedStore<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for KeyedOrderedStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedOrderedStore")
            .field("entries", &self.entries)
            .field("observers", &self.observers.len())
            .finish()
    }
}
