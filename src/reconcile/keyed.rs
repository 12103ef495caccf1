//! Key-identity reconciliation.
//!
//! # Algorithm
//!
//! 1. **Prune**: walk the store from the back and remove every entry whose
//!    key is not in the target. Survivors keep their relative order.
//! 2. **Align**: for each target position `i`, the entry with the expected
//!    key is either already at `i`, somewhere after `i` (one `Move`), or
//!    missing (one `Insert`). Retained entries are then synchronized in
//!    place with a single `Replace`.
//!
//! A key present on both sides is always relocated with `Move`, never with
//! `Remove` + `Insert`, so observers keep the identity of the entry.
//!
//! # Complexity
//!
//! - Time: O(n + m) lookups, plus the store's re-indexing of shifted entries
//! - Space: O(m) for the target key set
//!
//! The edit count is plausible but not globally minimal: rotating
//! `[a, b, c, d]` into `[b, c, d, a]` takes three moves where one would do.
//! Exact minimisation would cost O(n * m).

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::error::{ReconcileError, ReconcileResult};
use crate::store::{shares_storage, KeyedStore};

/// Statistics from a keyed reconciliation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct KeyedStats {
    /// Number of entries removed in the prune phase
    pub removed: usize,
    /// Number of entries moved into place
    pub moved: usize,
    /// Number of entries inserted
    pub inserted: usize,
    /// Number of retained entries synchronized in place
    pub synced: usize,
}

impl KeyedStats {
    /// Total number of structural edits (value synchronizations excluded)
    pub fn edit_count(&self) -> usize {
        self.removed + self.moved + self.inserted
    }

    /// Check if no structural edit was needed
    pub fn is_empty(&self) -> bool {
        self.edit_count() == 0
    }
}

type KeyUpdater<'f, K> = Box<dyn FnMut(&mut K, &K) + 'f>;
type ValueUpdater<'f, V> = Box<dyn FnMut(&mut V, &V) + 'f>;

/// Reconciler for key-ordered stores.
///
/// ```
/// use tola_reconcile::{KeyedOrderedStore, KeyedReconciler};
///
/// let mut store = KeyedOrderedStore::from_entries(vec![(1, 10), (2, 20)]).unwrap();
/// let stats = KeyedReconciler::new()
///     .with_value_updater(|old: &mut i32, new: &i32| *old += *new)
///     .update(&mut store, &[(2, 1), (1, 1)])
///     .unwrap();
///
/// assert_eq!(stats.moved, 1);
/// assert_eq!(store.to_vec(), vec![(2, 21), (1, 11)]);
/// ```
pub struct KeyedReconciler<'f, K, V> {
    key_updater: Option<KeyUpdater<'f, K>>,
    value_updater: Option<ValueUpdater<'f, V>>,
}

impl<'f, K, V> KeyedReconciler<'f, K, V> {
    /// Create a reconciler that overwrites retained values.
    pub fn new() -> Self {
        Self {
            key_updater: None,
            value_updater: None,
        }
    }

    /// Copy auxiliary state from the target key onto the retained key.
    ///
    /// If the updater changes what the key compares as, the store re-keys the
    /// entry; a key already held by another entry fails with `DuplicateKey`.
    pub fn with_key_updater(mut self, f: impl FnMut(&mut K, &K) + 'f) -> Self {
        self.key_updater = Some(Box::new(f));
        self
    }

    /// Merge the target value into the retained value instead of
    /// overwriting it.
    pub fn with_value_updater(mut self, f: impl FnMut(&mut V, &V) + 'f) -> Self {
        self.value_updater = Some(Box::new(f));
        self
    }
}

impl<K, V> KeyedReconciler<'_, K, V>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    /// Make `store` equal to `target`.
    ///
    /// Fails with [`ReconcileError::DuplicateKey`] before touching the store
    /// if `target` repeats a key.
    pub fn update<S>(&mut self, store: &mut S, target: &[(K, V)]) -> ReconcileResult<KeyedStats>
    where
        S: KeyedStore<K, V>,
    {
        if shares_storage(store.entries(), target) {
            debug!(len = target.len(), "target is the store itself, nothing to reconcile");
            return Ok(KeyedStats::default());
        }

        let mut target_keys = FxHashSet::default();
        target_keys.reserve(target.len());
        for (pos, (key, _)) in target.iter().enumerate() {
            if !target_keys.insert(key) {
                return Err(ReconcileError::duplicate_key(pos));
            }
        }

        let mut stats = KeyedStats::default();

        // Phase 1: prune
        for pos in (0..store.len()).rev() {
            if !target_keys.contains(&store.entries()[pos].0) {
                trace!(index = pos, "remove");
                store.remove_range(pos, 1)?;
                stats.removed += 1;
            }
        }

        // Phase 2: align
        for (i, (key, value)) in target.iter().enumerate() {
            let in_place = store.entries().get(i).is_some_and(|(k, _)| k == key);
            if !in_place {
                match store.index_of(key) {
                    Some(pos) => {
                        debug_assert!(pos > i, "positions before {i} are already aligned");
                        trace!(from = pos, to = i, "move");
                        store.move_range(pos, i, 1)?;
                        stats.moved += 1;
                    }
                    None => {
                        trace!(index = i, "insert");
                        store.insert_range(i, [(key.clone(), value.clone())])?;
                        stats.inserted += 1;
                        continue;
                    }
                }
            }

            self.sync(store, i, key, value)?;
            stats.synced += 1;
        }

        debug_assert_eq!(store.len(), target.len());
        debug!(
            removed = stats.removed,
            moved = stats.moved,
            inserted = stats.inserted,
            synced = stats.synced,
            "keyed store reconciled"
        );
        Ok(stats)
    }

    /// Bring the retained entry at `index` up to date with the target entry.
    fn sync<S>(&mut self, store: &mut S, index: usize, key: &K, value: &V) -> ReconcileResult<()>
    where
        S: KeyedStore<K, V>,
    {
        let key_updater = &mut self.key_updater;
        let value_updater = &mut self.value_updater;
        store.modify_entry(index, |retained_key, retained_value| {
            if let Some(update) = key_updater {
                update(retained_key, key);
            }
            match value_updater {
                Some(update) => update(retained_value, value),
                None => retained_value.clone_from(value),
            }
        })
    }
}

impl<K, V> Default for KeyedReconciler<'_, K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for KeyedReconciler<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedReconciler")
            .field("key_updater", &self.key_updater.is_some())
            .field("value_updater", &self.value_updater.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangeKind, ChangeLog, CollectionChange};
    use crate::store::KeyedOrderedStore;
    use proptest::prelude::*;

    type Store = KeyedOrderedStore<u32, i32>;

    fn logged(entries: &[(u32, i32)]) -> (Store, ChangeLog<(u32, i32)>) {
        let log = ChangeLog::new();
        let mut store = Store::from_entries(entries.to_vec()).unwrap();
        store.subscribe(log.clone());
        (store, log)
    }

    #[test]
    fn test_rotation_moves_once_and_syncs_all() {
        let (mut store, log) = logged(&[(0, 0), (1, 1), (2, 2)]);
        let target = [(2, 2), (0, 0), (1, 1)];

        let stats = store.update(&target).unwrap();

        assert_eq!(store.to_vec(), target.to_vec());
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.inserted, 0);
        assert_eq!(stats.edit_count(), 1);
        assert_eq!(stats.synced, 3);
        // Every retained entry is synchronized, unchanged values included
        assert_eq!(
            log.kinds(),
            vec![
                ChangeKind::Move,
                ChangeKind::Replace,
                ChangeKind::Replace,
                ChangeKind::Replace,
            ]
        );
    }

    #[test]
    fn test_prune_move_insert() {
        let (mut store, log) = logged(&[(1, 1), (2, 2), (3, 3), (4, 4)]);
        let target = [(4, 40), (9, 90), (2, 20)];

        let stats = store.update(&target).unwrap();

        assert_eq!(store.to_vec(), target.to_vec());
        assert_eq!(
            stats,
            KeyedStats {
                removed: 2,
                moved: 1,
                inserted: 1,
                synced: 2
            }
        );
        assert_eq!(
            log.kinds(),
            vec![
                ChangeKind::Remove,
                ChangeKind::Remove,
                ChangeKind::Move,
                ChangeKind::Replace,
                ChangeKind::Add,
                ChangeKind::Replace,
            ]
        );
        // Prune runs back to front
        let removed: Vec<_> = log
            .changes()
            .iter()
            .filter_map(|change| match change {
                CollectionChange::Remove { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(removed, vec![2, 0]);
    }

    #[test]
    fn test_shared_keys_never_removed_or_inserted() {
        let (mut store, log) = logged(&[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]);
        let target = [(5, 0), (3, 0), (6, 0), (1, 0), (2, 0)];

        let _ = store.update(&target).unwrap();

        for change in log.changes() {
            match change {
                CollectionChange::Remove { items, .. } => {
                    assert!(items.iter().all(|(key, _)| *key == 4), "{items:?}");
                }
                CollectionChange::Add { items, .. } => {
                    assert!(items.iter().all(|(key, _)| *key == 6), "{items:?}");
                }
                _ => {}
            }
        }
        assert_eq!(store.to_vec(), target.to_vec());
        assert!(store.index_is_consistent());
    }

    #[test]
    fn test_empty_target_removes_everything() {
        let (mut store, log) = logged(&[(1, 1), (2, 2)]);
        let stats = store.update(&[]).unwrap();

        assert!(store.is_empty());
        assert_eq!(stats.removed, 2);
        assert_eq!(log.kinds(), vec![ChangeKind::Remove, ChangeKind::Remove]);
    }

    #[test]
    fn test_empty_store_inserts_in_order() {
        let (mut store, log) = logged(&[]);
        let target = [(7, 0), (8, 0), (9, 0)];

        let stats = store.update(&target).unwrap();

        assert_eq!(stats.inserted, 3);
        assert_eq!(stats.synced, 0);
        let indices: Vec<_> = log.changes().iter().filter_map(CollectionChange::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_self_reference_is_noop() {
        let (mut store, log) = logged(&[(1, 1), (2, 2)]);
        let view = store.view();

        let stats = store.update(&view).unwrap();

        assert_eq!(stats, KeyedStats::default());
        assert!(log.is_empty());
    }

    #[test]
    fn test_duplicate_target_key_rejected_before_mutation() {
        let (mut store, log) = logged(&[(1, 1), (2, 2)]);
        let err = store.update(&[(3, 3), (3, 4)]).unwrap_err();

        assert_eq!(err, ReconcileError::duplicate_key(1));
        assert_eq!(store.to_vec(), vec![(1, 1), (2, 2)]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_value_updater_merges() {
        let (mut store, _log) = logged(&[(1, 100), (2, 200)]);
        let target = [(2, 2), (3, 3)];

        let stats = store
            .update_values(&target, |retained, incoming| *retained += *incoming)
            .unwrap();

        // Retained 2 merges, new 3 is inserted as-is
        assert_eq!(store.to_vec(), vec![(2, 202), (3, 3)]);
        assert_eq!(stats.synced, 1);
        assert_eq!(stats.edit_count(), 2);
    }

    #[derive(Debug, Clone)]
    struct Tag {
        id: u32,
        label: String,
    }

    impl PartialEq for Tag {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    impl Eq for Tag {}

    impl Hash for Tag {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    fn tag(id: u32, label: &str) -> Tag {
        Tag {
            id,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_key_updater_transfers_state() {
        let mut store = KeyedOrderedStore::from_entries(vec![(tag(1, "old"), 'a')]).unwrap();
        let target = [(tag(1, "new"), 'b')];

        let stats = store
            .update_keys(&target, |retained, incoming| {
                retained.label.clone_from(&incoming.label)
            })
            .unwrap();

        assert!(stats.is_empty());
        let (key, value) = store.get_index(0).unwrap();
        assert_eq!(key.label, "new");
        assert_eq!(*value, 'b');
        assert!(store.index_is_consistent());
    }

    #[test]
    fn test_key_updater_changing_identity_keeps_index() {
        let mut store = KeyedOrderedStore::from_entries(vec![(1u32, 'x'), (2, 'y')]).unwrap();

        let stats = store
            .update_keys(&[(1, 'a'), (2, 'b')], |retained, _| *retained += 100)
            .unwrap();

        assert_eq!(stats.synced, 2);
        assert_eq!(store.to_vec(), vec![(101, 'a'), (102, 'b')]);
        assert_eq!(store.index_of(&101), Some(0));
        assert_eq!(store.index_of(&1), None);
        assert!(store.index_is_consistent());
    }

    #[test]
    fn test_key_updater_collision_fails() {
        let mut store = KeyedOrderedStore::from_entries(vec![(1u32, 'x'), (2, 'y')]).unwrap();

        let err = store
            .update_keys(&[(1, 'a'), (2, 'b')], |retained, _| *retained = 2)
            .unwrap_err();

        assert_eq!(err, ReconcileError::duplicate_key(0));
        assert!(store.index_is_consistent());
        assert_eq!(store.to_vec(), vec![(1, 'x'), (2, 'y')]);
    }

    #[test]
    fn test_both_updaters() {
        let mut store =
            KeyedOrderedStore::from_entries(vec![(tag(1, "x"), vec![1]), (tag(2, "y"), vec![2])])
                .unwrap();
        let target = [(tag(2, "Y"), vec![20]), (tag(1, "X"), vec![10])];

        let stats = store
            .update_with(
                &target,
                |retained, incoming| retained.label.clone_from(&incoming.label),
                |retained, incoming| retained.extend_from_slice(incoming),
            )
            .unwrap();

        assert_eq!(stats.moved, 1);
        assert_eq!(stats.synced, 2);
        let labels: Vec<_> = store.keys().map(|key| key.label.as_str()).collect();
        assert_eq!(labels, vec!["Y", "X"]);
        let values: Vec<_> = store.values().cloned().collect();
        assert_eq!(values, vec![vec![2, 20], vec![1, 10]]);
    }

    #[test]
    fn test_reconciler_is_not_minimal_for_rotations() {
        let (mut store, _log) = logged(&[(1, 0), (2, 0), (3, 0), (4, 0)]);
        let stats = store.update(&[(2, 0), (3, 0), (4, 0), (1, 0)]).unwrap();

        assert_eq!(stats.moved, 3);
    }

    proptest! {
        #[test]
        fn prop_keyed_store_equals_target(
            source in proptest::collection::hash_map(0u32..24, any::<i32>(), 0..16),
            target in proptest::collection::hash_map(0u32..24, any::<i32>(), 0..16),
        ) {
            let source: Vec<_> = source.into_iter().collect();
            let target: Vec<_> = target.into_iter().collect();
            let shared = source.iter().filter(|(key, _)| target.iter().any(|(k, _)| k == key)).count();
            let (mut store, log) = logged(&source);

            let stats = store.update(&target).unwrap();

            prop_assert_eq!(store.to_vec(), target.clone());
            prop_assert!(store.index_is_consistent());
            prop_assert_eq!(stats.removed, source.len() - shared);
            prop_assert_eq!(stats.inserted, target.len() - shared);
            prop_assert_eq!(stats.synced, shared);
            let structural = log.kinds().iter().filter(|kind| **kind != ChangeKind::Replace).count();
            prop_assert_eq!(structural, stats.edit_count());
        }
    }
}
