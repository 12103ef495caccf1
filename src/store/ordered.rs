//! Observable positional sequence.

use std::fmt;
use std::sync::Arc;

use smallvec::smallvec;

use crate::change::{ChangeObserver, CollectionChange, FnObserver, Items, Observers};
use crate::error::{check_range, ReconcileResult};
use crate::reconcile::{EditCount, SequenceReconciler};

use super::{SequenceStore, StoreView};

/// Resizable, index-addressable sequence raising one notification per
/// mutation primitive.
///
/// # Example
///
/// ```
/// use tola_reconcile::{EditCount, OrderedStore};
///
/// let mut store = OrderedStore::from_vec("kitten".chars().collect());
/// let target: Vec<char> = "sitting".chars().collect();
///
/// assert_eq!(store.update(&target).unwrap(), EditCount::Exact(3));
/// assert_eq!(store.as_slice(), target.as_slice());
/// assert_eq!(store.len(), 7);
/// ```
pub struct OrderedStore<T> {
    items: Arc<Vec<T>>,
    observers: Observers<T>,
}

impl<T: Clone> OrderedStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create a store holding `items`.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(items),
            observers: Observers::new(),
        }
    }

    /// Register an observer.
    pub fn subscribe(&mut self, observer: impl ChangeObserver<T> + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Register a closure called with every collection change.
    pub fn on_change(&mut self, f: impl FnMut(&CollectionChange<T>) + 'static) {
        self.observers.push(Box::new(FnObserver(f)));
    }

    /// Read-only view sharing this store's storage.
    pub fn view(&self) -> StoreView<T> {
        StoreView::new(&self.items)
    }

    /// Current content.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the store holds no element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Copy the content out.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.to_vec()
    }

    /// Append one element.
    pub fn push(&mut self, item: T) {
        let index = self.items.len();
        self.storage().push(item.clone());
        self.observers.count_changed(index + 1);
        self.observers.notify(CollectionChange::Add {
            index,
            items: smallvec![item],
        });
    }

    /// Insert one element at `index`.
    pub fn insert(&mut self, index: usize, item: T) -> ReconcileResult<()> {
        self.insert_range(index, [item])
    }

    /// Remove and return the element at `index`.
    pub fn remove(&mut self, index: usize) -> ReconcileResult<T> {
        check_range(index, 1, self.items.len())?;
        let item = self.items[index].clone();
        self.remove_range(index, 1)?;
        Ok(item)
    }

    /// Overwrite the element at `index`.
    pub fn set(&mut self, index: usize, item: T) -> ReconcileResult<()> {
        self.set_range(index, [item])
    }

    /// Move one element from `old_index` to `new_index`.
    pub fn move_item(&mut self, old_index: usize, new_index: usize) -> ReconcileResult<()> {
        self.move_range(old_index, new_index, 1)
    }

    fn storage(&mut self) -> &mut Vec<T> {
        Arc::make_mut(&mut self.items)
    }
}

impl<T: Clone + PartialEq> OrderedStore<T> {
    /// Reconcile with `target` using `==`.
    pub fn update(&mut self, target: &[T]) -> ReconcileResult<EditCount> {
        SequenceReconciler::new().update(self, target)
    }
}

impl<T: Clone> OrderedStore<T> {
    /// Reconcile with `target` using a custom equality.
    pub fn update_by<F>(&mut self, target: &[T], comparer: F) -> ReconcileResult<EditCount>
    where
        F: Fn(&T, &T) -> bool,
    {
        SequenceReconciler::new().update_by(self, target, comparer)
    }

    /// Reconcile with `target`, merging substituted elements in place.
    pub fn update_with<F, M>(
        &mut self,
        target: &[T],
        comparer: F,
        item_merge: M,
    ) -> ReconcileResult<EditCount>
    where
        F: Fn(&T, &T) -> bool,
        M: FnMut(&mut T, &T),
    {
        SequenceReconciler::new().update_with(self, target, comparer, item_merge)
    }
}

impl<T: Clone> SequenceStore<T> for OrderedStore<T> {
    #[inline]
    fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn insert_range(&mut self, index: usize, items: impl IntoIterator<Item = T>) -> ReconcileResult<()> {
        check_range(index, 0, self.items.len())?;
        let block: Items<T> = items.into_iter().collect();
        if block.is_empty() {
            return Ok(());
        }

        let storage = self.storage();
        storage.splice(index..index, block.iter().cloned());
        let len = storage.len();

        self.observers.count_changed(len);
        self.observers.notify(CollectionChange::Add { index, items: block });
        Ok(())
    }

    fn remove_range(&mut self, index: usize, count: usize) -> ReconcileResult<()> {
        check_range(index, count, self.items.len())?;
        if count == 0 {
            return Ok(());
        }

        let storage = self.storage();
        let block: Items<T> = storage.drain(index..index + count).collect();
        let len = storage.len();

        self.observers.count_changed(len);
        self.observers.notify(CollectionChange::Remove { index, items: block });
        Ok(())
    }

    fn set_range(&mut self, index: usize, items: impl IntoIterator<Item = T>) -> ReconcileResult<()> {
        let block: Items<T> = items.into_iter().collect();
        check_range(index, block.len(), self.items.len())?;
        if block.is_empty() {
            return Ok(());
        }

        let storage = self.storage();
        let old_items: Items<T> = storage[index..index + block.len()]
            .iter_mut()
            .zip(block.iter().cloned())
            .map(|(slot, item)| std::mem::replace(slot, item))
            .collect();

        self.observers.notify(CollectionChange::Replace {
            index,
            old_items,
            new_items: block,
        });
        Ok(())
    }

    fn modify(&mut self, index: usize, f: impl FnOnce(&mut T)) -> ReconcileResult<()> {
        check_range(index, 1, self.items.len())?;

        let slot = &mut self.storage()[index];
        let old = slot.clone();
        f(slot);
        let new = slot.clone();

        self.observers.notify(CollectionChange::Replace {
            index,
            old_items: smallvec![old],
            new_items: smallvec![new],
        });
        Ok(())
    }

    fn move_range(&mut self, old_index: usize, new_index: usize, count: usize) -> ReconcileResult<()> {
        let len = self.items.len();
        check_range(old_index, count, len)?;
        check_range(new_index, count, len)?;
        if old_index == new_index || count == 0 {
            return Ok(());
        }

        let storage = self.storage();
        let block: Items<T> = storage.drain(old_index..old_index + count).collect();
        storage.splice(new_index..new_index, block.iter().cloned());

        self.observers.notify(CollectionChange::Move {
            old_index,
            new_index,
            items: block,
        });
        Ok(())
    }

    fn clear(&mut self) {
        let was_empty = self.items.is_empty();
        self.items = Arc::new(Vec::new());

        if !was_empty {
            self.observers.count_changed(0);
        }
        self.observers.notify(CollectionChange::Reset);
    }
}

impl<T: Clone> Default for OrderedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> From<Vec<T>> for OrderedStore<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Clone> FromIterator<T> for OrderedStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: fmt::Debug> fmt::Debug for OrderedStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedStore")
            .field("items", &self.items)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangeKind, ChangeLog};
    use crate::error::ReconcileError;

    fn logged(items: Vec<i32>) -> (OrderedStore<i32>, ChangeLog<i32>) {
        let log = ChangeLog::new();
        let mut store = OrderedStore::from_vec(items);
        store.subscribe(log.clone());
        (store, log)
    }

    #[test]
    fn test_insert_range_raises_single_add() {
        let (mut store, log) = logged(vec![1, 4]);
        store.insert_range(1, [2, 3]).unwrap();

        assert_eq!(store.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(log.counts(), vec![4]);
        assert_eq!(
            log.changes(),
            vec![CollectionChange::Add {
                index: 1,
                items: smallvec![2, 3]
            }]
        );
    }

    #[test]
    fn test_insert_at_end_and_past_end() {
        let (mut store, log) = logged(vec![1]);
        store.insert(1, 2).unwrap();
        assert_eq!(store.as_slice(), &[1, 2]);

        let err = store.insert(5, 9).unwrap_err();
        assert_eq!(err, ReconcileError::out_of_range(5, 0, 2));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_remove_range() {
        let (mut store, log) = logged(vec![1, 2, 3, 4]);
        store.remove_range(1, 2).unwrap();

        assert_eq!(store.as_slice(), &[1, 4]);
        assert_eq!(
            log.changes(),
            vec![CollectionChange::Remove {
                index: 1,
                items: smallvec![2, 3]
            }]
        );
        assert!(store.remove_range(1, 2).is_err());
    }

    #[test]
    fn test_set_range_keeps_count() {
        let (mut store, log) = logged(vec![1, 2, 3]);
        store.set_range(1, [20, 30]).unwrap();

        assert_eq!(store.as_slice(), &[1, 20, 30]);
        assert!(log.counts().is_empty());
        assert_eq!(
            log.changes(),
            vec![CollectionChange::Replace {
                index: 1,
                old_items: smallvec![2, 3],
                new_items: smallvec![20, 30]
            }]
        );
    }

    #[test]
    fn test_modify_reports_before_and_after() {
        let (mut store, log) = logged(vec![1, 2]);
        store.modify(0, |item| *item += 10).unwrap();

        assert_eq!(store.as_slice(), &[11, 2]);
        assert_eq!(
            log.changes(),
            vec![CollectionChange::Replace {
                index: 0,
                old_items: smallvec![1],
                new_items: smallvec![11]
            }]
        );
    }

    #[test]
    fn test_move_range() {
        let (mut store, log) = logged(vec![0, 1, 2, 3, 4]);
        store.move_range(0, 3, 2).unwrap();

        assert_eq!(store.as_slice(), &[2, 3, 4, 0, 1]);
        assert_eq!(
            log.changes(),
            vec![CollectionChange::Move {
                old_index: 0,
                new_index: 3,
                items: smallvec![0, 1]
            }]
        );
    }

    #[test]
    fn test_move_to_same_index_is_noop() {
        let (mut store, log) = logged(vec![0, 1, 2]);
        store.move_item(1, 1).unwrap();
        assert!(log.is_empty());
        assert!(store.move_item(0, 3).is_err());
    }

    #[test]
    fn test_clear_raises_reset() {
        let (mut store, log) = logged(vec![1, 2]);
        store.clear();

        assert!(store.is_empty());
        assert_eq!(log.counts(), vec![0]);
        assert_eq!(log.kinds(), vec![ChangeKind::Reset]);
    }

    #[test]
    fn test_empty_ranges_are_silent() {
        let (mut store, log) = logged(vec![1]);
        store.insert_range(0, std::iter::empty()).unwrap();
        store.remove_range(1, 0).unwrap();
        store.set_range(0, Vec::new()).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_push_appends_with_one_add() {
        let (mut store, log) = logged(vec![1, 2]);
        store.push(3);

        assert_eq!(store.len(), 3);
        assert_eq!(log.counts(), vec![3]);
        assert_eq!(
            log.changes(),
            vec![CollectionChange::Add {
                index: 2,
                items: smallvec![3]
            }]
        );
    }

    #[test]
    fn test_view_is_snapshot() {
        let mut store = OrderedStore::from_vec(vec![1, 2]);
        let view = store.view();
        store.push(3);

        assert_eq!(&*view, &[1, 2]);
        assert_eq!(store.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_on_change_closure() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut store = OrderedStore::new();
        store.on_change(move |change: &CollectionChange<char>| sink.borrow_mut().push(change.kind()));

        store.push('a');
        store.remove(0).unwrap();
        assert_eq!(*seen.borrow(), vec![ChangeKind::Add, ChangeKind::Remove]);
    }
}
