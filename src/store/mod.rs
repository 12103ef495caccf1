//! Observable stores and the mutation primitives the reconcilers drive.
//!
//! The reconcilers never touch a concrete collection type. They depend on
//! [`SequenceStore`] and [`KeyedStore`], whose primitives each apply one
//! atomic edit and raise exactly one notification:
//!
//! | Primitive | Notification |
//! |-----------|--------------|
//! | `insert_range` | `Add` (+ count changed) |
//! | `remove_range` | `Remove` (+ count changed) |
//! | `set_range` / `modify` | `Replace` |
//! | `move_range` | `Move` |
//! | `clear` | `Reset` (+ count changed if non-empty) |
//!
//! Empty ranges are accepted and raise nothing. Range violations return
//! [`ReconcileError::OutOfRange`](crate::ReconcileError::OutOfRange).

mod keyed;
mod ordered;

pub use keyed::KeyedOrderedStore;
pub use ordered::OrderedStore;

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::ReconcileResult;

// =============================================================================
// Mutation primitives
// =============================================================================

/// Mutation primitives of a positional sequence.
pub trait SequenceStore<T> {
    /// Current content.
    fn as_slice(&self) -> &[T];

    /// Number of elements.
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Check if the store holds no element.
    #[inline]
    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Insert `items` so the first lands at `index` (`index <= len`).
    fn insert_range(&mut self, index: usize, items: impl IntoIterator<Item = T>) -> ReconcileResult<()>;

    /// Remove `count` elements starting at `index`.
    fn remove_range(&mut self, index: usize, count: usize) -> ReconcileResult<()>;

    /// Overwrite the block starting at `index` with `items`.
    fn set_range(&mut self, index: usize, items: impl IntoIterator<Item = T>) -> ReconcileResult<()>;

    /// Edit the element at `index` in place.
    fn modify(&mut self, index: usize, f: impl FnOnce(&mut T)) -> ReconcileResult<()>;

    /// Move `count` elements from `old_index` so they start at `new_index`.
    ///
    /// `new_index` is relative to the sequence after the block was taken out.
    fn move_range(&mut self, old_index: usize, new_index: usize, count: usize) -> ReconcileResult<()>;

    /// Remove every element.
    fn clear(&mut self);
}

/// Mutation primitives of a key-ordered sequence with unique keys.
///
/// Implementations keep a key -> position index that is a bijection onto
/// `0..len` after every call.
pub trait KeyedStore<K, V> {
    /// Current entries in order.
    fn entries(&self) -> &[(K, V)];

    /// Number of entries.
    #[inline]
    fn len(&self) -> usize {
        self.entries().len()
    }

    /// Check if the store holds no entry.
    #[inline]
    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Position of `key`, if present.
    fn index_of(&self, key: &K) -> Option<usize>;

    /// Check if `key` is present.
    #[inline]
    fn contains_key(&self, key: &K) -> bool {
        self.index_of(key).is_some()
    }

    /// Insert `entries` at `index`. Fails without mutating if any key is
    /// already present or repeated within `entries`.
    fn insert_range(
        &mut self,
        index: usize,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> ReconcileResult<()>;

    /// Remove `count` entries starting at `index`.
    fn remove_range(&mut self, index: usize, count: usize) -> ReconcileResult<()>;

    /// Overwrite the block starting at `index`. New keys may only collide
    /// with keys inside the overwritten block.
    fn set_range(
        &mut self,
        index: usize,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> ReconcileResult<()>;

    /// Edit the entry at `index` in place.
    ///
    /// If `f` changes the key, the index follows it. A new key already held
    /// by another entry fails with `DuplicateKey` and restores the entry.
    fn modify_entry(&mut self, index: usize, f: impl FnOnce(&mut K, &mut V)) -> ReconcileResult<()>;

    /// Move `count` entries from `old_index` so they start at `new_index`.
    fn move_range(&mut self, old_index: usize, new_index: usize, count: usize) -> ReconcileResult<()>;

    /// Remove every entry.
    fn clear(&mut self);
}

// =============================================================================
// StoreView
// =============================================================================

/// Read-only view sharing a store's backing allocation.
///
/// Creating a view is an `Arc` clone. The view keeps the content it was
/// created with: the next mutation of the store copies the backing vector
/// instead of writing through the view.
pub struct StoreView<T>(Arc<Vec<T>>);

impl<T> StoreView<T> {
    pub(crate) fn new(items: &Arc<Vec<T>>) -> Self {
        Self(Arc::clone(items))
    }

    /// Content of the view.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }
}

impl<T> Clone for StoreView<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Deref for StoreView<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> AsRef<[T]> for StoreView<T> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for StoreView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Check if `target` is the store's own backing storage.
///
/// Reading the target while writing the store would observe half-applied
/// edits, so the reconcilers stop before touching either.
#[inline]
pub(crate) fn shares_storage<T>(store: &[T], target: &[T]) -> bool {
    std::ptr::eq(store.as_ptr(), target.as_ptr()) && store.len() == target.len()
}
