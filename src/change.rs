//! Change notifications raised by the stores.
//!
//! Every mutation primitive raises exactly one [`CollectionChange`]. Stores
//! that change length additionally report the new length through
//! [`ChangeObserver::count_changed`] before the collection change.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

// =============================================================================
// Notification types
// =============================================================================

/// Block of items carried by a notification.
///
/// Reconciliation edits touch one element at a time, so a single inline
/// slot avoids a heap allocation per notification.
pub type Items<T> = SmallVec<[T; 1]>;

/// Kind of a collection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Add,
    Remove,
    Replace,
    Move,
    Reset,
}

/// A granular collection change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange<T> {
    /// `items` were inserted starting at `index`
    Add { index: usize, items: Items<T> },
    /// `items` were removed starting at `index`
    Remove { index: usize, items: Items<T> },
    /// The block at `index` was overwritten
    Replace {
        index: usize,
        old_items: Items<T>,
        new_items: Items<T>,
    },
    /// `items` moved from `old_index` to `new_index`
    Move {
        old_index: usize,
        new_index: usize,
        items: Items<T>,
    },
    /// The whole collection was cleared
    Reset,
}

impl<T> CollectionChange<T> {
    /// Get the kind of this change
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Add { .. } => ChangeKind::Add,
            Self::Remove { .. } => ChangeKind::Remove,
            Self::Replace { .. } => ChangeKind::Replace,
            Self::Move { .. } => ChangeKind::Move,
            Self::Reset => ChangeKind::Reset,
        }
    }

    /// Start index of the change (`new_index` for moves, `None` for resets)
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Add { index, .. } | Self::Remove { index, .. } | Self::Replace { index, .. } => {
                Some(*index)
            }
            Self::Move { new_index, .. } => Some(*new_index),
            Self::Reset => None,
        }
    }

    /// Check if this change altered the collection length
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Add { .. } | Self::Remove { .. } | Self::Reset)
    }
}

// =============================================================================
// Observers
// =============================================================================

/// Receiver of store notifications.
///
/// Observers run synchronously inside the mutating call, in the order the
/// edits are applied. Forwarding to another thread is up to the observer.
pub trait ChangeObserver<T> {
    /// Called once per applied mutation primitive.
    fn collection_changed(&mut self, change: &CollectionChange<T>);

    /// Called before `collection_changed` whenever the length changed.
    fn count_changed(&mut self, _count: usize) {}
}

/// Adapter turning a closure into an observer.
pub(crate) struct FnObserver<F>(pub(crate) F);

impl<T, F> ChangeObserver<T> for FnObserver<F>
where
    F: FnMut(&CollectionChange<T>),
{
    fn collection_changed(&mut self, change: &CollectionChange<T>) {
        (self.0)(change)
    }
}

/// Registered observers of one store.
pub(crate) struct Observers<T> {
    inner: Vec<Box<dyn ChangeObserver<T>>>,
}

impl<T> Observers<T> {
    pub(crate) fn new() -> Self {
        Self { inner: Vec::new() }
    }

    pub(crate) fn push(&mut self, observer: Box<dyn ChangeObserver<T>>) {
        self.inner.push(observer);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    pub(crate) fn count_changed(&mut self, count: usize) {
        for observer in &mut self.inner {
            observer.count_changed(count);
        }
    }

    pub(crate) fn notify(&mut self, change: CollectionChange<T>) {
        for observer in &mut self.inner {
            observer.collection_changed(&change);
        }
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("len", &self.inner.len()).finish()
    }
}

// =============================================================================
// ChangeLog - shared recorder
// =============================================================================

#[derive(Debug)]
struct LogInner<T> {
    changes: Vec<CollectionChange<T>>,
    counts: Vec<usize>,
}

/// Cloneable recorder of notifications.
///
/// Clones share the same log, so one handle can be registered on a store
/// while another is kept for inspection.
///
/// ```
/// use tola_reconcile::{ChangeKind, ChangeLog, OrderedStore};
///
/// let log = ChangeLog::new();
/// let mut store: OrderedStore<i32> = OrderedStore::new();
/// store.subscribe(log.clone());
/// store.update(&[1, 2, 3]).unwrap();
/// assert_eq!(log.kinds(), vec![ChangeKind::Add; 3]);
/// ```
#[derive(Debug)]
pub struct ChangeLog<T> {
    inner: Arc<Mutex<LogInner<T>>>,
}

impl<T> Clone for ChangeLog<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ChangeLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ChangeLog<T> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogInner {
                changes: Vec::new(),
                counts: Vec::new(),
            })),
        }
    }

    /// Number of recorded collection changes.
    pub fn len(&self) -> usize {
        self.inner.lock().changes.len()
    }

    /// Check if no collection change was recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().changes.is_empty()
    }

    /// Kinds of the recorded changes, in order.
    pub fn kinds(&self) -> Vec<ChangeKind> {
        self.inner.lock().changes.iter().map(CollectionChange::kind).collect()
    }

    /// Lengths reported through `count_changed`, in order.
    pub fn counts(&self) -> Vec<usize> {
        self.inner.lock().counts.clone()
    }

    /// Drain and return the recorded changes.
    pub fn take(&self) -> Vec<CollectionChange<T>> {
        let mut inner = self.inner.lock();
        inner.counts.clear();
        std::mem::take(&mut inner.changes)
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.changes.clear();
        inner.counts.clear();
    }
}

impl<T: Clone> ChangeLog<T> {
    /// Snapshot of the recorded changes.
    pub fn changes(&self) -> Vec<CollectionChange<T>> {
        self.inner.lock().changes.clone()
    }
}

impl<T: Clone> ChangeObserver<T> for ChangeLog<T> {
    fn collection_changed(&mut self, change: &CollectionChange<T>) {
        self.inner.lock().changes.push(change.clone());
    }

    fn count_changed(&mut self, count: usize) {
        self.inner.lock().counts.push(count);
    }
}
