//! tola-reconcile - Minimal-edit reconciliation of observable collections
//!
//! ## Core Concepts
//!
//! **Reconciliation**: mutate a live collection in place until it equals a
//! target, applying primitive edits one at a time so every observer sees a
//! granular `Add` / `Remove` / `Replace` / `Move` / `Reset` notification
//! instead of a wholesale reset.
//!
//! **Two strategies**:
//! - Positional sequences use the Levenshtein matrix and apply the minimal
//!   insert / delete / substitute script, bounded by a cell budget.
//! - Keyed sequences align entries by key identity in linear time, relocating
//!   shared keys with moves.
//!
//! ## Modules
//! - `store`: observable stores and the mutation primitive traits
//! - `algo`: distance matrix and edit script backtrace
//! - `reconcile`: sequence and keyed reconcilers
//! - `change`: notification types and observers
//! - `config`: reconciliation limits
//!
//! ## Usage
//!
//! ```
//! use tola_reconcile::{ChangeKind, ChangeLog, EditCount, OrderedStore};
//!
//! let log = ChangeLog::new();
//! let mut store = OrderedStore::from_vec(vec!['k', 'i', 't', 't', 'e', 'n']);
//! store.subscribe(log.clone());
//!
//! let target: Vec<char> = "sitting".chars().collect();
//! assert_eq!(store.update(&target).unwrap(), EditCount::Exact(3));
//! assert_eq!(
//!     log.kinds(),
//!     vec![ChangeKind::Add, ChangeKind::Replace, ChangeKind::Replace]
//! );
//! ```
//!
//! ## Concurrency
//!
//! Stores are not synchronized. Every mutation takes `&mut self`, so one
//! reconciliation can never overlap another on the same store. Observers run
//! synchronously, in edit order, before `update` returns.

// =============================================================================
// Modules
// =============================================================================

/// Edit distance and edit script algorithms
pub mod algo;

/// Change notifications and observers
pub mod change;

/// Reconciliation limits
pub mod config;

/// Error types
pub mod error;

/// Prelude for common imports
pub mod prelude;

/// Sequence and keyed reconcilers
pub mod reconcile;

/// Observable stores and mutation primitives
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

// Stores
pub use store::{KeyedOrderedStore, KeyedStore, OrderedStore, SequenceStore, StoreView};

// Notifications
pub use change::{ChangeKind, ChangeLog, ChangeObserver, CollectionChange, Items};

// Reconcilers
pub use reconcile::{EditCount, KeyedReconciler, KeyedStats, SequenceReconciler, FALLBACK_SENTINEL};

// Algorithms
pub use algo::{DistanceMatrix, EditOp, EditStats};

// Config
pub use config::{ReconcileConfig, DEFAULT_MAX_CELLS};

// Error types
pub use error::{ReconcileError, ReconcileResult};

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stores_are_send_when_items_are() {
        static_assertions::assert_impl_all!(StoreView<String>: Send, Sync, Clone);
        static_assertions::assert_impl_all!(ReconcileConfig: Send, Sync, Copy);
        static_assertions::assert_impl_all!(SequenceReconciler: Send, Sync, Copy);
    }

    #[test]
    fn test_positional_then_keyed_round() {
        let mut list: OrderedStore<&str> = ["a", "b", "c"].into_iter().collect();
        let count = list.update(&["a", "c", "d"]).unwrap();
        assert_eq!(count, EditCount::Exact(2));
        assert_eq!(list.as_slice(), &["a", "c", "d"]);

        let mut map = KeyedOrderedStore::new();
        for (pos, item) in list.iter().enumerate() {
            map.push(*item, pos).unwrap();
        }
        let stats = map.update(&[("d", 0), ("a", 1)]).unwrap();
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.moved, 1);
        assert_eq!(map.to_vec(), vec![("d", 0), ("a", 1)]);
    }
}
