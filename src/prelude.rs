//! Prelude for common imports.
//!
//! ```
//! use tola_reconcile::prelude::*;
//! ```

// Stores and primitive traits
pub use crate::store::{KeyedOrderedStore, KeyedStore, OrderedStore, SequenceStore, StoreView};

// Notifications
pub use crate::change::{ChangeKind, ChangeLog, ChangeObserver, CollectionChange};

// Reconcilers
pub use crate::reconcile::{EditCount, KeyedReconciler, KeyedStats, SequenceReconciler};

// Algorithms
pub use crate::algo::{
    apply_script, backtrace, edit_script, levenshtein, DistanceMatrix, EditOp, EditStats,
};

// Config
pub use crate::config::ReconcileConfig;

// Error
pub use crate::error::{ReconcileError, ReconcileResult};
