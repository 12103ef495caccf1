//! Positional reconciliation driven by the Levenshtein matrix.
//!
//! # Algorithm
//!
//! 1. Fast paths: self-reference, empty target (clear), empty source
//!    (insert everything in ascending order)
//! 2. Cell budget check: oversized inputs are overwritten positionally
//! 3. Compute the DP matrix, then apply the backtrace edit by edit
//!
//! The returned count of the exact path is the Levenshtein distance.

use tracing::{debug, trace};

use crate::algo::{backtrace, DistanceMatrix, EditOp};
use crate::config::ReconcileConfig;
use crate::error::ReconcileResult;
use crate::store::{shares_storage, SequenceStore};

use super::EditCount;

/// Reconciler for positional sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceReconciler {
    config: ReconcileConfig,
}

impl SequenceReconciler {
    /// Create a reconciler with the default cell budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reconciler with custom limits.
    pub fn with_config(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// Active limits.
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Make `store` equal to `target`, comparing elements with `==`.
    pub fn update<T, S>(&self, store: &mut S, target: &[T]) -> ReconcileResult<EditCount>
    where
        T: Clone + PartialEq,
        S: SequenceStore<T>,
    {
        self.update_by(store, target, |a: &T, b: &T| a == b)
    }

    /// Make `store` equal to `target` under `comparer`.
    ///
    /// Elements the comparer considers equal are left untouched, even if
    /// they differ otherwise.
    pub fn update_by<T, S, F>(&self, store: &mut S, target: &[T], comparer: F) -> ReconcileResult<EditCount>
    where
        T: Clone,
        S: SequenceStore<T>,
        F: Fn(&T, &T) -> bool,
    {
        self.run(store, target, comparer, None::<fn(&mut T, &T)>)
    }

    /// Make `store` equal to `target` under `comparer`, calling
    /// `item_merge(existing, replacement)` instead of overwriting on every
    /// substitution.
    pub fn update_with<T, S, F, M>(
        &self,
        store: &mut S,
        target: &[T],
        comparer: F,
        item_merge: M,
    ) -> ReconcileResult<EditCount>
    where
        T: Clone,
        S: SequenceStore<T>,
        F: Fn(&T, &T) -> bool,
        M: FnMut(&mut T, &T),
    {
        self.run(store, target, comparer, Some(item_merge))
    }

    fn run<T, S, F, M>(
        &self,
        store: &mut S,
        target: &[T],
        comparer: F,
        mut item_merge: Option<M>,
    ) -> ReconcileResult<EditCount>
    where
        T: Clone,
        S: SequenceStore<T>,
        F: Fn(&T, &T) -> bool,
        M: FnMut(&mut T, &T),
    {
        let n = store.len();
        let m = target.len();

        // Quick paths
        if shares_storage(store.as_slice(), target) {
            debug!(len = n, "target is the store itself, nothing to reconcile");
            return Ok(EditCount::Exact(0));
        }

        if n == 0 && m == 0 {
            return Ok(EditCount::Exact(0));
        }

        if m == 0 {
            debug!(removed = n, "empty target, clearing store");
            store.clear();
            return Ok(EditCount::Exact(n));
        }

        if n == 0 {
            debug!(inserted = m, "empty store, inserting target");
            for (index, item) in target.iter().enumerate() {
                store.insert_range(index, [item.clone()])?;
            }
            return Ok(EditCount::Exact(m));
        }

        let Some(matrix) = DistanceMatrix::compute(store.as_slice(), target, &comparer, &self.config) else {
            debug!(
                source_len = n,
                target_len = m,
                max_cells = self.config.max_cells,
                "edit matrix exceeds cell budget, overwriting positionally"
            );
            swap(store, target, item_merge.as_mut())?;
            return Ok(EditCount::Fallback);
        };

        let distance = matrix.distance();
        for op in backtrace(&matrix, target) {
            apply(store, op, item_merge.as_mut())?;
        }

        debug!(source_len = n, target_len = m, distance, "sequence reconciled");
        Ok(EditCount::Exact(distance))
    }
}

/// Apply one backtrace edit to the live store.
fn apply<T, S, M>(store: &mut S, op: EditOp<&T>, item_merge: Option<&mut M>) -> ReconcileResult<()>
where
    T: Clone,
    S: SequenceStore<T>,
    M: FnMut(&mut T, &T),
{
    match op {
        EditOp::Insert { index, item } => {
            trace!(index, "insert");
            store.insert_range(index, [item.clone()])
        }
        EditOp::Delete { index } => {
            trace!(index, "delete");
            store.remove_range(index, 1)
        }
        EditOp::Substitute { index, item } => {
            trace!(index, "substitute");
            substitute(store, index, item, item_merge)
        }
    }
}

fn substitute<T, S, M>(store: &mut S, index: usize, item: &T, item_merge: Option<&mut M>) -> ReconcileResult<()>
where
    T: Clone,
    S: SequenceStore<T>,
    M: FnMut(&mut T, &T),
{
    match item_merge {
        Some(merge) => store.modify(index, |slot| merge(slot, item)),
        None => store.set_range(index, [item.clone()]),
    }
}

/// Overwrite the overlapping prefix, then trim or extend the tail.
fn swap<T, S, M>(store: &mut S, target: &[T], mut item_merge: Option<&mut M>) -> ReconcileResult<()>
where
    T: Clone,
    S: SequenceStore<T>,
    M: FnMut(&mut T, &T),
{
    let n = store.len();
    let m = target.len();
    let overlap = n.min(m);

    for (index, item) in target[..overlap].iter().enumerate() {
        substitute(store, index, item, item_merge.as_deref_mut())?;
    }

    if n > m {
        store.remove_range(m, n - m)?;
    } else if m > n {
        store.insert_range(n, target[n..].iter().cloned())?;
    }
    Ok(())
}
