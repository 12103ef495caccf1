//! Edit script reconstruction.
//!
//! Walks a [`DistanceMatrix`] from `(n, m)` back to `(0, 0)` and yields one
//! primitive edit per non-matching step.
//!
//! # Tie-break
//!
//! At cell `(i, j)` with `diagonal = (i-1, j-1)`, `left = (i-1, j)` and
//! `up = (i, j-1)`:
//!
//! 1. `diagonal <= left && diagonal <= up`: step diagonally; a `Substitute`
//!    of `target[j-1]` at `i-1` unless `diagonal` equals the current cell,
//!    in which case the elements matched and nothing is emitted.
//! 2. otherwise, if `left + 1` equals the current cell: `Delete` at `i-1`.
//! 3. otherwise: `Insert` of `target[j-1]` at `i`.
//!
//! On row 0 only inserts remain, on column 0 only deletes. The order is
//! fixed so equal inputs always produce the same script.
//!
//! # Application order
//!
//! Edits come out by decreasing source index. Positions below `i` still hold
//! the untouched `source[..i]` and positions from `i` on already hold the
//! finished `target[j..]`, so each edit can be applied to the live store the
//! moment it is yielded.

use std::iter::FusedIterator;

use crate::config::ReconcileConfig;
use crate::error::ReconcileResult;
use crate::store::SequenceStore;

use super::matrix::DistanceMatrix;

// =============================================================================
// Public Types
// =============================================================================

/// Primitive positional edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp<T> {
    /// Insert `item` so it lands at `index`
    Insert { index: usize, item: T },
    /// Remove the element at `index`
    Delete { index: usize },
    /// Overwrite the element at `index` with `item`
    Substitute { index: usize, item: T },
}

impl<T> EditOp<T> {
    /// Index the edit applies to.
    pub fn index(&self) -> usize {
        match self {
            Self::Insert { index, .. } | Self::Delete { index } | Self::Substitute { index, .. } => {
                *index
            }
        }
    }

    /// Check if this is an Insert operation
    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert { .. })
    }

    /// Check if this is a Delete operation
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }

    /// Check if this is a Substitute operation
    pub fn is_substitute(&self) -> bool {
        matches!(self, Self::Substitute { .. })
    }
}

impl<T: Clone> EditOp<&T> {
    /// Clone the referenced item into an owned edit.
    pub fn cloned(self) -> EditOp<T> {
        match self {
            Self::Insert { index, item } => EditOp::Insert {
                index,
                item: item.clone(),
            },
            Self::Delete { index } => EditOp::Delete { index },
            Self::Substitute { index, item } => EditOp::Substitute {
                index,
                item: item.clone(),
            },
        }
    }
}

/// Statistics of an edit script.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EditStats {
    /// Number of elements inserted
    pub inserted: usize,
    /// Number of elements deleted
    pub deleted: usize,
    /// Number of elements overwritten
    pub substituted: usize,
}

impl EditStats {
    /// Count the edits of `ops`.
    pub fn of<'a, T: 'a>(ops: impl IntoIterator<Item = &'a EditOp<T>>) -> Self {
        let mut stats = Self::default();
        for op in ops {
            stats.record(op);
        }
        stats
    }

    /// Total number of edit operations
    pub fn edit_count(&self) -> usize {
        self.inserted + self.deleted + self.substituted
    }

    /// Check if there are no changes
    pub fn is_empty(&self) -> bool {
        self.edit_count() == 0
    }

    pub(crate) fn record<T>(&mut self, op: &EditOp<T>) {
        match op {
            EditOp::Insert { .. } => self.inserted += 1,
            EditOp::Delete { .. } => self.deleted += 1,
            EditOp::Substitute { .. } => self.substituted += 1,
        }
    }
}

// =============================================================================
// Backtrace
// =============================================================================

/// Iterator over the edits of a matrix, in application order.
#[derive(Debug, Clone)]
pub struct Backtrace<'a, T> {
    matrix: &'a DistanceMatrix,
    target: &'a [T],
    i: usize,
    j: usize,
}

/// Walk `matrix` back to the origin, yielding edits that reference `target`.
///
/// `target` must be the sequence the matrix was computed against.
pub fn backtrace<'a, T>(matrix: &'a DistanceMatrix, target: &'a [T]) -> Backtrace<'a, T> {
    debug_assert_eq!(matrix.target_len(), target.len());
    Backtrace {
        matrix,
        target,
        i: matrix.source_len(),
        j: matrix.target_len(),
    }
}

impl<'a, T> Iterator for Backtrace<'a, T> {
    type Item = EditOp<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (i, j) = (self.i, self.j);
            match (i, j) {
                (0, 0) => return None,
                (0, _) => {
                    self.j -= 1;
                    return Some(EditOp::Insert {
                        index: 0,
                        item: &self.target[j - 1],
                    });
                }
                (_, 0) => {
                    self.i -= 1;
                    return Some(EditOp::Delete { index: i - 1 });
                }
                _ => {}
            }

            let current = self.matrix.get(i, j);
            let diagonal = self.matrix.get(i - 1, j - 1);
            let left = self.matrix.get(i - 1, j);
            let up = self.matrix.get(i, j - 1);

            if diagonal <= left && diagonal <= up {
                self.i -= 1;
                self.j -= 1;
                if diagonal == current {
                    continue;
                }
                return Some(EditOp::Substitute {
                    index: i - 1,
                    item: &self.target[j - 1],
                });
            }

            if left + 1 == current {
                self.i -= 1;
                return Some(EditOp::Delete { index: i - 1 });
            }

            self.j -= 1;
            return Some(EditOp::Insert {
                index: i,
                item: &self.target[j - 1],
            });
        }
    }
}

impl<T> FusedIterator for Backtrace<'_, T> {}

// =============================================================================
// Script helpers
// =============================================================================

/// Compute the edit script turning `source` into `target`.
///
/// Returns `None` when the comparison exceeds the cell budget.
///
/// ```
/// use tola_reconcile::algo::{edit_script, EditOp};
/// use tola_reconcile::ReconcileConfig;
///
/// let source: Vec<char> = "kitten".chars().collect();
/// let target: Vec<char> = "sitting".chars().collect();
/// let script = edit_script(&source, &target, |a, b| a == b, &ReconcileConfig::default()).unwrap();
///
/// assert_eq!(
///     script,
///     vec![
///         EditOp::Insert { index: 6, item: 'g' },
///         EditOp::Substitute { index: 4, item: 'i' },
///         EditOp::Substitute { index: 0, item: 's' },
///     ]
/// );
/// ```
pub fn edit_script<T, F>(
    source: &[T],
    target: &[T],
    comparer: F,
    config: &ReconcileConfig,
) -> Option<Vec<EditOp<T>>>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let matrix = DistanceMatrix::compute(source, target, comparer, config)?;
    Some(backtrace(&matrix, target).map(EditOp::cloned).collect())
}

/// Apply a script produced by [`edit_script`] to `store`, in order.
pub fn apply_script<T, S>(store: &mut S, script: &[EditOp<T>]) -> ReconcileResult<EditStats>
where
    T: Clone,
    S: SequenceStore<T>,
{
    let mut stats = EditStats::default();
    for op in script {
        match op {
            EditOp::Insert { index, item } => store.insert_range(*index, [item.clone()])?,
            EditOp::Delete { index } => store.remove_range(*index, 1)?,
            EditOp::Substitute { index, item } => store.set_range(*index, [item.clone()])?,
        }
        stats.record(op);
    }
    Ok(stats)
}
