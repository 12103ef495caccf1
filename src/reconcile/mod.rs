//! Reconcilers: mutate a live store until it equals a target.
//!
//! | Reconciler | Matches by | Cost | Minimal |
//! |------------|-----------|------|---------|
//! | [`SequenceReconciler`] | position + comparer | O(n * m) | yes, within the cell budget |
//! | [`KeyedReconciler`] | key identity | O(n + m) | no |
//!
//! Both apply every edit to the store as soon as it is decided, so the
//! store's observers see the exact edit sequence. Nothing is rolled back if
//! a user closure panics halfway.

mod keyed;
mod sequence;

pub use keyed::{KeyedReconciler, KeyedStats};
pub use sequence::SequenceReconciler;

/// Signed value reported for [`EditCount::Fallback`].
pub const FALLBACK_SENTINEL: isize = -1;

/// Outcome of a positional reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum EditCount {
    /// The store was edited with exactly this many primitive edits, which
    /// is the edit distance between the old content and the target.
    Exact(usize),
    /// The comparison exceeded the cell budget and the content was
    /// overwritten positionally. The number of edits is not a distance.
    Fallback,
}

impl EditCount {
    /// The edit distance, if it was computed.
    pub fn exact(self) -> Option<usize> {
        match self {
            Self::Exact(count) => Some(count),
            Self::Fallback => None,
        }
    }

    /// Check if the fallback path was taken.
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback)
    }

    /// Signed view: the distance, or [`FALLBACK_SENTINEL`].
    pub fn as_signed(self) -> isize {
        match self {
            Self::Exact(count) => isize::try_from(count).unwrap_or(isize::MAX),
            Self::Fallback => FALLBACK_SENTINEL,
        }
    }
}
