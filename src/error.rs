//! Error types for tola-reconcile.
//!
//! Only argument validation produces errors. Panics raised by user supplied
//! comparers or merge closures are not caught and leave the store partially
//! edited.

use thiserror::Error;

/// Errors that can occur while mutating or reconciling a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// An index or range falls outside the store
    #[error("range out of bounds: index {index} + count {count} exceeds length {len}")]
    OutOfRange {
        /// Start index of the offending range
        index: usize,
        /// Number of elements in the range
        count: usize,
        /// Length of the store at the time of the call
        len: usize,
    },

    /// A key already present in the store (or twice in a target) was supplied
    #[error("duplicate key at position {index}")]
    DuplicateKey {
        /// Position of the offending entry in the supplied sequence
        index: usize,
    },
}

/// Result type alias for store and reconcile operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    /// Create an out-of-range error.
    pub fn out_of_range(index: usize, count: usize, len: usize) -> Self {
        Self::OutOfRange { index, count, len }
    }

    /// Create a duplicate key error for the entry at `index`.
    pub fn duplicate_key(index: usize) -> Self {
        Self::DuplicateKey { index }
    }
}

/// Validate that `[index, index + count)` lies within `[0, len]`.
#[inline]
pub(crate) fn check_range(index: usize, count: usize, len: usize) -> ReconcileResult<()> {
    match index.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(ReconcileError::out_of_range(index, count, len)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReconcileError::out_of_range(4, 2, 5);
        assert_eq!(
            err.to_string(),
            "range out of bounds: index 4 + count 2 exceeds length 5"
        );

        let err = ReconcileError::duplicate_key(3);
        assert_eq!(err.to_string(), "duplicate key at position 3");
    }

    #[test]
    fn test_check_range() {
        assert!(check_range(0, 0, 0).is_ok());
        assert!(check_range(3, 0, 3).is_ok());
        assert!(check_range(1, 2, 3).is_ok());
        assert!(check_range(4, 0, 3).is_err());
        assert!(check_range(2, 2, 3).is_err());
        assert!(check_range(usize::MAX, 2, 3).is_err());
    }

    #[test]
    fn test_error_is_send_sync() {
        static_assertions::assert_impl_all!(ReconcileError: Send, Sync);
    }
}
