//! Reconciliation limits.

/// Default cap on `source.len() * target.len()` before exact DP is skipped.
pub const DEFAULT_MAX_CELLS: usize = 1_000_000;

/// Configuration for the positional reconciler.
///
/// Use this to tune when the edit-distance matrix is computed:
/// - Increase the budget for large collections that must stay minimal
/// - Decrease it for a faster fallback on bulk replacements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Maximum number of DP cells (`n * m`) computed before falling back
    /// to overwriting the store positionally.
    /// Default: 1,000,000
    pub max_cells: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl ReconcileConfig {
    /// Create config with a custom cell budget.
    pub fn new(max_cells: usize) -> Self {
        Self { max_cells }
    }

    /// Create config for large collections (higher budget).
    pub fn large() -> Self {
        Self {
            max_cells: 16 * 1024 * 1024,
        }
    }

    /// Create config for small collections (lower budget, faster fallback).
    pub fn small() -> Self {
        Self {
            max_cells: 64 * 1024,
        }
    }

    /// Check if an `n x m` comparison fits in the budget.
    #[inline]
    pub fn fits(&self, n: usize, m: usize) -> bool {
        n.checked_mul(m).is_some_and(|cells| cells <= self.max_cells)
    }
}
