//! Levenshtein distance matrix.
//!
//! # Complexity
//!
//! - Time: O(n * m) comparer calls
//! - Space: O(n * m) cells
//!
//! The matrix is kept whole: the backtrace in `script` revisits arbitrary
//! cells on its way from `(n, m)` to `(0, 0)`, so the usual two-row rolling
//! buffer does not apply.

use std::fmt;

use crate::config::ReconcileConfig;

/// Dense `(n + 1) x (m + 1)` edit distance grid.
///
/// `get(i, j)` is the edit distance between `source[..i]` and `target[..j]`.
#[derive(Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    cells: Vec<usize>,
    rows: usize,
    cols: usize,
}

impl DistanceMatrix {
    /// Compute the matrix of `source` against `target`.
    ///
    /// Returns `None` without allocating when `n * m` exceeds
    /// `config.max_cells`; the caller should replace the content wholesale.
    pub fn compute<T, F>(
        source: &[T],
        target: &[T],
        comparer: F,
        config: &ReconcileConfig,
    ) -> Option<Self>
    where
        F: Fn(&T, &T) -> bool,
    {
        let n = source.len();
        let m = target.len();
        if !config.fits(n, m) {
            return None;
        }

        let rows = n + 1;
        let cols = m + 1;
        let mut cells = vec![0usize; rows * cols];

        // dist[0][j] = j
        for (j, cell) in cells[..cols].iter_mut().enumerate() {
            *cell = j;
        }

        for i in 1..rows {
            let (prev, row) = cells[(i - 1) * cols..(i + 1) * cols].split_at_mut(cols);
            row[0] = i;
            let item = &source[i - 1];
            for j in 1..cols {
                let cost = usize::from(!comparer(item, &target[j - 1]));
                row[j] = (prev[j] + 1).min(row[j - 1] + 1).min(prev[j - 1] + cost);
            }
        }

        Some(Self { cells, rows, cols })
    }

    /// Cell `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.rows && j < self.cols);
        self.cells[i * self.cols + j]
    }

    /// Length of the source the matrix was built from.
    #[inline]
    pub fn source_len(&self) -> usize {
        self.rows - 1
    }

    /// Length of the target the matrix was built from.
    #[inline]
    pub fn target_len(&self) -> usize {
        self.cols - 1
    }

    /// The edit distance, `get(n, m)`.
    #[inline]
    pub fn distance(&self) -> usize {
        self.cells[self.cells.len() - 1]
    }
}

impl fmt::Debug for DistanceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for row in self.cells.chunks(self.cols) {
            list.entry(&row);
        }
        list.finish()
    }
}

/// Edit distance between `source` and `target` under `comparer`.
///
/// Returns `None` when the comparison exceeds the configured cell budget.
pub fn levenshtein<T, F>(source: &[T], target: &[T], comparer: F, config: &ReconcileConfig) -> Option<usize>
where
    F: Fn(&T, &T) -> bool,
{
    if source.is_empty() {
        return Some(target.len());
    }
    if target.is_empty() {
        return Some(source.len());
    }
    DistanceMatrix::compute(source, target, comparer, config).map(|matrix| matrix.distance())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn matrix(a: &str, b: &str) -> DistanceMatrix {
        DistanceMatrix::compute(&chars(a), &chars(b), |x, y| x == y, &ReconcileConfig::default())
            .unwrap()
    }

    #[test]
    fn test_borders() {
        let m = matrix("abc", "de");
        for i in 0..=3 {
            assert_eq!(m.get(i, 0), i);
        }
        for j in 0..=2 {
            assert_eq!(m.get(0, j), j);
        }
        assert_eq!(m.source_len(), 3);
        assert_eq!(m.target_len(), 2);
    }

    #[test]
    fn test_kitten_sitting() {
        assert_eq!(matrix("kitten", "sitting").distance(), 3);
        assert_eq!(matrix("sitting", "kitten").distance(), 3);
    }

    #[test]
    fn test_known_distances() {
        assert_eq!(matrix("flaw", "lawn").distance(), 2);
        assert_eq!(matrix("abc", "abc").distance(), 0);
        assert_eq!(matrix("abc", "xyz").distance(), 3);
        assert_eq!(matrix("", "abc").distance(), 3);
        assert_eq!(matrix("abc", "").distance(), 3);
    }

    #[test]
    fn test_neighbours_differ_by_at_most_one() {
        let m = matrix("intention", "execution");
        for i in 0..=m.source_len() {
            for j in 0..=m.target_len() {
                if i > 0 {
                    assert!(m.get(i, j).abs_diff(m.get(i - 1, j)) <= 1);
                }
                if j > 0 {
                    assert!(m.get(i, j).abs_diff(m.get(i, j - 1)) <= 1);
                }
            }
        }
        assert_eq!(m.distance(), 5);
    }

    #[test]
    fn test_custom_comparer() {
        let a = chars("ABC");
        let b = chars("abc");
        let config = ReconcileConfig::default();
        assert_eq!(levenshtein(&a, &b, |x, y| x == y, &config), Some(3));
        assert_eq!(
            levenshtein(&a, &b, |x, y| x.eq_ignore_ascii_case(y), &config),
            Some(0)
        );
    }

    #[test]
    fn test_guard_skips_computation() {
        let a = vec![0u8; 100];
        let b = vec![1u8; 100];
        let config = ReconcileConfig::new(9_999);
        assert!(DistanceMatrix::compute(&a, &b, |x, y| x == y, &config).is_none());
        assert_eq!(levenshtein(&a, &b, |x, y| x == y, &config), None);

        // Empty sides never need the matrix
        assert_eq!(levenshtein(&a, &[], |x, y| x == y, &config), Some(100));
    }
}
