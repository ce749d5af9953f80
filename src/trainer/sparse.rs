//! Compressed sparse rows of `(index, confidence)` pairs.

use std::ops::Range;

/// Per-row adjacency lists stored back to back.
///
/// Row `r` owns `entries[offsets[r]..offsets[r + 1]]`, in the order the pairs were pushed.
#[derive(Debug)]
pub struct Adjacency {
    offsets: Vec<usize>,
    entries: Vec<(usize, f32)>,
}

impl Adjacency {
    /// Builds the rows with a counting sort over `(row, column, confidence)` triples.
    #[must_use]
    pub fn from_triples(n_rows: usize, triples: &[(usize, usize, f32)]) -> Self {
        let mut offsets = vec![0; n_rows + 1];
        for &(row, _, _) in triples {
            offsets[row + 1] += 1;
        }
        for row in 0..n_rows {
            offsets[row + 1] += offsets[row];
        }

        let mut cursors = offsets[..n_rows].to_vec();
        let mut entries = vec![(0, 0.0); triples.len()];
        for &(row, column, confidence) in triples {
            entries[cursors[row]] = (column, confidence);
            cursors[row] += 1;
        }

        Self { offsets, entries }
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.offsets.len() - 1
    }

    #[must_use]
    #[inline]
    pub fn row(&self, index: usize) -> &[(usize, f32)] {
        &self.entries[self.range(index)]
    }

    fn range(&self, index: usize) -> Range<usize> {
        self.offsets[index]..self.offsets[index + 1]
    }
}
