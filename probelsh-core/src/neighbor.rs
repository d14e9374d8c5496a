//! Search result type shared by the LSH index and the ground-truth search.

use std::cmp::Ordering;

/// A retrieved entry and its true distance to the query.
///
/// `index` is the entry's insertion position, so results from different
/// searchers built over the same keys in the same order are comparable.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    /// Insertion index of the matched entry.
    pub index: usize,
    /// Distance from the query (lower = closer).
    pub distance: f32,
}

impl Neighbor {
    /// Creates a new neighbor.
    #[inline]
    pub fn new(index: usize, distance: f32) -> Self {
        Self { index, distance }
    }
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    /// Ascending distance, ties broken by insertion index.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}
