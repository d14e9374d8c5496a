//! Per-table bucket storage.

use std::collections::HashMap;

use rand::Rng;

use super::hash::{Projection, ProjectionHash};

/// Maps bucket keys to the entries hashed into them.
///
/// Buckets hold entry indices and only grow: there is no removal and no
/// compaction.
#[derive(Debug, Clone, Default)]
pub struct BucketStore {
    buckets: HashMap<Box<[i32]>, Vec<usize>>,
}

impl BucketStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` to the bucket at `key`, creating the bucket if absent.
    pub fn insert(&mut self, key: &[i32], entry: usize) {
        match self.buckets.get_mut(key) {
            Some(bucket) => bucket.push(entry),
            None => {
                self.buckets.insert(key.into(), vec![entry]);
            }
        }
    }

    /// Entries in the bucket at `key`; empty if the bucket doesn't exist.
    #[inline]
    pub fn lookup(&self, key: &[i32]) -> &[usize] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of non-empty buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if nothing has been inserted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Size of the fullest bucket.
    pub fn largest(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }
}

/// One hash table: its hash functions and its buckets.
#[derive(Debug, Clone)]
pub struct HashTable {
    hash: ProjectionHash,
    buckets: BucketStore,
}

impl HashTable {
    /// Creates an empty table with freshly drawn hash functions.
    pub fn new<R: Rng + ?Sized>(
        dimension: usize,
        projections: usize,
        width: f64,
        rng: &mut R,
    ) -> Self {
        Self {
            hash: ProjectionHash::new(dimension, projections, width, rng),
            buckets: BucketStore::new(),
        }
    }

    /// This table's hash functions.
    #[inline]
    pub fn hash(&self) -> &ProjectionHash {
        &self.hash
    }

    /// This table's buckets.
    #[inline]
    pub fn buckets(&self) -> &BucketStore {
        &self.buckets
    }

    /// Projects a vector onto this table's hash functions.
    #[inline]
    pub fn project(&self, vector: &[f32]) -> Projection {
        self.hash.project(vector)
    }

    /// Hashes `vector` and stores `entry` in the resulting bucket.
    pub fn insert(&mut self, vector: &[f32], entry: usize) {
        let projection = self.hash.project(vector);
        self.buckets.insert(projection.key(), entry);
    }

    /// Entries in the bucket at `key`.
    #[inline]
    pub fn lookup(&self, key: &[i32]) -> &[usize] {
        self.buckets.lookup(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_insert_and_lookup() {
        let mut store = BucketStore::new();
        assert!(store.is_empty());

        store.insert(&[1, 2], 0);
        store.insert(&[1, 2], 5);
        store.insert(&[0, -1], 3);

        assert_eq!(store.lookup(&[1, 2]), &[0, 5]);
        assert_eq!(store.lookup(&[0, -1]), &[3]);
        assert!(store.lookup(&[9, 9]).is_empty());
        assert_eq!(store.len(), 2);
        assert_eq!(store.largest(), 2);
    }

    #[test]
    fn test_table_places_each_entry_once() {
        let mut table = HashTable::new(3, 2, 1.0, &mut StdRng::seed_from_u64(11));
        let points = [[0.0f32, 0.0, 0.0], [0.1, 0.2, 0.3], [5.0, -5.0, 2.0]];
        for (i, p) in points.iter().enumerate() {
            table.insert(p, i);
        }

        let placed: usize = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let key = table.project(p).key().to_vec();
                assert!(table.lookup(&key).contains(&i));
                table.lookup(&key).len()
            })
            .max()
            .unwrap();
        assert!(placed >= 1);

        let total: usize = table.buckets.buckets.values().map(Vec::len).sum();
        assert_eq!(total, points.len());
    }

    #[test]
    fn test_identical_keys_share_bucket() {
        let mut table = HashTable::new(2, 4, 0.5, &mut StdRng::seed_from_u64(2));
        table.insert(&[1.5, -0.5], 0);
        table.insert(&[1.5, -0.5], 1);
        let key = table.project(&[1.5, -0.5]).key().to_vec();
        assert_eq!(table.lookup(&key), &[0, 1]);
    }
}
