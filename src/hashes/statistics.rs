//! Bucket-population statistics layout.
//!
//! Records how many points land in each bucket without storing membership.
//! Accepted at the parameter surface for population studies; queries on it
//! are unsupported.

use super::uhash::GBucketId;
use std::collections::HashMap;

/// Statistics-only bucket table.
pub struct StatisticsTable {
    table_size: u32,
    counts: HashMap<(u32, u32), u32>,
    n_entries: usize,
}

impl StatisticsTable {
    /// Create a table sized for roughly `n_points_estimate` points.
    pub fn new(n_points_estimate: usize) -> Self {
        Self {
            table_size: n_points_estimate.max(1) as u32,
            counts: HashMap::new(),
            n_entries: 0,
        }
    }

    /// Number of directory slots.
    #[inline]
    pub fn table_size(&self) -> u32 {
        self.table_size
    }

    /// Record one point landing in the bucket identified by `id`.
    pub fn add_entry(&mut self, id: GBucketId) {
        let key = (id.slot(self.table_size), id.control);
        *self.counts.entry(key).or_insert(0) += 1;
        self.n_entries += 1;
    }

    /// Total recorded entries.
    #[inline]
    pub fn n_entries(&self) -> usize {
        self.n_entries
    }

    /// Number of distinct non-empty buckets.
    #[inline]
    pub fn n_buckets(&self) -> usize {
        self.counts.len()
    }

    /// Bucket populations in descending order.
    pub fn bucket_sizes(&self) -> Vec<u32> {
        let mut sizes: Vec<u32> = self.counts.values().copied().collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }

    /// Size of the largest bucket, or 0 when empty.
    pub fn max_bucket_size(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(main: u32, control: u32) -> GBucketId {
        GBucketId { main, control }
    }

    #[test]
    fn test_counts() {
        let mut table = StatisticsTable::new(100);
        table.add_entry(id(1, 10));
        table.add_entry(id(1, 10));
        table.add_entry(id(2, 20));

        assert_eq!(table.n_entries(), 3);
        assert_eq!(table.n_buckets(), 2);
        assert_eq!(table.bucket_sizes(), vec![2, 1]);
        assert_eq!(table.max_bucket_size(), 2);
    }

    #[test]
    fn test_empty() {
        let table = StatisticsTable::new(10);
        assert_eq!(table.n_entries(), 0);
        assert_eq!(table.max_bucket_size(), 0);
        assert!(table.bucket_sizes().is_empty());
    }
}
