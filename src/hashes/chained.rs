//! Arena-backed chained bucket table.
//!
//! This is the incremental layout, and also the model table that
//! full-dataset builds fill and pack into the hybrid layout one table at a
//! time. Buckets live in a single arena; each directory slot heads a chain
//! of buckets disambiguated by their control hash.

use super::uhash::GBucketId;
use crate::types::PointIndex;

/// One bucket in the arena: its control hash, the next bucket in the slot
/// chain, and the member points in insertion order.
#[derive(Debug, Clone)]
pub(crate) struct ChainBucket {
    pub control: u32,
    pub next: Option<u32>,
    pub entries: Vec<PointIndex>,
}

/// Chained bucket table.
pub struct ChainedTable {
    table_size: u32,
    /// Slot → head bucket in the arena.
    slots: Vec<Option<u32>>,
    buckets: Vec<ChainBucket>,
    n_entries: usize,
}

impl ChainedTable {
    /// Create a table sized for roughly `n_points_estimate` points.
    pub fn new(n_points_estimate: usize) -> Self {
        let table_size = n_points_estimate.max(1) as u32;
        Self {
            table_size,
            slots: vec![None; table_size as usize],
            buckets: Vec::new(),
            n_entries: 0,
        }
    }

    /// Number of directory slots.
    #[inline]
    pub fn table_size(&self) -> u32 {
        self.table_size
    }

    /// Total entries across all buckets.
    #[inline]
    pub fn n_entries(&self) -> usize {
        self.n_entries
    }

    /// Number of non-empty buckets.
    #[inline]
    pub fn n_buckets(&self) -> usize {
        self.buckets.len()
    }

    fn find_bucket(&self, id: GBucketId) -> Option<u32> {
        let slot = id.slot(self.table_size) as usize;
        let mut cursor = self.slots[slot];
        while let Some(b) = cursor {
            let bucket = &self.buckets[b as usize];
            if bucket.control == id.control {
                return Some(b);
            }
            cursor = bucket.next;
        }
        None
    }

    /// Append `point` to the bucket identified by `id`, creating the bucket
    /// on first use.
    pub fn add_entry(&mut self, id: GBucketId, point: PointIndex) {
        self.n_entries += 1;
        if let Some(b) = self.find_bucket(id) {
            self.buckets[b as usize].entries.push(point);
            return;
        }
        let slot = id.slot(self.table_size) as usize;
        let head = self.slots[slot];
        self.buckets.push(ChainBucket {
            control: id.control,
            next: head,
            entries: vec![point],
        });
        self.slots[slot] = Some(self.buckets.len() as u32 - 1);
    }

    /// Members of the bucket identified by `id`, in insertion order.
    pub fn bucket(&self, id: GBucketId) -> Option<&[PointIndex]> {
        self.find_bucket(id)
            .map(|b| self.buckets[b as usize].entries.as_slice())
    }

    /// Remove all entries, keeping the slot directory allocation for reuse.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.buckets.clear();
        self.n_entries = 0;
    }

    /// Visit every bucket in slot order, then chain order within the slot.
    pub(crate) fn for_each_bucket(&self, mut f: impl FnMut(u32, &ChainBucket)) {
        for slot in 0..self.table_size {
            let mut cursor = self.slots[slot as usize];
            while let Some(b) = cursor {
                let bucket = &self.buckets[b as usize];
                f(slot, bucket);
                cursor = bucket.next;
            }
        }
    }

    /// Re-pack the bucket arena in slot order to improve scan locality.
    /// Observable contents are unchanged.
    pub fn optimize(&mut self) {
        let mut packed: Vec<ChainBucket> = Vec::with_capacity(self.buckets.len());
        let mut new_slots: Vec<Option<u32>> = vec![None; self.table_size as usize];

        for slot in 0..self.table_size as usize {
            let mut cursor = self.slots[slot];
            let mut prev: Option<usize> = None;
            while let Some(b) = cursor {
                let bucket = &self.buckets[b as usize];
                cursor = bucket.next;

                let idx = packed.len();
                packed.push(ChainBucket {
                    control: bucket.control,
                    next: None,
                    entries: bucket.entries.clone(),
                });
                match prev {
                    None => new_slots[slot] = Some(idx as u32),
                    Some(p) => packed[p].next = Some(idx as u32),
                }
                prev = Some(idx);
            }
        }

        self.buckets = packed;
        self.slots = new_slots;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(main: u32, control: u32) -> GBucketId {
        GBucketId { main, control }
    }

    #[test]
    fn test_add_and_lookup() {
        let mut table = ChainedTable::new(100);
        table.add_entry(id(7, 42), 0);
        table.add_entry(id(7, 42), 1);
        table.add_entry(id(7, 42), 2);

        assert_eq!(table.bucket(id(7, 42)), Some([0, 1, 2].as_slice()));
        assert_eq!(table.bucket(id(7, 43)), None);
        assert_eq!(table.n_entries(), 3);
        assert_eq!(table.n_buckets(), 1);
    }

    #[test]
    fn test_slot_collision_distinct_controls() {
        let mut table = ChainedTable::new(10);
        // main 3 and 13 share slot 3 of a 10-slot table.
        table.add_entry(id(3, 100), 0);
        table.add_entry(id(13, 200), 1);

        assert_eq!(table.bucket(id(3, 100)), Some([0].as_slice()));
        assert_eq!(table.bucket(id(13, 200)), Some([1].as_slice()));
        assert_eq!(table.n_buckets(), 2);
    }

    #[test]
    fn test_clear_keeps_directory() {
        let mut table = ChainedTable::new(16);
        table.add_entry(id(1, 1), 5);
        table.clear();

        assert_eq!(table.n_entries(), 0);
        assert_eq!(table.bucket(id(1, 1)), None);
        assert_eq!(table.table_size(), 16);

        table.add_entry(id(1, 1), 9);
        assert_eq!(table.bucket(id(1, 1)), Some([9].as_slice()));
    }

    #[test]
    fn test_optimize_preserves_contents() {
        let mut table = ChainedTable::new(4);
        for p in 0..50u32 {
            table.add_entry(id(p % 8, p % 8 + 100), p);
        }
        let before: Vec<Option<Vec<PointIndex>>> = (0..8)
            .map(|m| table.bucket(id(m, m + 100)).map(|s| s.to_vec()))
            .collect();

        table.optimize();

        for (m, want) in before.iter().enumerate() {
            let got = table.bucket(id(m as u32, m as u32 + 100)).map(|s| s.to_vec());
            assert_eq!(&got, want);
        }
    }

    #[test]
    fn test_for_each_bucket_visits_all() {
        let mut table = ChainedTable::new(8);
        for p in 0..20u32 {
            table.add_entry(id(p, p + 1000), p);
        }
        let mut total = 0;
        table.for_each_bucket(|_, bucket| total += bucket.entries.len());
        assert_eq!(total, 20);
    }
}
