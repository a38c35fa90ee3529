//! Query-time deduplication scratch.
//!
//! A boolean per point index plus a stack of the indices touched during the
//! current query. Marking is O(1) and needs no allocation on the query path;
//! the reset drains the stack so the set is all-false again before the query
//! returns.

use crate::types::PointIndex;

/// Marked-point scratch set.
pub struct MarkedSet {
    flags: Vec<bool>,
    touched: Vec<PointIndex>,
}

impl MarkedSet {
    /// Create a set with capacity for `capacity` point indices.
    pub fn new(capacity: usize) -> Self {
        Self {
            flags: vec![false; capacity.max(1)],
            touched: Vec::new(),
        }
    }

    /// Current capacity in point indices.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.flags.len()
    }

    /// Number of indices marked since the last reset.
    #[inline]
    pub fn n_marked(&self) -> usize {
        self.touched.len()
    }

    /// Grow (doubling) until at least `n_points` indices fit.
    ///
    /// Must not be called mid-query; at rest all flags are false, so the new
    /// region's false fill keeps the invariant.
    pub fn ensure_capacity(&mut self, n_points: usize) {
        if n_points <= self.flags.len() {
            return;
        }
        let mut new_len = self.flags.len().max(1);
        while new_len < n_points {
            new_len *= 2;
        }
        self.flags.resize(new_len, false);
    }

    /// Whether `index` is currently marked.
    #[inline]
    pub fn is_marked(&self, index: PointIndex) -> bool {
        self.flags[index as usize]
    }

    /// Mark `index`; returns true iff it was not marked before.
    #[inline]
    pub fn mark(&mut self, index: PointIndex) -> bool {
        let flag = &mut self.flags[index as usize];
        if *flag {
            return false;
        }
        *flag = true;
        self.touched.push(index);
        true
    }

    /// Reset every marked flag to false and empty the touched stack.
    pub fn reset(&mut self) {
        for &index in &self.touched {
            debug_assert!(self.flags[index as usize]);
            self.flags[index as usize] = false;
        }
        self.touched.clear();
    }

    /// Whether every flag is false (the at-rest invariant).
    #[cfg(test)]
    pub fn is_all_clear(&self) -> bool {
        self.touched.is_empty() && self.flags.iter().all(|&f| !f)
    }
}
