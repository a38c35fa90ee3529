//! Packed hybrid-chain bucket layout.
//!
//! Built once by packing a chained model table. All bucket membership lives
//! in one contiguous array of `u32` cells; a CSR directory maps each slot to
//! its `(control, first_cell)` runs.
//!
//! Cell layout, low bits first: point index
//! ([`N_BITS_PER_POINT_INDEX`] bits), last-point flag (1 bit), bucket-length
//! field ([`N_BITS_FOR_BUCKET_LENGTH`] bits), one spare bit. The header cell
//! carries the bucket length, or 0 when the bucket holds more than
//! [`MAX_NONOVERFLOW_POINTS_PER_BUCKET`] points; in that case the length
//! fields of the following [`N_FIELDS_PER_INDEX_OF_OVERFLOW`] cells encode,
//! little-endian in 6-bit chunks, how far past the non-overflow region the
//! remaining points were placed, and iteration jumps the cursor by that
//! offset when it reaches cell [`MAX_NONOVERFLOW_POINTS_PER_BUCKET`].

use super::chained::ChainedTable;
use super::uhash::GBucketId;
use super::{
    MAX_NONOVERFLOW_POINTS_PER_BUCKET, MAX_PACKED_POINT_INDEX, N_BITS_FOR_BUCKET_LENGTH,
    N_BITS_PER_POINT_INDEX, N_FIELDS_PER_INDEX_OF_OVERFLOW,
};
use crate::error::{LshError, Result};
use crate::types::PointIndex;

const POINT_INDEX_MASK: u32 = (1 << N_BITS_PER_POINT_INDEX) - 1;
const LAST_POINT_BIT: u32 = 1 << N_BITS_PER_POINT_INDEX;
const LENGTH_SHIFT: u32 = N_BITS_PER_POINT_INDEX + 1;
const LENGTH_MASK: u32 = MAX_NONOVERFLOW_POINTS_PER_BUCKET;

#[inline]
fn pack_cell(point: PointIndex, last: bool, length_field: u32) -> u32 {
    debug_assert!(point <= MAX_PACKED_POINT_INDEX);
    debug_assert!(length_field <= LENGTH_MASK);
    point | (u32::from(last) << N_BITS_PER_POINT_INDEX) | (length_field << LENGTH_SHIFT)
}

#[inline]
fn cell_point(cell: u32) -> PointIndex {
    cell & POINT_INDEX_MASK
}

#[inline]
fn cell_is_last(cell: u32) -> bool {
    cell & LAST_POINT_BIT != 0
}

#[inline]
fn cell_length_field(cell: u32) -> u32 {
    (cell >> LENGTH_SHIFT) & LENGTH_MASK
}

#[inline]
fn set_length_field(cell: &mut u32, value: u32) {
    debug_assert!(value <= LENGTH_MASK);
    *cell = (*cell & !(LENGTH_MASK << LENGTH_SHIFT)) | (value << LENGTH_SHIFT);
}

/// One directory entry: a bucket's control hash and its header cell.
#[derive(Debug, Clone, Copy)]
struct DirEntry {
    control: u32,
    first_cell: u32,
}

/// Packed hybrid-chain bucket table.
pub struct HybridChainTable {
    table_size: u32,
    /// CSR run boundaries into `directory`, length `table_size + 1`.
    slot_starts: Vec<u32>,
    directory: Vec<DirEntry>,
    cells: Vec<u32>,
}

impl HybridChainTable {
    /// Pack a chained model table into the hybrid layout.
    ///
    /// Fails with `InvalidParameter` if any point index or overflow offset
    /// exceeds the packed cell width.
    pub fn pack(model: &ChainedTable) -> Result<Self> {
        let table_size = model.table_size();
        let max_len = MAX_NONOVERFLOW_POINTS_PER_BUCKET as usize;

        let mut slot_starts = vec![0u32; table_size as usize + 1];
        let mut directory = Vec::with_capacity(model.n_buckets());
        let mut cells = Vec::with_capacity(model.n_entries());
        // Overflowing buckets: (header cell, spilled points).
        let mut overflows: Vec<(usize, Vec<PointIndex>)> = Vec::new();

        let mut pack_error = None;
        let mut current_slot = 0u32;
        model.for_each_bucket(|slot, bucket| {
            if pack_error.is_some() {
                return;
            }
            while current_slot <= slot {
                slot_starts[current_slot as usize] = directory.len() as u32;
                current_slot += 1;
            }

            let entries = &bucket.entries;
            if let Some(&bad) = entries.iter().find(|&&p| p > MAX_PACKED_POINT_INDEX) {
                pack_error = Some(LshError::invalid_parameter(format!(
                    "point index {} exceeds the packed cell width",
                    bad
                )));
                return;
            }

            let first_cell = cells.len();
            directory.push(DirEntry {
                control: bucket.control,
                first_cell: first_cell as u32,
            });

            let len = entries.len();
            if len <= max_len {
                for (i, &p) in entries.iter().enumerate() {
                    let length_field = if i == 0 { len as u32 } else { 0 };
                    cells.push(pack_cell(p, i + 1 == len, length_field));
                }
            } else {
                // Non-overflow region: the first MAX points, header length 0.
                for &p in &entries[..max_len] {
                    cells.push(pack_cell(p, false, 0));
                }
                overflows.push((first_cell, entries[max_len..].to_vec()));
            }
        });
        if let Some(err) = pack_error {
            return Err(err);
        }
        while current_slot <= table_size {
            slot_starts[current_slot as usize] = directory.len() as u32;
            current_slot += 1;
        }

        // Spill the overflow regions past the packed non-overflow cells and
        // patch the offset chunks next to each affected header.
        for (header, spilled) in overflows {
            let offset = cells.len() - (header + max_len);
            if offset as u64 > MAX_PACKED_POINT_INDEX as u64 {
                return Err(LshError::invalid_parameter(format!(
                    "bucket overflow offset {} exceeds the packed cell width",
                    offset
                )));
            }
            for j in 0..N_FIELDS_PER_INDEX_OF_OVERFLOW {
                let chunk = (offset >> (j * N_BITS_FOR_BUCKET_LENGTH) as usize) as u32 & LENGTH_MASK;
                set_length_field(&mut cells[header + 1 + j as usize], chunk);
            }
            let spill_len = spilled.len();
            for (i, &p) in spilled.iter().enumerate() {
                cells.push(pack_cell(p, i + 1 == spill_len, 0));
            }
        }

        Ok(Self {
            table_size,
            slot_starts,
            directory,
            cells,
        })
    }

    /// Number of directory slots.
    #[inline]
    pub fn table_size(&self) -> u32 {
        self.table_size
    }

    /// Number of packed buckets.
    #[inline]
    pub fn n_buckets(&self) -> usize {
        self.directory.len()
    }

    /// Total packed cells.
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// Look up the bucket identified by `id` and return a cursor over its
    /// point indices, or `None` when the bucket is empty.
    pub fn bucket(&self, id: GBucketId) -> Option<BucketIter<'_>> {
        let slot = id.slot(self.table_size) as usize;
        let start = self.slot_starts[slot] as usize;
        let end = self.slot_starts[slot + 1] as usize;
        self.directory[start..end]
            .iter()
            .find(|e| e.control == id.control)
            .map(|e| BucketIter::new(&self.cells, e.first_cell as usize))
    }
}

/// Cursor over one packed bucket's point indices.
pub struct BucketIter<'t> {
    cells: &'t [u32],
    base: usize,
    index: u32,
    offset: u32,
    done: bool,
}

impl<'t> BucketIter<'t> {
    fn new(cells: &'t [u32], base: usize) -> Self {
        // Header length 0 marks an overflowing bucket; decode the jump
        // offset from the chunk cells up front.
        let mut offset = 0u32;
        if cell_length_field(cells[base]) == 0 {
            for j in 0..N_FIELDS_PER_INDEX_OF_OVERFLOW {
                offset +=
                    cell_length_field(cells[base + 1 + j as usize]) << (j * N_BITS_FOR_BUCKET_LENGTH);
            }
        }
        Self {
            cells,
            base,
            index: 0,
            offset,
            done: false,
        }
    }
}

impl Iterator for BucketIter<'_> {
    type Item = PointIndex;

    fn next(&mut self) -> Option<PointIndex> {
        if self.done {
            return None;
        }
        if self.index == MAX_NONOVERFLOW_POINTS_PER_BUCKET {
            self.index += self.offset;
        }
        let cell = self.cells[self.base + self.index as usize];
        self.done = cell_is_last(cell);
        self.index += 1;
        Some(cell_point(cell))
    }
}
