//! Core type definitions shared across the crate.

/// Index of a point inside an index structure.
///
/// Identity is assigned at insertion time and lies in `[0, n_points)`.
pub type PointIndex = u32;

/// A single scalar LSH hash value.
///
/// The floor quantization wraps to a `u32` ring residue; the bucket hash
/// treats it as such.
pub type HashValue = u32;

/// Real coordinate type for points and projection vectors.
pub type Real = f64;

/// Initial capacity used when a caller hands in an empty result buffer.
pub const RESULT_INIT_SIZE: usize = 8;
