//! Two-level bucket hashing.
//!
//! The first level maps a point's integer hash tuple to a `(main, control)`
//! pair over a prime modulus ([`uhash`]); the second level stores bucket
//! membership in one of three layouts: a chained model table
//! ([`chained`]), a bucket-population recorder ([`statistics`]), or the
//! packed hybrid-chain layout used by full-dataset builds ([`hybrid`]).

pub mod chained;
pub mod hybrid;
pub mod statistics;
pub mod uhash;

pub use chained::ChainedTable;
pub use hybrid::HybridChainTable;
pub use statistics::StatisticsTable;
pub use uhash::{GBucketId, PrecomputedUhf, UHashCoefficients};

use crate::error::{LshError, Result};
use serde::{Deserialize, Serialize};

/// Prime modulus for the bucket hash: `2^32 − 5`.
pub const UH_PRIME: u64 = 4_294_967_291;

/// Bucket-hash coefficients are drawn uniformly from `[1, MAX_HASH_RND]`.
pub const MAX_HASH_RND: u32 = 536_870_912;

/// Bits of a packed cell devoted to the point index.
pub const N_BITS_PER_POINT_INDEX: u32 = 24;

/// Bits of a packed cell devoted to the bucket-length field.
pub const N_BITS_FOR_BUCKET_LENGTH: u32 = 6;

/// Largest bucket length representable without overflow encoding.
pub const MAX_NONOVERFLOW_POINTS_PER_BUCKET: u32 = (1 << N_BITS_FOR_BUCKET_LENGTH) - 1;

/// Number of cells whose length fields carry the overflow offset,
/// little-endian in [`N_BITS_FOR_BUCKET_LENGTH`]-bit chunks.
pub const N_FIELDS_PER_INDEX_OF_OVERFLOW: u32 = 4;

/// Largest point index a packed cell can carry.
pub const MAX_PACKED_POINT_INDEX: u32 = (1 << N_BITS_PER_POINT_INDEX) - 1;

/// Bucket storage layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    /// Chained buckets; supports incremental insertion.
    LinkedChain,
    /// Bucket-population statistics only; queries are unsupported.
    Statistics,
    /// Packed hybrid chains; built once from a full dataset.
    HybridChain,
}

impl TableKind {
    /// The `typeHT` code used by the parameter text format.
    pub fn code(self) -> u32 {
        match self {
            TableKind::LinkedChain => 1,
            TableKind::Statistics => 2,
            TableKind::HybridChain => 3,
        }
    }

    /// Parse a `typeHT` code.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            1 => Ok(TableKind::LinkedChain),
            2 => Ok(TableKind::Statistics),
            3 => Ok(TableKind::HybridChain),
            other => Err(LshError::invalid_parameter(format!(
                "unknown typeHT code: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_kind_codes() {
        for kind in [
            TableKind::LinkedChain,
            TableKind::Statistics,
            TableKind::HybridChain,
        ] {
            assert_eq!(TableKind::from_code(kind.code()).unwrap(), kind);
        }
        assert!(TableKind::from_code(0).is_err());
        assert!(TableKind::from_code(4).is_err());
    }

    #[test]
    fn test_cell_layout_constants() {
        // Point index, last-point flag, and length field fit one u32 cell.
        assert!(N_BITS_PER_POINT_INDEX + 1 + N_BITS_FOR_BUCKET_LENGTH <= 32);
        // The overflow chunks can carry a full point-index-sized offset.
        assert!(N_FIELDS_PER_INDEX_OF_OVERFLOW * N_BITS_FOR_BUCKET_LENGTH >= N_BITS_PER_POINT_INDEX);
    }
}
