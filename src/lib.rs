//! # e2lsh - Randomized R-near-neighbor search
//!
//! A Rust implementation of locality-sensitive hashing with p-stable
//! projections for the R-near-neighbor problem: given a point set
//! `P ⊂ ℝ^d`, report every `p ∈ P` with `‖p − q‖ ≤ R`, with per-point
//! recall probability bounded below by a configured success probability.
//!
//! ## Overview
//!
//! - **p-stable projections**: `h(x) = ⌊(⟨a, x⟩ + b) / W⌋` with `a` drawn
//!   from `N(0, 1)` for L2 or `Cauchy(0, 1)` for L1
//! - **Compound hashes**: `k` scalar functions per g-function, amplified by
//!   `L` independent tables
//! - **u-function amplification**: each of the `L` tables can use a pair
//!   drawn from `m` independent `k/2`-tuples
//! - **ACHash variant**: randomized Hadamard preconditioning plus
//!   per-function coordinate subsampling
//! - **Packed bucket storage**: hybrid-chain layout with 6-bit length
//!   fields and overflow encoding, built through a chained model table
//!
//! ## Quick Start
//!
//! ```rust
//! use e2lsh::prelude::*;
//!
//! let points = vec![
//!     Point::new(vec![0.0, 0.0]),
//!     Point::new(vec![1.0, 0.0]),
//!     Point::new(vec![10.0, 10.0]),
//! ];
//!
//! let params = LshParams::new(2, 1.5)
//!     .with_k(2)
//!     .with_tables(4)
//!     .with_width(50.0)
//!     .with_seed(42);
//!
//! let mut index = RnnIndex::with_dataset(&params, &points).unwrap();
//! let neighbors = index.query(&points[0]).unwrap();
//!
//! // Every reported point is within distance R of the query.
//! assert!(neighbors.len() >= 1);
//! ```
//!
//! ## Incremental insertion
//!
//! The chained layout accepts points one at a time:
//!
//! ```rust
//! use e2lsh::prelude::*;
//!
//! let params = LshParams::new(3, 5.0)
//!     .with_k(2)
//!     .with_tables(4)
//!     .with_width(1000.0)
//!     .with_seed(7)
//!     .with_table_kind(TableKind::LinkedChain);
//!
//! let a = Point::new(vec![0.0, 0.0, 0.0]);
//! let b = Point::new(vec![3.0, 4.0, 0.0]);
//!
//! let mut index = RnnIndex::new_empty(&params, 2).unwrap();
//! index.insert(&a).unwrap();
//! index.insert(&b).unwrap();
//!
//! let neighbors = index.query(&a).unwrap();
//! assert_eq!(neighbors.len(), 2);
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: the parameter record and its text serialization
//! - [`data_format`]: the borrowed point type
//! - [`distance_measures`]: L1/L2 distances and the short-circuit filter
//! - [`projection`]: the p-stable hash family and Hadamard preconditioning
//! - [`hashes`]: the bucket hash and the three storage layouts
//! - [`index`]: the `RnnIndex` driver
//! - [`marked_set`]: query-time deduplication scratch
//! - [`utils`]: seedable random draw primitives

#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod data_format;
pub mod distance_measures;
pub mod hashes;
pub mod index;
pub mod marked_set;
pub mod projection;
pub mod utils;

mod error;
mod types;

pub use config::LshParams;
pub use error::{ErrorKind, LshError, Result};
pub use index::RnnIndex;
pub use types::{HashValue, PointIndex, Real};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::LshParams;
    pub use crate::data_format::Point;
    pub use crate::distance_measures::{l1_distance, l2_distance_sqr, DistanceMeasure};
    pub use crate::error::{ErrorKind, LshError, Result};
    pub use crate::hashes::TableKind;
    pub use crate::index::RnnIndex;
    pub use crate::types::{HashValue, PointIndex, Real};
    pub use crate::utils::LshRng;
}
