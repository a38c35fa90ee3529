//! Distance computations.
//!
//! The query pipeline never needs the full distance of a rejected candidate,
//! so the filter keeps a running sum and bails out as soon as the threshold
//! is exceeded.

use crate::data_format::Point;
use crate::types::Real;
use serde::{Deserialize, Serialize};

/// Distance mode selected at build time.
///
/// The same mode must be used for family construction (which p-stable
/// distribution the projections are drawn from) and for the distance filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMeasure {
    /// Manhattan distance; projections drawn from `Cauchy(0, 1)`.
    L1,
    /// Euclidean distance; projections drawn from `N(0, 1)`.
    #[default]
    L2,
}

impl DistanceMeasure {
    /// The filter threshold for radius `r`: `r²` for L2, `r` for L1.
    pub fn threshold(self, r: Real) -> Real {
        match self {
            DistanceMeasure::L1 => r,
            DistanceMeasure::L2 => r * r,
        }
    }
}

/// Compute the L1 (Manhattan) distance between two points.
pub fn l1_distance(a: &Point, b: &Point) -> Real {
    debug_assert_eq!(a.dimension(), b.dimension());
    a.coordinates()
        .iter()
        .zip(b.coordinates())
        .map(|(&x, &y)| (x - y).abs())
        .sum()
}

/// Compute the squared L2 distance between two points.
pub fn l2_distance_sqr(a: &Point, b: &Point) -> Real {
    debug_assert_eq!(a.dimension(), b.dimension());
    a.coordinates()
        .iter()
        .zip(b.coordinates())
        .map(|(&x, &y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Return true iff the distance between `a` and `b` is within `threshold`:
/// `Σ(aᵢ−bᵢ)² ≤ threshold` for L2, `Σ|aᵢ−bᵢ| ≤ threshold` for L1.
///
/// Short-circuits as soon as the running sum exceeds the threshold.
#[inline]
pub fn within_distance(
    measure: DistanceMeasure,
    a: &Point,
    b: &Point,
    threshold: Real,
) -> bool {
    debug_assert_eq!(a.dimension(), b.dimension());
    let mut sum = 0.0;
    for (&x, &y) in a.coordinates().iter().zip(b.coordinates()) {
        let diff = x - y;
        sum += match measure {
            DistanceMeasure::L1 => diff.abs(),
            DistanceMeasure::L2 => diff * diff,
        };
        if sum > threshold {
            return false;
        }
    }
    true
}
