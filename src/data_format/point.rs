//! Owned point type.
//!
//! An index stores borrows of points; the caller keeps them alive for the
//! index's lifetime. Point identity inside an index is the insertion
//! position, not the caller-supplied id.

use crate::types::Real;

/// A fixed-dimension vector of reals with a cached squared L2 length and an
/// optional caller-supplied id.
///
/// Immutable once handed to an index.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    coordinates: Vec<Real>,
    sqr_length: Real,
    id: Option<u32>,
}

impl Point {
    /// Create a point from its coordinates.
    pub fn new(coordinates: Vec<Real>) -> Self {
        let sqr_length = coordinates.iter().map(|&c| c * c).sum();
        Self {
            coordinates,
            sqr_length,
            id: None,
        }
    }

    /// Create a point with a caller-supplied id.
    pub fn with_id(coordinates: Vec<Real>, id: u32) -> Self {
        let mut point = Self::new(coordinates);
        point.id = Some(id);
        point
    }

    /// Get the coordinate slice.
    #[inline]
    pub fn coordinates(&self) -> &[Real] {
        &self.coordinates
    }

    /// Get the dimensionality.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.coordinates.len()
    }

    /// Get the cached squared L2 length.
    #[inline]
    pub fn sqr_length(&self) -> Real {
        self.sqr_length
    }

    /// Get the caller-supplied id, if any.
    #[inline]
    pub fn id(&self) -> Option<u32> {
        self.id
    }
}

impl From<Vec<Real>> for Point {
    fn from(coordinates: Vec<Real>) -> Self {
        Self::new(coordinates)
    }
}

impl From<&[Real]> for Point {
    fn from(coordinates: &[Real]) -> Self {
        Self::new(coordinates.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_creation() {
        let p = Point::new(vec![3.0, 4.0]);
        assert_eq!(p.dimension(), 2);
        assert_eq!(p.coordinates(), &[3.0, 4.0]);
        assert!((p.sqr_length() - 25.0).abs() < 1e-12);
        assert!(p.id().is_none());
    }

    #[test]
    fn test_point_with_id() {
        let p = Point::with_id(vec![1.0, 0.0, 0.0], 17);
        assert_eq!(p.id(), Some(17));
        assert!((p.sqr_length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_slice() {
        let coords = [1.0, 2.0];
        let p: Point = coords.as_slice().into();
        assert_eq!(p.coordinates(), &coords);
    }
}
