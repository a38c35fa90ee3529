//! The p-stable LSH hash family.
//!
//! Holds the projection vectors `a`, offsets `b`, and the per-function
//! coordinate permutations and Rademacher diagonals used by the ACHash
//! variant. Storage is flat, indexed by `(tuple, function, dimension)`, one
//! allocation per rank. Immutable after construction.

use crate::config::LshParams;
use crate::distance_measures::DistanceMeasure;
use crate::types::{HashValue, Real};
use crate::utils::LshRng;

/// A drawn family of `n_tuples × tuple_len` scalar LSH functions.
pub struct HashFamily {
    n_tuples: usize,
    tuple_len: usize,
    dimension: usize,
    w: Real,
    /// Projection vectors, `(tuple, function, dim)`.
    a: Vec<Real>,
    /// Offsets in `[0, W)`, `(tuple, function)`.
    b: Vec<Real>,
    /// Coordinate permutations of `0..d`, `(tuple, function, dim)`.
    ran_dim: Vec<u32>,
    /// Rademacher `±1` diagonals, `(tuple, function, dim)`.
    diagonal: Vec<Real>,
}

impl HashFamily {
    /// Draw a family for the given parameters.
    ///
    /// Projection coordinates come from `N(0, 1)` for L2 and `Cauchy(0, 1)`
    /// for L1; offsets from `U[0, W)`.
    pub fn draw(params: &LshParams, rng: &mut LshRng) -> Self {
        let n_tuples = params.n_hf_tuples();
        let tuple_len = params.hf_tuple_len();
        let d = params.dimension;
        let n_functions = n_tuples * tuple_len;

        let mut a = Vec::with_capacity(n_functions * d);
        let mut b = Vec::with_capacity(n_functions);
        for _ in 0..n_functions {
            for _ in 0..d {
                let coord = match params.distance {
                    DistanceMeasure::L1 => rng.standard_cauchy(),
                    DistanceMeasure::L2 => rng.standard_gaussian(),
                };
                a.push(coord);
            }
            b.push(rng.uniform(0.0, params.w));
        }

        let mut ran_dim = Vec::with_capacity(n_functions * d);
        for _ in 0..n_functions {
            ran_dim.extend_from_slice(&rng.permutation(d));
        }

        let mut diagonal = vec![0.0; n_functions * d];
        for chunk in diagonal.chunks_mut(d) {
            rng.fill_diagonal(chunk);
        }

        Self {
            n_tuples,
            tuple_len,
            dimension: d,
            w: params.w,
            a,
            b,
            ran_dim,
            diagonal,
        }
    }

    /// Number of independent tuples.
    #[inline]
    pub fn n_tuples(&self) -> usize {
        self.n_tuples
    }

    /// Functions per tuple.
    #[inline]
    pub fn tuple_len(&self) -> usize {
        self.tuple_len
    }

    /// Point dimensionality.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn function_index(&self, tuple: usize, func: usize) -> usize {
        debug_assert!(tuple < self.n_tuples && func < self.tuple_len);
        tuple * self.tuple_len + func
    }

    /// Projection vector of function `(tuple, func)`.
    #[inline]
    pub fn a(&self, tuple: usize, func: usize) -> &[Real] {
        let f = self.function_index(tuple, func);
        &self.a[f * self.dimension..(f + 1) * self.dimension]
    }

    /// Offset of function `(tuple, func)`.
    #[inline]
    pub fn b(&self, tuple: usize, func: usize) -> Real {
        self.b[self.function_index(tuple, func)]
    }

    /// Coordinate permutation of function `(tuple, func)`.
    #[inline]
    pub fn ran_dim(&self, tuple: usize, func: usize) -> &[u32] {
        let f = self.function_index(tuple, func);
        &self.ran_dim[f * self.dimension..(f + 1) * self.dimension]
    }

    /// Rademacher diagonal of function `(tuple, func)`.
    #[inline]
    pub fn diagonal(&self, tuple: usize, func: usize) -> &[Real] {
        let f = self.function_index(tuple, func);
        &self.diagonal[f * self.dimension..(f + 1) * self.dimension]
    }

    /// Quantize one projection: `⌊(value + b) / W⌋`, floor toward `−∞`,
    /// wrapped to a `u32` ring residue.
    #[inline]
    fn quantize(&self, value: Real, b: Real) -> HashValue {
        ((value + b) / self.w).floor() as i64 as u32
    }

    /// Compute the dense ULSH tuple of `point` under tuple `tuple`:
    /// `out[j] = ⌊(⟨a_j, point⟩ + b_j) / W⌋`.
    ///
    /// `out` must hold `tuple_len` values.
    pub fn compute_ulsh(&self, tuple: usize, point: &[Real], out: &mut [HashValue]) {
        debug_assert_eq!(out.len(), self.tuple_len);
        debug_assert!(point.len() >= self.dimension);

        for j in 0..self.tuple_len {
            let a = self.a(tuple, j);
            let mut value = 0.0;
            for d in 0..self.dimension {
                value += point[d] * a[d];
            }
            out[j] = self.quantize(value, self.b(tuple, j));
        }
    }

    /// Compute the subsampled ULSH tuple used by the ACHash variant: the
    /// inner product runs over the first `subdim` coordinates of `point`
    /// permuted through `ran_dim`.
    ///
    /// `point` must already be preconditioned (sign diagonal + Hadamard).
    pub fn compute_ulsh_subsampled(
        &self,
        tuple: usize,
        point: &[Real],
        subdim: usize,
        out: &mut [HashValue],
    ) {
        debug_assert_eq!(out.len(), self.tuple_len);
        debug_assert!(subdim <= self.dimension);

        for j in 0..self.tuple_len {
            let a = self.a(tuple, j);
            let perm = self.ran_dim(tuple, j);
            let mut value = 0.0;
            for d in 0..subdim {
                value += point[perm[d] as usize] * a[d];
            }
            out[j] = self.quantize(value, self.b(tuple, j));
        }
    }
}
