//! The R-near-neighbor index driver.
//!
//! Ties the pipeline together: point → (optional Hadamard preconditioning) →
//! p-stable projections → floor quantization → bucket hash → bucket store,
//! repeated for each of the `L` tables; queries run the same pipeline and
//! deduplicate candidates through the marked set.

use crate::config::LshParams;
use crate::data_format::Point;
use crate::distance_measures::{within_distance, DistanceMeasure};
use crate::error::{LshError, Result};
use crate::hashes::{
    ChainedTable, GBucketId, HybridChainTable, PrecomputedUhf, StatisticsTable, TableKind,
    UHashCoefficients, MAX_PACKED_POINT_INDEX,
};
use crate::marked_set::MarkedSet;
use crate::projection::{hadamard, HashFamily};
use crate::types::{HashValue, PointIndex, Real, RESULT_INIT_SIZE};
use crate::utils::LshRng;
use tracing::debug;

/// One of the `L` per-table bucket stores.
enum Table {
    Chained(ChainedTable),
    Statistics(StatisticsTable),
    Hybrid(HybridChainTable),
}

/// Randomized R-near-neighbor index over borrowed points.
///
/// The index borrows its points; the caller keeps them alive for the
/// index's lifetime. All operations take `&mut self`: scratch state (the
/// marked set, the reduced-point buffer, the per-tuple hash vectors) is
/// per-index, and every query restores the marked set before returning.
pub struct RnnIndex<'a> {
    params: LshParams,
    /// Distance-filter threshold: `R²` for L2, `R` for L1.
    threshold: Real,
    points: Vec<&'a Point>,
    family: HashFamily,
    uhash: UHashCoefficients,
    /// The u-tuple pair feeding table `l`; `(l, l)` when u-functions are off.
    table_pairs: Vec<(usize, usize)>,
    tables: Vec<Table>,
    marked: MarkedSet,
    reporting: bool,
    /// ACHash subsampling width; `None` selects the dense pipeline.
    subdim: Option<usize>,
    reduced_point: Vec<Real>,
    ulsh_scratch: Vec<HashValue>,
    precomputed: Vec<PrecomputedUhf>,
    n_marked_last: usize,
}

/// Lexicographic `(i₁, i₂)` pairs with `i₁ < i₂` over `0..n_tuples`,
/// in the order tables consume them.
fn u_function_pairs(n_tuples: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n_tuples).flat_map(move |i| (i + 1..n_tuples).map(move |j| (i, j)))
}

impl<'a> RnnIndex<'a> {
    fn init(params: &LshParams, n_points_estimate: usize, subdim: Option<usize>) -> Result<Self> {
        params.validate()?;
        if let Some(s) = subdim {
            if s == 0 || s > params.dimension {
                return Err(LshError::invalid_parameter(format!(
                    "subdim {} must lie in [1, dimension = {}]",
                    s, params.dimension
                )));
            }
        }

        let mut rng = match params.seed {
            Some(seed) => LshRng::with_seed(seed),
            None => LshRng::from_entropy(),
        };
        let family = HashFamily::draw(params, &mut rng);
        let uhash = UHashCoefficients::draw(params.k, params.use_u_functions, &mut rng);

        let table_pairs: Vec<(usize, usize)> = if params.use_u_functions {
            u_function_pairs(params.n_hf_tuples()).take(params.l).collect()
        } else {
            (0..params.l).map(|l| (l, l)).collect()
        };
        debug_assert_eq!(table_pairs.len(), params.l);

        let threshold = match params.distance {
            DistanceMeasure::L1 => params.r,
            DistanceMeasure::L2 => params.r2,
        };

        let n_tuples = params.n_hf_tuples();
        Ok(Self {
            params: params.clone(),
            threshold,
            points: Vec::new(),
            family,
            uhash,
            table_pairs,
            tables: Vec::new(),
            marked: MarkedSet::new(n_points_estimate),
            reporting: true,
            subdim,
            reduced_point: Vec::with_capacity(params.dimension),
            ulsh_scratch: vec![0; params.hf_tuple_len()],
            precomputed: vec![PrecomputedUhf::default(); n_tuples],
            n_marked_last: 0,
        })
    }

    /// Build an index over a full dataset.
    ///
    /// Requires `table_kind = HybridChain`; the dataset is hashed once,
    /// inserted into a shared chained model table per output table, and
    /// packed.
    pub fn with_dataset(params: &LshParams, points: &'a [Point]) -> Result<Self> {
        Self::with_dataset_inner(params, points, None)
    }

    /// Build an ACHash index over a full dataset: points are preconditioned
    /// with the sign diagonal and the Hadamard transform, and each hash
    /// function reads only `subdim` permuted coordinates.
    pub fn with_dataset_ac(params: &LshParams, points: &'a [Point], subdim: usize) -> Result<Self> {
        Self::with_dataset_inner(params, points, Some(subdim))
    }

    fn with_dataset_inner(
        params: &LshParams,
        points: &'a [Point],
        subdim: Option<usize>,
    ) -> Result<Self> {
        if params.table_kind != TableKind::HybridChain {
            return Err(LshError::invalid_parameter(
                "full-dataset builds require the hybrid-chain layout",
            ));
        }
        if points.len() as u64 > MAX_PACKED_POINT_INDEX as u64 + 1 {
            return Err(LshError::invalid_parameter(format!(
                "dataset of {} points exceeds the packed point-index width",
                points.len()
            )));
        }

        let mut index = Self::init(params, points.len(), subdim)?;
        for point in points {
            index.check_dimension(point)?;
        }
        index.points.extend(points.iter());
        index.build_hybrid_tables()?;
        Ok(index)
    }

    /// Build the `L` packed tables through a shared chained model table.
    fn build_hybrid_tables(&mut self) -> Result<()> {
        let n = self.points.len();
        let n_tuples = self.params.n_hf_tuples();

        // Hash every point once; the shared bucket-hash coefficients make
        // the products reusable across all L tables.
        let mut cached = vec![PrecomputedUhf::default(); n * n_tuples];
        for p in 0..n {
            let point: &Point = self.points[p];
            self.prepare_point(point.coordinates());
            cached[p * n_tuples..(p + 1) * n_tuples].copy_from_slice(&self.precomputed);
        }
        debug!(n_points = n, n_tuples, "precomputed bucket hashes");

        let mut model = ChainedTable::new(n);
        for l in 0..self.params.l {
            let (i1, i2) = self.table_pairs[l];
            for p in 0..n {
                let row = &cached[p * n_tuples..(p + 1) * n_tuples];
                let id = if self.params.use_u_functions {
                    self.uhash.bucket_id_pair(&row[i1], &row[i2])
                } else {
                    self.uhash.bucket_id_single(&row[i1])
                };
                model.add_entry(id, p as PointIndex);
            }
            self.tables.push(Table::Hybrid(HybridChainTable::pack(&model)?));
            model.clear();
        }
        debug!(n_tables = self.tables.len(), "packed hybrid tables");
        Ok(())
    }

    /// Create an empty index that accepts incremental insertion.
    ///
    /// Requires `table_kind` of `LinkedChain` or `Statistics`.
    pub fn new_empty(params: &LshParams, n_points_estimate: usize) -> Result<Self> {
        if params.table_kind == TableKind::HybridChain {
            return Err(LshError::invalid_parameter(
                "empty indices require the linked-chain or statistics layout",
            ));
        }
        let mut index = Self::init(params, n_points_estimate, None)?;
        for _ in 0..params.l {
            index.tables.push(match params.table_kind {
                TableKind::LinkedChain => Table::Chained(ChainedTable::new(n_points_estimate)),
                TableKind::Statistics => {
                    Table::Statistics(StatisticsTable::new(n_points_estimate))
                }
                TableKind::HybridChain => unreachable!(),
            });
        }
        Ok(index)
    }

    /// Insert one point into an empty-style index.
    pub fn insert(&mut self, point: &'a Point) -> Result<()> {
        if self.params.table_kind == TableKind::HybridChain {
            return Err(LshError::invalid_parameter(
                "insertions into a packed index are not supported",
            ));
        }
        self.check_dimension(point)?;

        let index = self.points.len() as PointIndex;
        self.points.push(point);
        self.prepare_point(point.coordinates());

        for l in 0..self.params.l {
            let id = self.bucket_id_for_table(l);
            match &mut self.tables[l] {
                Table::Chained(table) => table.add_entry(id, index),
                Table::Statistics(table) => table.add_entry(id),
                Table::Hybrid(_) => unreachable!(),
            }
        }

        self.marked.ensure_capacity(self.points.len());
        Ok(())
    }

    /// Report the R-near neighbors of `query`, appending them to `result`
    /// in table order (`l` ascending, bucket-traversal order within each
    /// table, first occurrence only). Returns the number appended.
    pub fn query_into(&mut self, query: &Point, result: &mut Vec<&'a Point>) -> Result<usize> {
        self.check_dimension(query)?;
        if self
            .tables
            .iter()
            .any(|t| matches!(t, Table::Statistics(_)))
        {
            return Err(LshError::unsupported_layout(
                "queries are not supported on the statistics layout",
            ));
        }

        self.prepare_point(query.coordinates());

        let mut n_neighbors = 0;
        for l in 0..self.params.l {
            let id = self.bucket_id_for_table(l);
            match &self.tables[l] {
                Table::Chained(table) => {
                    let Some(entries) = table.bucket(id) else {
                        continue;
                    };
                    for &candidate in entries {
                        let point = self.points[candidate as usize];
                        if within_distance(self.params.distance, query, point, self.threshold)
                            && self.reporting
                            && self.marked.mark(candidate)
                        {
                            result.push(point);
                            n_neighbors += 1;
                        }
                    }
                }
                Table::Hybrid(table) => {
                    let Some(cursor) = table.bucket(id) else {
                        continue;
                    };
                    for candidate in cursor {
                        if !self.marked.mark(candidate) {
                            continue;
                        }
                        let point = self.points[candidate as usize];
                        if within_distance(self.params.distance, query, point, self.threshold)
                            && self.reporting
                        {
                            result.push(point);
                            n_neighbors += 1;
                        }
                    }
                }
                Table::Statistics(_) => unreachable!(),
            }
        }

        self.n_marked_last = self.marked.n_marked();
        self.marked.reset();
        debug!(
            n_neighbors,
            candidates = self.n_marked_last,
            "query finished"
        );
        Ok(n_neighbors)
    }

    /// Convenience wrapper over [`query_into`](Self::query_into) allocating
    /// a fresh result buffer.
    pub fn query(&mut self, query: &Point) -> Result<Vec<&'a Point>> {
        let mut result = Vec::with_capacity(RESULT_INIT_SIZE);
        self.query_into(query, &mut result)?;
        Ok(result)
    }

    /// When reporting is off, queries still walk buckets and run the
    /// distance filter (for fair counter accounting) but report nothing.
    pub fn set_reporting(&mut self, reporting: bool) {
        self.reporting = reporting;
    }

    /// Number of distinct candidates the last query examined.
    pub fn candidates_examined(&self) -> usize {
        self.n_marked_last
    }

    /// Non-aggressive compaction: re-packs chained-table arenas in slot
    /// order. Packed tables are left untouched.
    pub fn optimize(&mut self) {
        for table in &mut self.tables {
            if let Table::Chained(chained) = table {
                chained.optimize();
            }
        }
    }

    /// The index parameters.
    pub fn params(&self) -> &LshParams {
        &self.params
    }

    /// Number of indexed points.
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    fn check_dimension(&self, point: &Point) -> Result<()> {
        if point.dimension() != self.params.dimension {
            return Err(LshError::precondition_violated(format!(
                "point dimension {} does not match index dimension {}",
                point.dimension(),
                self.params.dimension
            )));
        }
        Ok(())
    }

    /// Run the hash pipeline for one point: fill the reduced-point buffer
    /// (dense copy, or ACHash preconditioning), compute every tuple's ULSH
    /// vector, and cache the bucket-hash products per tuple.
    fn prepare_point(&mut self, coords: &[Real]) {
        match self.subdim {
            None => {
                self.reduced_point.clear();
                self.reduced_point.extend_from_slice(coords);
            }
            Some(_) => {
                let diagonal = self.family.diagonal(0, 0);
                hadamard::ac_precondition(coords, diagonal, &mut self.reduced_point);
            }
        }

        for i in 0..self.params.n_hf_tuples() {
            match self.subdim {
                None => self
                    .family
                    .compute_ulsh(i, &self.reduced_point, &mut self.ulsh_scratch),
                Some(subdim) => self.family.compute_ulsh_subsampled(
                    i,
                    &self.reduced_point,
                    subdim,
                    &mut self.ulsh_scratch,
                ),
            }
            self.precomputed[i] = self.uhash.precompute(&self.ulsh_scratch);
        }
    }

    /// Bucket identity of the current prepared point under table `l`.
    fn bucket_id_for_table(&self, l: usize) -> GBucketId {
        let (i1, i2) = self.table_pairs[l];
        if self.params.use_u_functions {
            self.uhash
                .bucket_id_pair(&self.precomputed[i1], &self.precomputed[i2])
        } else {
            self.uhash.bucket_id_single(&self.precomputed[i1])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_params(dimension: usize, r: Real) -> LshParams {
        // A large W makes near points collide in essentially every table,
        // so the distance filter decides membership.
        LshParams::new(dimension, r)
            .with_k(2)
            .with_tables(4)
            .with_width(1000.0)
            .with_seed(42)
    }

    #[test]
    fn test_u_function_pairs_lex_order() {
        let pairs: Vec<_> = u_function_pairs(4).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_with_dataset_requires_hybrid() {
        let points = vec![Point::new(vec![0.0, 0.0])];
        let params = wide_params(2, 1.0).with_table_kind(TableKind::LinkedChain);
        assert!(RnnIndex::with_dataset(&params, &points).is_err());
    }

    #[test]
    fn test_new_empty_rejects_hybrid() {
        let params = wide_params(2, 1.0);
        assert!(RnnIndex::new_empty(&params, 10).is_err());
    }

    #[test]
    fn test_insert_rejected_on_built_index() {
        let points = vec![Point::new(vec![0.0, 0.0])];
        let params = wide_params(2, 1.0);
        let mut index = RnnIndex::with_dataset(&params, &points).unwrap();
        let extra = Point::new(vec![1.0, 1.0]);
        assert!(index.insert(&extra).is_err());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let points = vec![Point::new(vec![0.0, 0.0])];
        let params = wide_params(2, 1.0);
        let mut index = RnnIndex::with_dataset(&params, &points).unwrap();
        let bad = Point::new(vec![0.0, 0.0, 0.0]);
        assert!(index.query(&bad).is_err());
    }

    #[test]
    fn test_statistics_layout_rejects_query() {
        let params = wide_params(2, 1.0).with_table_kind(TableKind::Statistics);
        let mut index = RnnIndex::new_empty(&params, 10).unwrap();
        let p = Point::new(vec![0.0, 0.0]);
        index.insert(&p).unwrap();
        let err = index.query(&p).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnsupportedLayout);
    }

    #[test]
    fn test_self_query_returns_self() {
        let points = vec![Point::new(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])];
        let params = wide_params(8, 0.0);
        let mut index = RnnIndex::with_dataset(&params, &points).unwrap();
        let found = index.query(&points[0]).unwrap();
        assert_eq!(found.len(), 1);
        assert!(std::ptr::eq(found[0], &points[0]));
    }

    #[test]
    fn test_reporting_disabled_counts_candidates() {
        let points: Vec<Point> = (0..10)
            .map(|i| Point::new(vec![i as f64 * 0.01, 0.0]))
            .collect();
        let params = wide_params(2, 1.0);
        let mut index = RnnIndex::with_dataset(&params, &points).unwrap();

        index.set_reporting(false);
        let found = index.query(&points[0]).unwrap();
        assert!(found.is_empty());
        // Candidates were still examined.
        assert!(index.candidates_examined() > 0);

        index.set_reporting(true);
        let found = index.query(&points[0]).unwrap();
        assert_eq!(found.len(), 10);
    }

    #[test]
    fn test_dedup_across_tables() {
        // All points near the origin with a huge W: every table returns the
        // same bucket, so deduplication must kick in.
        let points: Vec<Point> = (0..5)
            .map(|i| Point::new(vec![i as f64 * 0.001, 0.0]))
            .collect();
        let params = wide_params(2, 1.0);
        let mut index = RnnIndex::with_dataset(&params, &points).unwrap();

        let found = index.query(&points[0]).unwrap();
        assert_eq!(found.len(), 5);
        let mut seen = std::collections::HashSet::new();
        for p in &found {
            assert!(seen.insert(*p as *const Point));
        }
    }

    #[test]
    fn test_incremental_insert_and_query() {
        let params = wide_params(3, 5.0).with_table_kind(TableKind::LinkedChain);
        let mut index = RnnIndex::new_empty(&params, 2).unwrap();

        let a = Point::new(vec![0.0, 0.0, 0.0]);
        let b = Point::new(vec![3.0, 4.0, 0.0]);
        index.insert(&a).unwrap();
        index.insert(&b).unwrap();

        // Distance is exactly 5.
        let found = index.query(&a).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_marked_set_growth_on_insert() {
        let params = wide_params(2, 1.0).with_table_kind(TableKind::LinkedChain);
        let mut index = RnnIndex::new_empty(&params, 1).unwrap();
        let points: Vec<Point> = (0..20)
            .map(|i| Point::new(vec![i as f64, 0.0]))
            .collect();
        for p in &points {
            index.insert(p).unwrap();
        }
        assert_eq!(index.n_points(), 20);
        // Query still works after growth.
        let found = index.query(&points[0]).unwrap();
        assert!(!found.is_empty());
    }
}
