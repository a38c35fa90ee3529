//! Stress and property tests: recall floor, soundness sweeps, and
//! serialization properties over generated inputs.

use e2lsh::prelude::*;
use e2lsh::projection::hadamard::hadamard_transform;
use proptest::prelude::*;

/// Generate `n` points uniform in `[0, scale)^d`.
fn uniform_points(n: usize, d: usize, scale: f64, seed: u64) -> Vec<Point> {
    let mut rng = LshRng::with_seed(seed);
    (0..n)
        .map(|_| Point::new((0..d).map(|_| rng.uniform(0.0, scale)).collect()))
        .collect()
}

#[test]
fn test_recall_floor_over_repeated_builds() {
    // One planted neighbor at distance 0.8 < R = 1 inside a spread-out
    // dataset; over independent builds the neighbor must be recalled with
    // frequency at least successProbability - epsilon.
    let d = 32;
    let n = 1000;
    let n_builds: u64 = 20;
    let epsilon = 0.1;

    let mut points = uniform_points(n - 1, d, 10.0, 911);
    let query = Point::new(vec![5.0; d]);
    let mut neighbor_coords = vec![5.0; d];
    neighbor_coords[0] += 0.8;
    points.push(Point::new(neighbor_coords));
    let neighbor = points.last().unwrap().clone();

    let base = LshParams::new(d, 1.0)
        .with_success_probability(0.9)
        .with_k(4)
        .with_tables(20);

    let mut hits = 0;
    for build in 0..n_builds {
        let params = base.clone().with_seed(1000 + build);
        let mut index = RnnIndex::with_dataset(&params, &points).unwrap();
        let found = index.query(&query).unwrap();
        if found
            .iter()
            .any(|p| p.coordinates() == neighbor.coordinates())
        {
            hits += 1;
        }
    }

    let recall = hits as f64 / n_builds as f64;
    assert!(
        recall >= base.success_probability - epsilon,
        "empirical recall {} below floor",
        recall
    );
}

#[test]
fn test_soundness_never_violated() {
    let d = 16;
    let points = uniform_points(2000, d, 1.0, 313);
    let params = LshParams::new(d, 0.5).with_k(4).with_tables(10).with_seed(317);
    let mut index = RnnIndex::with_dataset(&params, &points).unwrap();

    let queries = uniform_points(50, d, 1.0, 331);
    for query in &queries {
        let found = index.query(query).unwrap();
        for p in &found {
            assert!(
                l2_distance_sqr(query, p) <= 0.25 + 1e-12,
                "soundness violated"
            );
        }
    }
}

#[test]
fn test_returned_set_is_subset_of_brute_force() {
    let d = 8;
    let r = 0.4;
    let points = uniform_points(500, d, 1.0, 41);
    let params = LshParams::new(d, r).with_k(4).with_tables(15).with_seed(43);
    let mut index = RnnIndex::with_dataset(&params, &points).unwrap();

    let queries = uniform_points(20, d, 1.0, 47);
    for query in &queries {
        let truth: std::collections::HashSet<*const Point> = points
            .iter()
            .filter(|p| l2_distance_sqr(query, p) <= r * r)
            .map(|p| p as *const Point)
            .collect();
        let found = index.query(query).unwrap();
        for p in &found {
            assert!(truth.contains(&(*p as *const Point)));
        }
    }
}

#[test]
fn test_l1_mode_soundness() {
    let d = 8;
    let r = 0.6;
    let points = uniform_points(500, d, 1.0, 53);
    let params = LshParams::new(d, r)
        .with_k(4)
        .with_tables(10)
        .with_distance(DistanceMeasure::L1)
        .with_seed(59);
    let mut index = RnnIndex::with_dataset(&params, &points).unwrap();

    let queries = uniform_points(20, d, 1.0, 61);
    for query in &queries {
        let found = index.query(query).unwrap();
        for p in &found {
            assert!(l1_distance(query, p) <= r + 1e-12, "L1 soundness violated");
        }
    }
}

#[test]
fn test_query_state_fully_restored() {
    // Interleave queries with very different candidate counts; results must
    // be independent of query history.
    let d = 4;
    let points = uniform_points(800, d, 1.0, 71);
    let params = LshParams::new(d, 0.3).with_k(4).with_tables(10).with_seed(73);
    let mut index = RnnIndex::with_dataset(&params, &points).unwrap();

    let dense_query = points[0].clone();
    let sparse_query = Point::new(vec![100.0; d]);

    let baseline: Vec<*const Point> = index
        .query(&dense_query)
        .unwrap()
        .iter()
        .map(|p| *p as *const Point)
        .collect();

    for _ in 0..5 {
        let empty = index.query(&sparse_query).unwrap();
        assert!(empty.is_empty());
        let again: Vec<*const Point> = index
            .query(&dense_query)
            .unwrap()
            .iter()
            .map(|p| *p as *const Point)
            .collect();
        assert_eq!(again, baseline);
    }
}

#[test]
fn test_incremental_index_grows_past_estimate() {
    let d = 4;
    let points = uniform_points(300, d, 0.2, 97);
    let params = LshParams::new(d, 0.5)
        .with_k(2)
        .with_tables(4)
        .with_width(100.0)
        .with_seed(101)
        .with_table_kind(TableKind::LinkedChain);

    // Deliberately tiny estimate; the marked set must double as needed.
    let mut index = RnnIndex::new_empty(&params, 2).unwrap();
    for p in &points {
        index.insert(p).unwrap();
    }

    let found = index.query(&points[0]).unwrap();
    assert_eq!(found.len(), 300);
}

proptest! {
    #[test]
    fn prop_parameter_text_round_trip(
        r in 0.0f64..100.0,
        w in 0.001f64..1000.0,
        success in 0.0f64..1.0,
        dimension in 1usize..4096,
        k in 1usize..64,
        l in 1usize..256,
        t in 0usize..10_000,
    ) {
        let mut params = LshParams::new(dimension, r)
            .with_success_probability(success)
            .with_k(k)
            .with_tables(l)
            .with_width(w);
        params.t = t;

        let mut buf = Vec::new();
        params.write_to(&mut buf).unwrap();
        let parsed = LshParams::read_from(&mut std::io::BufReader::new(buf.as_slice())).unwrap();

        prop_assert_eq!(parsed.dimension, dimension);
        prop_assert_eq!(parsed.k, k);
        prop_assert_eq!(parsed.l, l);
        prop_assert_eq!(parsed.t, t);
        prop_assert!((parsed.r - r).abs() < 1e-8);
        prop_assert!((parsed.r2 - r * r).abs() < 1e-8);
        prop_assert!((parsed.w - w).abs() < 1e-8);
        prop_assert!((parsed.success_probability - success).abs() < 1e-8);
    }

    #[test]
    fn prop_hadamard_involution(values in prop::collection::vec(-100.0f64..100.0, 1..64)) {
        let n = values.len().next_power_of_two();
        let mut buf = values.clone();
        buf.resize(n, 0.0);

        hadamard_transform(&mut buf);
        hadamard_transform(&mut buf);

        for (got, want) in buf.iter().take(values.len()).zip(&values) {
            prop_assert!((got / n as f64 - want).abs() < 1e-9);
        }
    }
}
