//! Integration tests for dense block detection
//!
//! Plants dense blocks in a sparse random background and checks that the
//! extractors and the multi-block run recover them, end to end from a text
//! file to the block files.

use fast_denseblock::config::Config;
use fast_denseblock::density::DensityMeasure;
use fast_denseblock::extractor::{
    bidirectional_search, BlockExtractor, ExtractorKind, MBiz, MBizRandom, MZoom, SizeBounds,
};
use fast_denseblock::iter_log::LogBackend;
use fast_denseblock::orchestrator::{find_dense_blocks, Orchestrator};
use fast_denseblock::tensor::{Tensor, WorkingTensor};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;
use temp_dir::TempDir;

const CARDINALITY: usize = 20;

fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Random background of unit-mass tuples plus cubic blocks of heavy cells.
/// Each planted block is `(first value, side, cell mass)`.
fn create_test_tensor(seed: u64, background: usize, planted: &[(usize, usize, f64)]) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows: Vec<[usize; 3]> = Vec::new();
    let mut masses = Vec::new();

    for _ in 0..background {
        rows.push([
            rng.random_range(0..CARDINALITY),
            rng.random_range(0..CARDINALITY),
            rng.random_range(0..CARDINALITY),
        ]);
        masses.push(1.0);
    }
    for &(start, side, mass) in planted {
        for i in start..start + side {
            for j in start..start + side {
                for k in start..start + side {
                    rows.push([i, j, k]);
                    masses.push(mass);
                }
            }
        }
    }

    let attributes = Array2::from_shape_fn((rows.len(), 3), |(t, attr)| rows[t][attr]);
    Tensor::from_tuples(vec![CARDINALITY; 3], attributes, masses).unwrap()
}

fn range_sets(start: usize, side: usize) -> Vec<BTreeSet<usize>> {
    vec![(start..start + side).collect(); 3]
}

#[test]
fn test_mzoom_recovers_planted_block() {
    let tensor = WorkingTensor::new(Arc::new(create_test_tensor(1, 200, &[(0, 4, 5.0)])));
    for measure in [
        DensityMeasure::Arithmetic,
        DensityMeasure::Geometric,
        DensityMeasure::Suspiciousness,
    ] {
        let block = MZoom::new()
            .extract(&tensor, &SizeBounds::default(), measure)
            .unwrap();
        assert_eq!(block.to_value_sets(), range_sets(0, 4), "measure {}", measure);
    }
}

#[test]
fn test_mbiz_keeps_planted_block() {
    let tensor = WorkingTensor::new(Arc::new(create_test_tensor(2, 200, &[(0, 4, 5.0)])));
    let block = MBiz::new(MZoom::new())
        .extract(&tensor, &SizeBounds::default(), DensityMeasure::Arithmetic)
        .unwrap();
    assert_eq!(block.to_value_sets(), range_sets(0, 4));
}

#[test]
fn test_bidirectional_search_grows_partial_seed() {
    let tensor = WorkingTensor::new(Arc::new(create_test_tensor(3, 200, &[(0, 4, 5.0)])));
    // two of the four planted values per attribute
    let mask: Vec<Vec<bool>> = (0..3)
        .map(|_| (0..CARDINALITY).map(|value| value < 2).collect())
        .collect();
    let outcome = bidirectional_search(
        &tensor,
        &SizeBounds::default(),
        DensityMeasure::Arithmetic,
        mask,
    )
    .unwrap();
    assert!(outcome.moves >= 6);
    assert_eq!(outcome.block.to_value_sets(), range_sets(0, 4));
}

#[test]
fn test_size_bounds_hold_for_every_algorithm() {
    let tensor = Arc::new(create_test_tensor(4, 300, &[(0, 5, 4.0)]));
    let bounds = SizeBounds::new(3, 9).unwrap();
    for kind in [ExtractorKind::MZoom, ExtractorKind::MBiz] {
        let result = Orchestrator::builder()
            .with_kind(kind, LogBackend::Memory, None)
            .block_count(3)
            .bounds(bounds)
            .measure(DensityMeasure::Geometric)
            .build()
            .unwrap()
            .run(Arc::clone(&tensor))
            .unwrap();
        for block in &result.blocks {
            assert!(
                bounds.contains(block.descriptor.size()),
                "{} returned {}",
                kind,
                block.descriptor
            );
        }
    }
}

#[test]
fn test_two_planted_blocks_are_found_in_order() {
    init_logger();
    let tensor = Arc::new(create_test_tensor(
        5,
        150,
        &[(0, 4, 6.0), (10, 4, 3.0)],
    ));
    let result = find_dense_blocks(
        tensor,
        2,
        SizeBounds::default(),
        DensityMeasure::Arithmetic,
        ExtractorKind::MZoom,
    )
    .unwrap();

    assert_eq!(result.blocks[0].value_sets, range_sets(0, 4));
    assert_eq!(result.blocks[1].value_sets, range_sets(10, 4));
    assert!(result.blocks[0].density > result.blocks[1].density);
    assert!(result.blocks[0].mass >= 64.0 * 6.0);
    assert_eq!(result.diversity, 1.0);
}

#[test]
fn test_diversity_within_unit_interval() {
    init_logger();
    let tensor = Arc::new(create_test_tensor(6, 400, &[]));
    let result = find_dense_blocks(
        tensor,
        4,
        SizeBounds::default(),
        DensityMeasure::Suspiciousness,
        ExtractorKind::MBiz,
    )
    .unwrap();
    assert_eq!(result.blocks.len(), 4);
    assert!((0.0..=1.0).contains(&result.diversity));
}

#[test]
fn test_spill_log_matches_memory_log() {
    let dir = TempDir::new().expect("Could not create temporary directory");
    let tensor = WorkingTensor::new(Arc::new(create_test_tensor(7, 250, &[(3, 3, 4.0)])));

    let in_memory = MZoom::new()
        .extract(&tensor, &SizeBounds::default(), DensityMeasure::Geometric)
        .unwrap();
    let spilled = MZoom::with_backend(LogBackend::Spill {
        dir: dir.path().to_path_buf(),
    })
    .extract(&tensor, &SizeBounds::default(), DensityMeasure::Geometric)
    .unwrap();

    assert_eq!(in_memory, spilled);
    // spill files are removed once the extraction is over
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_random_seed_runs_are_reproducible() {
    let tensor = WorkingTensor::new(Arc::new(create_test_tensor(8, 200, &[(0, 4, 5.0)])));
    let bounds = SizeBounds::default();
    let mut first = MBizRandom::with_seed(21);
    let mut second = MBizRandom::with_seed(21);
    for _ in 0..3 {
        assert_eq!(
            first
                .extract(&tensor, &bounds, DensityMeasure::Arithmetic)
                .unwrap(),
            second
                .extract(&tensor, &bounds, DensityMeasure::Arithmetic)
                .unwrap()
        );
    }
}

#[test]
fn test_end_to_end_from_text_file() {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let tensor = create_test_tensor(9, 200, &[(0, 4, 5.0)]);

    let mut content = String::new();
    for tuple in 0..tensor.omega() {
        let row = tensor.tuple(tuple);
        content.push_str(&format!(
            "user{},item{},day{},{}\n",
            row[0],
            row[1],
            row[2],
            tensor.masses()[tuple]
        ));
    }
    let input = dir.path().join("ratings.csv");
    fs::write(&input, content).unwrap();
    let output = dir.path().join("blocks");

    let args = vec![
        "fast_denseblock".to_string(),
        input.display().to_string(),
        output.display().to_string(),
        "3".to_string(),
        "ari".to_string(),
        "2".to_string(),
        "--algorithm".to_string(),
        "mbiz".to_string(),
    ];
    let config = Config::new(args.into_iter()).unwrap();
    let result = fast_denseblock::run(&config).unwrap();
    assert_eq!(result.blocks.len(), 2);

    let attributes = fs::read_to_string(output.join("block_1.attributes")).unwrap();
    let expected: Vec<String> = ["user", "item", "day"]
        .iter()
        .enumerate()
        .flat_map(|(attr, prefix)| (0..4).map(move |v| format!("{},{}{}", attr, prefix, v)))
        .collect();
    let mut lines: Vec<&str> = attributes.lines().collect();
    lines.sort();
    let mut expected: Vec<&str> = expected.iter().map(|s| s.as_str()).collect();
    expected.sort();
    assert_eq!(lines, expected);

    let tuples = fs::read_to_string(output.join("block_1.tuples")).unwrap();
    assert!(tuples.lines().count() >= 64);
    assert!(output.join("block_2.tuples").exists());
    assert!(output.join("summary.json").exists());
}
