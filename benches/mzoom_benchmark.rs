//! Benchmarks for the block extractors and the multi-block run
//!
//! Run with: cargo bench --bench mzoom_benchmark
//! HTML reports: target/criterion/report/index.html

use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
use fast_denseblock::density::DensityMeasure;
use fast_denseblock::extractor::{BlockExtractor, ExtractorKind, MBiz, MZoom, SizeBounds};
use fast_denseblock::iter_log::LogBackend;
use fast_denseblock::orchestrator::find_dense_blocks;
use fast_denseblock::tensor::{Tensor, WorkingTensor};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Random 3-way tensor with one planted dense block
fn create_benchmark_tensor(cardinality: usize, omega: usize) -> Tensor {
    let mut rng = StdRng::seed_from_u64(42);
    let side = (cardinality / 10).max(2);
    let planted = side * side * side;

    let attributes = Array2::from_shape_fn((omega + planted, 3), |(t, attr)| {
        if t < omega {
            rng.random_range(0..cardinality)
        } else {
            let cell = t - omega;
            match attr {
                0 => cell / (side * side),
                1 => (cell / side) % side,
                _ => cell % side,
            }
        }
    });
    let masses = (0..omega + planted)
        .map(|t| if t < omega { rng.random_range(1..4) as f64 } else { 10.0 })
        .collect();
    Tensor::from_tuples(vec![cardinality; 3], attributes, masses).unwrap()
}

/// M-Zoom with each density measure on growing tensors
fn bench_mzoom(c: &mut Criterion) {
    let mut group = c.benchmark_group("mzoom");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    group.sample_size(20);

    for (cardinality, omega) in [(100, 5_000), (500, 50_000), (2_000, 200_000)] {
        let tensor = WorkingTensor::new(Arc::new(create_benchmark_tensor(cardinality, omega)));
        for measure in [
            DensityMeasure::Arithmetic,
            DensityMeasure::Geometric,
            DensityMeasure::Suspiciousness,
        ] {
            group.bench_with_input(
                BenchmarkId::new(measure.to_string(), omega),
                &tensor,
                |b, tensor| {
                    b.iter(|| {
                        MZoom::new()
                            .extract(black_box(tensor), &SizeBounds::default(), measure)
                            .unwrap()
                    });
                },
            );
        }
    }

    group.finish();
}

/// M-Zoom versus M-Biz on the same tensor
fn bench_extractors(c: &mut Criterion) {
    let mut group = c.benchmark_group("extractors");
    group.sample_size(20);

    let tensor = WorkingTensor::new(Arc::new(create_benchmark_tensor(500, 50_000)));
    group.bench_function("mzoom", |b| {
        b.iter(|| {
            MZoom::new()
                .extract(black_box(&tensor), &SizeBounds::default(), DensityMeasure::Geometric)
                .unwrap()
        });
    });
    group.bench_function("mbiz", |b| {
        b.iter(|| {
            MBiz::new(MZoom::new())
                .extract(black_box(&tensor), &SizeBounds::default(), DensityMeasure::Geometric)
                .unwrap()
        });
    });
    group.bench_function("mzoom_spill_log", |b| {
        let dir = std::env::temp_dir();
        b.iter(|| {
            MZoom::with_backend(LogBackend::Spill { dir: dir.clone() })
                .extract(black_box(&tensor), &SizeBounds::default(), DensityMeasure::Geometric)
                .unwrap()
        });
    });

    group.finish();
}

/// Multi-block run including diversity
fn bench_multi_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_block");
    group.sample_size(10);

    let tensor = Arc::new(create_benchmark_tensor(500, 50_000));
    for block_count in [1, 5, 10] {
        group.bench_with_input(
            BenchmarkId::new("find_dense_blocks", block_count),
            &block_count,
            |b, &block_count| {
                b.iter(|| {
                    find_dense_blocks(
                        Arc::clone(&tensor),
                        block_count,
                        SizeBounds::default(),
                        DensityMeasure::Arithmetic,
                        ExtractorKind::MZoom,
                    )
                    .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_mzoom, bench_extractors, bench_multi_block);

criterion_main!(benches);
