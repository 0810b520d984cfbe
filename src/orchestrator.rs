//! # Multi-Block Detection
//!
//! Runs a [`BlockExtractor`] several times on a shrinking working copy of
//! the tensor. After each round the tuples of the block found are zeroed in
//! the working copy, so later rounds look elsewhere. Every block is scored
//! against the original tensor, and the set of blocks gets a diversity score
//! (one minus the mean pairwise Jaccard similarity).
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use ndarray::array;
//! use fast_denseblock::density::DensityMeasure;
//! use fast_denseblock::extractor::{MZoom, SizeBounds};
//! use fast_denseblock::orchestrator::Orchestrator;
//! use fast_denseblock::tensor::Tensor;
//!
//! let tensor = Tensor::from_tuples(
//!     vec![2, 2],
//!     array![[0, 0], [0, 1], [1, 0], [1, 1]],
//!     vec![9.0, 1.0, 1.0, 1.0],
//! )
//! .unwrap();
//!
//! let mut orchestrator = Orchestrator::builder()
//!     .with_extractor(Box::new(MZoom::new()))
//!     .block_count(2)
//!     .measure(DensityMeasure::Arithmetic)
//!     .bounds(SizeBounds::default())
//!     .build()
//!     .unwrap();
//! let result = orchestrator.run(Arc::new(tensor)).unwrap();
//! assert_eq!(result.blocks.len(), 2);
//! assert!((0.0..=1.0).contains(&result.diversity));
//! ```

/**
 * File: /src/orchestrator.rs
 * Created Date: Thursday, March 5th 2026
 * Author: Zihan
 * -----
 * Last Modified: Friday, 6th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-05		Zihan	Repeated extraction with block removal
 * 2026-03-06		Zihan	Parallel diversity and run statistics
 */

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::block::BlockDescriptor;
use crate::density::{DensityMeasure, Measure};
use crate::error::DenseBlockError;
use crate::extractor::{BlockExtractor, ExtractorKind, SizeBounds};
use crate::iter_log::LogBackend;
use crate::tensor::{Tensor, WorkingTensor};

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Number of blocks to extract
    pub block_count: usize,
    pub bounds: SizeBounds,
    pub measure: DensityMeasure,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            block_count: 1,
            bounds: SizeBounds::default(),
            measure: DensityMeasure::Arithmetic,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), DenseBlockError> {
        if self.block_count == 0 {
            return Err(DenseBlockError::InvalidConfiguration(
                "block count must be positive".to_string(),
            ));
        }
        if self.bounds.lower > self.bounds.upper {
            return Err(DenseBlockError::InvalidBounds {
                lower: self.bounds.lower,
                upper: self.bounds.upper,
            });
        }
        if let DensityMeasure::EntrySurplus { alpha } = self.measure {
            DensityMeasure::entry_surplus(alpha)?;
        }
        Ok(())
    }
}

/// One block found by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedBlock {
    pub descriptor: BlockDescriptor,
    /// Density against the original tensor
    pub density: f64,
    /// Original mass of the tuples inside the block
    pub mass: f64,
    /// attribute -> included values
    pub value_sets: Vec<BTreeSet<usize>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DensityDistribution {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl DensityDistribution {
    /// Distribution of the finite densities, zeros when there are none
    pub fn from_densities(densities: &[f64]) -> Self {
        let finite: Vec<f64> = densities.iter().copied().filter(|d| d.is_finite()).collect();
        if finite.is_empty() {
            return Self::default();
        }
        Self {
            min: Statistics::min(finite.iter()),
            max: Statistics::max(finite.iter()),
            mean: Statistics::mean(finite.iter()),
            std_dev: if finite.len() > 1 {
                Statistics::population_std_dev(finite.iter())
            } else {
                0.0
            },
        }
    }
}

/// Run statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionStats {
    pub total_duration: Duration,
    pub extraction_duration: Duration,
    pub scoring_duration: Duration,
    pub diversity_duration: Duration,
    pub extractor: String,
    pub density_distribution: DensityDistribution,
}

/// Blocks found by one run, in extraction order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub blocks: Vec<DetectedBlock>,
    pub diversity: f64,
    pub stats: DetectionStats,
}

impl DetectionResult {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Found {} blocks with {}, diversity {:.4}",
            self.blocks.len(),
            self.stats.extractor,
            self.diversity
        );
        for (i, block) in self.blocks.iter().enumerate().take(5) {
            summary.push_str(&format!(
                "\n  #{}: {}, density: {:.4}, mass: {}",
                i + 1,
                block.descriptor,
                block.density,
                block.mass
            ));
        }
        if self.blocks.len() > 5 {
            summary.push_str(&format!("\n  ... and {} more", self.blocks.len() - 5));
        }
        summary
    }
}

/// Repeated single-block extraction
pub struct Orchestrator {
    extractor: Box<dyn BlockExtractor>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn new(
        extractor: Box<dyn BlockExtractor>,
        config: OrchestratorConfig,
    ) -> Result<Self, DenseBlockError> {
        config.validate()?;
        Ok(Self { extractor, config })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn run(&mut self, tensor: Arc<Tensor>) -> Result<DetectionResult, DenseBlockError> {
        let start_time = Instant::now();
        let config = self.config.clone();
        info!(
            "Searching {} blocks with {} ({} measure) in {}",
            config.block_count,
            self.extractor.name(),
            config.measure,
            tensor
        );

        let mut scoring_measure = Measure::new(config.measure);
        scoring_measure.initialize(tensor.cardinalities(), tensor.total_mass());
        let mut working = WorkingTensor::new(Arc::clone(&tensor));

        let mut blocks = Vec::with_capacity(config.block_count);
        let mut extraction_duration = Duration::ZERO;
        let mut scoring_duration = Duration::ZERO;
        for i in 0..config.block_count {
            let extraction_start = Instant::now();
            let descriptor = self
                .extractor
                .extract(&working, &config.bounds, config.measure)?;
            extraction_duration += extraction_start.elapsed();

            let scoring_start = Instant::now();
            let mass = working.remove_block(&descriptor);
            let density = scoring_measure.density(mass, descriptor.cardinalities());
            scoring_duration += scoring_start.elapsed();

            info!(
                "Block {}/{}: {}, density: {:.4}, mass: {}",
                i + 1,
                config.block_count,
                descriptor,
                density,
                mass
            );
            debug!("{:.4} mass left in the working tensor", working.total_mass());

            blocks.push(DetectedBlock {
                value_sets: descriptor.to_value_sets(),
                descriptor,
                density,
                mass,
            });
        }

        let diversity_start = Instant::now();
        let value_sets: Vec<Vec<BTreeSet<usize>>> =
            blocks.iter().map(|block| block.value_sets.clone()).collect();
        let diversity = diversity(&value_sets);
        let diversity_duration = diversity_start.elapsed();

        let densities: Vec<f64> = blocks.iter().map(|block| block.density).collect();
        let total_duration = start_time.elapsed();
        info!(
            "Detection completed in {:?}, diversity {:.4}",
            total_duration, diversity
        );

        Ok(DetectionResult {
            blocks,
            diversity,
            stats: DetectionStats {
                total_duration,
                extraction_duration,
                scoring_duration,
                diversity_duration,
                extractor: self.extractor.name().to_string(),
                density_distribution: DensityDistribution::from_densities(&densities),
            },
        })
    }
}

/// Orchestrator builder
pub struct OrchestratorBuilder {
    extractor: Option<Box<dyn BlockExtractor>>,
    config: OrchestratorConfig,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            extractor: None,
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn BlockExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Build the extractor from its kind
    pub fn with_kind(self, kind: ExtractorKind, log_backend: LogBackend, seed: Option<u64>) -> Self {
        self.with_extractor(kind.build(log_backend, seed))
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn block_count(mut self, block_count: usize) -> Self {
        self.config.block_count = block_count;
        self
    }

    pub fn bounds(mut self, bounds: SizeBounds) -> Self {
        self.config.bounds = bounds;
        self
    }

    pub fn measure(mut self, measure: DensityMeasure) -> Self {
        self.config.measure = measure;
        self
    }

    pub fn build(self) -> Result<Orchestrator, DenseBlockError> {
        let extractor = self.extractor.ok_or_else(|| {
            DenseBlockError::InvalidConfiguration("extractor not set".to_string())
        })?;
        Orchestrator::new(extractor, self.config)
    }
}

/// Find `block_count` dense blocks with an in-memory removal log
pub fn find_dense_blocks(
    tensor: Arc<Tensor>,
    block_count: usize,
    bounds: SizeBounds,
    measure: DensityMeasure,
    kind: ExtractorKind,
) -> Result<DetectionResult, DenseBlockError> {
    Orchestrator::builder()
        .with_kind(kind, LogBackend::Memory, None)
        .block_count(block_count)
        .bounds(bounds)
        .measure(measure)
        .build()?
        .run(tensor)
}

fn jaccard(a: &[BTreeSet<usize>], b: &[BTreeSet<usize>]) -> f64 {
    let mut intersection = 0;
    let mut union = 0;
    for (values_a, values_b) in a.iter().zip(b) {
        intersection += values_a.intersection(values_b).count();
        union += values_a.union(values_b).count();
    }
    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}

/// One minus the mean pairwise Jaccard similarity of the blocks.
///
/// Each block is given as one value set per attribute; a pair's similarity
/// sums intersections and unions over the attributes. Zero for fewer than
/// two blocks.
pub fn diversity(blocks: &[Vec<BTreeSet<usize>>]) -> f64 {
    let n = blocks.len();
    if n < 2 {
        return 0.0;
    }
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();
    let similarity: f64 = pairs
        .par_iter()
        .map(|&(i, j)| jaccard(&blocks[i], &blocks[j]))
        .sum();
    1.0 - similarity / pairs.len() as f64
}
