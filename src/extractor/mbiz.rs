//! # M-Biz
//!
//! Bidirectional local search. From a seed block, every move either removes
//! an included attribute value or inserts an excluded one, picking whichever
//! single move raises the density the most, until no move helps.
//!
//! Per attribute there are two heaps:
//! - a min-heap of included values keyed by the mass of the block tuples
//!   they carry (candidates for removal)
//! - a max-heap of excluded values keyed by the mass of the tuples that would
//!   join the block if that one value were inserted (candidates for insertion)
//!
//! Each tuple tracks how many of its values are outside the block. Only
//! tuples with zero or one excluded value contribute to a heap, so a move
//! touches the tuples of one value and a constant number of heap entries
//! per tuple.

/**
 * File: /src/extractor/mbiz.rs
 * Created Date: Wednesday, March 4th 2026
 * Author: Zihan
 * -----
 * Last Modified: Monday, 9th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-04		Zihan	Bidirectional search seeded by M-Zoom
 * 2026-03-05		Zihan	Random seed variant
 * 2026-03-09		Zihan	Ignore density gains within rounding noise
 */

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{BlockExtractor, MZoom, SizeBounds};
use crate::block::BlockDescriptor;
use crate::density::{improves, DensityMeasure, Measure};
use crate::error::DenseBlockError;
use crate::heap::{MaxHeap, MinHeap};
use crate::tensor::WorkingTensor;

/// Block reached by a bidirectional search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub block: BlockDescriptor,
    pub density: f64,
    /// Number of accepted insertions and removals
    pub moves: usize,
}

/// One applied bidirectional move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Remove { attribute: usize, value: usize },
    Insert { attribute: usize, value: usize },
}

/// State of a bidirectional search from one seed block
pub struct BidirectionalSearch<'t> {
    tensor: &'t WorkingTensor,
    bounds: SizeBounds,
    /// `mask[attr][value]` tells whether `value` of `attr` is in the block
    mask: Vec<Vec<bool>>,
    /// tuple -> number of its values outside the block
    excluded_counts: Vec<usize>,
    in_heaps: Vec<MinHeap>,
    out_heaps: Vec<MaxHeap>,
    measure: Measure,
    size: usize,
    density: f64,
    moves: usize,
}

impl<'t> BidirectionalSearch<'t> {
    pub fn new(
        tensor: &'t WorkingTensor,
        bounds: SizeBounds,
        kind: DensityMeasure,
        mask: Vec<Vec<bool>>,
    ) -> Result<Self, DenseBlockError> {
        let base = tensor.base();
        let cardinalities = tensor.cardinalities();
        let dimension = tensor.dimension();
        check_mask(&mask, cardinalities)?;

        let mut excluded_counts = vec![0usize; tensor.omega()];
        let mut in_masses: Vec<Vec<f64>> = cardinalities.iter().map(|&c| vec![0.0; c]).collect();
        let mut out_masses: Vec<Vec<f64>> = cardinalities.iter().map(|&c| vec![0.0; c]).collect();
        let mut block_mass = 0.0;

        for (tuple, &mass) in tensor.masses().iter().enumerate() {
            let row = base.tuple(tuple);
            let mut missing_attr = 0;
            for attr in 0..dimension {
                if !mask[attr][row[attr]] {
                    excluded_counts[tuple] += 1;
                    missing_attr = attr;
                }
            }
            match excluded_counts[tuple] {
                0 => {
                    block_mass += mass;
                    for attr in 0..dimension {
                        in_masses[attr][row[attr]] += mass;
                    }
                }
                1 => out_masses[missing_attr][row[missing_attr]] += mass,
                _ => {}
            }
        }

        let mut in_heaps: Vec<MinHeap> = Vec::with_capacity(dimension);
        let mut out_heaps: Vec<MaxHeap> = Vec::with_capacity(dimension);
        let mut block_cardinalities = vec![0usize; dimension];
        for attr in 0..dimension {
            let mut in_heap = MinHeap::new(cardinalities[attr]);
            let mut out_heap = MaxHeap::new(cardinalities[attr]);
            for value in 0..cardinalities[attr] {
                if mask[attr][value] {
                    in_heap.insert(value, in_masses[attr][value]);
                    block_cardinalities[attr] += 1;
                } else {
                    out_heap.insert(value, out_masses[attr][value]);
                }
            }
            in_heaps.push(in_heap);
            out_heaps.push(out_heap);
        }

        let mut measure = Measure::new(kind);
        let density = measure.initialize_with_block(
            cardinalities,
            tensor.total_mass(),
            &block_cardinalities,
            block_mass,
        );

        Ok(Self {
            tensor,
            bounds,
            mask,
            excluded_counts,
            in_heaps,
            out_heaps,
            measure,
            size: block_cardinalities.iter().sum(),
            density,
            moves: 0,
        })
    }

    /// Apply the single move that raises the density the most.
    ///
    /// Removals are tried before insertions, in attribute order. Returns
    /// `None` once no move improves the density.
    pub fn step(&mut self) -> Option<Move> {
        let mut best: Option<(bool, usize)> = None;
        let mut best_density = self.density;
        if self.size > self.bounds.lower {
            for (attr, heap) in self.in_heaps.iter().enumerate() {
                if let Some((_, mass)) = heap.peek() {
                    let density = self.measure.if_removed(attr, 1, mass);
                    if improves(density, best_density) {
                        best_density = density;
                        best = Some((false, attr));
                    }
                }
            }
        }
        if self.size < self.bounds.upper {
            for (attr, heap) in self.out_heaps.iter().enumerate() {
                if let Some((_, mass)) = heap.peek() {
                    let density = self.measure.if_inserted(attr, 1, mass);
                    if improves(density, best_density) {
                        best_density = density;
                        best = Some((true, attr));
                    }
                }
            }
        }

        let applied = match best? {
            (false, attr) => self.remove_value(attr)?,
            (true, attr) => self.insert_value(attr)?,
        };
        self.moves += 1;
        Some(applied)
    }

    fn remove_value(&mut self, attr: usize) -> Option<Move> {
        let (value, mass) = self.in_heaps[attr].poll()?;
        self.density = self.measure.remove(attr, 1, mass);
        self.size -= 1;

        let tensor: &'t WorkingTensor = self.tensor;
        let base = tensor.base();
        let dimension = tensor.dimension();
        let mut mass_out = 0.0;
        for &tuple in base.tuples_with(attr, value) {
            let mass = tensor.mass(tuple);
            let row = base.tuple(tuple);
            match self.excluded_counts[tuple] {
                0 => {
                    mass_out += mass;
                    for other in (0..dimension).filter(|&other| other != attr) {
                        let heap = &mut self.in_heaps[other];
                        heap.update_priority(row[other], heap.priority(row[other]) - mass);
                    }
                }
                1 => {
                    if let Some(other) = (0..dimension)
                        .find(|&other| other != attr && !self.mask[other][row[other]])
                    {
                        let heap = &mut self.out_heaps[other];
                        heap.update_priority(row[other], heap.priority(row[other]) - mass);
                    }
                }
                _ => {}
            }
            self.excluded_counts[tuple] += 1;
        }
        self.out_heaps[attr].insert(value, mass_out);
        self.mask[attr][value] = false;
        Some(Move::Remove {
            attribute: attr,
            value,
        })
    }

    fn insert_value(&mut self, attr: usize) -> Option<Move> {
        let (value, mass) = self.out_heaps[attr].poll()?;
        self.density = self.measure.insert(attr, 1, mass);
        self.size += 1;

        let tensor: &'t WorkingTensor = self.tensor;
        let base = tensor.base();
        let dimension = tensor.dimension();
        let mut mass_in = 0.0;
        for &tuple in base.tuples_with(attr, value) {
            let mass = tensor.mass(tuple);
            let row = base.tuple(tuple);
            match self.excluded_counts[tuple] {
                1 => {
                    mass_in += mass;
                    for other in (0..dimension).filter(|&other| other != attr) {
                        let heap = &mut self.in_heaps[other];
                        heap.update_priority(row[other], heap.priority(row[other]) + mass);
                    }
                }
                2 => {
                    if let Some(other) = (0..dimension)
                        .find(|&other| other != attr && !self.mask[other][row[other]])
                    {
                        let heap = &mut self.out_heaps[other];
                        heap.update_priority(row[other], heap.priority(row[other]) + mass);
                    }
                }
                _ => {}
            }
            self.excluded_counts[tuple] -= 1;
        }
        self.in_heaps[attr].insert(value, mass_in);
        self.mask[attr][value] = true;
        Some(Move::Insert {
            attribute: attr,
            value,
        })
    }

    /// Apply moves until none improves the density
    pub fn run_to_end(&mut self) {
        while self.step().is_some() {}
    }

    pub fn finish(mut self) -> SearchOutcome {
        self.run_to_end();
        SearchOutcome {
            block: BlockDescriptor::from_mask(&self.mask),
            density: self.density,
            moves: self.moves,
        }
    }

    pub fn mask(&self) -> &[Vec<bool>] {
        &self.mask
    }

    pub fn excluded_counts(&self) -> &[usize] {
        &self.excluded_counts
    }

    /// Included values keyed by the mass of the block tuples carrying them
    pub fn in_heaps(&self) -> &[MinHeap] {
        &self.in_heaps
    }

    /// Excluded values keyed by the mass their insertion would add
    pub fn out_heaps(&self) -> &[MaxHeap] {
        &self.out_heaps
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn moves(&self) -> usize {
        self.moves
    }
}

/// Improve the block given by `mask` with single-value moves.
///
/// `mask[attr][value]` tells whether `value` of `attr` is in the seed block.
/// Removals are only tried while the block size is above `bounds.lower`,
/// insertions only while it is below `bounds.upper`.
pub fn bidirectional_search(
    tensor: &WorkingTensor,
    bounds: &SizeBounds,
    measure: DensityMeasure,
    mask: Vec<Vec<bool>>,
) -> Result<SearchOutcome, DenseBlockError> {
    Ok(BidirectionalSearch::new(tensor, *bounds, measure, mask)?.finish())
}

fn check_mask(mask: &[Vec<bool>], cardinalities: &[usize]) -> Result<(), DenseBlockError> {
    if mask.len() != cardinalities.len() {
        return Err(DenseBlockError::InvalidConfiguration(format!(
            "seed mask has {} attributes, tensor has {}",
            mask.len(),
            cardinalities.len()
        )));
    }
    for (attr, (values, &cardinality)) in mask.iter().zip(cardinalities).enumerate() {
        if values.len() != cardinality {
            return Err(DenseBlockError::InvalidConfiguration(format!(
                "seed mask of attribute {} has {} values, expected {}",
                attr,
                values.len(),
                cardinality
            )));
        }
    }
    Ok(())
}

/// Random seed block: every value is kept with probability 1/2, redrawing
/// an attribute until at least one of its values is kept
pub fn random_seed_mask<R: Rng>(cardinalities: &[usize], rng: &mut R) -> Vec<Vec<bool>> {
    cardinalities
        .iter()
        .map(|&cardinality| {
            if cardinality == 0 {
                return Vec::new();
            }
            loop {
                let values: Vec<bool> = (0..cardinality).map(|_| rng.random_bool(0.5)).collect();
                if values.iter().any(|&kept| kept) {
                    break values;
                }
            }
        })
        .collect()
}

/// M-Biz seeded with the M-Zoom block
#[derive(Debug, Clone, Default)]
pub struct MBiz {
    seed_extractor: MZoom,
}

impl MBiz {
    pub fn new(seed_extractor: MZoom) -> Self {
        Self { seed_extractor }
    }
}

impl BlockExtractor for MBiz {
    fn extract(
        &mut self,
        tensor: &WorkingTensor,
        bounds: &SizeBounds,
        measure: DensityMeasure,
    ) -> Result<BlockDescriptor, DenseBlockError> {
        let seed = self.seed_extractor.extract(tensor, bounds, measure)?;
        let outcome = bidirectional_search(
            tensor,
            bounds,
            measure,
            seed.to_mask(tensor.cardinalities()),
        )?;
        debug!(
            "M-Biz: {} -> {} in {} moves, density {:.4}",
            seed, outcome.block, outcome.moves, outcome.density
        );
        Ok(outcome.block)
    }

    fn name(&self) -> &str {
        "M-Biz"
    }
}

/// M-Biz started from a random block
#[derive(Debug, Clone)]
pub struct MBizRandom {
    rng: StdRng,
}

impl Default for MBizRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl MBizRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl BlockExtractor for MBizRandom {
    fn extract(
        &mut self,
        tensor: &WorkingTensor,
        bounds: &SizeBounds,
        measure: DensityMeasure,
    ) -> Result<BlockDescriptor, DenseBlockError> {
        let mask = random_seed_mask(tensor.cardinalities(), &mut self.rng);
        let outcome = bidirectional_search(tensor, bounds, measure, mask)?;
        debug!(
            "M-Biz (Random): {} after {} moves, density {:.4}",
            outcome.block, outcome.moves, outcome.density
        );
        Ok(outcome.block)
    }

    fn name(&self) -> &str {
        "M-Biz (Random)"
    }
}
