//! # M-Zoom
//!
//! Shrink-only greedy search. Starting from the whole tensor, each
//! iteration removes the attribute value whose removal gives the highest
//! density, until every value is gone. The best block seen within the size
//! bounds is then rebuilt from the removal log.
//!
//! One min-heap per attribute holds, for each remaining value, the mass of
//! the still-active tuples carrying it. When a value is removed, each of its
//! active tuples is subtracted once from the heaps of the other attributes
//! and then deactivated, so a tuple takes part in at most `dimension`
//! heap updates over the whole run.

/**
 * File: /src/extractor/mzoom.rs
 * Created Date: Tuesday, March 3rd 2026
 * Author: Zihan
 * -----
 * Last Modified: Monday, 9th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-03		Zihan	Shrink search with per-attribute min-heaps
 * 2026-03-04		Zihan	Stepping interface so heap state can be inspected
 * 2026-03-09		Zihan	Ignore density gains within rounding noise
 */

use log::{debug, warn};

use super::{BlockExtractor, SizeBounds};
use crate::block::BlockDescriptor;
use crate::density::{improves, DensityMeasure, Measure, INVALID_DENSITY};
use crate::error::DenseBlockError;
use crate::heap::MinHeap;
use crate::iter_log::{BlockIterLog, IterLogBackend, LogBackend};
use crate::tensor::WorkingTensor;

/// One committed removal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Removal {
    pub attribute: usize,
    pub value: usize,
    /// Density of the block left after the removal
    pub density: f64,
}

/// State of one shrink pass over a working tensor
pub struct ShrinkSearch<'t> {
    tensor: &'t WorkingTensor,
    bounds: SizeBounds,
    /// tuple -> mass while active, 0 once any of its values was removed
    active_masses: Vec<f64>,
    heaps: Vec<MinHeap>,
    measure: Measure,
    log: BlockIterLog,
    size: usize,
    iteration: usize,
    initial_size: usize,
    best_density: f64,
    best_iteration: usize,
}

impl<'t> ShrinkSearch<'t> {
    pub fn new(
        tensor: &'t WorkingTensor,
        bounds: SizeBounds,
        kind: DensityMeasure,
        log_backend: &LogBackend,
    ) -> Result<Self, DenseBlockError> {
        let cardinalities = tensor.cardinalities();
        let value_masses = tensor.attribute_value_masses();
        let heaps: Vec<MinHeap> = value_masses
            .iter()
            .map(|masses| {
                let mut heap = MinHeap::new(masses.len());
                for (value, &mass) in masses.iter().enumerate() {
                    heap.insert(value, mass);
                }
                heap
            })
            .collect();

        let mut measure = Measure::new(kind);
        let initial_density = measure.initialize(cardinalities, tensor.total_mass());
        let initial_size: usize = cardinalities.iter().sum();
        let best_density = if bounds.contains(initial_size) {
            initial_density
        } else {
            INVALID_DENSITY
        };

        Ok(Self {
            tensor,
            bounds,
            active_masses: tensor.masses().to_vec(),
            heaps,
            measure,
            log: BlockIterLog::new(cardinalities, log_backend)?,
            size: initial_size,
            iteration: 0,
            initial_size,
            best_density,
            best_iteration: 0,
        })
    }

    /// Whether every attribute value has been removed
    pub fn is_done(&self) -> bool {
        self.iteration >= self.initial_size
    }

    /// Remove the value whose removal maximizes density.
    ///
    /// Returns `None` once the pass is done.
    pub fn step(&mut self) -> Result<Option<Removal>, DenseBlockError> {
        if self.is_done() {
            return Ok(None);
        }

        // first attribute wins ties
        let mut choice: Option<(usize, f64)> = None;
        for (attribute, heap) in self.heaps.iter().enumerate() {
            if let Some((_, min_mass)) = heap.peek() {
                let density = self.measure.if_removed(attribute, 1, min_mass);
                if choice.map_or(true, |(_, best)| improves(density, best)) {
                    choice = Some((attribute, density));
                }
            }
        }
        let attribute = match choice {
            Some((attribute, _)) => attribute,
            None => return Ok(None),
        };
        let (value, mass) = match self.heaps[attribute].poll() {
            Some(top) => top,
            None => return Ok(None),
        };

        let density = self.measure.remove(attribute, 1, mass);
        self.iteration += 1;
        self.size -= 1;
        if self.bounds.contains(self.size) && improves(density, self.best_density) {
            self.best_density = density;
            self.best_iteration = self.iteration;
        }
        self.log.add_entry(attribute, value)?;
        self.deactivate_tuples(attribute, value);

        Ok(Some(Removal {
            attribute,
            value,
            density,
        }))
    }

    fn deactivate_tuples(&mut self, attribute: usize, value: usize) {
        let tensor: &'t WorkingTensor = self.tensor;
        let base = tensor.base();
        for &tuple in base.tuples_with(attribute, value) {
            let mass = self.active_masses[tuple];
            if mass > 0.0 {
                for (dim, &other_value) in base.tuple(tuple).iter().enumerate() {
                    if dim != attribute {
                        let heap = &mut self.heaps[dim];
                        heap.update_priority(other_value, heap.priority(other_value) - mass);
                    }
                }
            }
            self.active_masses[tuple] = 0.0;
        }
    }

    /// Run the remaining iterations
    pub fn run_to_end(&mut self) -> Result<(), DenseBlockError> {
        while self.step()?.is_some() {}
        Ok(())
    }

    /// Block left after the first `iteration` removals
    pub fn materialize(&mut self, iteration: usize) -> Result<BlockDescriptor, DenseBlockError> {
        self.log.materialize_suffix(iteration)
    }

    /// Finish the pass and rebuild the best block within the bounds
    pub fn finish(mut self) -> Result<BlockDescriptor, DenseBlockError> {
        self.run_to_end()?;
        if self.best_density == INVALID_DENSITY {
            warn!(
                "No block within size bounds [{}, {}] has a defined density, returning the whole tensor",
                self.bounds.lower, self.bounds.upper
            );
        }
        let best_iteration = self.best_iteration;
        self.log.materialize_suffix(best_iteration)
    }

    pub fn heaps(&self) -> &[MinHeap] {
        &self.heaps
    }

    /// Summed mass of the tuples not yet deactivated
    pub fn active_mass(&self) -> f64 {
        self.active_masses.iter().sum()
    }

    /// Sum of the cardinalities of the current block
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn best_density(&self) -> f64 {
        self.best_density
    }

    pub fn best_iteration(&self) -> usize {
        self.best_iteration
    }
}

/// M-Zoom single-block extractor
#[derive(Debug, Clone, Default)]
pub struct MZoom {
    log_backend: LogBackend,
}

impl MZoom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(log_backend: LogBackend) -> Self {
        Self { log_backend }
    }
}

impl BlockExtractor for MZoom {
    fn extract(
        &mut self,
        tensor: &WorkingTensor,
        bounds: &SizeBounds,
        measure: DensityMeasure,
    ) -> Result<BlockDescriptor, DenseBlockError> {
        let mut search = ShrinkSearch::new(tensor, *bounds, measure, &self.log_backend)?;
        search.run_to_end()?;
        debug!(
            "M-Zoom: best density {:.4} after {} of {} removals",
            search.best_density(),
            search.best_iteration(),
            search.iteration()
        );
        search.finish()
    }

    fn name(&self) -> &str {
        "M-Zoom"
    }
}
