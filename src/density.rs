//! # Density Measures
//!
//! Objective functions scoring a block's mass relative to its size.
//! [`DensityMeasure`] is the user-facing selector, [`Measure`] is the
//! stateful instance an extractor owns for one run. Every variant keeps
//! the block statistics it needs and answers pure "what-if" queries
//! (`if_removed`, `if_inserted`) as well as committing mutations
//! (`remove`, `insert`).
//!
//! Degenerate blocks (empty, or zero mass where the formula needs a
//! logarithm) score [`INVALID_DENSITY`], which is lower than any real
//! density so such a block never wins a comparison.

/**
 * File: /src/density.rs
 * Created Date: Monday, March 2nd 2026
 * Author: Zihan
 * -----
 * Last Modified: Monday, 9th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-02		Zihan	Arithmetic, geometric, suspiciousness and entry surplus
 * 2026-03-04		Zihan	Single invalid-density constant for all measures
 * 2026-03-09		Zihan	Tolerance for density gains and residual masses
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DenseBlockError;

/// Density of a block the measure is undefined for
pub const INVALID_DENSITY: f64 = f64::NEG_INFINITY;

/// Relative margin a density has to clear to count as an improvement
pub const DENSITY_TOLERANCE: f64 = 1e-9;

/// Share of the tensor mass under which a block counts as massless
pub const MASS_TOLERANCE: f64 = 1e-12;

/// Whether `candidate` beats `current` by more than floating-point noise.
///
/// Masses are updated by repeated subtraction, so blocks of equal density
/// can come out a few ulps apart. Any defined density beats
/// [`INVALID_DENSITY`].
pub fn improves(candidate: f64, current: f64) -> bool {
    if current == INVALID_DENSITY {
        return candidate > current;
    }
    candidate > current + DENSITY_TOLERANCE * current.abs().max(1.0)
}

/// Density measure selector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DensityMeasure {
    /// Arithmetic average mass
    Arithmetic,
    /// Geometric average mass
    Geometric,
    /// Log-likelihood of the block's mass under a uniform model
    Suspiciousness,
    /// Mass in excess of `alpha` times the expected mass
    EntrySurplus { alpha: f64 },
}

impl DensityMeasure {
    /// Create an entry surplus selector, rejecting non-positive penalties
    pub fn entry_surplus(alpha: f64) -> Result<Self, DenseBlockError> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(DenseBlockError::InvalidAlpha(alpha));
        }
        Ok(DensityMeasure::EntrySurplus { alpha })
    }

    pub fn name(&self) -> &str {
        match self {
            DensityMeasure::Arithmetic => "Arithmetic",
            DensityMeasure::Geometric => "Geometric",
            DensityMeasure::Suspiciousness => "Suspiciousness",
            DensityMeasure::EntrySurplus { .. } => "EntrySurplus",
        }
    }
}

impl fmt::Display for DensityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DensityMeasure::Arithmetic => write!(f, "ari"),
            DensityMeasure::Geometric => write!(f, "geo"),
            DensityMeasure::Suspiciousness => write!(f, "susp"),
            DensityMeasure::EntrySurplus { alpha } => write!(f, "es_{}", alpha),
        }
    }
}

/// Parse `ari`, `geo`, `susp` or `es_<alpha>` (case-insensitive)
///
/// # Example
/// ```
/// use fast_denseblock::density::DensityMeasure;
///
/// let measure: DensityMeasure = "ES_2.5".parse().unwrap();
/// assert_eq!(measure, DensityMeasure::EntrySurplus { alpha: 2.5 });
/// assert!("median".parse::<DensityMeasure>().is_err());
/// ```
impl FromStr for DensityMeasure {
    type Err = DenseBlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "ari" => Ok(DensityMeasure::Arithmetic),
            "geo" => Ok(DensityMeasure::Geometric),
            "susp" => Ok(DensityMeasure::Suspiciousness),
            other => match other.strip_prefix("es_") {
                Some(param) => {
                    let alpha = param
                        .parse::<f64>()
                        .map_err(|_| DenseBlockError::UnknownMeasure(s.to_string()))?;
                    DensityMeasure::entry_surplus(alpha)
                }
                None => Err(DenseBlockError::UnknownMeasure(s.to_string())),
            },
        }
    }
}

fn product(cardinalities: &[usize]) -> f64 {
    cardinalities.iter().map(|&c| c as f64).product()
}

/// Product of the block cardinalities with `attribute` shifted by `delta`
fn shifted_product(cardinalities: &[usize], attribute: usize, delta: isize) -> f64 {
    cardinalities
        .iter()
        .enumerate()
        .map(|(attr, &c)| {
            if attr == attribute {
                (c as isize + delta).max(0) as f64
            } else {
                c as f64
            }
        })
        .product()
}

/// Arithmetic average mass: `mass / sum(cardinalities) * dimension`
#[derive(Debug, Clone, Default)]
pub struct Arithmetic {
    dimension: usize,
    mass: f64,
    sum_of_cardinalities: usize,
}

impl Arithmetic {
    fn score(&self, mass: f64, sum_of_cardinalities: usize) -> f64 {
        if sum_of_cardinalities == 0 {
            return INVALID_DENSITY;
        }
        mass / sum_of_cardinalities as f64 * self.dimension as f64
    }

    fn initialize_with_block(&mut self, cardinalities_of_block: &[usize], mass_of_block: f64) -> f64 {
        self.dimension = cardinalities_of_block.len();
        self.mass = mass_of_block;
        self.sum_of_cardinalities = cardinalities_of_block.iter().sum();
        self.score(self.mass, self.sum_of_cardinalities)
    }

    fn if_removed(&self, num_values: usize, mass_sum: f64) -> f64 {
        self.score(
            self.mass - mass_sum,
            self.sum_of_cardinalities.saturating_sub(num_values),
        )
    }

    fn if_inserted(&self, num_values: usize, mass_sum: f64) -> f64 {
        self.score(self.mass + mass_sum, self.sum_of_cardinalities + num_values)
    }

    fn remove(&mut self, num_values: usize, mass_sum: f64) -> f64 {
        self.mass -= mass_sum;
        self.sum_of_cardinalities = self.sum_of_cardinalities.saturating_sub(num_values);
        self.score(self.mass, self.sum_of_cardinalities)
    }

    fn insert(&mut self, num_values: usize, mass_sum: f64) -> f64 {
        self.mass += mass_sum;
        self.sum_of_cardinalities += num_values;
        self.score(self.mass, self.sum_of_cardinalities)
    }

    fn density(&self, mass: f64, cardinalities: &[usize]) -> f64 {
        self.score(mass, cardinalities.iter().sum())
    }
}

/// Geometric average mass: `mass / prod(cardinalities)^(1/dimension)`
#[derive(Debug, Clone, Default)]
pub struct Geometric {
    dimension: usize,
    mass: f64,
    cardinalities: Vec<usize>,
    product_of_cardinalities: f64,
}

impl Geometric {
    fn score(&self, mass: f64, product_of_cardinalities: f64) -> f64 {
        if product_of_cardinalities == 0.0 {
            return INVALID_DENSITY;
        }
        mass / product_of_cardinalities.powf(1.0 / self.dimension as f64)
    }

    fn initialize_with_block(&mut self, cardinalities_of_block: &[usize], mass_of_block: f64) -> f64 {
        self.dimension = cardinalities_of_block.len();
        self.cardinalities = cardinalities_of_block.to_vec();
        self.mass = mass_of_block;
        self.product_of_cardinalities = product(&self.cardinalities);
        self.score(self.mass, self.product_of_cardinalities)
    }

    fn if_removed(&self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        let volume = shifted_product(&self.cardinalities, attribute, -(num_values as isize));
        self.score(self.mass - mass_sum, volume)
    }

    fn if_inserted(&self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        let volume = shifted_product(&self.cardinalities, attribute, num_values as isize);
        self.score(self.mass + mass_sum, volume)
    }

    fn remove(&mut self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        self.cardinalities[attribute] = self.cardinalities[attribute].saturating_sub(num_values);
        self.product_of_cardinalities = product(&self.cardinalities);
        self.mass -= mass_sum;
        self.score(self.mass, self.product_of_cardinalities)
    }

    fn insert(&mut self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        self.cardinalities[attribute] += num_values;
        self.product_of_cardinalities = product(&self.cardinalities);
        self.mass += mass_sum;
        self.score(self.mass, self.product_of_cardinalities)
    }

    fn density(&self, mass: f64, cardinalities: &[usize]) -> f64 {
        self.score(mass, product(cardinalities))
    }
}

/// Suspiciousness relative to the whole tensor:
/// `m(ln(m/M) - 1) + M * P/Pall - m * ln(P/Pall)`
#[derive(Debug, Clone, Default)]
pub struct Suspiciousness {
    cardinalities: Vec<usize>,
    mass_of_all: f64,
    mass_of_block: f64,
    product_of_all: f64,
    product_of_block: f64,
}

impl Suspiciousness {
    fn score(&self, mass: f64, product_of_block: f64) -> f64 {
        if product_of_block == 0.0 || mass <= MASS_TOLERANCE * self.mass_of_all {
            return INVALID_DENSITY;
        }
        let volume_ratio = product_of_block / self.product_of_all;
        mass * ((mass / self.mass_of_all).ln() - 1.0) + self.mass_of_all * volume_ratio
            - mass * volume_ratio.ln()
    }

    fn initialize_with_block(
        &mut self,
        cardinalities_of_all: &[usize],
        mass_of_all: f64,
        cardinalities_of_block: &[usize],
        mass_of_block: f64,
    ) -> f64 {
        self.cardinalities = cardinalities_of_block.to_vec();
        self.mass_of_all = mass_of_all;
        self.mass_of_block = mass_of_block;
        self.product_of_all = product(cardinalities_of_all);
        self.product_of_block = product(&self.cardinalities);
        self.score(self.mass_of_block, self.product_of_block)
    }

    fn if_removed(&self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        let volume = shifted_product(&self.cardinalities, attribute, -(num_values as isize));
        self.score(self.mass_of_block - mass_sum, volume)
    }

    fn if_inserted(&self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        let volume = shifted_product(&self.cardinalities, attribute, num_values as isize);
        self.score(self.mass_of_block + mass_sum, volume)
    }

    fn remove(&mut self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        self.cardinalities[attribute] = self.cardinalities[attribute].saturating_sub(num_values);
        self.product_of_block = product(&self.cardinalities);
        self.mass_of_block -= mass_sum;
        self.score(self.mass_of_block, self.product_of_block)
    }

    fn insert(&mut self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        self.cardinalities[attribute] += num_values;
        self.product_of_block = product(&self.cardinalities);
        self.mass_of_block += mass_sum;
        self.score(self.mass_of_block, self.product_of_block)
    }

    fn density(&self, mass: f64, cardinalities: &[usize]) -> f64 {
        self.score(mass, product(cardinalities))
    }
}

/// Entry surplus: `m - alpha * P * M / Pall`
#[derive(Debug, Clone)]
pub struct EntrySurplus {
    alpha: f64,
    cardinalities: Vec<usize>,
    mass_of_all: f64,
    mass_of_block: f64,
    product_of_all: f64,
    product_of_block: f64,
}

impl EntrySurplus {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            cardinalities: Vec::new(),
            mass_of_all: 0.0,
            mass_of_block: 0.0,
            product_of_all: 0.0,
            product_of_block: 0.0,
        }
    }

    fn score(&self, mass: f64, product_of_block: f64) -> f64 {
        if product_of_block == 0.0 || mass <= MASS_TOLERANCE * self.mass_of_all {
            return INVALID_DENSITY;
        }
        mass - self.alpha * product_of_block * self.mass_of_all / self.product_of_all
    }

    fn initialize_with_block(
        &mut self,
        cardinalities_of_all: &[usize],
        mass_of_all: f64,
        cardinalities_of_block: &[usize],
        mass_of_block: f64,
    ) -> f64 {
        self.cardinalities = cardinalities_of_block.to_vec();
        self.mass_of_all = mass_of_all;
        self.mass_of_block = mass_of_block;
        self.product_of_all = product(cardinalities_of_all);
        self.product_of_block = product(&self.cardinalities);
        self.score(self.mass_of_block, self.product_of_block)
    }

    fn if_removed(&self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        let volume = shifted_product(&self.cardinalities, attribute, -(num_values as isize));
        self.score(self.mass_of_block - mass_sum, volume)
    }

    fn if_inserted(&self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        let volume = shifted_product(&self.cardinalities, attribute, num_values as isize);
        self.score(self.mass_of_block + mass_sum, volume)
    }

    fn remove(&mut self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        self.cardinalities[attribute] = self.cardinalities[attribute].saturating_sub(num_values);
        self.product_of_block = product(&self.cardinalities);
        self.mass_of_block -= mass_sum;
        self.score(self.mass_of_block, self.product_of_block)
    }

    fn insert(&mut self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        self.cardinalities[attribute] += num_values;
        self.product_of_block = product(&self.cardinalities);
        self.mass_of_block += mass_sum;
        self.score(self.mass_of_block, self.product_of_block)
    }

    fn density(&self, mass: f64, cardinalities: &[usize]) -> f64 {
        self.score(mass, product(cardinalities))
    }
}

/// Stateful density measure owned by one extraction run
#[derive(Debug, Clone)]
pub enum Measure {
    Arithmetic(Arithmetic),
    Geometric(Geometric),
    Suspiciousness(Suspiciousness),
    EntrySurplus(EntrySurplus),
}

impl Measure {
    /// Create an uninitialized measure of the selected kind
    pub fn new(kind: DensityMeasure) -> Self {
        match kind {
            DensityMeasure::Arithmetic => Measure::Arithmetic(Arithmetic::default()),
            DensityMeasure::Geometric => Measure::Geometric(Geometric::default()),
            DensityMeasure::Suspiciousness => Measure::Suspiciousness(Suspiciousness::default()),
            DensityMeasure::EntrySurplus { alpha } => Measure::EntrySurplus(EntrySurplus::new(alpha)),
        }
    }

    /// Scope the measure to the whole tensor and return its density
    pub fn initialize(&mut self, cardinalities_of_all: &[usize], mass_of_all: f64) -> f64 {
        self.initialize_with_block(cardinalities_of_all, mass_of_all, cardinalities_of_all, mass_of_all)
    }

    /// Scope the measure to a seed block inside the tensor and return its density
    pub fn initialize_with_block(
        &mut self,
        cardinalities_of_all: &[usize],
        mass_of_all: f64,
        cardinalities_of_block: &[usize],
        mass_of_block: f64,
    ) -> f64 {
        match self {
            Measure::Arithmetic(m) => m.initialize_with_block(cardinalities_of_block, mass_of_block),
            Measure::Geometric(m) => m.initialize_with_block(cardinalities_of_block, mass_of_block),
            Measure::Suspiciousness(m) => m.initialize_with_block(
                cardinalities_of_all,
                mass_of_all,
                cardinalities_of_block,
                mass_of_block,
            ),
            Measure::EntrySurplus(m) => m.initialize_with_block(
                cardinalities_of_all,
                mass_of_all,
                cardinalities_of_block,
                mass_of_block,
            ),
        }
    }

    /// Density if `num_values` values carrying `mass_sum` left `attribute`
    pub fn if_removed(&self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        match self {
            Measure::Arithmetic(m) => m.if_removed(num_values, mass_sum),
            Measure::Geometric(m) => m.if_removed(attribute, num_values, mass_sum),
            Measure::Suspiciousness(m) => m.if_removed(attribute, num_values, mass_sum),
            Measure::EntrySurplus(m) => m.if_removed(attribute, num_values, mass_sum),
        }
    }

    /// Density if `num_values` values carrying `mass_sum` joined `attribute`
    pub fn if_inserted(&self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        match self {
            Measure::Arithmetic(m) => m.if_inserted(num_values, mass_sum),
            Measure::Geometric(m) => m.if_inserted(attribute, num_values, mass_sum),
            Measure::Suspiciousness(m) => m.if_inserted(attribute, num_values, mass_sum),
            Measure::EntrySurplus(m) => m.if_inserted(attribute, num_values, mass_sum),
        }
    }

    pub fn remove(&mut self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        match self {
            Measure::Arithmetic(m) => m.remove(num_values, mass_sum),
            Measure::Geometric(m) => m.remove(attribute, num_values, mass_sum),
            Measure::Suspiciousness(m) => m.remove(attribute, num_values, mass_sum),
            Measure::EntrySurplus(m) => m.remove(attribute, num_values, mass_sum),
        }
    }

    pub fn insert(&mut self, attribute: usize, num_values: usize, mass_sum: f64) -> f64 {
        match self {
            Measure::Arithmetic(m) => m.insert(num_values, mass_sum),
            Measure::Geometric(m) => m.insert(attribute, num_values, mass_sum),
            Measure::Suspiciousness(m) => m.insert(attribute, num_values, mass_sum),
            Measure::EntrySurplus(m) => m.insert(attribute, num_values, mass_sum),
        }
    }

    /// Density of an arbitrary block, normalized by the tensor the
    /// measure was initialized with. Does not touch the measure state.
    pub fn density(&self, mass: f64, cardinalities: &[usize]) -> f64 {
        match self {
            Measure::Arithmetic(m) => m.density(mass, cardinalities),
            Measure::Geometric(m) => m.density(mass, cardinalities),
            Measure::Suspiciousness(m) => m.density(mass, cardinalities),
            Measure::EntrySurplus(m) => m.density(mass, cardinalities),
        }
    }
}
