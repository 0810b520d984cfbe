//! # Block Extractors
//!
//! Greedy searches that pull one dense block out of a working tensor.
//!
//! - [`MZoom`]: shrink-only search removing one attribute value at a time
//! - [`MBiz`]: bidirectional local search seeded with the M-Zoom block
//! - [`MBizRandom`]: bidirectional local search from a random seed block

/**
 * File: /src/extractor/mod.rs
 * Created Date: Tuesday, March 3rd 2026
 * Author: Zihan
 * -----
 * Last Modified: Wednesday, 4th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-03		Zihan	Extractor trait and size bounds
 */

pub mod mbiz;
pub mod mzoom;

pub use mbiz::{bidirectional_search, random_seed_mask, BidirectionalSearch, MBiz, MBizRandom};
pub use mzoom::{MZoom, ShrinkSearch};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::block::BlockDescriptor;
use crate::density::DensityMeasure;
use crate::error::DenseBlockError;
use crate::iter_log::LogBackend;
use crate::tensor::WorkingTensor;

/// Inclusive bounds on the size (sum of cardinalities) of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub lower: usize,
    pub upper: usize,
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self {
            lower: 0,
            upper: usize::MAX,
        }
    }
}

impl SizeBounds {
    pub fn new(lower: usize, upper: usize) -> Result<Self, DenseBlockError> {
        if lower > upper {
            return Err(DenseBlockError::InvalidBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    #[inline]
    pub fn contains(&self, size: usize) -> bool {
        size >= self.lower && size <= self.upper
    }
}

/// Single-block search algorithm
pub trait BlockExtractor {
    /// Find one dense block in the current state of `tensor`
    fn extract(
        &mut self,
        tensor: &WorkingTensor,
        bounds: &SizeBounds,
        measure: DensityMeasure,
    ) -> Result<BlockDescriptor, DenseBlockError>;

    fn name(&self) -> &str;
}

impl<T: BlockExtractor + ?Sized> BlockExtractor for Box<T> {
    fn extract(
        &mut self,
        tensor: &WorkingTensor,
        bounds: &SizeBounds,
        measure: DensityMeasure,
    ) -> Result<BlockDescriptor, DenseBlockError> {
        (**self).extract(tensor, bounds, measure)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Algorithm selector used by the configuration layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractorKind {
    #[default]
    MZoom,
    MBiz,
    MBizRandom,
}

impl ExtractorKind {
    /// Build the extractor; `seed` only affects [`ExtractorKind::MBizRandom`]
    pub fn build(self, log_backend: LogBackend, seed: Option<u64>) -> Box<dyn BlockExtractor> {
        match self {
            ExtractorKind::MZoom => Box::new(MZoom::with_backend(log_backend)),
            ExtractorKind::MBiz => Box::new(MBiz::new(MZoom::with_backend(log_backend))),
            ExtractorKind::MBizRandom => Box::new(match seed {
                Some(seed) => MBizRandom::with_seed(seed),
                None => MBizRandom::new(),
            }),
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractorKind::MZoom => write!(f, "mzoom"),
            ExtractorKind::MBiz => write!(f, "mbiz"),
            ExtractorKind::MBizRandom => write!(f, "mbiz-random"),
        }
    }
}

impl FromStr for ExtractorKind {
    type Err = DenseBlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mzoom" | "m-zoom" => Ok(ExtractorKind::MZoom),
            "mbiz" | "m-biz" => Ok(ExtractorKind::MBiz),
            "mbiz-random" | "mbiz_random" => Ok(ExtractorKind::MBizRandom),
            other => Err(DenseBlockError::InvalidConfiguration(format!(
                "unknown algorithm '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bounds() {
        let bounds = SizeBounds::new(2, 5).unwrap();
        assert!(!bounds.contains(1));
        assert!(bounds.contains(2));
        assert!(bounds.contains(5));
        assert!(!bounds.contains(6));
        assert!(SizeBounds::default().contains(usize::MAX));
        assert!(matches!(
            SizeBounds::new(3, 2),
            Err(DenseBlockError::InvalidBounds { lower: 3, upper: 2 })
        ));
    }

    #[test]
    fn test_extractor_kind_parse() {
        assert_eq!("MZoom".parse::<ExtractorKind>().unwrap(), ExtractorKind::MZoom);
        assert_eq!("m-biz".parse::<ExtractorKind>().unwrap(), ExtractorKind::MBiz);
        assert_eq!(
            "mbiz-random".parse::<ExtractorKind>().unwrap(),
            ExtractorKind::MBizRandom
        );
        assert!("dcube".parse::<ExtractorKind>().is_err());
    }

    #[test]
    fn test_build_names() {
        for (kind, name) in [
            (ExtractorKind::MZoom, "M-Zoom"),
            (ExtractorKind::MBiz, "M-Biz"),
            (ExtractorKind::MBizRandom, "M-Biz (Random)"),
        ] {
            assert_eq!(kind.build(LogBackend::Memory, Some(1)).name(), name);
        }
    }
}
