/**
 * File: /src/block.rs
 * Created Date: Monday, March 2nd 2026
 * Author: Zihan
 * -----
 * Last Modified: Tuesday, 3rd March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-02		Zihan	Block descriptor returned by the extractors
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A block: one subset of values per attribute
///
/// # Example
/// ```
/// use fast_denseblock::block::BlockDescriptor;
///
/// let mask = vec![vec![true, false, true], vec![false, true]];
/// let block = BlockDescriptor::from_mask(&mask);
/// assert_eq!(block.size(), 3);
/// assert_eq!(block.cardinalities(), &[2, 1]);
/// assert_eq!(block.to_mask(&[3, 2]), mask);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    /// attribute -> number of included values
    cardinalities: Vec<usize>,
    /// included (attribute, value) pairs
    entries: Vec<(usize, usize)>,
}

impl BlockDescriptor {
    /// Block made of the listed `(attribute, value)` pairs
    pub fn from_entries(dimension: usize, entries: &[(usize, usize)]) -> Self {
        let mut cardinalities = vec![0; dimension];
        for &(attr, _) in entries {
            cardinalities[attr] += 1;
        }
        Self {
            cardinalities,
            entries: entries.to_vec(),
        }
    }

    /// Block made of the `true` cells of a per-attribute inclusion mask
    pub fn from_mask(mask: &[Vec<bool>]) -> Self {
        let mut cardinalities = vec![0; mask.len()];
        let mut entries = Vec::new();
        for (attr, values) in mask.iter().enumerate() {
            for (value, &included) in values.iter().enumerate() {
                if included {
                    cardinalities[attr] += 1;
                    entries.push((attr, value));
                }
            }
        }
        Self {
            cardinalities,
            entries,
        }
    }

    /// Sum of the per-attribute included-value counts
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn dimension(&self) -> usize {
        self.cardinalities.len()
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    pub fn entries(&self) -> &[(usize, usize)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Included values of every attribute
    pub fn to_value_sets(&self) -> Vec<BTreeSet<usize>> {
        let mut sets = vec![BTreeSet::new(); self.dimension()];
        for &(attr, value) in &self.entries {
            sets[attr].insert(value);
        }
        sets
    }

    /// Boolean inclusion mask sized by the tensor cardinalities
    pub fn to_mask(&self, tensor_cardinalities: &[usize]) -> Vec<Vec<bool>> {
        let mut mask: Vec<Vec<bool>> = tensor_cardinalities
            .iter()
            .map(|&cardinality| vec![false; cardinality])
            .collect();
        for &(attr, value) in &self.entries {
            mask[attr][value] = true;
        }
        mask
    }

    /// Number of cells in the Cartesian product of the block
    pub fn volume(&self) -> f64 {
        self.cardinalities.iter().map(|&c| c as f64).product()
    }
}

impl fmt::Display for BlockDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let volume: Vec<String> = self.cardinalities.iter().map(|c| c.to_string()).collect();
        write!(f, "Block {}", volume.join(" X "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries() {
        let block = BlockDescriptor::from_entries(3, &[(0, 4), (2, 1), (0, 2)]);
        assert_eq!(block.size(), 3);
        assert_eq!(block.cardinalities(), &[2, 0, 1]);
        assert_eq!(block.volume(), 0.0);
        let sets = block.to_value_sets();
        assert_eq!(sets[0].iter().copied().collect::<Vec<_>>(), vec![2, 4]);
        assert!(sets[1].is_empty());
    }

    #[test]
    fn test_entries_and_mask_agree() {
        let block = BlockDescriptor::from_entries(2, &[(1, 0), (0, 1), (1, 2)]);
        let mask = block.to_mask(&[2, 3]);
        assert_eq!(mask, vec![vec![false, true], vec![true, false, true]]);
        let rebuilt = BlockDescriptor::from_mask(&mask);
        assert_eq!(rebuilt.to_value_sets(), block.to_value_sets());
        assert_eq!(rebuilt.cardinalities(), block.cardinalities());
    }

    #[test]
    fn test_display() {
        let block = BlockDescriptor::from_entries(2, &[(0, 0), (1, 0), (1, 1)]);
        assert_eq!(format!("{}", block), "Block 1 X 2");
        assert_eq!(block.volume(), 2.0);
    }
}
