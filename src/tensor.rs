//! # Tensor Data Model
//!
//! [`Tensor`] holds the immutable dataset: the attribute matrix, the
//! original tuple masses and the value -> tuples inverted index. It is
//! shared through an `Arc`. [`WorkingTensor`] pairs that shared tensor with
//! a private mass vector so tuples can be logically removed (mass zeroed)
//! between block extractions without rebuilding the index.

/**
 * File: /src/tensor.rs
 * Created Date: Monday, March 2nd 2026
 * Author: Zihan
 * -----
 * Last Modified: Wednesday, 4th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-02		Zihan	Multi-attribute tensor with inverted index
 * 2026-03-04		Zihan	Working tensor sharing the index, private masses
 */

use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

use crate::block::BlockDescriptor;
use crate::error::DenseBlockError;

/// Multi-attribute tensor of weighted tuples
#[derive(Debug, Clone)]
pub struct Tensor {
    dimension: usize,
    /// attribute -> number of distinct values
    cardinalities: Vec<usize>,
    /// (tuple, attribute) -> value
    attributes: Array2<usize>,
    /// tuple -> mass
    masses: Vec<f64>,
    total_mass: f64,
    /// (attribute, value) -> tuples holding the value
    value_to_tuples: Vec<Vec<Vec<usize>>>,
    /// (attribute, value) -> original string, when the tensor was imported from text
    labels: Option<Vec<Vec<String>>>,
}

impl Tensor {
    /// Create a tensor from its parts, checking that they agree.
    ///
    /// `attributes` is `omega × dimension`; `value_to_tuples` must list,
    /// for every attribute value, exactly the tuples holding it.
    pub fn new(
        dimension: usize,
        cardinalities: Vec<usize>,
        attributes: Array2<usize>,
        masses: Vec<f64>,
        value_to_tuples: Vec<Vec<Vec<usize>>>,
    ) -> Result<Self, DenseBlockError> {
        Self::check_shape(dimension, &cardinalities, &attributes, &masses)?;

        if value_to_tuples.len() != dimension {
            return Err(DenseBlockError::InvalidTensor(format!(
                "inverted index has {} attributes, expected {}",
                value_to_tuples.len(),
                dimension
            )));
        }
        for (attr, values) in value_to_tuples.iter().enumerate() {
            if values.len() != cardinalities[attr] {
                return Err(DenseBlockError::InvalidTensor(format!(
                    "inverted index of attribute {} has {} values, expected {}",
                    attr,
                    values.len(),
                    cardinalities[attr]
                )));
            }
            let mut listed = 0;
            for (value, tuples) in values.iter().enumerate() {
                for &tuple in tuples {
                    if tuple >= attributes.nrows() || attributes[[tuple, attr]] != value {
                        return Err(DenseBlockError::InvalidTensor(format!(
                            "tuple {} listed under value {} of attribute {}",
                            tuple, value, attr
                        )));
                    }
                }
                listed += tuples.len();
            }
            if listed != attributes.nrows() {
                return Err(DenseBlockError::InvalidTensor(format!(
                    "inverted index of attribute {} covers {} of {} tuples",
                    attr,
                    listed,
                    attributes.nrows()
                )));
            }
        }

        let total_mass = masses.iter().sum();
        Ok(Self {
            dimension,
            cardinalities,
            attributes,
            masses,
            total_mass,
            value_to_tuples,
            labels: None,
        })
    }

    /// Create a tensor and build its inverted index
    ///
    /// # Example
    /// ```
    /// use fast_denseblock::tensor::Tensor;
    /// use ndarray::array;
    ///
    /// let tensor = Tensor::from_tuples(vec![2, 3], array![[0, 2], [1, 0], [1, 2]], vec![1.0, 2.0, 4.0]).unwrap();
    /// assert_eq!(tensor.omega(), 3);
    /// assert_eq!(tensor.total_mass(), 7.0);
    /// assert_eq!(tensor.tuples_with(1, 2), &[0, 2]);
    /// ```
    pub fn from_tuples(
        cardinalities: Vec<usize>,
        attributes: Array2<usize>,
        masses: Vec<f64>,
    ) -> Result<Self, DenseBlockError> {
        let dimension = cardinalities.len();
        Self::check_shape(dimension, &cardinalities, &attributes, &masses)?;

        let mut value_to_tuples: Vec<Vec<Vec<usize>>> = cardinalities
            .iter()
            .map(|&cardinality| vec![Vec::new(); cardinality])
            .collect();
        for (tuple, row) in attributes.outer_iter().enumerate() {
            for (attr, &value) in row.iter().enumerate() {
                value_to_tuples[attr][value].push(tuple);
            }
        }

        let total_mass = masses.iter().sum();
        Ok(Self {
            dimension,
            cardinalities,
            attributes,
            masses,
            total_mass,
            value_to_tuples,
            labels: None,
        })
    }

    /// Attach the original string of every value, indexed `[attribute][value]`
    pub fn with_labels(mut self, labels: Vec<Vec<String>>) -> Result<Self, DenseBlockError> {
        let consistent = labels.len() == self.dimension
            && labels
                .iter()
                .zip(&self.cardinalities)
                .all(|(l, &c)| l.len() == c);
        if !consistent {
            return Err(DenseBlockError::InvalidTensor(
                "labels do not match the attribute cardinalities".to_string(),
            ));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    fn check_shape(
        dimension: usize,
        cardinalities: &[usize],
        attributes: &Array2<usize>,
        masses: &[f64],
    ) -> Result<(), DenseBlockError> {
        if dimension == 0 {
            return Err(DenseBlockError::InvalidTensor("dimension must be positive".to_string()));
        }
        if cardinalities.len() != dimension {
            return Err(DenseBlockError::InvalidTensor(format!(
                "{} cardinalities for {} attributes",
                cardinalities.len(),
                dimension
            )));
        }
        if attributes.ncols() != dimension {
            return Err(DenseBlockError::InvalidTensor(format!(
                "attribute matrix has {} columns, expected {}",
                attributes.ncols(),
                dimension
            )));
        }
        if attributes.nrows() != masses.len() {
            return Err(DenseBlockError::InvalidTensor(format!(
                "{} tuples but {} masses",
                attributes.nrows(),
                masses.len()
            )));
        }
        if let Some(m) = masses.iter().find(|m| !m.is_finite() || **m < 0.0) {
            return Err(DenseBlockError::InvalidTensor(format!("invalid tuple mass {}", m)));
        }
        for row in attributes.outer_iter() {
            for (attr, &value) in row.iter().enumerate() {
                if value >= cardinalities[attr] {
                    return Err(DenseBlockError::InvalidTensor(format!(
                        "value {} out of range for attribute {} (cardinality {})",
                        value, attr, cardinalities[attr]
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    pub fn sum_of_cardinalities(&self) -> usize {
        self.cardinalities.iter().sum()
    }

    /// Number of tuples
    pub fn omega(&self) -> usize {
        self.masses.len()
    }

    pub fn total_mass(&self) -> f64 {
        self.total_mass
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Attribute values of one tuple
    pub fn tuple(&self, tuple: usize) -> ArrayView1<'_, usize> {
        self.attributes.row(tuple)
    }

    /// Tuples holding `value` for `attribute`
    pub fn tuples_with(&self, attribute: usize, value: usize) -> &[usize] {
        &self.value_to_tuples[attribute][value]
    }

    /// Printable name of an attribute value
    pub fn label(&self, attribute: usize, value: usize) -> String {
        match &self.labels {
            Some(labels) => labels[attribute][value].clone(),
            None => value.to_string(),
        }
    }

    /// Whether every attribute value of `tuple` lies in the block mask
    pub fn tuple_in_mask(&self, tuple: usize, mask: &[Vec<bool>]) -> bool {
        self.attributes
            .row(tuple)
            .iter()
            .enumerate()
            .all(|(attr, &value)| mask[attr][value])
    }

    /// Tuples whose values all lie inside `block`
    pub fn tuples_in_block(&self, block: &BlockDescriptor) -> Vec<usize> {
        let mask = block.to_mask(&self.cardinalities);
        (0..self.omega())
            .filter(|&tuple| self.tuple_in_mask(tuple, &mask))
            .collect()
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape: Vec<String> = self.cardinalities.iter().map(|c| c.to_string()).collect();
        write!(
            f,
            "Tensor {} ({} tuples, mass {})",
            shape.join(" × "),
            self.omega(),
            self.total_mass
        )
    }
}

/// Working copy of a tensor: shared structure, private masses
#[derive(Debug, Clone)]
pub struct WorkingTensor {
    base: Arc<Tensor>,
    masses: Vec<f64>,
    total_mass: f64,
}

impl WorkingTensor {
    /// Start from the original masses of `base`
    pub fn new(base: Arc<Tensor>) -> Self {
        let masses = base.masses.clone();
        let total_mass = base.total_mass;
        Self {
            base,
            masses,
            total_mass,
        }
    }

    pub fn base(&self) -> &Tensor {
        &self.base
    }

    pub fn dimension(&self) -> usize {
        self.base.dimension
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.base.cardinalities
    }

    pub fn omega(&self) -> usize {
        self.masses.len()
    }

    /// Mass of all tuples not yet removed
    pub fn total_mass(&self) -> f64 {
        self.total_mass
    }

    /// Current (possibly zeroed) tuple masses
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn mass(&self, tuple: usize) -> f64 {
        self.masses[tuple]
    }

    /// Per attribute value, the summed current mass of the tuples holding it
    pub fn attribute_value_masses(&self) -> Vec<Vec<f64>> {
        let base = &self.base;
        (0..base.dimension)
            .into_par_iter()
            .map(|attr| {
                (0..base.cardinalities[attr])
                    .map(|value| {
                        base.value_to_tuples[attr][value]
                            .iter()
                            .map(|&tuple| self.masses[tuple])
                            .sum()
                    })
                    .collect()
            })
            .collect()
    }

    /// Zero every tuple lying entirely inside `block`.
    ///
    /// Returns the summed ORIGINAL mass of those tuples, counting tuples
    /// already removed by earlier blocks as well.
    pub fn remove_block(&mut self, block: &BlockDescriptor) -> f64 {
        let mask = block.to_mask(&self.base.cardinalities);
        let mut original_mass = 0.0;
        for tuple in 0..self.masses.len() {
            if self.base.tuple_in_mask(tuple, &mask) {
                self.total_mass -= self.masses[tuple];
                self.masses[tuple] = 0.0;
                original_mass += self.base.masses[tuple];
            }
        }
        original_mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grid_tensor() -> Tensor {
        Tensor::from_tuples(
            vec![2, 2],
            array![[0, 0], [0, 1], [1, 0], [1, 1]],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap()
    }

    #[test]
    fn test_from_tuples_builds_index() {
        let tensor = grid_tensor();
        assert_eq!(tensor.dimension(), 2);
        assert_eq!(tensor.sum_of_cardinalities(), 4);
        assert_eq!(tensor.total_mass(), 10.0);
        assert_eq!(tensor.tuples_with(0, 1), &[2, 3]);
        assert_eq!(tensor.tuples_with(1, 1), &[1, 3]);
        assert_eq!(tensor.tuple(2).to_vec(), vec![1, 0]);
    }

    #[test]
    fn test_new_accepts_consistent_index() {
        let tensor = Tensor::new(
            2,
            vec![2, 1],
            array![[0, 0], [1, 0]],
            vec![1.0, 1.0],
            vec![vec![vec![0], vec![1]], vec![vec![0, 1]]],
        );
        assert!(tensor.is_ok());
    }

    #[test]
    fn test_new_rejects_inconsistent_index() {
        let tensor = Tensor::new(
            2,
            vec![2, 1],
            array![[0, 0], [1, 0]],
            vec![1.0, 1.0],
            vec![vec![vec![1], vec![0]], vec![vec![0, 1]]],
        );
        assert!(matches!(tensor, Err(DenseBlockError::InvalidTensor(_))));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(Tensor::from_tuples(vec![2], array![[0, 1]], vec![1.0]).is_err());
        assert!(Tensor::from_tuples(vec![2, 2], array![[0, 2]], vec![1.0]).is_err());
        assert!(Tensor::from_tuples(vec![2, 2], array![[0, 1]], vec![-1.0]).is_err());
        assert!(Tensor::from_tuples(vec![2, 2], array![[0, 1]], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_labels() {
        let tensor = grid_tensor()
            .with_labels(vec![
                vec!["alice".to_string(), "bob".to_string()],
                vec!["x".to_string(), "y".to_string()],
            ])
            .unwrap();
        assert_eq!(tensor.label(0, 1), "bob");
        assert!(grid_tensor().with_labels(vec![vec![]]).is_err());
        assert_eq!(grid_tensor().label(1, 1), "1");
    }

    #[test]
    fn test_attribute_value_masses() {
        let working = WorkingTensor::new(Arc::new(grid_tensor()));
        let masses = working.attribute_value_masses();
        assert_eq!(masses, vec![vec![3.0, 7.0], vec![4.0, 6.0]]);
    }

    #[test]
    fn test_remove_block_keeps_base() {
        let base = Arc::new(grid_tensor());
        let mut working = WorkingTensor::new(Arc::clone(&base));
        let block = BlockDescriptor::from_entries(2, &[(0, 1), (1, 0), (1, 1)]);

        let removed = working.remove_block(&block);
        assert_eq!(removed, 7.0);
        assert_eq!(working.masses(), &[1.0, 2.0, 0.0, 0.0]);
        assert_eq!(working.total_mass(), 3.0);
        assert_eq!(base.masses(), &[1.0, 2.0, 3.0, 4.0]);

        // already removed tuples still count with their original mass
        assert_eq!(working.remove_block(&block), 7.0);
        assert_eq!(working.total_mass(), 3.0);
    }
}
