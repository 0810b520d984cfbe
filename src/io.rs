//! # Tensor Import and Block Output
//!
//! Input is delimited text, one tuple per line: `d` attribute values then
//! the mass. Attribute values are arbitrary strings, dictionary-encoded per
//! attribute in first-seen order; the strings are kept as labels so the
//! output can be written back in the input vocabulary.
//!
//! Output is one pair of files per block plus a JSON summary:
//! - `block_<i>.attributes`: `attribute,label` lines
//! - `block_<i>.tuples`: the tuples inside the block, labels then mass
//! - `summary.json`: tensor shape and the full detection result

/**
 * File: /src/io.rs
 * Created Date: Friday, March 6th 2026
 * Author: Zihan
 * -----
 * Last Modified: Friday, 6th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-06		Zihan	Delimited text import, block writer
 */

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use log::{info, warn};
use ndarray::Array2;
use serde::Serialize;

use crate::error::DenseBlockError;
use crate::orchestrator::DetectionResult;
use crate::tensor::Tensor;

/// Per-attribute string -> index dictionary
struct Dictionary {
    indices: HashMap<String, usize>,
    labels: Vec<String>,
}

impl Dictionary {
    fn new() -> Self {
        Self {
            indices: HashMap::new(),
            labels: Vec::new(),
        }
    }

    fn encode(&mut self, token: &str) -> usize {
        if let Some(&index) = self.indices.get(token) {
            return index;
        }
        let index = self.labels.len();
        self.indices.insert(token.to_string(), index);
        self.labels.push(token.to_string());
        index
    }
}

/// Read a tensor from a delimited text file.
///
/// Lines with fewer than `dimension + 1` fields, or whose mass is not a
/// finite non-negative number, are skipped with a warning.
pub fn import_tensor(
    path: impl AsRef<Path>,
    delimiter: &str,
    dimension: usize,
) -> Result<Tensor, DenseBlockError> {
    let path = path.as_ref();
    if dimension == 0 {
        return Err(DenseBlockError::InvalidConfiguration(
            "dimension must be positive".to_string(),
        ));
    }
    if delimiter.is_empty() {
        return Err(DenseBlockError::InvalidConfiguration(
            "delimiter must not be empty".to_string(),
        ));
    }

    let start = Instant::now();
    let reader = BufReader::new(File::open(path)?);
    let mut dictionaries: Vec<Dictionary> = (0..dimension).map(|_| Dictionary::new()).collect();
    let mut values: Vec<usize> = Vec::new();
    let mut masses: Vec<f64> = Vec::new();
    let mut skipped = 0;

    for line in reader.lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split(delimiter).collect();
        if tokens.len() < dimension + 1 {
            if !line.trim().is_empty() {
                warn!("Skipped line: {}", line);
                skipped += 1;
            }
            continue;
        }
        let mass = match tokens[dimension].trim().parse::<f64>() {
            Ok(mass) if mass.is_finite() && mass >= 0.0 => mass,
            _ => {
                warn!("Skipped line with invalid mass: {}", line);
                skipped += 1;
                continue;
            }
        };
        for (dictionary, token) in dictionaries.iter_mut().zip(&tokens) {
            values.push(dictionary.encode(token));
        }
        masses.push(mass);
    }

    if masses.is_empty() {
        return Err(DenseBlockError::InvalidTensor(format!(
            "no valid records in {}",
            path.display()
        )));
    }

    let omega = masses.len();
    let attributes = Array2::from_shape_vec((omega, dimension), values)
        .map_err(|e| DenseBlockError::InvalidTensor(e.to_string()))?;
    let cardinalities: Vec<usize> = dictionaries.iter().map(|d| d.labels.len()).collect();
    let labels: Vec<Vec<String>> = dictionaries.into_iter().map(|d| d.labels).collect();
    let tensor = Tensor::from_tuples(cardinalities, attributes, masses)?.with_labels(labels)?;

    info!(
        "Loaded {} from {} in {:.3}s ({} lines skipped)",
        tensor,
        path.display(),
        start.elapsed().as_secs_f64(),
        skipped
    );
    Ok(tensor)
}

#[derive(Serialize)]
struct OutputSummary<'a> {
    dimension: usize,
    cardinalities: &'a [usize],
    omega: usize,
    total_mass: f64,
    result: &'a DetectionResult,
}

/// Write every detected block and `summary.json` into `dir`
pub fn write_blocks(
    dir: impl AsRef<Path>,
    tensor: &Tensor,
    result: &DetectionResult,
) -> Result<(), DenseBlockError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    for (index, block) in result.blocks.iter().enumerate() {
        let block_number = index + 1;

        let mut writer = BufWriter::new(File::create(
            dir.join(format!("block_{}.attributes", block_number)),
        )?);
        for (attr, values) in block.value_sets.iter().enumerate() {
            for &value in values {
                writeln!(writer, "{},{}", attr, tensor.label(attr, value))?;
            }
        }
        writer.flush()?;

        let mut writer = BufWriter::new(File::create(
            dir.join(format!("block_{}.tuples", block_number)),
        )?);
        for tuple in tensor.tuples_in_block(&block.descriptor) {
            for (attr, &value) in tensor.tuple(tuple).iter().enumerate() {
                write!(writer, "{},", tensor.label(attr, value))?;
            }
            writeln!(writer, "{}", tensor.masses()[tuple])?;
        }
        writer.flush()?;
    }

    let summary = OutputSummary {
        dimension: tensor.dimension(),
        cardinalities: tensor.cardinalities(),
        omega: tensor.omega(),
        total_mass: tensor.total_mass(),
        result,
    };
    let writer = BufWriter::new(File::create(dir.join("summary.json"))?);
    serde_json::to_writer_pretty(writer, &summary)?;

    info!(
        "Wrote {} blocks to {}",
        result.blocks.len(),
        dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::DensityMeasure;
    use crate::extractor::{ExtractorKind, SizeBounds};
    use crate::orchestrator::find_dense_blocks;
    use std::sync::Arc;
    use temp_dir::TempDir;

    fn write_input(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("input.csv");
        fs::write(&path, content).expect("Could not write input");
        path
    }

    #[test]
    fn test_import_dictionary_encodes_in_first_seen_order() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = write_input(&dir, "bob,x,3\nalice,x,1\nbob,y,2\n");
        let tensor = import_tensor(&path, ",", 2).unwrap();

        assert_eq!(tensor.cardinalities(), &[2, 2]);
        assert_eq!(tensor.omega(), 3);
        assert_eq!(tensor.total_mass(), 6.0);
        assert_eq!(tensor.label(0, 0), "bob");
        assert_eq!(tensor.label(0, 1), "alice");
        assert_eq!(tensor.label(1, 1), "y");
        assert_eq!(tensor.tuples_with(0, 0), &[0, 2]);
    }

    #[test]
    fn test_import_skips_malformed_lines() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = write_input(&dir, "a,b,1\nshort,2\n\na,c,oops\na,c,-1\nd,b,4\n");
        let tensor = import_tensor(&path, ",", 2).unwrap();
        assert_eq!(tensor.omega(), 2);
        assert_eq!(tensor.masses(), &[1.0, 4.0]);
    }

    #[test]
    fn test_import_custom_delimiter_and_extra_columns() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = write_input(&dir, "u1\tp1\t2.5\tignored\nu2\tp1\t0.5\n");
        let tensor = import_tensor(&path, "\t", 2).unwrap();
        assert_eq!(tensor.cardinalities(), &[2, 1]);
        assert_eq!(tensor.total_mass(), 3.0);
    }

    #[test]
    fn test_import_errors() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = write_input(&dir, "only,short\n");
        assert!(matches!(
            import_tensor(&path, ",", 2),
            Err(DenseBlockError::InvalidTensor(_))
        ));
        assert!(matches!(
            import_tensor(&path, ",", 0),
            Err(DenseBlockError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            import_tensor(dir.path().join("missing.csv"), ",", 2),
            Err(DenseBlockError::Io(_))
        ));
    }

    #[test]
    fn test_write_blocks() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let path = write_input(&dir, "a,x,50\na,y,1\nb,x,1\nb,y,1\n");
        let tensor = Arc::new(import_tensor(&path, ",", 2).unwrap());
        let result = find_dense_blocks(
            Arc::clone(&tensor),
            1,
            SizeBounds::default(),
            DensityMeasure::Arithmetic,
            ExtractorKind::MZoom,
        )
        .unwrap();

        let output = dir.path().join("out");
        write_blocks(&output, &tensor, &result).unwrap();

        let attributes = fs::read_to_string(output.join("block_1.attributes")).unwrap();
        assert_eq!(attributes, "0,a\n1,x\n");
        let tuples = fs::read_to_string(output.join("block_1.tuples")).unwrap();
        assert_eq!(tuples, "a,x,50\n");

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output.join("summary.json")).unwrap())
                .unwrap();
        assert_eq!(summary["omega"], 4);
        assert_eq!(summary["result"]["blocks"].as_array().unwrap().len(), 1);
    }
}
