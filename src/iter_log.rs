//! # Block Iteration Log
//!
//! Records the order in which attribute values are removed during a shrink
//! pass. Any block seen during the pass is a suffix of that order, so the
//! extractor can run the pass to the end once and afterwards materialize the
//! best block by replaying the log from the best iteration.
//!
//! Entries live in memory by default. For tensors with very large
//! cardinalities the [`SpillLog`] backend streams them to a file instead.

/**
 * File: /src/iter_log.rs
 * Created Date: Tuesday, March 3rd 2026
 * Author: Zihan
 * -----
 * Last Modified: Wednesday, 4th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-03		Zihan	In-memory removal log
 * 2026-03-04		Zihan	Spill-to-disk backend behind the same contract
 */

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::block::BlockDescriptor;
use crate::error::DenseBlockError;

/// Where the removal order is kept
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum LogBackend {
    #[default]
    Memory,
    /// Stream entries to a temporary file inside `dir`
    Spill { dir: PathBuf },
}

/// Append/replay contract shared by the log backends
pub trait IterLogBackend {
    /// Record that `value` of `attribute` was removed
    fn add_entry(&mut self, attribute: usize, value: usize) -> Result<(), DenseBlockError>;

    /// Number of recorded entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block made of the entries `[from, len)`, i.e. every value still
    /// present after `from` removals
    fn materialize_suffix(&mut self, from: usize) -> Result<BlockDescriptor, DenseBlockError>;
}

/// Removal order held in two parallel vectors
#[derive(Debug, Clone)]
pub struct MemoryLog {
    dimension: usize,
    attributes: Vec<usize>,
    values: Vec<usize>,
}

impl MemoryLog {
    pub fn new(cardinalities: &[usize]) -> Self {
        let capacity = cardinalities.iter().sum();
        Self {
            dimension: cardinalities.len(),
            attributes: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }
}

impl IterLogBackend for MemoryLog {
    fn add_entry(&mut self, attribute: usize, value: usize) -> Result<(), DenseBlockError> {
        self.attributes.push(attribute);
        self.values.push(value);
        Ok(())
    }

    fn len(&self) -> usize {
        self.attributes.len()
    }

    fn materialize_suffix(&mut self, from: usize) -> Result<BlockDescriptor, DenseBlockError> {
        let from = from.min(self.len());
        let entries: Vec<(usize, usize)> = self.attributes[from..]
            .iter()
            .copied()
            .zip(self.values[from..].iter().copied())
            .collect();
        Ok(BlockDescriptor::from_entries(self.dimension, &entries))
    }
}

static SPILL_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Removal order streamed to a file as big-endian `(u32, u64)` records
#[derive(Debug)]
pub struct SpillLog {
    dimension: usize,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    len: usize,
}

impl SpillLog {
    pub fn new(cardinalities: &[usize], dir: &Path) -> Result<Self, DenseBlockError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "ordering_{}_{}.bin",
            std::process::id(),
            SPILL_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let writer = BufWriter::with_capacity(1 << 23, File::create(&path)?);
        debug!("Spilling removal order to {}", path.display());
        Ok(Self {
            dimension: cardinalities.len(),
            path,
            writer: Some(writer),
            len: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IterLogBackend for SpillLog {
    fn add_entry(&mut self, attribute: usize, value: usize) -> Result<(), DenseBlockError> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            DenseBlockError::InvalidConfiguration("removal log was already replayed".to_string())
        })?;
        writer.write_u32::<BigEndian>(attribute as u32)?;
        writer.write_u64::<BigEndian>(value as u64)?;
        self.len += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.len
    }

    fn materialize_suffix(&mut self, from: usize) -> Result<BlockDescriptor, DenseBlockError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let mut reader = BufReader::with_capacity(1 << 23, File::open(&self.path)?);
        let mut entries = Vec::with_capacity(self.len.saturating_sub(from));
        for index in 0..self.len {
            let attribute = reader.read_u32::<BigEndian>()? as usize;
            let value = reader.read_u64::<BigEndian>()? as usize;
            if index >= from {
                entries.push((attribute, value));
            }
        }
        Ok(BlockDescriptor::from_entries(self.dimension, &entries))
    }
}

impl Drop for SpillLog {
    fn drop(&mut self) {
        self.writer.take();
        let _ = fs::remove_file(&self.path);
    }
}

/// Removal log with the backend chosen at run time
pub enum BlockIterLog {
    Memory(MemoryLog),
    Spill(SpillLog),
}

impl BlockIterLog {
    pub fn new(cardinalities: &[usize], backend: &LogBackend) -> Result<Self, DenseBlockError> {
        match backend {
            LogBackend::Memory => Ok(BlockIterLog::Memory(MemoryLog::new(cardinalities))),
            LogBackend::Spill { dir } => Ok(BlockIterLog::Spill(SpillLog::new(cardinalities, dir)?)),
        }
    }

    fn inner(&mut self) -> &mut dyn IterLogBackend {
        match self {
            BlockIterLog::Memory(log) => log,
            BlockIterLog::Spill(log) => log,
        }
    }
}

impl IterLogBackend for BlockIterLog {
    fn add_entry(&mut self, attribute: usize, value: usize) -> Result<(), DenseBlockError> {
        self.inner().add_entry(attribute, value)
    }

    fn len(&self) -> usize {
        match self {
            BlockIterLog::Memory(log) => log.len(),
            BlockIterLog::Spill(log) => log.len(),
        }
    }

    fn materialize_suffix(&mut self, from: usize) -> Result<BlockDescriptor, DenseBlockError> {
        self.inner().materialize_suffix(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    fn fill(log: &mut dyn IterLogBackend) {
        // removal order over cardinalities [2, 3]
        for (attr, value) in [(1, 2), (0, 0), (1, 0), (0, 1), (1, 1)] {
            log.add_entry(attr, value).unwrap();
        }
    }

    fn check_replay(log: &mut dyn IterLogBackend) {
        let full = log.materialize_suffix(0).unwrap();
        assert_eq!(full.cardinalities(), &[2, 3]);
        assert_eq!(full.size(), 5);

        let suffix = log.materialize_suffix(2).unwrap();
        assert_eq!(suffix.cardinalities(), &[1, 2]);
        assert_eq!(suffix.entries(), &[(1, 0), (0, 1), (1, 1)]);

        let empty = log.materialize_suffix(5).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.cardinalities(), &[0, 0]);
    }

    #[test]
    fn test_memory_log_replay() {
        let mut log = MemoryLog::new(&[2, 3]);
        fill(&mut log);
        assert_eq!(log.len(), 5);
        check_replay(&mut log);
    }

    #[test]
    fn test_spill_log_replay() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let mut log = SpillLog::new(&[2, 3], dir.path()).unwrap();
        fill(&mut log);
        check_replay(&mut log);

        let path = log.path().to_path_buf();
        assert!(path.exists());
        drop(log);
        assert!(!path.exists());
    }

    #[test]
    fn test_spill_log_rejects_append_after_replay() {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let mut log = BlockIterLog::new(
            &[1, 1],
            &LogBackend::Spill {
                dir: dir.path().to_path_buf(),
            },
        )
        .unwrap();
        log.add_entry(0, 0).unwrap();
        log.materialize_suffix(0).unwrap();
        assert!(log.add_entry(1, 0).is_err());
    }

    #[test]
    fn test_backend_enum_dispatch() {
        let mut log = BlockIterLog::new(&[2, 3], &LogBackend::Memory).unwrap();
        assert!(log.is_empty());
        fill(&mut log);
        check_replay(&mut log);
    }
}
