/**
 * File: /src/config.rs
 * Created Date: Friday, March 6th 2026
 * Author: Zihan
 * -----
 * Last Modified: Saturday, 7th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-06		Zihan	Command line configuration
 * 2026-03-07		Zihan	clap parsing, spill directory and seed options
 */

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::density::DensityMeasure;
use crate::error::DenseBlockError;
use crate::extractor::{ExtractorKind, SizeBounds};
use crate::iter_log::LogBackend;
use crate::orchestrator::OrchestratorConfig;

/// Raw command line arguments
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fast_denseblock",
    version,
    about = "Find dense blocks in a multi-attribute tensor"
)]
pub struct CliArgs {
    /// Input file, one tuple per line: attribute values then mass
    pub input: PathBuf,
    /// Output directory
    pub output: PathBuf,
    /// Number of attributes (columns before the mass)
    pub dimension: usize,
    /// Density measure: ari, geo, susp or es_<alpha>
    pub measure: String,
    /// Number of blocks to find
    pub blocks: usize,
    /// Minimum block size (sum of cardinalities)
    pub lower: Option<usize>,
    /// Maximum block size (sum of cardinalities)
    pub upper: Option<usize>,
    /// Extraction algorithm: mzoom, mbiz or mbiz-random
    #[arg(long, default_value = "mzoom")]
    pub algorithm: String,
    /// Field delimiter of the input file
    #[arg(long, default_value = ",")]
    pub delimiter: String,
    /// Seed for the random starting blocks of mbiz-random
    #[arg(long)]
    pub seed: Option<u64>,
    /// Stream the removal order to files in this directory instead of memory
    #[arg(long)]
    pub spill_dir: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    input: PathBuf,
    output: PathBuf,
    dimension: usize,
    delimiter: String,
    measure: DensityMeasure,
    block_count: usize,
    bounds: SizeBounds,
    algorithm: ExtractorKind,
    seed: Option<u64>,
    log_backend: LogBackend,
    verbose: bool,
}

impl Config {
    /// constructor
    ///
    /// # Examples
    /// ```bash
    /// $ cargo run -- data/transactions.csv out 3 geo 5 0 100 --algorithm mbiz
    /// ```
    pub fn new(args: impl Iterator<Item = String>) -> Result<Config, DenseBlockError> {
        let cli = CliArgs::try_parse_from(args)
            .map_err(|e| DenseBlockError::InvalidConfiguration(e.to_string()))?;
        Config::from_cli(cli)
    }

    /// Validate parsed arguments
    pub fn from_cli(cli: CliArgs) -> Result<Config, DenseBlockError> {
        if cli.dimension == 0 {
            return Err(DenseBlockError::InvalidConfiguration(
                "dimension must be positive".to_string(),
            ));
        }
        if cli.blocks == 0 {
            return Err(DenseBlockError::InvalidConfiguration(
                "number of blocks must be positive".to_string(),
            ));
        }
        if cli.delimiter.is_empty() {
            return Err(DenseBlockError::InvalidConfiguration(
                "delimiter must not be empty".to_string(),
            ));
        }
        let measure: DensityMeasure = cli.measure.parse()?;
        let algorithm: ExtractorKind = cli.algorithm.parse()?;
        let bounds = SizeBounds::new(
            cli.lower.unwrap_or(0),
            cli.upper.unwrap_or(usize::MAX),
        )?;
        let log_backend = match cli.spill_dir {
            Some(dir) => LogBackend::Spill { dir },
            None => LogBackend::Memory,
        };

        Ok(Config {
            input: cli.input,
            output: cli.output,
            dimension: cli.dimension,
            delimiter: cli.delimiter,
            measure,
            block_count: cli.blocks,
            bounds,
            algorithm,
            seed: cli.seed,
            log_backend,
            verbose: cli.verbose,
        })
    }

    pub fn get_input(&self) -> &Path {
        &self.input
    }

    pub fn get_output(&self) -> &Path {
        &self.output
    }

    pub fn get_dimension(&self) -> usize {
        self.dimension
    }

    pub fn get_delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn get_measure(&self) -> DensityMeasure {
        self.measure
    }

    pub fn get_block_count(&self) -> usize {
        self.block_count
    }

    pub fn get_bounds(&self) -> SizeBounds {
        self.bounds
    }

    pub fn get_algorithm(&self) -> ExtractorKind {
        self.algorithm
    }

    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn get_log_backend(&self) -> &LogBackend {
        &self.log_backend
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            block_count: self.block_count,
            bounds: self.bounds,
            measure: self.measure,
        }
    }
}
