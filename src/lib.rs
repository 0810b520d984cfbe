/**
 * File: /src/lib.rs
 * Created Date: Monday, March 2nd 2026
 * Author: Zihan
 * -----
 * Last Modified: Saturday, 7th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-03-02		Zihan	Tensor, heaps and density measures
 * 2026-03-05		Zihan	Extractors and orchestrator
 * 2026-03-07		Zihan	Command line pipeline
 */

pub mod block;
pub mod config;
pub mod density;
pub mod error;
pub mod extractor;
pub mod heap;
pub mod io;
pub mod iter_log;
pub mod orchestrator;
pub mod tensor;

use std::sync::Arc;

use chrono::Local;
use log::info;

pub use block::BlockDescriptor;
pub use config::Config;
pub use density::{DensityMeasure, INVALID_DENSITY};
pub use error::DenseBlockError;
pub use extractor::{BlockExtractor, ExtractorKind, SizeBounds};
pub use orchestrator::{find_dense_blocks, DetectionResult, Orchestrator};
pub use tensor::{Tensor, WorkingTensor};

pub fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Import the input, search the blocks and write them out
pub fn run(config: &Config) -> Result<DetectionResult, DenseBlockError> {
    let method = config.get_algorithm();

    info!(
        "[method: {}] [{}] Dataset: {}",
        method,
        timestamp(),
        config.get_input().display()
    );
    let tensor = Arc::new(io::import_tensor(
        config.get_input(),
        config.get_delimiter(),
        config.get_dimension(),
    )?);

    info!(
        "[method: {}] [{}] Begin search for {} blocks, measure: {}",
        method,
        timestamp(),
        config.get_block_count(),
        config.get_measure()
    );
    let mut orchestrator = Orchestrator::builder()
        .with_kind(method, config.get_log_backend().clone(), config.get_seed())
        .with_config(config.orchestrator_config())
        .build()?;
    let result = orchestrator.run(Arc::clone(&tensor))?;
    info!(
        "[method: {}] [{}] Search done in {:.3}s",
        method,
        timestamp(),
        result.stats.total_duration.as_secs_f64()
    );

    io::write_blocks(config.get_output(), &tensor, &result)?;
    info!(
        "[method: {}] [{}] Blocks written to {}",
        method,
        timestamp(),
        config.get_output().display()
    );
    Ok(result)
}
