pub mod filter;
pub mod label;
pub mod pipeline;
pub mod proximity;
pub mod report;

use std::error::Error;
use std::path::Path;

use prox_pipe::{load_config, PipelineConfig};

/// Settings file when given, defaults rooted at the command's directories otherwise.
pub fn base_config(config: Option<&Path>, input: &Path, out: &Path) -> Result<PipelineConfig, Box<dyn Error>> {
    match config {
        Some(path) => {
            let mut config = load_config(path)?;
            config.input_root = input.to_path_buf();
            config.output_root = out.to_path_buf();
            config.base_dir = Default::default();
            Ok(config)
        }
        None => Ok(PipelineConfig::new(input, out)),
    }
}
