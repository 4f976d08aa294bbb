use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use prox_core::{parse_date, ColumnSchema, ErrorInfo, ProxError};
use serde::{Deserialize, Serialize};

use crate::filters::FilterSpec;
use crate::hash::stable_hash_string;
use crate::label::LabelSpec;
use crate::serde::{from_yaml_slice, to_yaml_string};

fn config_error(code: &str, message: impl Into<String>) -> ProxError {
    ProxError::Config(ErrorInfo::new(code, message))
}

/// Run configuration shared by every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the input tables.
    pub input_root: PathBuf,
    /// Directory receiving the stage outputs.
    pub output_root: PathBuf,
    /// Cutoff date, `YYYY-MM-DD`, used as the closure date of open businesses.
    #[serde(default = "PipelineConfig::default_horizon")]
    pub horizon: String,
    /// Worker threads; one table per task.
    #[serde(default = "PipelineConfig::default_concurrency")]
    pub concurrency: usize,
    /// Input column names.
    #[serde(default)]
    pub columns: ColumnSchema,
    /// Stage 1 record filters.
    #[serde(default)]
    pub filters: FilterSpec,
    /// Stage 2 survival labelling.
    #[serde(default)]
    pub labeling: LabelSpec,
    /// Directory containing the configuration file (ignored when serializing).
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl PipelineConfig {
    fn default_horizon() -> String {
        "2019-12-31".to_string()
    }

    fn default_concurrency() -> usize {
        std::thread::available_parallelism()
            .map(|threads| threads.get())
            .unwrap_or(1)
    }

    /// Configuration with default settings for the given directories.
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            horizon: Self::default_horizon(),
            concurrency: Self::default_concurrency(),
            columns: ColumnSchema::default(),
            filters: FilterSpec::default(),
            labeling: LabelSpec::default(),
            base_dir: PathBuf::new(),
        }
    }

    /// Parsed horizon date.
    pub fn horizon_date(&self) -> Result<NaiveDate, ProxError> {
        parse_date(&self.horizon).map_err(|err| {
            ProxError::Config(
                ErrorInfo::new("config_horizon", "horizon is not a YYYY-MM-DD date")
                    .with_context("horizon", self.horizon.clone())
                    .with_hint(err.to_string()),
            )
        })
    }

    /// Input root, resolved against the configuration file's directory.
    pub fn input_dir(&self) -> PathBuf {
        self.resolve(&self.input_root)
    }

    /// Output root, resolved against the configuration file's directory.
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output_root)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Checks the settings that are fatal for a whole run.
    pub fn validate(&self) -> Result<NaiveDate, ProxError> {
        let horizon = self.horizon_date()?;
        if self.concurrency == 0 {
            return Err(config_error("config_concurrency", "concurrency must be at least 1"));
        }
        ensure_input_dir(&self.input_dir())?;
        if !self.labeling.min_years.is_finite() {
            return Err(ProxError::Config(
                ErrorInfo::new("config_min_years", "minimum survival years must be finite")
                    .with_context("min_years", self.labeling.min_years.to_string()),
            ));
        }
        Ok(horizon)
    }

    /// Canonical hash of the configuration, embedded in run reports.
    pub fn config_hash(&self) -> Result<String, ProxError> {
        stable_hash_string(self)
    }

    /// YAML representation of the configuration.
    pub fn to_yaml_string(&self) -> Result<String, ProxError> {
        to_yaml_string(self)
    }
}

/// Loads a configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ProxError> {
    let config_path = path.as_ref();
    let bytes = fs::read(config_path).map_err(|err| {
        ProxError::Config(
            ErrorInfo::new("config_read", err.to_string())
                .with_context("path", config_path.display().to_string()),
        )
    })?;
    let mut config: PipelineConfig = from_yaml_slice(&bytes)?;
    config.base_dir = config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok(config)
}

/// Fails with `config_input_root` unless `path` is a directory.
pub fn ensure_input_dir(path: &Path) -> Result<(), ProxError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ProxError::Config(
            ErrorInfo::new("config_input_root", "input root is not a readable directory")
                .with_context("path", path.display().to_string()),
        ))
    }
}

/// Creates `path` if needed, failing with `config_output_root`.
pub fn ensure_output_dir(path: &Path) -> Result<(), ProxError> {
    fs::create_dir_all(path).map_err(|err| {
        ProxError::Config(
            ErrorInfo::new("config_output_root", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}
