//! Run configuration.
//!
//! Values are layered, later sources winning: built-in defaults, an optional
//! TOML file, `RSQA_*` environment variables, then command-line flags.

use crate::error::{ProcessingError, Result};
use crate::utils::constants::*;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlConfig {
    pub registry_path: PathBuf,
    pub measurement_path: PathBuf,
    pub output_dir: PathBuf,
    pub default_municipality: String,
    pub default_environment_type: String,
    pub delimiter: String,
    pub compression: String,
    pub row_group_size: usize,
    pub use_mmap: bool,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
            measurement_path: PathBuf::from(DEFAULT_MEASUREMENT_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            default_municipality: DEFAULT_MUNICIPALITY.to_string(),
            default_environment_type: DEFAULT_ENVIRONMENT_TYPE.to_string(),
            delimiter: ",".to_string(),
            compression: COMPRESSION_SNAPPY.to_string(),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            use_mmap: false,
        }
    }
}

impl EtlConfig {
    /// Load configuration from defaults, `config_file` (or `rsqa.toml` when
    /// present) and the environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("registry_path", DEFAULT_REGISTRY_PATH)?
            .set_default("measurement_path", DEFAULT_MEASUREMENT_PATH)?
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("default_municipality", defaults.default_municipality)?
            .set_default("default_environment_type", defaults.default_environment_type)?
            .set_default("delimiter", defaults.delimiter)?
            .set_default("compression", defaults.compression)?
            .set_default("row_group_size", defaults.row_group_size as i64)?
            .set_default("use_mmap", defaults.use_mmap)?;

        builder = match config_file {
            Some(path) => {
                debug!("Reading configuration file {}", path.display());
                builder.add_source(
                    File::new(&path.to_string_lossy(), FileFormat::Toml).required(true),
                )
            }
            None => {
                builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false))
            }
        };

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: EtlConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_registry_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.registry_path = path;
        }
        self
    }

    pub fn with_measurement_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.measurement_path = path;
        }
        self
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output_dir = dir;
        }
        self
    }

    pub fn with_compression(mut self, compression: Option<String>) -> Self {
        if let Some(compression) = compression {
            self.compression = compression;
        }
        self
    }

    /// The delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(ProcessingError::Config(format!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_municipality.trim().is_empty() {
            return Err(ProcessingError::Config(
                "default_municipality must not be blank".to_string(),
            ));
        }
        if self.default_environment_type.trim().is_empty() {
            return Err(ProcessingError::Config(
                "default_environment_type must not be blank".to_string(),
            ));
        }
        if self.row_group_size == 0 {
            return Err(ProcessingError::Config(
                "row_group_size must be greater than zero".to_string(),
            ));
        }
        if !SUPPORTED_COMPRESSIONS.contains(&self.compression.to_lowercase().as_str()) {
            return Err(ProcessingError::Config(format!(
                "Unsupported compression: {} (expected one of {})",
                self.compression,
                SUPPORTED_COMPRESSIONS.join(", ")
            )));
        }
        self.delimiter_byte()?;
        Ok(())
    }

    pub fn log_config(&self) {
        info!("Registry source: {}", self.registry_path.display());
        info!("Measurement source: {}", self.measurement_path.display());
        info!("Output directory: {}", self.output_dir.display());
        info!(
            "Fallback references: municipality='{}', environment type='{}'",
            self.default_municipality, self.default_environment_type
        );
    }
}
