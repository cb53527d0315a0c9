use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::{CacheKeying, DatasetCache};
use crate::covariance::CovarianceKind;
use crate::noise::SnrRange;
use crate::params::GeneratorParams;
use crate::CbnError;

pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Dataset generation run, usually read from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub schema_version: String,
    /// Number of scenes
    pub training_size: usize,
    /// Snapshots per scene (L)
    pub replicas: usize,
    pub seed: u64,
    pub use_cache: bool,
    pub cache_dir: PathBuf,
    pub keying: CacheKeying,
    pub snr: SnrRange,
    /// Outer product used for covariance features
    pub covariance: CovarianceKind,
    pub generator: GeneratorParams,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            training_size: 500_000,
            replicas: 4,
            seed: 42,
            use_cache: true,
            cache_dir: PathBuf::from("data"),
            keying: CacheKeying::Full,
            snr: SnrRange::default(),
            covariance: CovarianceKind::Transpose,
            generator: GeneratorParams::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, CbnError> {
        let cfg: RunConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, CbnError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), CbnError> {
        if self.schema_version != CONFIG_SCHEMA_VERSION {
            return Err(CbnError::InvalidConfig(format!(
                "config schema_version {} does not match {}",
                self.schema_version, CONFIG_SCHEMA_VERSION
            )));
        }
        if self.training_size == 0 {
            return Err(CbnError::InvalidConfig(
                "training_size must be greater than zero".to_string(),
            ));
        }
        if self.replicas == 0 {
            return Err(CbnError::InvalidConfig(
                "replicas must be greater than zero".to_string(),
            ));
        }
        self.snr.validate()?;
        self.generator.validate()
    }

    pub fn cache(&self) -> DatasetCache {
        DatasetCache::new(&self.cache_dir, self.keying)
    }
}
