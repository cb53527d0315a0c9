//! On-disk dataset cache
//!
//! A dataset is stored as two `.npy` arrays next to each other,
//! `<basename>_data.npy` (complex64, (scenes * L) x N) and
//! `<basename>_labels.npy` (float64, scenes x resolution), plus a JSON
//! provenance sidecar. The basename is derived from the configuration.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ndarray_npy::{read_npy, write_npy};
use num_complex::Complex32;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bulk::{generate_bulk_data, Dataset};
use crate::params::GeneratorParams;
use crate::CbnError;

pub const CACHE_SCHEMA_VERSION: &str = "1.0.0";

const DATA_SUFFIX: &str = "_data.npy";
const LABELS_SUFFIX: &str = "_labels.npy";
const MANIFEST_SUFFIX: &str = "_manifest.json";

/// Which parameters take part in the cache file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKeying {
    /// `CBN_training_N=..._K=..._L=...` only. Frequency, resolution,
    /// bound and distribution changes hit the same files.
    Shape,
    /// Every generator parameter is encoded in the name
    #[default]
    Full,
}

/// How `data_initialization` produced its dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Caching disabled, freshly generated
    Generated,
    /// Generated and written to the cache
    Stored,
    /// Read back from the cache
    Loaded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    pub schema_version: String,
    pub keying: CacheKeying,
    pub params: GeneratorParams,
    pub replicas: usize,
    pub scenes: usize,
}

/// Cache rooted at a directory
#[derive(Debug, Clone)]
pub struct DatasetCache {
    root: PathBuf,
    keying: CacheKeying,
}

impl DatasetCache {
    pub fn new(root: impl Into<PathBuf>, keying: CacheKeying) -> Self {
        Self {
            root: root.into(),
            keying,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn keying(&self) -> CacheKeying {
        self.keying
    }

    /// Basename (without suffixes) of the files for this configuration
    pub fn basename(&self, params: &GeneratorParams, l: usize, training_size: usize) -> PathBuf {
        let mut name = format!(
            "CBN_training_N={}_K={}_L={}",
            params.antennas, params.sources, l
        );
        if self.keying == CacheKeying::Full {
            name.push_str(&format!(
                "_size={}_f={}_res={}_bound={}_dist={}",
                training_size,
                params.frequency_hz,
                params.resolution,
                params.theta_bound,
                params.distribution
            ));
        }
        self.root.join(name)
    }

    /// Generate, load or store a dataset for this configuration
    pub fn initialize<R: Rng + ?Sized>(
        &self,
        training_size: usize,
        l: usize,
        params: &GeneratorParams,
        use_cache: bool,
        rng: &mut R,
    ) -> Result<(Dataset, CacheOutcome), CbnError> {
        if !use_cache {
            let dataset = generate_bulk_data(training_size, l, params, rng)?;
            return Ok((dataset, CacheOutcome::Generated));
        }

        let base = self.basename(params, l, training_size);
        if !check_data_exists(&base) {
            let dataset = generate_bulk_data(training_size, l, params, rng)?;
            // sidecar first: the arrays only count as cached once both exist
            write_manifest(&base, self.keying, params, &dataset)?;
            save_generated_data(&base, &dataset)?;
            tracing::info!(path = %base.display(), scenes = dataset.scenes(), "stored dataset");
            return Ok((dataset, CacheOutcome::Stored));
        }

        let dataset = load_generated_data(&base, l)?;
        if dataset.scenes() != training_size
            || dataset.resolution() != params.resolution
            || dataset.antennas() != params.antennas
        {
            tracing::warn!(
                path = %base.display(),
                cached_scenes = dataset.scenes(),
                requested_scenes = training_size,
                cached_resolution = dataset.resolution(),
                requested_resolution = params.resolution,
                "cached dataset does not match the requested configuration"
            );
        }
        tracing::info!(path = %base.display(), scenes = dataset.scenes(), "loaded cached dataset");
        Ok((dataset, CacheOutcome::Loaded))
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut raw = base.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

pub fn data_path(base: &Path) -> PathBuf {
    with_suffix(base, DATA_SUFFIX)
}

pub fn labels_path(base: &Path) -> PathBuf {
    with_suffix(base, LABELS_SUFFIX)
}

pub fn manifest_path(base: &Path) -> PathBuf {
    with_suffix(base, MANIFEST_SUFFIX)
}

/// True only when both the data and label files are present
pub fn check_data_exists(base: &Path) -> bool {
    data_path(base).is_file() && labels_path(base).is_file()
}

fn ensure_parent(base: &Path) -> Result<(), CbnError> {
    if let Some(parent) = base.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write the data and label arrays under `base`
pub fn save_generated_data(base: &Path, dataset: &Dataset) -> Result<(), CbnError> {
    ensure_parent(base)?;
    write_npy(data_path(base), dataset.data())?;
    write_npy(labels_path(base), dataset.labels())?;
    Ok(())
}

/// Read the arrays written by [`save_generated_data`]
///
/// Missing files surface as read errors; call [`check_data_exists`] first.
pub fn load_generated_data(base: &Path, l: usize) -> Result<Dataset, CbnError> {
    let data: Array2<Complex32> = read_npy(data_path(base))?;
    let labels: Array2<f64> = read_npy(labels_path(base))?;
    Dataset::from_parts(labels, data, l)
}

pub fn write_manifest(
    base: &Path,
    keying: CacheKeying,
    params: &GeneratorParams,
    dataset: &Dataset,
) -> Result<PathBuf, CbnError> {
    let manifest = CacheManifest {
        schema_version: CACHE_SCHEMA_VERSION.to_string(),
        keying,
        params: *params,
        replicas: dataset.replicas(),
        scenes: dataset.scenes(),
    };
    ensure_parent(base)?;
    let path = manifest_path(base);
    fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
    Ok(path)
}

pub fn read_manifest(base: &Path) -> Result<CacheManifest, CbnError> {
    let raw = fs::read_to_string(manifest_path(base))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Generate or reuse the training set for a configuration
pub fn data_initialization<R: Rng + ?Sized>(
    cache: &DatasetCache,
    training_size: usize,
    l: usize,
    params: &GeneratorParams,
    use_cache: bool,
    rng: &mut R,
) -> Result<(Dataset, CacheOutcome), CbnError> {
    cache.initialize(training_size, l, params, use_cache, rng)
}
