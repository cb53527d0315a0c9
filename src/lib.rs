//! CBN dataset generator
//!
//! Synthetic direction-of-arrival data for a Coherent Beamforming Network
//! receiver: K far-field sources observed by an N-element uniform linear
//! array, labelled on an angular grid, replicated L times per scene and
//! cached to disk as `.npy` files.

pub mod array;
pub mod bulk;
pub mod cache;
pub mod config;
pub mod covariance;
pub mod features;
pub mod logging;
pub mod noise;
pub mod params;
pub mod signal;

use thiserror::Error;

// Re-export main types
pub use array::UniformLinearArray;
pub use bulk::{generate_bulk_data, Dataset};
pub use cache::{data_initialization, CacheKeying, CacheOutcome, DatasetCache};
pub use config::RunConfig;
pub use covariance::{compute_cov, CovarianceKind};
pub use noise::{apply_wgn, NoisyBatch, SnrRange};
pub use params::{GeneratorParams, ThetaDistribution};
pub use signal::{generate_single_data, SignalSample};

#[derive(Debug, Error)]
pub enum CbnError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("npy read error: {0}")]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),
    #[error("npy write error: {0}")]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
}

pub type Result<T> = std::result::Result<T, CbnError>;
