//! Sample covariance features

use std::str::FromStr;

use ndarray::{Array2, ArrayView3, Axis};
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

use crate::bulk::Dataset;
use crate::CbnError;

/// Which outer product a covariance row is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CovarianceKind {
    /// R = Y^T Y, i.e. sum_l y_l[i] y_l[j] with no conjugate. This is the
    /// feature the CBN training pipeline was fitted on.
    #[default]
    Transpose,
    /// R = Y^H Y, the Hermitian sample covariance sum_l y_l[i] conj(y_l[j])
    Hermitian,
}

impl FromStr for CovarianceKind {
    type Err = CbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transpose" => Ok(CovarianceKind::Transpose),
            "hermitian" => Ok(CovarianceKind::Hermitian),
            other => Err(CbnError::InvalidConfig(format!(
                "unknown covariance kind '{other}'. valid: transpose,hermitian"
            ))),
        }
    }
}

/// Covariance feature rows for a (batch, L, N) block of snapshots
///
/// Each scene contributes R = Y^T Y (N x N, row-major) and its row holds
/// `[Re(R) | Im(R)]`, giving shape (batch, 2 N^2).
pub fn compute_cov(snapshots: ArrayView3<'_, Complex32>) -> Array2<f32> {
    compute_cov_with(snapshots, CovarianceKind::Transpose)
}

/// [`compute_cov`] with an explicit choice of outer product
pub fn compute_cov_with(
    snapshots: ArrayView3<'_, Complex32>,
    kind: CovarianceKind,
) -> Array2<f32> {
    let (batch, _l, n) = snapshots.dim();
    let nn = n * n;
    let mut features = Array2::<f32>::zeros((batch, 2 * nn));

    for (scene, mut row) in snapshots.outer_iter().zip(features.axis_iter_mut(Axis(0))) {
        for i in 0..n {
            for j in 0..n {
                let r: Complex32 = scene
                    .outer_iter()
                    .map(|y| match kind {
                        CovarianceKind::Transpose => y[i] * y[j],
                        CovarianceKind::Hermitian => y[i] * y[j].conj(),
                    })
                    .sum();
                row[i * n + j] = r.re;
                row[nn + i * n + j] = r.im;
            }
        }
    }

    features
}

/// Covariance features of every scene in a dataset
pub fn covariance_features(
    dataset: &Dataset,
    kind: CovarianceKind,
) -> Result<Array2<f32>, CbnError> {
    Ok(compute_cov_with(dataset.snapshots()?, kind))
}
