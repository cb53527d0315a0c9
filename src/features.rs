//! Feature preparation for an external trainer
//!
//! Noisy snapshots of each scene are flattened into one real-valued row
//! (`[Re | Im]`) and each row is scaled by its peak magnitude.

use ndarray::{concatenate, Array2, Axis};
use num_complex::Complex32;
use rand::Rng;

use crate::bulk::Dataset;
use crate::noise::{apply_wgn, SnrRange};
use crate::CbnError;

/// Flatten each scene's `l` snapshots into `[Re | Im]`, shape (scenes, 2 N L)
pub fn stack_real_imag(data: &Array2<Complex32>, l: usize) -> Result<Array2<f32>, CbnError> {
    if l == 0 {
        return Err(CbnError::InvalidConfig("l must be greater than zero".to_string()));
    }
    if data.nrows() % l != 0 {
        return Err(CbnError::LengthMismatch {
            context: "feature rows",
            expected: data.nrows().div_ceil(l) * l,
            got: data.nrows(),
        });
    }
    let scenes = data.nrows() / l;
    let width = data.ncols() * l;

    let flat = data
        .as_standard_layout()
        .into_owned()
        .into_shape((scenes, width))?;
    let re = flat.mapv(|z| z.re);
    let im = flat.mapv(|z| z.im);
    Ok(concatenate(Axis(1), &[re.view(), im.view()])?)
}

/// Divide every row by its largest absolute value; all-zero rows are kept
pub fn normalize_rows(mut features: Array2<f32>) -> Array2<f32> {
    for mut row in features.axis_iter_mut(Axis(0)) {
        let peak = row.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        if peak > 0.0 {
            row.mapv_inplace(|v| v / peak);
        }
    }
    features
}

/// Noise, stack and normalise a dataset; returns (features, labels)
pub fn training_features<R: Rng + ?Sized>(
    dataset: &Dataset,
    snr: SnrRange,
    rng: &mut R,
) -> Result<(Array2<f32>, Array2<f64>), CbnError> {
    let noisy = apply_wgn(dataset.data(), dataset.replicas(), snr, rng)?;
    let stacked = stack_real_imag(&noisy.data, dataset.replicas())?;
    Ok((normalize_rows(stacked), dataset.labels().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_stack_layout() {
        let data = array![
            [Complex32::new(1.0, -1.0), Complex32::new(2.0, -2.0)],
            [Complex32::new(3.0, -3.0), Complex32::new(4.0, -4.0)],
        ];
        let stacked = stack_real_imag(&data, 2).unwrap();
        assert_eq!(
            stacked,
            array![[1.0, 2.0, 3.0, 4.0, -1.0, -2.0, -3.0, -4.0]]
        );
    }

    #[test]
    fn test_stack_rejects_partial_scene() {
        let data = Array2::<Complex32>::zeros((3, 2));
        assert!(stack_real_imag(&data, 2).is_err());
        assert!(stack_real_imag(&data, 0).is_err());
    }

    #[test]
    fn test_normalize_rows() {
        let out = normalize_rows(array![[2.0, -4.0, 1.0], [0.0, 0.0, 0.0]]);
        assert_eq!(out, array![[0.5, -1.0, 0.25], [0.0, 0.0, 0.0]]);
    }
}
