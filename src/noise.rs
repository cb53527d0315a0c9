//! Complex white Gaussian noise at a per-scene SNR

use ndarray::{Array1, Array2, Axis};
use num_complex::Complex32;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::CbnError;

/// SNR interval in dB; each scene draws its SNR uniformly from it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnrRange {
    pub min_db: f64,
    pub max_db: f64,
}

impl SnrRange {
    pub fn new(min_db: f64, max_db: f64) -> Result<Self, CbnError> {
        let range = Self { min_db, max_db };
        range.validate()?;
        Ok(range)
    }

    pub fn fixed(snr_db: f64) -> Result<Self, CbnError> {
        Self::new(snr_db, snr_db)
    }

    pub fn validate(&self) -> Result<(), CbnError> {
        if !self.min_db.is_finite() || !self.max_db.is_finite() {
            return Err(CbnError::InvalidConfig(
                "snr bounds must be finite".to_string(),
            ));
        }
        if self.max_db < self.min_db {
            return Err(CbnError::InvalidConfig(format!(
                "snr max ({}) must be >= snr min ({})",
                self.max_db, self.min_db
            )));
        }
        Ok(())
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max_db > self.min_db {
            rng.gen_range(self.min_db..self.max_db)
        } else {
            self.min_db
        }
    }
}

impl Default for SnrRange {
    fn default() -> Self {
        Self {
            min_db: 5.0,
            max_db: 30.0,
        }
    }
}

/// Noisy copy of a batch plus the noise level used for each scene
#[derive(Debug, Clone)]
pub struct NoisyBatch {
    pub data: Array2<Complex32>,
    /// Per-component noise standard deviation, one entry per scene
    pub noise_scale: Array1<f64>,
}

/// Linear power of a dB value
pub fn db_to_power(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// Add complex white Gaussian noise to `data`
///
/// `data` holds scenes of `l` consecutive identical rows. One SNR is drawn
/// per scene and shared by its `l` rows; every entry then receives
/// independent real and imaginary noise with standard deviation
/// sqrt(0.5 / snr_linear).
pub fn apply_wgn<R: Rng + ?Sized>(
    data: &Array2<Complex32>,
    l: usize,
    snr: SnrRange,
    rng: &mut R,
) -> Result<NoisyBatch, CbnError> {
    snr.validate()?;
    if l == 0 {
        return Err(CbnError::InvalidConfig("l must be greater than zero".to_string()));
    }
    let rows = data.nrows();
    if rows % l != 0 {
        return Err(CbnError::LengthMismatch {
            context: "noise batch rows",
            expected: rows.div_ceil(l) * l,
            got: rows,
        });
    }

    let scenes = rows / l;
    let noise_scale: Array1<f64> = (0..scenes)
        .map(|_| (0.5 / db_to_power(snr.draw(rng))).sqrt())
        .collect();

    let mut noisy = data.clone();
    for (row_idx, mut row) in noisy.axis_iter_mut(Axis(0)).enumerate() {
        let sigma = noise_scale[row_idx / l];
        for z in row.iter_mut() {
            let re: f64 = StandardNormal.sample(rng);
            let im: f64 = StandardNormal.sample(rng);
            z.re += (re * sigma) as f32;
            z.im += (im * sigma) as f32;
        }
    }

    Ok(NoisyBatch {
        data: noisy,
        noise_scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_db_to_power() {
        assert_relative_eq!(db_to_power(0.0), 1.0);
        assert_relative_eq!(db_to_power(10.0), 10.0, epsilon = 1e-12);
        assert_relative_eq!(db_to_power(-20.0), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_snr_range_validation() {
        assert!(SnrRange::new(5.0, 30.0).is_ok());
        assert!(SnrRange::new(30.0, 5.0).is_err());
        assert!(SnrRange::new(f64::NAN, 5.0).is_err());
    }

    #[test]
    fn test_fixed_snr_scale() {
        let data = Array2::<Complex32>::zeros((6, 3));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let out = apply_wgn(&data, 2, SnrRange::fixed(10.0).unwrap(), &mut rng).unwrap();
        assert_eq!(out.noise_scale.len(), 3);
        for s in out.noise_scale.iter() {
            assert_relative_eq!(*s, (0.05f64).sqrt(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rows_not_multiple_of_l() {
        let data = Array2::<Complex32>::zeros((5, 3));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let err = apply_wgn(&data, 2, SnrRange::default(), &mut rng).unwrap_err();
        assert!(matches!(err, CbnError::LengthMismatch { .. }));
    }

    #[test]
    fn test_scale_within_snr_range() {
        let data = Array2::<Complex32>::zeros((40, 2));
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let snr = SnrRange::new(5.0, 30.0).unwrap();
        let out = apply_wgn(&data, 4, snr, &mut rng).unwrap();
        let lo = (0.5 / db_to_power(30.0)).sqrt();
        let hi = (0.5 / db_to_power(5.0)).sqrt();
        assert!(out.noise_scale.iter().all(|&s| s > lo && s <= hi));
    }

    #[test]
    fn test_measured_noise_power_matches_snr() {
        let data = Array2::<Complex32>::zeros((1, 20_000));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let out = apply_wgn(&data, 1, SnrRange::fixed(0.0).unwrap(), &mut rng).unwrap();
        let power: f64 =
            out.data.iter().map(|z| z.norm_sqr() as f64).sum::<f64>() / 20_000.0;
        // unit SNR against a unit-power signal: complex noise power 1.0
        assert!((power - 1.0).abs() < 0.05, "power = {power}");
    }
}
