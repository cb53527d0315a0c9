//! Uniform linear array geometry and steering vectors

use std::f64::consts::PI;

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::params::SPEED_OF_LIGHT;

/// N-element uniform linear array with half-wavelength spacing
#[derive(Debug, Clone, PartialEq)]
pub struct UniformLinearArray {
    /// Element positions in wavelengths
    positions: Array1<f64>,
    /// Normalisation applied to every steering vector entry
    scale: f64,
}

impl UniformLinearArray {
    /// Build the array for a carrier at `frequency_hz`
    pub fn new(antennas: usize, frequency_hz: f64) -> Self {
        let wavelength = SPEED_OF_LIGHT / frequency_hz;
        let spacing = wavelength / 2.0;
        let positions = Array1::from_iter((0..antennas).map(|n| n as f64 * spacing / wavelength));

        Self {
            positions,
            scale: (1.0 / antennas as f64).sqrt(),
        }
    }

    pub fn antennas(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &Array1<f64> {
        &self.positions
    }

    /// Steering vector a(theta): exp(-j 2 pi p_n sin theta) / sqrt(N)
    pub fn steering_vector(&self, theta: f64) -> Array1<Complex64> {
        let sin_theta = theta.sin();
        self.positions
            .mapv(|p| Complex64::from_polar(self.scale, -2.0 * PI * p * sin_theta))
    }

    /// Steering vectors stacked row-wise, one row per angle (K x N)
    pub fn steering_matrix(&self, thetas: &[f64]) -> Array2<Complex64> {
        let mut matrix = Array2::<Complex64>::zeros((thetas.len(), self.antennas()));
        for (mut row, &theta) in matrix.outer_iter_mut().zip(thetas) {
            row.assign(&self.steering_vector(theta));
        }
        matrix
    }

    /// Superposition of the sources: y = sum_k gain_k * a(theta_k)
    pub fn receive(&self, thetas: &[f64], gains: &[Complex64]) -> Array1<Complex64> {
        assert_eq!(thetas.len(), gains.len(), "Angle/gain count mismatch");
        let gains = Array1::from_iter(gains.iter().copied());
        self.steering_matrix(thetas).t().dot(&gains)
    }
}
