//! Single-scene signal generator
//!
//! Draws K angles of arrival and complex gains, forms the received array
//! snapshot and labels the angles on a `resolution`-bin grid.

use ndarray::Array1;
use num_complex::{Complex32, Complex64};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::array::UniformLinearArray;
use crate::params::{GeneratorParams, ThetaDistribution};
use crate::CbnError;

/// One generated scene
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSample {
    /// Binary grid of length `resolution`, 1.0 where a source lies
    pub label_grid: Array1<f64>,
    /// Received snapshot across the N antennas
    pub sample: Array1<Complex32>,
    /// True angles of arrival (radians)
    pub thetas: Vec<f64>,
}

/// Reusable generator holding the array geometry for a parameter set
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    params: GeneratorParams,
    array: UniformLinearArray,
}

impl SignalGenerator {
    pub fn new(params: GeneratorParams) -> Result<Self, CbnError> {
        params.validate()?;
        Ok(Self {
            array: UniformLinearArray::new(params.antennas, params.frequency_hz),
            params,
        })
    }

    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    pub fn array(&self) -> &UniformLinearArray {
        &self.array
    }

    /// Generate one scene
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> SignalSample {
        let p = &self.params;
        let thetas = draw_thetas(p.distribution, p.sources, p.theta_bound, rng);
        let gains = draw_gains(p.sources, rng);

        let received = self.array.receive(&thetas, &gains);
        let sample = received.mapv(|z| Complex32::new(z.re as f32, z.im as f32));

        SignalSample {
            label_grid: label_grid(&thetas, p.theta_bound, p.resolution),
            sample,
            thetas,
        }
    }
}

/// Generate one scene from `params`
pub fn generate_single_data<R: Rng + ?Sized>(
    params: &GeneratorParams,
    rng: &mut R,
) -> Result<SignalSample, CbnError> {
    Ok(SignalGenerator::new(*params)?.generate(rng))
}

/// Draw K angles of arrival
pub fn draw_thetas<R: Rng + ?Sized>(
    dist: ThetaDistribution,
    k: usize,
    theta_bound: f64,
    rng: &mut R,
) -> Vec<f64> {
    match dist {
        ThetaDistribution::Uniform => (0..k)
            .map(|_| 2.0 * theta_bound * rng.gen::<f64>() - theta_bound)
            .collect(),
        ThetaDistribution::Normal => (0..k).map(|_| StandardNormal.sample(rng)).collect(),
        ThetaDistribution::Zeros => vec![0.0; k],
        ThetaDistribution::Ones => vec![1.0; k],
    }
}

/// Draw K circularly-symmetric complex normal gains with unit variance
pub fn draw_gains<R: Rng + ?Sized>(k: usize, rng: &mut R) -> Vec<Complex64> {
    let scale = 0.5_f64.sqrt();
    (0..k)
        .map(|_| {
            let re: f64 = StandardNormal.sample(rng);
            let im: f64 = StandardNormal.sample(rng);
            Complex64::new(re, im) * scale
        })
        .collect()
}

/// Grid bin of an angle over [-theta_bound, theta_bound]
///
/// Angles on or beyond the upper bound fall in the last bin, angles below
/// the lower bound in the first one. A grid with no bins maps everything
/// to 0, which is not a valid index; callers must check `resolution > 0`.
pub fn theta_bin(theta: f64, theta_bound: f64, resolution: usize) -> usize {
    if resolution == 0 {
        return 0;
    }
    let pos = ((theta + theta_bound) / (2.0 * theta_bound) * resolution as f64).floor();
    // NaN casts to 0
    (pos as i64).clamp(0, resolution as i64 - 1) as usize
}

/// Binary label grid marking the bin of every angle
///
/// An empty grid is returned when `resolution` is 0.
pub fn label_grid(thetas: &[f64], theta_bound: f64, resolution: usize) -> Array1<f64> {
    let mut grid = Array1::<f64>::zeros(resolution);
    if resolution == 0 {
        return grid;
    }
    for &theta in thetas {
        grid[theta_bin(theta, theta_bound, resolution)] = 1.0;
    }
    grid
}
