//! Bulk dataset generation
//!
//! Repeats the single-scene generator and replicates every snapshot `L`
//! times so a downstream receiver sees L observations of each scene.

use ndarray::{s, Array2, ArrayView3, Axis};
use num_complex::Complex32;
use rand::Rng;

use crate::params::GeneratorParams;
use crate::signal::SignalGenerator;
use crate::CbnError;

/// Labels and replicated snapshots for a batch of scenes
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// scenes x resolution
    labels: Array2<f64>,
    /// (scenes * replicas) x antennas
    data: Array2<Complex32>,
    replicas: usize,
}

impl Dataset {
    /// Assemble a dataset, checking the row counts agree
    pub fn from_parts(
        labels: Array2<f64>,
        data: Array2<Complex32>,
        replicas: usize,
    ) -> Result<Self, CbnError> {
        if replicas == 0 {
            return Err(CbnError::InvalidConfig(
                "replicas must be greater than zero".to_string(),
            ));
        }
        let expected = labels.nrows() * replicas;
        if data.nrows() != expected {
            return Err(CbnError::LengthMismatch {
                context: "dataset rows",
                expected,
                got: data.nrows(),
            });
        }
        Ok(Self {
            labels,
            data,
            replicas,
        })
    }

    pub fn labels(&self) -> &Array2<f64> {
        &self.labels
    }

    pub fn data(&self) -> &Array2<Complex32> {
        &self.data
    }

    pub fn into_parts(self) -> (Array2<f64>, Array2<Complex32>) {
        (self.labels, self.data)
    }

    pub fn scenes(&self) -> usize {
        self.labels.nrows()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    pub fn antennas(&self) -> usize {
        self.data.ncols()
    }

    pub fn resolution(&self) -> usize {
        self.labels.ncols()
    }

    /// View the data as (scenes, replicas, antennas)
    pub fn snapshots(&self) -> Result<ArrayView3<'_, Complex32>, CbnError> {
        Ok(self
            .data
            .view()
            .into_shape((self.scenes(), self.replicas, self.antennas()))?)
    }

    /// Replace the snapshot matrix, e.g. with a noisy copy of the same shape
    pub fn with_data(&self, data: Array2<Complex32>) -> Result<Self, CbnError> {
        if data.dim() != self.data.dim() {
            return Err(CbnError::LengthMismatch {
                context: "replacement data rows",
                expected: self.data.nrows(),
                got: data.nrows(),
            });
        }
        Self::from_parts(self.labels.clone(), data, self.replicas)
    }

    /// Number of set label bins in each scene
    pub fn sources_per_scene(&self) -> Vec<usize> {
        self.labels
            .axis_iter(Axis(0))
            .map(|row| row.iter().filter(|&&v| v != 0.0).count())
            .collect()
    }
}

/// Generate `data_points` scenes, each replicated `l` times
pub fn generate_bulk_data<R: Rng + ?Sized>(
    data_points: usize,
    l: usize,
    params: &GeneratorParams,
    rng: &mut R,
) -> Result<Dataset, CbnError> {
    if l == 0 {
        return Err(CbnError::InvalidConfig("l must be greater than zero".to_string()));
    }
    let generator = SignalGenerator::new(*params)?;

    let mut data = Array2::<Complex32>::zeros((data_points * l, params.antennas));
    let mut labels = Array2::<f64>::zeros((data_points, params.resolution));

    for i in 0..data_points {
        let scene = generator.generate(rng);

        let start = l * i;
        let end = start + l;
        data.slice_mut(s![start..end, ..]).assign(&scene.sample);
        labels.row_mut(i).assign(&scene.label_grid);
    }

    tracing::debug!(
        scenes = data_points,
        replicas = l,
        antennas = params.antennas,
        sources = params.sources,
        "generated bulk dataset"
    );

    Dataset::from_parts(labels, data, l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_bulk_shapes() {
        let params = GeneratorParams::new(4, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let ds = generate_bulk_data(25, 3, &params, &mut rng).unwrap();
        assert_eq!(ds.labels().dim(), (25, 180));
        assert_eq!(ds.data().dim(), (75, 4));
        assert_eq!(ds.scenes(), 25);
        assert_eq!(ds.replicas(), 3);
    }

    #[test]
    fn test_replicas_are_identical() {
        let params = GeneratorParams::new(5, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let ds = generate_bulk_data(10, 4, &params, &mut rng).unwrap();
        let snaps = ds.snapshots().unwrap();
        for scene in snaps.outer_iter() {
            let first = scene.row(0);
            for rep in scene.outer_iter() {
                assert_eq!(rep, first);
            }
        }
    }

    #[test]
    fn test_label_counts_bounded_by_k() {
        let params = GeneratorParams::new(8, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let ds = generate_bulk_data(200, 1, &params, &mut rng).unwrap();
        assert!(ds.sources_per_scene().iter().all(|&c| (1..=3).contains(&c)));
    }

    #[test]
    fn test_from_parts_rejects_mismatch() {
        let labels = Array2::<f64>::zeros((3, 10));
        let data = Array2::<Complex32>::zeros((7, 4));
        assert!(Dataset::from_parts(labels, data, 2).is_err());
    }

    #[test]
    fn test_zero_scenes() {
        let params = GeneratorParams::new(4, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let ds = generate_bulk_data(0, 2, &params, &mut rng).unwrap();
        assert_eq!(ds.data().nrows(), 0);
        assert_eq!(ds.snapshots().unwrap().dim(), (0, 2, 4));
    }
}
