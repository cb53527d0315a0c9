//! Generator parameters
//!
//! Array geometry, source count and label grid settings shared by the
//! signal and bulk generators.

use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CbnError;

/// Speed of light used for the carrier wavelength (m/s)
pub const SPEED_OF_LIGHT: f64 = 3e8;

/// Default carrier frequency (Hz)
pub const DEFAULT_FREQUENCY_HZ: f64 = 2.4e9;

/// Default number of angular bins in the label grid
pub const DEFAULT_RESOLUTION: usize = 180;

/// How the K angles of arrival of a scene are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThetaDistribution {
    /// Uniform on [-theta_bound, theta_bound)
    #[default]
    Uniform,
    /// Standard normal (radians), not truncated to the bound
    Normal,
    /// Every source at broadside
    Zeros,
    /// Every source at 1 rad
    Ones,
}

impl ThetaDistribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThetaDistribution::Uniform => "uniform",
            ThetaDistribution::Normal => "normal",
            ThetaDistribution::Zeros => "zeros",
            ThetaDistribution::Ones => "ones",
        }
    }
}

impl fmt::Display for ThetaDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThetaDistribution {
    type Err = CbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uniform" => Ok(ThetaDistribution::Uniform),
            "normal" => Ok(ThetaDistribution::Normal),
            "zeros" => Ok(ThetaDistribution::Zeros),
            "ones" => Ok(ThetaDistribution::Ones),
            other => Err(CbnError::InvalidConfig(format!(
                "unknown theta distribution '{other}'. valid: uniform,normal,zeros,ones"
            ))),
        }
    }
}

/// Parameters for generating one scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorParams {
    /// Number of receive antennas (N)
    pub antennas: usize,
    /// Number of point sources (K)
    pub sources: usize,
    /// Carrier frequency in Hz
    pub frequency_hz: f64,
    /// Number of angular bins in the label grid
    pub resolution: usize,
    /// Angles are labelled over [-theta_bound, theta_bound] (radians)
    pub theta_bound: f64,
    /// Angle-of-arrival distribution
    pub distribution: ThetaDistribution,
}

impl GeneratorParams {
    /// Create parameters for N antennas and K sources with default carrier and grid
    pub fn new(antennas: usize, sources: usize) -> Self {
        Self {
            antennas,
            sources,
            ..Self::default()
        }
    }

    pub fn with_distribution(mut self, distribution: ThetaDistribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_frequency(mut self, frequency_hz: f64) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    /// Carrier wavelength in metres
    pub fn wavelength(&self) -> f64 {
        SPEED_OF_LIGHT / self.frequency_hz
    }

    pub fn validate(&self) -> Result<(), CbnError> {
        if self.antennas == 0 {
            return Err(CbnError::InvalidConfig(
                "antennas must be greater than zero".to_string(),
            ));
        }
        if self.sources == 0 {
            return Err(CbnError::InvalidConfig(
                "sources must be greater than zero".to_string(),
            ));
        }
        if self.resolution == 0 {
            return Err(CbnError::InvalidConfig(
                "resolution must be greater than zero".to_string(),
            ));
        }
        if self.sources > self.resolution {
            return Err(CbnError::InvalidConfig(format!(
                "sources ({}) cannot exceed resolution ({})",
                self.sources, self.resolution
            )));
        }
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(CbnError::InvalidConfig(
                "frequency_hz must be finite and > 0".to_string(),
            ));
        }
        if !self.theta_bound.is_finite() || self.theta_bound <= 0.0 {
            return Err(CbnError::InvalidConfig(
                "theta_bound must be finite and > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            antennas: 8,
            sources: 1,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            resolution: DEFAULT_RESOLUTION,
            theta_bound: FRAC_PI_2,
            distribution: ThetaDistribution::Uniform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = GeneratorParams::new(16, 3);
        assert_eq!(params.resolution, 180);
        assert!(params.validate().is_ok());
        assert!((params.wavelength() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_degenerate_shapes() {
        assert!(GeneratorParams::new(0, 1).validate().is_err());
        assert!(GeneratorParams::new(4, 0).validate().is_err());
        assert!(GeneratorParams::new(4, 5).with_resolution(4).validate().is_err());
        assert!(GeneratorParams::new(4, 1).with_frequency(0.0).validate().is_err());
    }

    #[test]
    fn test_distribution_parse() {
        assert_eq!("Normal".parse::<ThetaDistribution>().unwrap(), ThetaDistribution::Normal);
        assert_eq!(" ones ".parse::<ThetaDistribution>().unwrap(), ThetaDistribution::Ones);
        assert!("gaussian".parse::<ThetaDistribution>().is_err());
        assert_eq!(ThetaDistribution::Zeros.to_string(), "zeros");
    }
}
