use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ConfigError;

/// Complete initial state handed to the propagator at startup or reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialCondition {
    /// Geocentric latitude (rad).
    #[serde(default)]
    pub latitude: f64,
    /// Longitude (rad).
    #[serde(default)]
    pub longitude: f64,
    /// Altitude above sea level (ft).
    #[serde(default)]
    pub altitude_asl: f64,
    /// Body-frame velocity u, v, w (ft/s).
    #[serde(default)]
    pub uvw: Vector3<f64>,
    /// Body-frame angular rates p, q, r relative to the rotating frame (rad/s).
    #[serde(default)]
    pub pqr: Vector3<f64>,
    /// Euler angles phi, theta, psi of the body relative to the local frame (rad).
    #[serde(default)]
    pub euler: Vector3<f64>,
    /// Terrain elevation above sea level at the starting location (ft).
    #[serde(default)]
    pub terrain_elevation: f64,
}

impl Default for InitialCondition {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude_asl: 0.0,
            uvw: Vector3::zeros(),
            pqr: Vector3::zeros(),
            euler: Vector3::zeros(),
            terrain_elevation: 0.0,
        }
    }
}

impl InitialCondition {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}
