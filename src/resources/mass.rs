use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ConfigError;
use crate::components::PointMassShape;

/// Mass and balance section of a vehicle definition.
///
/// Inertia terms are in slug-ft^2 about the vehicle reference, weights in
/// pounds, locations in structural-frame inches (X positive aft).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassConfig {
    pub ixx: f64,
    pub iyy: f64,
    pub izz: f64,
    #[serde(default)]
    pub ixy: f64,
    #[serde(default)]
    pub ixz: f64,
    #[serde(default)]
    pub iyz: f64,
    /// Empty weight (lbs).
    pub empty_weight: f64,
    /// Base center of gravity, structural frame (in).
    pub cg: Vector3<f64>,
    #[serde(default)]
    pub point_masses: Vec<PointMassConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointMassConfig {
    pub name: String,
    /// Weight (lbs).
    pub weight: f64,
    /// Location, structural frame (in).
    pub location: Vector3<f64>,
    #[serde(default)]
    pub shape: Option<ShapeConfig>,
}

/// Optional geometry used to derive a point mass's own moment of inertia.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeConfig {
    pub kind: PointMassShape,
    /// Radius (ft).
    pub radius: f64,
    /// Length along the structural X axis (ft); unused for spheres and balls.
    #[serde(default)]
    pub length: f64,
}

impl MassConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: MassConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.empty_weight < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "empty weight must be non-negative, got {}",
                self.empty_weight
            )));
        }
        if self.ixx < 0.0 || self.iyy < 0.0 || self.izz < 0.0 {
            return Err(ConfigError::ValidationError(
                "diagonal inertia terms must be non-negative".into(),
            ));
        }
        for pm in &self.point_masses {
            if pm.weight < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "point mass `{}` has negative weight {}",
                    pm.name, pm.weight
                )));
            }
            if let Some(shape) = &pm.shape {
                if shape.radius <= 0.0 {
                    return Err(ConfigError::ValidationError(format!(
                        "point mass `{}` shape requires a positive radius",
                        pm.name
                    )));
                }
                if matches!(shape.kind, PointMassShape::Tube | PointMassShape::Cylinder)
                    && shape.length <= 0.0
                {
                    return Err(ConfigError::ValidationError(format!(
                        "point mass `{}` shape requires a positive length",
                        pm.name
                    )));
                }
            }
        }
        Ok(())
    }
}
