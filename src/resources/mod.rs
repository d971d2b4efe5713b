mod earth;
mod mass;
mod physics;
mod start;

pub use earth::EarthConfig;
pub use mass::{MassConfig, PointMassConfig, ShapeConfig};
pub use physics::{GravityModel, Integrator, IntegratorConfig, PhysicsConfig};
pub use start::InitialCondition;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}
