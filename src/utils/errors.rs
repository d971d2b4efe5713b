use std::io;
use thiserror::Error;

use crate::expressions::FunctionError;
use crate::resources::ConfigError;
use crate::systems::PhysicsError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Function error: {0}")]
    Function(#[from] FunctionError),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("State error: {0}")]
    State(String),
}
