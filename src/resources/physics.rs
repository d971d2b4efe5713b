use serde::{Deserialize, Serialize};

/// Numerical integration scheme for one integrated quantity.
///
/// `None` freezes the quantity: its value is held constant while the
/// simulation keeps running. The multistep schemes draw on the per-quantity
/// derivative history, which is updated on every step regardless of scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    None,
    RectEuler,
    Trapezoidal,
    AdamsBashforth2,
    AdamsBashforth3,
    AdamsBashforth4,
}

/// Gravitation model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GravityModel {
    /// Inverse-square gravitation along the local down axis.
    Standard,
    /// Oblate-planet J2 gravitation evaluated in the ECEF frame.
    Wgs84,
}

/// Integrator selection for the four independently configurable axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegratorConfig {
    pub rotational_rate: Integrator,
    pub translational_rate: Integrator,
    pub rotational_position: Integrator,
    pub translational_position: Integrator,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            rotational_rate: Integrator::AdamsBashforth2,
            translational_rate: Integrator::AdamsBashforth2,
            rotational_position: Integrator::Trapezoidal,
            translational_position: Integrator::Trapezoidal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Fixed step size (s).
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    #[serde(default)]
    pub gravity: GravityModel,
    #[serde(default)]
    pub integrator: IntegratorConfig,
}

fn default_time_step() -> f64 {
    1.0 / 120.0
}

impl Default for GravityModel {
    fn default() -> Self {
        GravityModel::Standard
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            gravity: GravityModel::default(),
            integrator: IntegratorConfig::default(),
        }
    }
}
