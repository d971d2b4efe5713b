use nalgebra::Vector3;
use tracing::info;

use crate::resources::EarthConfig;

/// Gravitation and planetary-rotation bookkeeping.
///
/// Owns the planetary constants for one simulation instance and tracks the
/// angle the planet has rotated since initialization. The rotation angle
/// only ever increases; it is reset to zero by `init_model`.
#[derive(Debug, Clone)]
pub struct Inertial {
    config: EarthConfig,
    g_accel: f64,
    g_accel_reference: f64,
    earth_position_angle: f64,
}

impl Inertial {
    pub fn new(config: EarthConfig) -> Self {
        let g_accel_reference = config.gm / (config.radius_reference * config.radius_reference);
        info!(
            rotation_rate = config.rotation_rate,
            gm = config.gm,
            "inertial model initialized"
        );
        Self {
            config,
            g_accel: g_accel_reference,
            g_accel_reference,
            earth_position_angle: 0.0,
        }
    }

    pub fn init_model(&mut self) {
        self.earth_position_angle = 0.0;
    }

    /// Refresh the cached gravitation value for the current radius and
    /// advance the planet rotation angle by one step.
    pub fn run(&mut self, dt: f64, radius: f64) {
        self.g_accel = self.g_accel(radius);
        self.earth_position_angle += dt * self.config.rotation_rate;
    }

    /// Inverse-square gravitational acceleration at distance `radius` from
    /// the planet center (ft/s^2).
    pub fn g_accel(&self, radius: f64) -> f64 {
        self.config.gm / (radius * radius)
    }

    /// Gravitational acceleration at the reference radius (ft/s^2).
    pub fn g_accel_reference(&self) -> f64 {
        self.g_accel_reference
    }

    /// Gravitation with the J2 oblateness correction, evaluated in and
    /// valid for the ECEF frame (Stevens and Lewis eqn. 1.4-16). Callers
    /// needing it in another frame transform the result themselves.
    pub fn gravity_j2(&self, position: &Vector3<f64>) -> Vector3<f64> {
        let r = position.norm();
        let sin_lat = position.z / r;

        let pre_common = 1.5 * self.config.j2 * (self.config.semimajor / r).powi(2);
        let xy = 1.0 - 5.0 * sin_lat * sin_lat;
        let z = 3.0 - 5.0 * sin_lat * sin_lat;
        let gm_over_r2 = self.config.gm / (r * r);

        Vector3::new(
            -gm_over_r2 * (1.0 + pre_common * xy) * position.x / r,
            -gm_over_r2 * (1.0 + pre_common * xy) * position.y / r,
            -gm_over_r2 * (1.0 + pre_common * z) * position.z / r,
        )
    }

    /// Planet angular velocity vector in the ECEF/ECI z-axis (rad/s).
    pub fn omega(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, self.config.rotation_rate)
    }

    /// Angle the planet has rotated since model initialization (rad).
    pub fn earth_position_angle(&self) -> f64 {
        self.earth_position_angle
    }

    pub fn config(&self) -> &EarthConfig {
        &self.config
    }
}

impl Default for Inertial {
    fn default() -> Self {
        Self::new(EarthConfig::default())
    }
}
