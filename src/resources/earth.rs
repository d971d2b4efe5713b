use serde::{Deserialize, Serialize};

/// Planetary constants used by the gravitation/inertial model and the
/// frame machinery. One instance is owned per simulation, so independent
/// simulations can model different bodies without interfering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthConfig {
    /// Planet rotation rate (rad/s).
    pub rotation_rate: f64,
    /// Gravitational parameter GM (ft^3/s^2).
    pub gm: f64,
    /// Equatorial reference radius (ft).
    pub radius_reference: f64,
    /// J2 oblateness coefficient.
    pub j2: f64,
    /// Ellipsoid semimajor axis length (ft).
    pub semimajor: f64,
    /// Ellipsoid semiminor axis length (ft).
    pub semiminor: f64,
}

impl EarthConfig {
    /// WGS84 Earth values.
    pub fn wgs84() -> Self {
        Self {
            rotation_rate: 0.00007292115,
            gm: 14.07644180e15,
            radius_reference: 20925650.00,
            j2: 1.0826266836e-03,
            semimajor: 20925646.3255,
            semiminor: 20855486.5951,
        }
    }

    /// Lunar values, for simulations around the Moon.
    pub fn moon() -> Self {
        Self {
            rotation_rate: 0.0000026617,
            gm: 1.7314079e14,
            radius_reference: 5702559.05,
            j2: 2.033542482111609e-04,
            semimajor: 5702559.05,
            semiminor: 5695439.63,
        }
    }
}

impl Default for EarthConfig {
    fn default() -> Self {
        Self::wgs84()
    }
}
