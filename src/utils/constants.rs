//! Unit conversions and shared physical constants.
//!
//! All simulation state is carried in English units: feet, slugs, pounds,
//! radians and seconds. Structural-frame coordinates are in inches.

/// Structural inches to body-frame feet.
pub const INCH_TO_FT: f64 = 1.0 / 12.0;

/// Feet to meters.
pub const FT_TO_M: f64 = 0.3048;

/// Meters to feet.
pub const M_TO_FT: f64 = 1.0 / FT_TO_M;

/// Slugs to pounds (standard gravity in ft/s^2).
pub const SLUG_TO_LB: f64 = 32.174049;

/// Pounds to slugs.
pub const LB_TO_SLUG: f64 = 1.0 / SLUG_TO_LB;

/// Depth of the derivative history kept for the multistep integrators.
pub const HISTORY_DEPTH: usize = 4;
