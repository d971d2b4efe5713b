use nalgebra::{Quaternion, Vector3};
use std::f64::consts::PI;

/// Convert degrees to radians
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Convert radians to degrees
#[inline]
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// True when every component of the vector is finite.
#[inline]
pub fn vector_is_finite(v: &Vector3<f64>) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// True when every component of the quaternion is finite.
#[inline]
pub fn quaternion_is_finite(q: &Quaternion<f64>) -> bool {
    q.coords.iter().all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn degree_radian_round_trip() {
        assert_relative_eq!(deg_to_rad(180.0), PI);
        assert_relative_eq!(rad_to_deg(deg_to_rad(37.5)), 37.5, epsilon = 1e-12);
    }

    #[test]
    fn finiteness_checks() {
        assert!(vector_is_finite(&Vector3::new(1.0, -2.0, 3.0)));
        assert!(!vector_is_finite(&Vector3::new(1.0, f64::NAN, 3.0)));
        assert!(!quaternion_is_finite(&Quaternion::new(
            f64::INFINITY,
            0.0,
            0.0,
            0.0
        )));
    }
}
