use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Position of the vehicle as a geocentric (ECEF) vector, with every
/// derived quantity kept consistent with it: longitude, geocentric
/// latitude, radius, geodetic latitude/altitude, and the ECEF<->local (NED)
/// rotation matrices. All derived values are recomputed together whenever
/// the ECEF vector changes so no pair can drift out of sync.
///
/// Units are feet and radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    ecef: Vector3<f64>,
    semimajor: f64,
    semiminor: f64,
    longitude: f64,
    latitude: f64,
    radius: f64,
    geodetic_latitude: f64,
    geodetic_altitude: f64,
    tec2l: Matrix3<f64>,
    tl2ec: Matrix3<f64>,
}

impl Location {
    /// Build from longitude, geocentric latitude (rad) and radius (ft).
    /// `semimajor`/`semiminor` are the ellipsoid axes used for geodetic
    /// conversions.
    pub fn new(
        longitude: f64,
        latitude: f64,
        radius: f64,
        semimajor: f64,
        semiminor: f64,
    ) -> Self {
        let cos_lat = latitude.cos();
        let ecef = Vector3::new(
            radius * cos_lat * longitude.cos(),
            radius * cos_lat * longitude.sin(),
            radius * latitude.sin(),
        );
        Self::from_ecef(ecef, semimajor, semiminor)
    }

    pub fn from_ecef(ecef: Vector3<f64>, semimajor: f64, semiminor: f64) -> Self {
        let mut location = Self {
            ecef,
            semimajor,
            semiminor,
            longitude: 0.0,
            latitude: 0.0,
            radius: 0.0,
            geodetic_latitude: 0.0,
            geodetic_altitude: 0.0,
            tec2l: Matrix3::identity(),
            tl2ec: Matrix3::identity(),
        };
        location.compute_derived();
        location
    }

    pub fn ecef(&self) -> &Vector3<f64> {
        &self.ecef
    }

    pub fn set_ecef(&mut self, ecef: Vector3<f64>) {
        self.ecef = ecef;
        self.compute_derived();
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Geocentric latitude (rad).
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Distance from the planet center (ft). A degenerate zero radius is
    /// reported as 1.0 ft so dependent calculations never divide by zero.
    pub fn radius(&self) -> f64 {
        if self.radius == 0.0 {
            1.0
        } else {
            self.radius
        }
    }

    pub fn geodetic_latitude(&self) -> f64 {
        self.geodetic_latitude
    }

    /// Height above the reference ellipsoid (ft).
    pub fn geodetic_altitude(&self) -> f64 {
        self.geodetic_altitude
    }

    pub fn set_longitude(&mut self, longitude: f64) {
        let (latitude, radius) = (self.latitude, self.radius);
        *self = Self::new(longitude, latitude, radius, self.semimajor, self.semiminor);
    }

    pub fn set_latitude(&mut self, latitude: f64) {
        let (longitude, radius) = (self.longitude, self.radius);
        *self = Self::new(longitude, latitude, radius, self.semimajor, self.semiminor);
    }

    pub fn set_radius(&mut self, radius: f64) {
        let (longitude, latitude) = (self.longitude, self.latitude);
        *self = Self::new(longitude, latitude, radius, self.semimajor, self.semiminor);
    }

    /// ECEF to local (NED) rotation matrix at this location.
    pub fn tec2l(&self) -> &Matrix3<f64> {
        &self.tec2l
    }

    /// Local (NED) to ECEF rotation matrix at this location.
    pub fn tl2ec(&self) -> &Matrix3<f64> {
        &self.tl2ec
    }

    fn compute_derived(&mut self) {
        self.radius = self.ecef.norm();
        if self.radius == 0.0 {
            self.longitude = 0.0;
            self.latitude = 0.0;
        } else {
            self.longitude = self.ecef.y.atan2(self.ecef.x);
            self.latitude = self
                .ecef
                .z
                .atan2((self.ecef.x * self.ecef.x + self.ecef.y * self.ecef.y).sqrt());
        }

        let (sin_lat, cos_lat) = self.latitude.sin_cos();
        let (sin_lon, cos_lon) = self.longitude.sin_cos();
        self.tec2l = Matrix3::new(
            -sin_lat * cos_lon,
            -sin_lat * sin_lon,
            cos_lat,
            -sin_lon,
            cos_lon,
            0.0,
            -cos_lat * cos_lon,
            -cos_lat * sin_lon,
            -sin_lat,
        );
        self.tl2ec = self.tec2l.transpose();

        self.compute_geodetic();
    }

    /// Heikkinen's closed-form ECEF to geodetic conversion.
    fn compute_geodetic(&mut self) {
        let a = self.semimajor;
        let b = self.semiminor;
        let x = self.ecef.x;
        let y = self.ecef.y;
        let z = self.ecef.z;

        let a2 = a * a;
        let b2 = b * b;
        let e2 = (a2 - b2) / a2;
        let ep2 = (a2 - b2) / b2;

        let p = (x * x + y * y).sqrt();
        if p < 1e-6 {
            // On (or extremely near) the polar axis.
            self.geodetic_latitude = if z >= 0.0 {
                std::f64::consts::FRAC_PI_2
            } else {
                -std::f64::consts::FRAC_PI_2
            };
            self.geodetic_altitude = z.abs() - b;
            return;
        }

        let f = 54.0 * b2 * z * z;
        let g = p * p + (1.0 - e2) * z * z - e2 * (a2 - b2);
        let c = e2 * e2 * f * p * p / (g * g * g);
        let s = (1.0 + c + (c * c + 2.0 * c).sqrt()).cbrt();
        let k = s + 1.0 + 1.0 / s;
        let pp = f / (3.0 * k * k * g * g);
        let q = (1.0 + 2.0 * e2 * e2 * pp).sqrt();
        let r0 = -(pp * e2 * p) / (1.0 + q)
            + (0.5 * a2 * (1.0 + 1.0 / q)
                - pp * (1.0 - e2) * z * z / (q * (1.0 + q))
                - 0.5 * pp * p * p)
                .max(0.0)
                .sqrt();
        let u = ((p - e2 * r0) * (p - e2 * r0) + z * z).sqrt();
        let v = ((p - e2 * r0) * (p - e2 * r0) + (1.0 - e2) * z * z).sqrt();
        let z0 = b2 * z / (a * v);

        self.geodetic_altitude = u * (1.0 - b2 / (a * v));
        self.geodetic_latitude = ((z + ep2 * z0) / p).atan();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    const A: f64 = 20925646.3255;
    const B: f64 = 20855486.5951;

    #[test]
    fn lat_lon_radius_round_trip() {
        let location = Location::new(-1.2, 0.65, 20925650.0, A, B);
        assert_relative_eq!(location.longitude(), -1.2, epsilon = 1e-12);
        assert_relative_eq!(location.latitude(), 0.65, epsilon = 1e-12);
        assert_relative_eq!(location.radius(), 20925650.0, epsilon = 1e-3);
    }

    #[test]
    fn zero_radius_guard() {
        let location = Location::from_ecef(Vector3::zeros(), A, B);
        assert_relative_eq!(location.radius(), 1.0);
    }

    #[test]
    fn ned_matrix_is_orthonormal_and_paired() {
        let location = Location::new(0.4, -0.9, 20925650.0, A, B);
        let product = location.tec2l() * location.tl2ec();
        assert_relative_eq!(product, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn down_axis_points_to_planet_center_on_sphere() {
        // At geocentric latitude 0, longitude 0 the local down axis is -X.
        let location = Location::new(0.0, 0.0, 20925650.0, A, B);
        let down_ecef = location.tl2ec() * Vector3::new(0.0, 0.0, 1.0);
        assert_relative_eq!(down_ecef, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn geodetic_matches_geocentric_at_equator() {
        let location = Location::new(0.3, 0.0, A + 1000.0, A, B);
        assert_relative_eq!(location.geodetic_latitude(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(location.geodetic_altitude(), 1000.0, epsilon = 1e-3);
    }

    #[test]
    fn geodetic_at_pole() {
        let location = Location::new(0.0, FRAC_PI_2, B + 500.0, A, B);
        assert_relative_eq!(location.geodetic_latitude(), FRAC_PI_2, epsilon = 1e-9);
        assert_relative_eq!(location.geodetic_altitude(), 500.0, epsilon = 1e-3);
    }

    #[test]
    fn geodetic_latitude_exceeds_geocentric_at_mid_latitudes() {
        let location = Location::new(0.0, PI / 4.0, 20906000.0, A, B);
        assert!(location.geodetic_latitude() > location.latitude());
        // The flattening correction is small.
        assert!((location.geodetic_latitude() - location.latitude()).abs() < 0.01);
    }

    #[test]
    fn setters_keep_derived_consistent() {
        let mut location = Location::new(0.0, 0.0, 20925650.0, A, B);
        location.set_latitude(0.5);
        assert_relative_eq!(location.latitude(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(location.radius(), 20925650.0, epsilon = 1e-3);

        location.set_radius(21000000.0);
        assert_relative_eq!(location.radius(), 21000000.0, epsilon = 1e-3);
        assert_relative_eq!(location.latitude(), 0.5, epsilon = 1e-12);
    }
}
