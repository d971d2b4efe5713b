use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::utils::constants::LB_TO_SLUG;

/// Geometric form of a point mass, used to derive its own moment of
/// inertia about its centroid. A cylinder is solid, a tube is hollow, a
/// ball is solid and a sphere is hollow. The long axis of tubes and
/// cylinders lies along structural X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointMassShape {
    Unspecified,
    Tube,
    Cylinder,
    Sphere,
    Ball,
}

/// A discrete mass item: crew, payload, ballast. Geometry is fixed at load
/// time; the weight may be changed at runtime, which re-derives the shape
/// inertia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMass {
    name: String,
    /// Weight (lbs).
    weight: f64,
    /// Location in the structural frame (in).
    location: Vector3<f64>,
    shape: PointMassShape,
    /// Radius (ft).
    radius: f64,
    /// Length (ft).
    length: f64,
    /// Inertia about the item's own centroid, body axes (slug-ft^2).
    shape_inertia: Matrix3<f64>,
}

impl PointMass {
    pub fn new(name: impl Into<String>, weight: f64, location: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            weight,
            location,
            shape: PointMassShape::Unspecified,
            radius: 0.0,
            length: 0.0,
            shape_inertia: Matrix3::zeros(),
        }
    }

    pub fn with_shape(
        name: impl Into<String>,
        weight: f64,
        location: Vector3<f64>,
        shape: PointMassShape,
        radius: f64,
        length: f64,
    ) -> Self {
        let mut pm = Self::new(name, weight, location);
        pm.shape = shape;
        pm.radius = radius;
        pm.length = length;
        pm.calculate_shape_inertia();
        pm
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
        self.calculate_shape_inertia();
    }

    pub fn location(&self) -> &Vector3<f64> {
        &self.location
    }

    pub fn shape(&self) -> PointMassShape {
        self.shape
    }

    pub fn shape_inertia(&self) -> &Matrix3<f64> {
        &self.shape_inertia
    }

    fn calculate_shape_inertia(&mut self) {
        let mass = self.weight * LB_TO_SLUG;
        let r2 = self.radius * self.radius;
        let l2 = self.length * self.length;
        let (ixx, iyy) = match self.shape {
            PointMassShape::Unspecified => (0.0, 0.0),
            // Thin-walled tube about its long axis: m r^2.
            PointMassShape::Tube => (mass * r2, mass / 12.0 * (6.0 * r2 + l2)),
            // Solid cylinder: m r^2 / 2.
            PointMassShape::Cylinder => (mass * r2 / 2.0, mass / 12.0 * (3.0 * r2 + l2)),
            // Hollow sphere: 2 m r^2 / 3.
            PointMassShape::Sphere => (2.0 * mass * r2 / 3.0, 2.0 * mass * r2 / 3.0),
            // Solid ball: 2 m r^2 / 5.
            PointMassShape::Ball => (2.0 * mass * r2 / 5.0, 2.0 * mass * r2 / 5.0),
        };
        self.shape_inertia = Matrix3::from_diagonal(&Vector3::new(ixx, iyy, iyy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::utils::constants::SLUG_TO_LB;

    #[test]
    fn unshaped_point_mass_has_no_self_inertia() {
        let pm = PointMass::new("ballast", 100.0, Vector3::new(120.0, 0.0, 0.0));
        assert_eq!(*pm.shape_inertia(), Matrix3::zeros());
    }

    #[test]
    fn cylinder_inertia_closed_form() {
        // One slug exactly, r = 2 ft, l = 6 ft.
        let pm = PointMass::with_shape(
            "tank",
            SLUG_TO_LB,
            Vector3::zeros(),
            PointMassShape::Cylinder,
            2.0,
            6.0,
        );
        let j = pm.shape_inertia();
        assert_relative_eq!(j[(0, 0)], 2.0, epsilon = 1e-12); // m r^2 / 2
        assert_relative_eq!(j[(1, 1)], (3.0 * 4.0 + 36.0) / 12.0, epsilon = 1e-12);
        assert_relative_eq!(j[(2, 2)], j[(1, 1)], epsilon = 1e-12);
    }

    #[test]
    fn sphere_and_ball_inertia_are_distinct() {
        let sphere = PointMass::with_shape(
            "shell",
            SLUG_TO_LB,
            Vector3::zeros(),
            PointMassShape::Sphere,
            3.0,
            0.0,
        );
        let ball = PointMass::with_shape(
            "ball",
            SLUG_TO_LB,
            Vector3::zeros(),
            PointMassShape::Ball,
            3.0,
            0.0,
        );
        assert_relative_eq!(sphere.shape_inertia()[(0, 0)], 2.0 * 9.0 / 3.0);
        assert_relative_eq!(ball.shape_inertia()[(0, 0)], 2.0 * 9.0 / 5.0);
        assert!(sphere.shape_inertia()[(0, 0)] > ball.shape_inertia()[(0, 0)]);
    }

    #[test]
    fn set_weight_rescales_shape_inertia() {
        let mut pm = PointMass::with_shape(
            "tank",
            SLUG_TO_LB,
            Vector3::zeros(),
            PointMassShape::Ball,
            1.0,
            0.0,
        );
        let before = pm.shape_inertia()[(0, 0)];
        pm.set_weight(2.0 * SLUG_TO_LB);
        assert_relative_eq!(pm.shape_inertia()[(0, 0)], 2.0 * before);
    }
}
