use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Orientation of the body frame relative to the local (NED) frame.
///
/// The unit quaternion is the source of truth; the Euler angles (extracted
/// in yaw-pitch-roll order), their sines/cosines and the two rotation
/// matrices are caches recomputed together on every update, so they are
/// always mutually consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    /// Rotates body-frame vectors into the local frame.
    quat: UnitQuaternion<f64>,
    euler: Vector3<f64>,
    sin_euler: Vector3<f64>,
    cos_euler: Vector3<f64>,
    local_to_body: Matrix3<f64>,
    body_to_local: Matrix3<f64>,
}

impl Attitude {
    pub fn identity() -> Self {
        Self::from_quaternion(UnitQuaternion::identity())
    }

    /// Build from Euler angles phi (roll), theta (pitch), psi (yaw), applied
    /// in yaw-pitch-roll order.
    pub fn from_euler(phi: f64, theta: f64, psi: f64) -> Self {
        Self::from_quaternion(UnitQuaternion::from_euler_angles(phi, theta, psi))
    }

    pub fn from_quaternion(quat: UnitQuaternion<f64>) -> Self {
        let body_to_local = quat.to_rotation_matrix().into_inner();
        let local_to_body = body_to_local.transpose();
        let (phi, theta, psi) = quat.euler_angles();
        let euler = Vector3::new(phi, theta, psi);
        Self {
            quat,
            euler,
            sin_euler: euler.map(f64::sin),
            cos_euler: euler.map(f64::cos),
            local_to_body,
            body_to_local,
        }
    }

    /// Build from a local-to-body direction cosine matrix.
    pub fn from_local_to_body(local_to_body: &Matrix3<f64>) -> Self {
        let rotation = Rotation3::from_matrix_unchecked(local_to_body.transpose());
        Self::from_quaternion(UnitQuaternion::from_rotation_matrix(&rotation))
    }

    pub fn quaternion(&self) -> &UnitQuaternion<f64> {
        &self.quat
    }

    /// (phi, theta, psi) in radians.
    pub fn euler(&self) -> &Vector3<f64> {
        &self.euler
    }

    pub fn phi(&self) -> f64 {
        self.euler.x
    }

    pub fn theta(&self) -> f64 {
        self.euler.y
    }

    pub fn psi(&self) -> f64 {
        self.euler.z
    }

    pub fn sin_euler(&self) -> &Vector3<f64> {
        &self.sin_euler
    }

    pub fn cos_euler(&self) -> &Vector3<f64> {
        &self.cos_euler
    }

    pub fn local_to_body(&self) -> &Matrix3<f64> {
        &self.local_to_body
    }

    pub fn body_to_local(&self) -> &Matrix3<f64> {
        &self.body_to_local
    }
}

impl Default for Attitude {
    fn default() -> Self {
        Self::identity()
    }
}

/// Quaternion kinematic equation: the time derivative of an orientation
/// quaternion given the body-frame angular rate it rotates with.
///
/// For a quaternion rotating body-frame vectors into some reference frame,
/// `qdot = 0.5 * q * (0, omega)` with omega the angular velocity of the
/// body relative to that reference frame, expressed in body axes.
pub fn quaternion_derivative(q: &Quaternion<f64>, omega: &Vector3<f64>) -> Quaternion<f64> {
    q * Quaternion::from_imag(*omega) * 0.5
}
