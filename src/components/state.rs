use nalgebra::{Quaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::attitude::Attitude;
use super::location::Location;
use crate::utils::constants::HISTORY_DEPTH;

/// Recent derivative samples for the multistep integrators, newest first.
/// Each queue is kept at exactly [`HISTORY_DEPTH`] entries: a new sample is
/// pushed at the front and the oldest dropped, every step, regardless of
/// which integration scheme is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    pub pqr_dot: VecDeque<Vector3<f64>>,
    pub uvw_dot: VecDeque<Vector3<f64>>,
    pub inertial_velocity: VecDeque<Vector3<f64>>,
    pub quat_dot: VecDeque<Quaternion<f64>>,
}

impl StateHistory {
    pub fn zeroed() -> Self {
        let zero_vec = || {
            let mut queue = VecDeque::with_capacity(HISTORY_DEPTH);
            queue.resize(HISTORY_DEPTH, Vector3::zeros());
            queue
        };
        let mut quat_dot = VecDeque::with_capacity(HISTORY_DEPTH);
        quat_dot.resize(HISTORY_DEPTH, Quaternion::new(0.0, 0.0, 0.0, 0.0));
        Self {
            pqr_dot: zero_vec(),
            uvw_dot: zero_vec(),
            inertial_velocity: zero_vec(),
            quat_dot,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::zeroed();
    }
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// The complete propagated state of the vehicle.
///
/// Owned exclusively by the propagator: it is created by `init_model`,
/// mutated only by the integration step (or the explicit state-injection
/// path, which recomputes every dependent quantity), and exposed read-only
/// to every other collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Vehicle position in the ECEF frame (ft).
    pub location: Location,
    /// Velocity relative to the ECEF frame, expressed in body axes (ft/s).
    pub uvw: Vector3<f64>,
    /// Angular velocity relative to the ECEF frame, body axes (rad/s).
    pub pqr: Vector3<f64>,
    /// Angular velocity relative to the ECI frame, body axes (rad/s).
    pub pqr_i: Vector3<f64>,
    /// Orientation of the body frame relative to the local (NED) frame.
    pub attitude_local: Attitude,
    /// Orientation of the body frame relative to the ECI frame. Kept as a
    /// raw quaternion because it is integrated additively and renormalized
    /// after each step.
    pub attitude_eci: Quaternion<f64>,
    /// Velocity in the ECI frame (ft/s).
    pub inertial_velocity: Vector3<f64>,
    /// Position in the ECI frame (ft).
    pub inertial_position: Vector3<f64>,
    pub history: StateHistory,
}

impl VehicleState {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            uvw: Vector3::zeros(),
            pqr: Vector3::zeros(),
            pqr_i: Vector3::zeros(),
            attitude_local: Attitude::identity(),
            attitude_eci: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            inertial_velocity: Vector3::zeros(),
            inertial_position: Vector3::zeros(),
            history: StateHistory::zeroed(),
        }
    }
}
