use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Frame a force or moment vector is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceFrame {
    Body,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Force {
    pub vector: Vector3<f64>,
    /// Application point relative to the CG, body frame (ft). When present,
    /// the force also contributes a moment.
    pub point: Option<Vector3<f64>>,
    pub frame: ReferenceFrame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Moment {
    pub vector: Vector3<f64>,
    pub frame: ReferenceFrame,
}

/// Accumulates the force and moment contributions of all producers for one
/// step and resolves them into net body-frame vectors.
#[derive(Debug, Default, Clone)]
pub struct ForceSystem {
    forces: Vec<Force>,
    moments: Vec<Moment>,
    net_force: Vector3<f64>,
    net_moment: Vector3<f64>,
}

impl ForceSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.forces.clear();
        self.moments.clear();
        self.net_force = Vector3::zeros();
        self.net_moment = Vector3::zeros();
    }

    pub fn add_force(&mut self, force: Force) {
        self.forces.push(force);
    }

    pub fn add_moment(&mut self, moment: Moment) {
        self.moments.push(moment);
    }

    /// Resolve all contributions into net body-frame force and moment.
    pub fn resolve(&mut self, local_to_body: &Matrix3<f64>) -> (Vector3<f64>, Vector3<f64>) {
        self.net_force = Vector3::zeros();
        self.net_moment = Vector3::zeros();

        for force in &self.forces {
            let body_vector = match force.frame {
                ReferenceFrame::Body => force.vector,
                ReferenceFrame::Local => local_to_body * force.vector,
            };
            self.net_force += body_vector;
            if let Some(point) = force.point {
                self.net_moment += point.cross(&body_vector);
            }
        }

        for moment in &self.moments {
            self.net_moment += match moment.frame {
                ReferenceFrame::Body => moment.vector,
                ReferenceFrame::Local => local_to_body * moment.vector,
            };
        }

        (self.net_force, self.net_moment)
    }

    pub fn net_force(&self) -> &Vector3<f64> {
        &self.net_force
    }

    pub fn net_moment(&self) -> &Vector3<f64> {
        &self.net_moment
    }
}

/// One contact-constraint record exchanged with the ground-reaction
/// collaborator. The propagator resolves the multiplier values each step
/// and folds the resulting constraint forces into the accelerations; the
/// records themselves are owned by the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LagrangeMultiplier {
    /// Sensitivity of the constraint to body-frame force (per unit lambda).
    pub force_jacobian: Vector3<f64>,
    /// Sensitivity of the constraint to body-frame moment (per unit lambda).
    pub moment_jacobian: Vector3<f64>,
    pub min: f64,
    pub max: f64,
    /// Current multiplier value; kept between steps to warm-start the solver.
    pub value: f64,
}
