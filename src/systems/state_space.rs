//! State-space linearization of the complete simulation.
//!
//! A downstream trim or analysis tool selects state, input and output
//! channels; `linearize` numerically differentiates the full simulation
//! around its current operating point into the (A, B, C, D) matrices of
//! `xdot = Ax + Bu`, `y = Cx + Du`.

use nalgebra::DMatrix;
use tracing::warn;

use crate::components::VehicleState;
use crate::simulation::Simulation;
use crate::utils::SimError;

/// Default perturbation step for the numerical Jacobians.
pub const DEFAULT_PERTURBATION: f64 = 1e-5;

/// Named components of the propagated state, readable (and where
/// physically meaningful, settable) for linearization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateVariable {
    /// Body-frame velocities (ft/s).
    U,
    V,
    W,
    /// Body-frame angular rates (rad/s).
    P,
    Q,
    R,
    /// Euler angles (rad).
    Phi,
    Theta,
    Psi,
    /// Position.
    Latitude,
    Longitude,
    AltitudeAsl,
    /// Local-frame velocity components (ft/s); derived, read-only.
    VNorth,
    VEast,
    VDown,
    /// Rate of climb (ft/s); derived, read-only.
    Hdot,
    /// Body-axis accelerations (ft/s^2, rad/s^2); derived, read-only.
    UDot,
    VDot,
    WDot,
    PDot,
    QDot,
    RDot,
}

impl StateVariable {
    pub fn name(&self) -> &'static str {
        use StateVariable::*;
        match self {
            U => "velocities/u-fps",
            V => "velocities/v-fps",
            W => "velocities/w-fps",
            P => "velocities/p-rad_sec",
            Q => "velocities/q-rad_sec",
            R => "velocities/r-rad_sec",
            Phi => "attitude/phi-rad",
            Theta => "attitude/theta-rad",
            Psi => "attitude/psi-rad",
            Latitude => "position/lat-gc-rad",
            Longitude => "position/long-gc-rad",
            AltitudeAsl => "position/h-sl-ft",
            VNorth => "velocities/v-north-fps",
            VEast => "velocities/v-east-fps",
            VDown => "velocities/v-down-fps",
            Hdot => "velocities/h-dot-fps",
            UDot => "accelerations/udot-ft_sec2",
            VDot => "accelerations/vdot-ft_sec2",
            WDot => "accelerations/wdot-ft_sec2",
            PDot => "accelerations/pdot-rad_sec2",
            QDot => "accelerations/qdot-rad_sec2",
            RDot => "accelerations/rdot-rad_sec2",
        }
    }

    pub fn get(&self, sim: &Simulation) -> f64 {
        use StateVariable::*;
        let propagator = sim.propagator();
        match self {
            U => propagator.uvw().x,
            V => propagator.uvw().y,
            W => propagator.uvw().z,
            P => propagator.pqr().x,
            Q => propagator.pqr().y,
            R => propagator.pqr().z,
            Phi => propagator.euler().x,
            Theta => propagator.euler().y,
            Psi => propagator.euler().z,
            Latitude => propagator.latitude(),
            Longitude => propagator.longitude(),
            AltitudeAsl => propagator.altitude_asl(),
            VNorth => propagator.vel_ned().x,
            VEast => propagator.vel_ned().y,
            VDown => propagator.vel_ned().z,
            Hdot => propagator.hdot(),
            UDot => propagator.uvw_dot().x,
            VDot => propagator.uvw_dot().y,
            WDot => propagator.uvw_dot().z,
            PDot => propagator.pqr_dot().x,
            QDot => propagator.pqr_dot().y,
            RDot => propagator.pqr_dot().z,
        }
    }

    pub fn settable(&self) -> bool {
        use StateVariable::*;
        !matches!(
            self,
            VNorth | VEast | VDown | Hdot | UDot | VDot | WDot | PDot | QDot | RDot
        )
    }

    pub fn set(&self, sim: &mut Simulation, value: f64) {
        use StateVariable::*;
        let propagator = sim.propagator_mut();
        match self {
            U | V | W => {
                let mut uvw = *propagator.uvw();
                match self {
                    U => uvw.x = value,
                    V => uvw.y = value,
                    _ => uvw.z = value,
                }
                propagator.set_uvw(uvw);
            }
            P | Q | R => {
                let mut pqr = *propagator.pqr();
                match self {
                    P => pqr.x = value,
                    Q => pqr.y = value,
                    _ => pqr.z = value,
                }
                propagator.set_pqr(pqr);
            }
            Phi | Theta | Psi => {
                let euler = *propagator.euler();
                let (mut phi, mut theta, mut psi) = (euler.x, euler.y, euler.z);
                match self {
                    Phi => phi = value,
                    Theta => theta = value,
                    _ => psi = value,
                }
                propagator.set_attitude(phi, theta, psi);
            }
            Latitude => propagator.set_latitude(value),
            Longitude => propagator.set_longitude(value),
            AltitudeAsl => propagator.set_altitude_asl(value),
            _ => warn!(variable = self.name(), "ignoring write to derived state variable"),
        }
    }
}

/// A linearization channel: either a native state variable or a property
/// on the bus (the usual way to reach control inputs).
#[derive(Debug, Clone, PartialEq)]
pub enum Channel {
    State(StateVariable),
    Property(String),
}

impl Channel {
    pub fn name(&self) -> String {
        match self {
            Channel::State(v) => v.name().to_string(),
            Channel::Property(name) => name.clone(),
        }
    }

    pub fn get(&self, sim: &Simulation) -> f64 {
        match self {
            Channel::State(v) => v.get(sim),
            Channel::Property(name) => sim.property(name).unwrap_or(0.0),
        }
    }

    pub fn set(&self, sim: &mut Simulation, value: f64) {
        match self {
            Channel::State(v) => v.set(sim, value),
            Channel::Property(name) => sim.set_property(name, value),
        }
    }
}

/// The four matrices of the linearized system.
#[derive(Debug, Clone)]
pub struct Linearization {
    pub a: DMatrix<f64>,
    pub b: DMatrix<f64>,
    pub c: DMatrix<f64>,
    pub d: DMatrix<f64>,
}

/// Channel selection for linearization: states `x`, inputs `u`, outputs `y`.
#[derive(Debug, Clone)]
pub struct StateSpace {
    pub x: Vec<Channel>,
    pub u: Vec<Channel>,
    pub y: Vec<Channel>,
}

impl StateSpace {
    pub fn new(x: Vec<Channel>, u: Vec<Channel>, y: Vec<Channel>) -> Self {
        Self { x, u, y }
    }

    /// Linearize around the simulation's current operating point with the
    /// default perturbation step.
    pub fn linearize(&self, sim: &mut Simulation) -> Result<Linearization, SimError> {
        self.linearize_with_step(sim, DEFAULT_PERTURBATION)
    }

    /// Linearize with an explicit perturbation step `h`. Each Jacobian
    /// entry is the 4-point central difference
    /// `(8(f(x+h) - f(x-h)) - (f(x+2h) - f(x-2h))) / (12h)`,
    /// evaluated by rerunning one full simulation step with `dt = h` per
    /// probe and restoring the baseline state between probes.
    pub fn linearize_with_step(
        &self,
        sim: &mut Simulation,
        h: f64,
    ) -> Result<Linearization, SimError> {
        let baseline = Baseline::capture(sim, &self.x, &self.u);
        sim.set_dt(h);

        // The state derivative channels corresponding to x.
        let xdot: Vec<Channel> = self.x.iter().map(derivative_channel).collect();

        let a = numerical_jacobian(sim, &xdot, &self.x, &baseline, h)?;
        let b = numerical_jacobian(sim, &xdot, &self.u, &baseline, h)?;
        let c = numerical_jacobian(sim, &self.y, &self.x, &baseline, h)?;
        let d = numerical_jacobian(sim, &self.y, &self.u, &baseline, h)?;

        baseline.restore(sim, &self.x, &self.u);
        Ok(Linearization { a, b, c, d })
    }
}

/// The derivative channel paired with a state channel. The Euler angle
/// rows use the matching body rate, the usual small-angle pairing for
/// longitudinal/lateral linear models. Channels without a native
/// derivative differentiate the channel's own value after the probe step.
fn derivative_channel(channel: &Channel) -> Channel {
    use StateVariable::*;
    match channel {
        Channel::State(U) => Channel::State(UDot),
        Channel::State(V) => Channel::State(VDot),
        Channel::State(W) => Channel::State(WDot),
        Channel::State(P) => Channel::State(PDot),
        Channel::State(Q) => Channel::State(QDot),
        Channel::State(R) => Channel::State(RDot),
        Channel::State(Phi) => Channel::State(P),
        Channel::State(Theta) => Channel::State(Q),
        Channel::State(Psi) => Channel::State(R),
        Channel::State(AltitudeAsl) => Channel::State(Hdot),
        other => other.clone(),
    }
}

struct Baseline {
    state: VehicleState,
    dt: f64,
    x0: Vec<f64>,
    u0: Vec<f64>,
}

impl Baseline {
    fn capture(sim: &Simulation, x: &[Channel], u: &[Channel]) -> Self {
        Self {
            state: sim.propagator().state().clone(),
            dt: sim.dt(),
            x0: x.iter().map(|c| c.get(sim)).collect(),
            u0: u.iter().map(|c| c.get(sim)).collect(),
        }
    }

    fn restore(&self, sim: &mut Simulation, x: &[Channel], u: &[Channel]) {
        sim.propagator_mut().set_state(&self.state);
        for (channel, value) in x.iter().zip(&self.x0) {
            if settable(channel) {
                channel.set(sim, *value);
            }
        }
        for (channel, value) in u.iter().zip(&self.u0) {
            channel.set(sim, *value);
        }
        sim.set_dt(self.dt);
    }
}

fn settable(channel: &Channel) -> bool {
    match channel {
        Channel::State(v) => v.settable(),
        Channel::Property(_) => true,
    }
}

fn numerical_jacobian(
    sim: &mut Simulation,
    outputs: &[Channel],
    inputs: &[Channel],
    baseline: &Baseline,
    h: f64,
) -> Result<DMatrix<f64>, SimError> {
    let m = outputs.len();
    let n = inputs.len();
    let mut jacobian = DMatrix::zeros(m, n);

    let x0: Vec<f64> = inputs.iter().map(|c| c.get(sim)).collect();

    for j in 0..n {
        if !settable(&inputs[j]) {
            warn!(
                channel = %inputs[j].name(),
                "cannot perturb read-only channel, leaving Jacobian column zero"
            );
            continue;
        }

        let mut probe = |offset: f64| -> Result<Vec<f64>, SimError> {
            sim.propagator_mut().set_state(&baseline.state);
            inputs[j].set(sim, x0[j] + offset);
            sim.run()?;
            Ok(outputs.iter().map(|c| c.get(sim)).collect())
        };

        let f1 = probe(h)?;
        let f2 = probe(2.0 * h)?;
        let fn1 = probe(-h)?;
        let fn2 = probe(-2.0 * h)?;

        for i in 0..m {
            jacobian[(i, j)] = (8.0 * (f1[i] - fn1[i]) - (f2[i] - fn2[i])) / (12.0 * h);
        }

        sim.propagator_mut().set_state(&baseline.state);
        inputs[j].set(sim, x0[j]);
    }

    Ok(jacobian)
}
