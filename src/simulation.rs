//! The step driver: owns the models, the property bus and the registered
//! collaborators, and sequences them through each frame.

use tracing::{info, warn};

use crate::components::{ForceSystem, LagrangeMultiplier, VehicleState};
use crate::expressions::{Function, PropertyBus};
use crate::resources::{EarthConfig, InitialCondition, MassConfig, PhysicsConfig};
use crate::systems::propagation::{Frame, MassProperties, PhysicsError};
use crate::systems::{Inertial, MassBalance, Propagator};
use crate::utils::math::{quaternion_is_finite, vector_is_finite};
use crate::utils::SimError;

/// Supplies force and moment contributions for one step. Implementations
/// read the vehicle state and published properties, and push their
/// contributions into the force system; they must not hold state the
/// propagator owns.
pub trait ForceMomentProducer {
    fn compute(&mut self, state: &VehicleState, bus: &mut PropertyBus, forces: &mut ForceSystem);
}

/// Ground-reaction collaborator: owns the contact constraint records and
/// keeps them current with the vehicle state. The propagator resolves the
/// multiplier values in place each step.
pub trait GroundReactions {
    fn multipliers(&mut self, state: &VehicleState) -> &mut Vec<LagrangeMultiplier>;
}

/// One complete simulation instance.
///
/// Execution is single-threaded and frame-stepped: `run` performs one
/// atomic step of the whole model chain. Forces and moments are finalized
/// by the registered producers before the propagator advances the state;
/// nothing re-enters the collaborators mid-step apart from the explicit
/// pre/post function hooks.
pub struct Simulation {
    config: PhysicsConfig,
    bus: PropertyBus,
    inertial: Inertial,
    mass_balance: MassBalance,
    propagator: Propagator,
    force_system: ForceSystem,
    producers: Vec<Box<dyn ForceMomentProducer>>,
    ground_reactions: Option<Box<dyn GroundReactions>>,
    pre_functions: Vec<Function>,
    post_functions: Vec<Function>,
    dt: f64,
    sim_time: f64,
    holding: bool,
    initialized: bool,
}

impl Simulation {
    pub fn new(config: PhysicsConfig, earth: EarthConfig) -> Self {
        let propagator = Propagator::new(&config, &earth);
        let inertial = Inertial::new(earth);
        let dt = config.time_step;
        Self {
            config,
            bus: PropertyBus::new(),
            inertial,
            mass_balance: MassBalance::new(),
            propagator,
            force_system: ForceSystem::new(),
            producers: Vec::new(),
            ground_reactions: None,
            pre_functions: Vec::new(),
            post_functions: Vec::new(),
            dt,
            sim_time: 0.0,
            holding: false,
            initialized: false,
        }
    }

    /// Load the mass/balance configuration. Must succeed before `init_model`.
    pub fn load_mass_config(&mut self, config: &MassConfig) -> Result<(), SimError> {
        self.mass_balance.load(config)?;
        Ok(())
    }

    /// Initialize the vehicle state. Requires a successfully loaded mass
    /// configuration.
    pub fn init_model(&mut self, ic: &InitialCondition) -> Result<(), SimError> {
        if !self.mass_balance.is_loaded() {
            return Err(SimError::Physics(PhysicsError::InvalidParameter(
                "mass configuration must be loaded before initialization".into(),
            )));
        }
        self.inertial.init_model();
        self.propagator.init_model(ic)?;
        self.sim_time = 0.0;
        self.initialized = true;
        self.publish_state();
        info!(time_step = self.dt, "simulation initialized");
        Ok(())
    }

    /// Advance the simulation by one step.
    ///
    /// Returns `Ok(false)` without advancing anything when the simulation
    /// is holding. Numeric excursions never fail the step; they degrade to
    /// IEEE specials and are reported through the non-finite check.
    pub fn run(&mut self) -> Result<bool, SimError> {
        if !self.initialized {
            return Err(SimError::Physics(PhysicsError::NotInitialized));
        }
        if self.holding {
            return Ok(false);
        }

        // New step: invalidate function caches, then run the pre hooks.
        for function in self.pre_functions.iter().chain(&self.post_functions) {
            function.clear_cache();
        }
        for function in &self.pre_functions {
            let value = function.value();
            self.bus.set(function.name(), value);
        }

        self.mass_balance.run();
        let mass_props = MassProperties {
            mass: self.mass_balance.mass(),
            j: *self.mass_balance.j(),
            j_inv: *self.mass_balance.j_inv(),
        };

        // Producers finalize this step's forces and moments.
        self.force_system.clear();
        for producer in &mut self.producers {
            producer.compute(self.propagator.state(), &mut self.bus, &mut self.force_system);
        }
        let local_to_body = self.propagator.transform(Frame::Local, Frame::Body);
        let (force, moment) = self.force_system.resolve(&local_to_body);

        let mut no_contacts: Vec<LagrangeMultiplier> = Vec::new();
        let contacts = match &mut self.ground_reactions {
            Some(ground) => ground.multipliers(self.propagator.state()),
            None => &mut no_contacts,
        };

        self.propagator.run(
            &force,
            &moment,
            &mass_props,
            &self.inertial,
            contacts,
            self.dt,
        )?;

        // Gravity sample and planet rotation for the next frame.
        self.inertial.run(self.dt, self.propagator.radius());

        for function in &self.post_functions {
            let value = function.value();
            self.bus.set(function.name(), value);
        }

        self.publish_state();
        self.check_finite();
        self.sim_time += self.dt;
        Ok(true)
    }

    /// Freeze the simulation: subsequent `run` calls return immediately
    /// without advancing state or histories.
    pub fn hold(&mut self) {
        self.holding = true;
    }

    pub fn resume(&mut self) {
        self.holding = false;
    }

    pub fn holding(&self) -> bool {
        self.holding
    }

    pub fn add_producer(&mut self, producer: Box<dyn ForceMomentProducer>) {
        self.producers.push(producer);
    }

    pub fn set_ground_reactions(&mut self, ground: Box<dyn GroundReactions>) {
        self.ground_reactions = Some(ground);
    }

    /// Register a function evaluated before the force producers each step.
    pub fn add_pre_function(&mut self, function: Function) {
        self.pre_functions.push(function);
    }

    /// Register a function evaluated after the propagation step.
    pub fn add_post_function(&mut self, function: Function) {
        self.post_functions.push(function);
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// Mutable access to the propagator for the documented state-injection
    /// setters (trim, linearization). All other collaborators read only.
    pub fn propagator_mut(&mut self) -> &mut Propagator {
        &mut self.propagator
    }

    pub fn mass_balance(&self) -> &MassBalance {
        &self.mass_balance
    }

    pub fn mass_balance_mut(&mut self) -> &mut MassBalance {
        &mut self.mass_balance
    }

    pub fn inertial(&self) -> &Inertial {
        &self.inertial
    }

    pub fn bus(&mut self) -> &mut PropertyBus {
        &mut self.bus
    }

    pub fn property(&self, name: &str) -> Option<f64> {
        self.bus.get(name)
    }

    pub fn set_property(&mut self, name: &str, value: f64) {
        self.bus.set(name, value);
    }

    /// Publish the core state to the bus under the conventional names, for
    /// expression trees and external consumers.
    fn publish_state(&mut self) {
        let uvw = *self.propagator.uvw();
        let pqr = *self.propagator.pqr();
        let uvw_dot = *self.propagator.uvw_dot();
        let euler = *self.propagator.euler();

        self.bus.set("velocities/u-fps", uvw.x);
        self.bus.set("velocities/v-fps", uvw.y);
        self.bus.set("velocities/w-fps", uvw.z);
        self.bus.set("velocities/p-rad_sec", pqr.x);
        self.bus.set("velocities/q-rad_sec", pqr.y);
        self.bus.set("velocities/r-rad_sec", pqr.z);
        self.bus.set("velocities/h-dot-fps", self.propagator.hdot());
        self.bus.set("accelerations/udot-ft_sec2", uvw_dot.x);
        self.bus.set("accelerations/vdot-ft_sec2", uvw_dot.y);
        self.bus.set("accelerations/wdot-ft_sec2", uvw_dot.z);
        self.bus.set("attitude/phi-rad", euler.x);
        self.bus.set("attitude/theta-rad", euler.y);
        self.bus.set("attitude/psi-rad", euler.z);
        self.bus.set("position/h-sl-ft", self.propagator.altitude_asl());
        self.bus.set("position/h-agl-ft", self.propagator.distance_agl());
        self.bus.set("position/lat-gc-rad", self.propagator.latitude());
        self.bus.set("position/long-gc-rad", self.propagator.longitude());
        self.bus.set("position/epa-rad", self.inertial.earth_position_angle());
    }

    /// Surface non-finite state as a reportable condition. The step itself
    /// never fails for numeric reasons.
    fn check_finite(&self) {
        let state = self.propagator.state();
        let finite = vector_is_finite(&state.uvw)
            && vector_is_finite(&state.pqr)
            && vector_is_finite(&state.inertial_position)
            && quaternion_is_finite(&state.attitude_eci);
        if !finite {
            warn!(
                time = self.sim_time,
                "vehicle state contains non-finite values"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Force, ReferenceFrame};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn level_start(altitude: f64) -> InitialCondition {
        InitialCondition {
            altitude_asl: altitude,
            ..InitialCondition::default()
        }
    }

    fn mass_config() -> MassConfig {
        MassConfig {
            ixx: 28366.4,
            iyy: 32852.8,
            izz: 52097.3,
            ixy: 0.0,
            ixz: 1384.3,
            iyz: 0.0,
            empty_weight: 7500.0,
            cg: Vector3::new(190.0, 0.0, 36.0),
            point_masses: Vec::new(),
        }
    }

    #[test]
    fn init_requires_loaded_mass_config() {
        let mut sim = Simulation::new(PhysicsConfig::default(), EarthConfig::default());
        assert!(sim.init_model(&level_start(1000.0)).is_err());

        sim.load_mass_config(&mass_config()).unwrap();
        assert!(sim.init_model(&level_start(1000.0)).is_ok());
    }

    #[test]
    fn holding_skips_the_step_entirely() {
        let mut sim = Simulation::new(PhysicsConfig::default(), EarthConfig::default());
        sim.load_mass_config(&mass_config()).unwrap();
        sim.init_model(&level_start(5000.0)).unwrap();

        sim.hold();
        let state_before = sim.propagator().state().clone();
        let time_before = sim.sim_time();
        assert!(!sim.run().unwrap());
        assert_eq!(sim.sim_time(), time_before);
        assert_eq!(*sim.propagator().state(), state_before);

        sim.resume();
        assert!(sim.run().unwrap());
        assert!(sim.sim_time() > time_before);
    }

    #[test]
    fn pre_functions_are_cache_cleared_each_step() {
        use crate::expressions::{Expr, NaryOp};

        let mut sim = Simulation::new(PhysicsConfig::default(), EarthConfig::default());
        sim.load_mass_config(&mass_config()).unwrap();

        let tree = Expr::Nary(
            NaryOp::Product,
            vec![
                Expr::Value(2.0),
                Expr::Property(sim.bus().node("test/input")),
            ],
        );
        let function = Function::new("test/doubled", tree);
        function.set_caching(true);
        sim.add_pre_function(function);

        sim.init_model(&level_start(5000.0)).unwrap();
        sim.set_property("test/input", 3.0);
        sim.run().unwrap();
        assert_relative_eq!(sim.property("test/doubled").unwrap(), 6.0);

        sim.set_property("test/input", 5.0);
        sim.run().unwrap();
        assert_relative_eq!(sim.property("test/doubled").unwrap(), 10.0);
    }

    struct ConstantBodyForce(Vector3<f64>);

    impl ForceMomentProducer for ConstantBodyForce {
        fn compute(
            &mut self,
            _state: &VehicleState,
            _bus: &mut PropertyBus,
            forces: &mut ForceSystem,
        ) {
            forces.add_force(Force {
                vector: self.0,
                point: None,
                frame: ReferenceFrame::Body,
            });
        }
    }

    #[test]
    fn producers_feed_the_propagator() {
        // Cancel gravity exactly with a local-frame up force, so the
        // vehicle hovers on a non-rotating planet.
        let earth = EarthConfig {
            rotation_rate: 0.0,
            ..EarthConfig::wgs84()
        };
        let mut sim = Simulation::new(PhysicsConfig::default(), earth);
        sim.load_mass_config(&mass_config()).unwrap();
        sim.init_model(&level_start(10000.0)).unwrap();

        let weight = sim.mass_balance().mass()
            * sim.inertial().g_accel(sim.propagator().radius());
        struct Lift(f64);
        impl ForceMomentProducer for Lift {
            fn compute(
                &mut self,
                _state: &VehicleState,
                _bus: &mut PropertyBus,
                forces: &mut ForceSystem,
            ) {
                forces.add_force(Force {
                    vector: Vector3::new(0.0, 0.0, -self.0),
                    point: None,
                    frame: ReferenceFrame::Local,
                });
            }
        }
        sim.add_producer(Box::new(Lift(weight)));

        let altitude = sim.propagator().altitude_asl();
        for _ in 0..120 {
            sim.run().unwrap();
        }
        assert_relative_eq!(sim.propagator().altitude_asl(), altitude, epsilon = 1e-3);
        assert!(sim.propagator().uvw().norm() < 1e-6);
    }

    #[test]
    fn body_force_accelerates_vehicle() {
        let earth = EarthConfig {
            rotation_rate: 0.0,
            ..EarthConfig::wgs84()
        };
        let physics = PhysicsConfig::default();
        let dt = physics.time_step;
        let mut sim = Simulation::new(physics, earth);
        sim.load_mass_config(&mass_config()).unwrap();
        sim.init_model(&level_start(10000.0)).unwrap();

        let mass = sim.mass_balance().mass();
        // Constant forward thrust; gravity only pulls in w.
        sim.add_producer(Box::new(ConstantBodyForce(Vector3::new(
            100.0 * mass,
            0.0,
            0.0,
        ))));

        let steps = 60;
        for _ in 0..steps {
            sim.run().unwrap();
        }
        // u grows at ~100 ft/s^2 (gravity only pulls in w).
        assert_relative_eq!(
            sim.propagator().uvw().x,
            100.0 * steps as f64 * dt,
            max_relative = 0.02
        );
        assert_relative_eq!(sim.sim_time(), steps as f64 * dt, epsilon = 1e-12);
    }

    #[test]
    fn state_is_published_to_the_bus() {
        let mut sim = Simulation::new(PhysicsConfig::default(), EarthConfig::default());
        sim.load_mass_config(&mass_config()).unwrap();
        let ic = InitialCondition {
            altitude_asl: 8000.0,
            uvw: Vector3::new(200.0, 0.0, 5.0),
            ..InitialCondition::default()
        };
        sim.init_model(&ic).unwrap();

        assert_relative_eq!(sim.property("velocities/u-fps").unwrap(), 200.0);
        assert_relative_eq!(sim.property("velocities/w-fps").unwrap(), 5.0);
        assert_relative_eq!(sim.property("position/h-sl-ft").unwrap(), 8000.0, epsilon = 1e-6);

        sim.run().unwrap();
        assert!(sim.property("position/epa-rad").unwrap() > 0.0);
    }
}
