use approx::assert_relative_eq;
use nalgebra::Vector3;

use kestrel::{
    Channel, EarthConfig, Force, ForceMomentProducer, ForceSystem, InitialCondition, Integrator,
    IntegratorConfig, MassConfig, PhysicsConfig, PropertyBus, ReferenceFrame, Simulation,
    StateSpace, StateVariable, VehicleState,
};

fn still_earth() -> EarthConfig {
    EarthConfig {
        rotation_rate: 0.0,
        ..EarthConfig::wgs84()
    }
}

fn twin_mass_config() -> MassConfig {
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

fn simulation_with(physics: PhysicsConfig, earth: EarthConfig, ic: &InitialCondition) -> Simulation {
    let mut sim = Simulation::new(physics, earth);
    sim.load_mass_config(&twin_mass_config()).unwrap();
    sim.init_model(ic).unwrap();
    sim
}

struct ThrustFromBus;

impl ForceMomentProducer for ThrustFromBus {
    fn compute(&mut self, _state: &VehicleState, bus: &mut PropertyBus, forces: &mut ForceSystem) {
        let thrust = bus.get("fcs/thrust-lbs").unwrap_or(0.0);
        forces.add_force(Force {
            vector: Vector3::new(thrust, 0.0, 0.0),
            point: None,
            frame: ReferenceFrame::Body,
        });
    }
}

#[test]
fn free_fall_velocity_is_exact_for_every_rate_integrator() {
    // A constant derivative integrates exactly under every scheme once the
    // history is primed. The histories start zeroed, which leaves each
    // multistep scheme a fixed half-sample startup offset.
    let schemes = [
        (Integrator::RectEuler, 0.0),
        (Integrator::Trapezoidal, -0.5),
        (Integrator::AdamsBashforth2, 0.5),
        (Integrator::AdamsBashforth3, 0.5),
        (Integrator::AdamsBashforth4, 0.5),
    ];

    for (scheme, startup_offset) in schemes {
        let physics = PhysicsConfig {
            integrator: IntegratorConfig {
                translational_rate: scheme,
                ..IntegratorConfig::default()
            },
            ..PhysicsConfig::default()
        };
        let dt = physics.time_step;
        let ic = InitialCondition {
            altitude_asl: 20000.0,
            ..InitialCondition::default()
        };
        let mut sim = simulation_with(physics, still_earth(), &ic);
        let g = sim.inertial().g_accel(sim.propagator().radius());

        let steps = 240;
        for _ in 0..steps {
            sim.run().unwrap();
        }

        // Gravity varies by ~1e-5 relative over the fall; allow for it.
        assert_relative_eq!(
            sim.propagator().vel_ned().z,
            g * (steps as f64 + startup_offset) * dt,
            max_relative = 1e-4
        );
    }
}

#[test]
fn frozen_translational_axis_holds_velocity_while_attitude_integrates() {
    let physics = PhysicsConfig {
        integrator: IntegratorConfig {
            translational_rate: Integrator::None,
            ..IntegratorConfig::default()
        },
        ..PhysicsConfig::default()
    };
    let ic = InitialCondition {
        altitude_asl: 20000.0,
        uvw: Vector3::new(150.0, 0.0, 0.0),
        pqr: Vector3::new(0.2, 0.0, 0.0),
        ..InitialCondition::default()
    };
    let mut sim = simulation_with(physics, still_earth(), &ic);

    for _ in 0..120 {
        sim.run().unwrap();
    }

    // Velocity frozen despite gravity; roll keeps integrating.
    assert_relative_eq!(*sim.propagator().uvw(), Vector3::new(150.0, 0.0, 0.0));
    assert_relative_eq!(sim.propagator().euler().x, 0.2, max_relative = 0.01);
    // The frozen axis still recorded fresh derivative samples.
    assert!(sim
        .propagator()
        .state()
        .history
        .uvw_dot
        .iter()
        .any(|v| v.norm() > 1.0));
}

#[test]
fn quaternion_magnitude_holds_through_tumbling_flight() {
    let ic = InitialCondition {
        altitude_asl: 30000.0,
        uvw: Vector3::new(300.0, 0.0, 0.0),
        pqr: Vector3::new(0.5, -0.4, 0.3),
        ..InitialCondition::default()
    };
    let mut sim = simulation_with(PhysicsConfig::default(), EarthConfig::wgs84(), &ic);

    for _ in 0..500 {
        sim.run().unwrap();
        let norm = sim.propagator().state().attitude_eci.norm();
        assert!((norm - 1.0).abs() < 1e-9, "quaternion norm drifted: {}", norm);
    }
}

#[test]
fn linearization_recovers_gravity_pitch_derivative() {
    // At a level, motionless operating point on a non-rotating planet the
    // only u-axis force is gravity, so d(udot)/d(theta) = -g.
    let ic = InitialCondition {
        altitude_asl: 10000.0,
        ..InitialCondition::default()
    };
    let mut sim = simulation_with(PhysicsConfig::default(), still_earth(), &ic);
    let g = sim.inertial().g_accel(sim.propagator().radius());

    let state_space = StateSpace::new(
        vec![Channel::State(StateVariable::Theta)],
        vec![],
        vec![Channel::State(StateVariable::UDot)],
    );
    let linearization = state_space.linearize(&mut sim).unwrap();

    assert_relative_eq!(linearization.c[(0, 0)], -g, max_relative = 1e-4);

    // The baseline was restored.
    assert_relative_eq!(sim.propagator().euler().y, 0.0, epsilon = 1e-9);
    assert_relative_eq!(sim.propagator().uvw().norm(), 0.0, epsilon = 1e-9);
}

#[test]
fn linearization_recovers_thrust_control_derivative() {
    let ic = InitialCondition {
        altitude_asl: 10000.0,
        ..InitialCondition::default()
    };
    let mut sim = simulation_with(PhysicsConfig::default(), still_earth(), &ic);
    sim.add_producer(Box::new(ThrustFromBus));
    sim.set_property("fcs/thrust-lbs", 0.0);
    let mass = sim.mass_balance().mass();

    let state_space = StateSpace::new(
        vec![Channel::State(StateVariable::U)],
        vec![Channel::Property("fcs/thrust-lbs".into())],
        vec![Channel::State(StateVariable::UDot)],
    );
    let linearization = state_space.linearize(&mut sim).unwrap();

    // d(udot)/d(thrust) = 1/m; u itself does not feed back at this point.
    assert_relative_eq!(linearization.d[(0, 0)], 1.0 / mass, max_relative = 1e-6);
    assert_relative_eq!(linearization.a[(0, 0)], 0.0, epsilon = 1e-6);
    assert_relative_eq!(linearization.b[(0, 0)], 1.0 / mass, max_relative = 1e-6);

    assert_relative_eq!(sim.property("fcs/thrust-lbs").unwrap(), 0.0);
}

#[test]
fn mixed_integrator_orders_coexist() {
    // Different orders on each axis is a supported configuration; the
    // simulation must stay finite and sane.
    let physics = PhysicsConfig {
        integrator: IntegratorConfig {
            rotational_rate: Integrator::AdamsBashforth4,
            translational_rate: Integrator::RectEuler,
            rotational_position: Integrator::AdamsBashforth3,
            translational_position: Integrator::Trapezoidal,
        },
        ..PhysicsConfig::default()
    };
    let ic = InitialCondition {
        altitude_asl: 15000.0,
        uvw: Vector3::new(200.0, 0.0, 10.0),
        pqr: Vector3::new(0.05, 0.02, -0.01),
        euler: Vector3::new(0.0, 0.05, 1.0),
        ..InitialCondition::default()
    };
    let mut sim = simulation_with(physics, EarthConfig::wgs84(), &ic);

    for _ in 0..600 {
        sim.run().unwrap();
        let state = sim.propagator().state();
        assert!(state.uvw.iter().all(|v| v.is_finite()));
        assert!(state.pqr.iter().all(|v| v.is_finite()));
    }
    assert!(sim.propagator().altitude_asl() < 15000.0);
}

#[test]
fn gravity_at_reference_radius_matches_standard_value() {
    let sim = Simulation::new(PhysicsConfig::default(), EarthConfig::wgs84());
    let g = sim.inertial().g_accel(20925650.00);
    assert_relative_eq!(g, 32.17, max_relative = 0.01);
}
