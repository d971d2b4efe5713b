//! kestrel: a six degree of freedom flight dynamics simulation engine.
//!
//! The crate propagates the equations of motion of a rigid vehicle over a
//! rotating oblate planet. Force and moment models plug in as
//! collaborators; the core provides the state propagation, the frame
//! machinery, mass/inertia aggregation, gravitation, the expression engine
//! the force models build their coefficients from, and a state-space
//! linearization interface for trim and analysis tools.

pub mod components;
pub mod expressions;
pub mod resources;
pub mod simulation;
pub mod systems;
pub mod utils;

pub use components::{
    Attitude, Force, ForceSystem, LagrangeMultiplier, Location, Moment, PointMass,
    PointMassShape, ReferenceFrame, StateHistory, VehicleState,
};
pub use expressions::{Expr, Function, FunctionDef, Parameter, Property, PropertyBus, Table};
pub use resources::{
    ConfigError, EarthConfig, GravityModel, InitialCondition, Integrator, IntegratorConfig,
    MassConfig, PhysicsConfig, PointMassConfig, ShapeConfig,
};
pub use simulation::{ForceMomentProducer, GroundReactions, Simulation};
pub use systems::{
    Channel, Frame, Inertial, Linearization, MassBalance, MassProperties, PhysicsError,
    Propagator, StateSpace, StateVariable,
};
pub use utils::{RngManager, SimError};
