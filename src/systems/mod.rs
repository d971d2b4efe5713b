pub mod inertial;
pub mod mass_balance;
pub mod propagation;
pub mod state_space;

pub use inertial::Inertial;
pub use mass_balance::MassBalance;
pub use propagation::{Frame, MassProperties, PhysicsError, Propagator};
pub use state_space::{Channel, Linearization, StateSpace, StateVariable};
