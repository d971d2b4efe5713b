mod attitude;
mod forces;
mod location;
mod mass;
mod state;

pub use attitude::{quaternion_derivative, Attitude};
pub use forces::{Force, ForceSystem, LagrangeMultiplier, Moment, ReferenceFrame};
pub use location::Location;
pub use mass::{PointMass, PointMassShape};
pub use state::{StateHistory, VehicleState};
