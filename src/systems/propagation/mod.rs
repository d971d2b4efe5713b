//! The equations-of-motion integrator.
//!
//! Given the net force and moment produced by the force models and the
//! current mass properties, the propagator computes body-axis angular and
//! translational accelerations (accounting for the rotating planet),
//! integrates rates and positions with the selected schemes, and rebuilds
//! the full set of frame transforms for every downstream consumer.

mod contact;
mod integrator;

pub use contact::resolve_contact_forces;
pub use integrator::integrate;

use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3};
use thiserror::Error;
use tracing::info;

use crate::components::{
    quaternion_derivative, Attitude, LagrangeMultiplier, Location, VehicleState,
};
use crate::resources::{
    EarthConfig, GravityModel, InitialCondition, IntegratorConfig, PhysicsConfig,
};
use crate::systems::inertial::Inertial;
use crate::utils::constants::FT_TO_M;
use crate::utils::math::rad_to_deg;

#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error("model stepped before initialization")]
    NotInitialized,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("physics computation error: {0}")]
    ComputationError(String),
}

/// Mass-property snapshot consumed by one propagation step.
#[derive(Debug, Clone, Copy)]
pub struct MassProperties {
    /// Total mass (slugs).
    pub mass: f64,
    /// Inertia tensor (slug-ft^2).
    pub j: Matrix3<f64>,
    /// Inverse of the inertia tensor.
    pub j_inv: Matrix3<f64>,
}

/// Reference frames the propagator maintains transforms between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Body,
    /// North-East-Down frame tangent to the ellipsoid at the vehicle.
    Local,
    Ecef,
    Eci,
}

#[derive(Debug, Clone)]
pub struct Propagator {
    state: VehicleState,

    // Per-step derivatives.
    pqr_dot: Vector3<f64>,
    uvw_dot: Vector3<f64>,
    quat_dot: Quaternion<f64>,
    grav_accel: Vector3<f64>,

    /// ECEF-frame velocity expressed in the local frame (Vnorth, Veast, Vdown).
    vel_ned: Vector3<f64>,

    // Transform matrix set. Each pair is kept as exact transposes and the
    // whole set is rebuilt together after every state change.
    t_ec2b: Matrix3<f64>,
    t_b2ec: Matrix3<f64>,
    t_l2b: Matrix3<f64>,
    t_b2l: Matrix3<f64>,
    t_l2ec: Matrix3<f64>,
    t_ec2l: Matrix3<f64>,
    t_ec2i: Matrix3<f64>,
    t_i2ec: Matrix3<f64>,
    t_i2b: Matrix3<f64>,
    t_b2i: Matrix3<f64>,
    t_i2l: Matrix3<f64>,
    t_l2i: Matrix3<f64>,

    earth: EarthConfig,
    omega_earth: Vector3<f64>,
    earth_position_angle: f64,

    sea_level_radius: f64,
    terrain_elevation: f64,
    local_terrain_radius: f64,
    vehicle_radius: f64,

    integrators: IntegratorConfig,
    gravity_model: GravityModel,
    initialized: bool,
}

impl Propagator {
    pub fn new(physics: &PhysicsConfig, earth: &EarthConfig) -> Self {
        let location = Location::new(
            0.0,
            0.0,
            earth.radius_reference,
            earth.semimajor,
            earth.semiminor,
        );
        Self {
            state: VehicleState::new(location),
            pqr_dot: Vector3::zeros(),
            uvw_dot: Vector3::zeros(),
            quat_dot: Quaternion::new(0.0, 0.0, 0.0, 0.0),
            grav_accel: Vector3::zeros(),
            vel_ned: Vector3::zeros(),
            t_ec2b: Matrix3::identity(),
            t_b2ec: Matrix3::identity(),
            t_l2b: Matrix3::identity(),
            t_b2l: Matrix3::identity(),
            t_l2ec: Matrix3::identity(),
            t_ec2l: Matrix3::identity(),
            t_ec2i: Matrix3::identity(),
            t_i2ec: Matrix3::identity(),
            t_i2b: Matrix3::identity(),
            t_b2i: Matrix3::identity(),
            t_i2l: Matrix3::identity(),
            t_l2i: Matrix3::identity(),
            earth: earth.clone(),
            omega_earth: Vector3::new(0.0, 0.0, earth.rotation_rate),
            earth_position_angle: 0.0,
            sea_level_radius: earth.radius_reference,
            terrain_elevation: 0.0,
            local_terrain_radius: earth.radius_reference,
            vehicle_radius: earth.radius_reference,
            integrators: physics.integrator,
            gravity_model: physics.gravity,
            initialized: false,
        }
    }

    /// Build the vehicle state from an initial condition. Must succeed
    /// before the first `run`.
    pub fn init_model(&mut self, ic: &InitialCondition) -> Result<(), PhysicsError> {
        if !ic.altitude_asl.is_finite() {
            return Err(PhysicsError::InvalidParameter(
                "initial altitude is not finite".into(),
            ));
        }

        self.terrain_elevation = ic.terrain_elevation;
        self.earth_position_angle = 0.0;

        let radius = self.sea_level_radius + ic.altitude_asl;
        self.state.location = Location::new(
            ic.longitude,
            ic.latitude,
            radius,
            self.earth.semimajor,
            self.earth.semiminor,
        );
        self.state.uvw = ic.uvw;
        self.state.pqr = ic.pqr;
        self.state.attitude_local = Attitude::from_euler(ic.euler.x, ic.euler.y, ic.euler.z);

        self.recompute_derived_state();
        self.initialized = true;
        info!(
            altitude_asl = ic.altitude_asl,
            latitude = ic.latitude,
            longitude = ic.longitude,
            "propagator initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Advance the state by one step of `dt` seconds.
    ///
    /// `force` and `moment` are the net body-frame vectors finalized by the
    /// force producers for this step; `contacts` are the ground-reaction
    /// constraint records (empty when airborne).
    pub fn run(
        &mut self,
        force: &Vector3<f64>,
        moment: &Vector3<f64>,
        mass_props: &MassProperties,
        inertial: &Inertial,
        contacts: &mut [LagrangeMultiplier],
        dt: f64,
    ) -> Result<(), PhysicsError> {
        if !self.initialized {
            return Err(PhysicsError::NotInitialized);
        }
        if mass_props.mass <= 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "mass must be positive, got {}",
                mass_props.mass
            )));
        }

        self.earth_position_angle = inertial.earth_position_angle();
        self.recompute_local_terrain_radius();
        self.vehicle_radius = self.radius();

        // Accelerations from the current state, then the constraint pass.
        self.calculate_pqr_dot(moment, mass_props);
        self.calculate_quat_dot();
        self.calculate_inertial_velocity();
        self.calculate_uvw_dot(force, mass_props, inertial);
        resolve_contact_forces(
            &mut self.uvw_dot,
            &mut self.pqr_dot,
            &self.state.uvw,
            &self.state.pqr,
            mass_props.mass,
            &mass_props.j_inv,
            contacts,
            dt,
        );

        // Integrate each quantity with its own scheme and history.
        integrate(
            &mut self.state.attitude_eci,
            self.quat_dot,
            &mut self.state.history.quat_dot,
            dt,
            self.integrators.rotational_position,
        );
        integrate(
            &mut self.state.pqr_i,
            self.pqr_dot,
            &mut self.state.history.pqr_dot,
            dt,
            self.integrators.rotational_rate,
        );
        integrate(
            &mut self.state.inertial_position,
            self.state.inertial_velocity,
            &mut self.state.history.inertial_velocity,
            dt,
            self.integrators.translational_position,
        );
        integrate(
            &mut self.state.uvw,
            self.uvw_dot,
            &mut self.state.history.uvw_dot,
            dt,
            self.integrators.translational_rate,
        );

        // Guard against drift accumulated by the additive quaternion update.
        self.state.attitude_eci = self.state.attitude_eci.normalize();

        // The order below matters: each transform feeds the next.
        self.update_inertial_matrices();
        let ecef = self.t_i2ec * self.state.inertial_position;
        self.state.location.set_ecef(ecef);
        self.update_location_matrices();
        self.update_body_matrices();

        self.state.pqr = self.state.pqr_i - self.t_i2b * self.omega_earth;
        self.state.attitude_local = Attitude::from_local_to_body(&self.t_l2b);
        self.vel_ned = self.t_b2l * self.state.uvw;

        self.recompute_local_terrain_radius();
        self.vehicle_radius = self.radius();
        Ok(())
    }

    /// Body-axis angular acceleration from the applied moment, the inertia
    /// tensor and the inertial angular rate, including the gyroscopic term:
    /// `pqr_dot = J^-1 (M - omega x (J omega))`.
    fn calculate_pqr_dot(&mut self, moment: &Vector3<f64>, mass_props: &MassProperties) {
        let omega = self.state.pqr_i;
        self.pqr_dot = mass_props.j_inv * (*moment - omega.cross(&(mass_props.j * omega)));
    }

    fn calculate_quat_dot(&mut self) {
        self.quat_dot = quaternion_derivative(&self.state.attitude_eci, &self.state.pqr_i);
    }

    /// ECI-frame velocity derived from the body-frame velocity and the
    /// planet rotation. This is the derivative integrated into the inertial
    /// position.
    fn calculate_inertial_velocity(&mut self) {
        self.state.inertial_velocity = self.t_b2i * self.state.uvw
            + self.omega_earth.cross(&self.state.inertial_position);
    }

    /// Body-axis translational acceleration: applied force over mass, the
    /// rotating-frame (Coriolis and centrifugal) corrections, and gravity
    /// rotated into body axes.
    fn calculate_uvw_dot(
        &mut self,
        force: &Vector3<f64>,
        mass_props: &MassProperties,
        inertial: &Inertial,
    ) {
        let uvw = self.state.uvw;
        let coriolis_rate = self.state.pqr + (self.t_i2b * self.omega_earth) * 2.0;
        self.uvw_dot = *force / mass_props.mass - coriolis_rate.cross(&uvw);

        // Centripetal acceleration of the rotating frame.
        let centripetal = self
            .omega_earth
            .cross(&self.omega_earth.cross(&self.state.inertial_position));
        self.uvw_dot -= self.t_i2b * centripetal;

        self.grav_accel = match self.gravity_model {
            GravityModel::Standard => {
                self.t_l2b * Vector3::new(0.0, 0.0, inertial.g_accel(self.vehicle_radius))
            }
            GravityModel::Wgs84 => self.t_ec2b * inertial.gravity_j2(self.state.location.ecef()),
        };
        self.uvw_dot += self.grav_accel;
    }

    fn update_inertial_matrices(&mut self) {
        let (sin_epa, cos_epa) = self.earth_position_angle.sin_cos();
        self.t_i2ec = Matrix3::new(
            cos_epa, sin_epa, 0.0,
            -sin_epa, cos_epa, 0.0,
            0.0, 0.0, 1.0,
        );
        self.t_ec2i = self.t_i2ec.transpose();
    }

    fn update_location_matrices(&mut self) {
        self.t_ec2l = *self.state.location.tec2l();
        self.t_l2ec = *self.state.location.tl2ec();
        self.t_i2l = self.t_ec2l * self.t_i2ec;
        self.t_l2i = self.t_i2l.transpose();
    }

    fn update_body_matrices(&mut self) {
        let q_eci = UnitQuaternion::from_quaternion(self.state.attitude_eci);
        self.t_b2i = q_eci.to_rotation_matrix().into_inner();
        self.t_i2b = self.t_b2i.transpose();
        self.t_ec2b = self.t_i2b * self.t_ec2i;
        self.t_b2ec = self.t_ec2b.transpose();
        self.t_l2b = self.t_i2b * self.t_l2i;
        self.t_b2l = self.t_l2b.transpose();
    }

    /// Rebuild every quantity derived from the primary state (location,
    /// body velocity, body rates, local attitude). Used at initialization
    /// and after direct state injection, which bypasses integration but
    /// must leave the transforms consistent.
    fn recompute_derived_state(&mut self) {
        self.update_inertial_matrices();
        self.update_location_matrices();

        // Orientation chain from the local attitude.
        self.t_l2b = *self.state.attitude_local.local_to_body();
        self.t_b2l = self.t_l2b.transpose();
        self.t_i2b = self.t_l2b * self.t_i2l;
        self.t_b2i = self.t_i2b.transpose();
        self.t_ec2b = self.t_i2b * self.t_ec2i;
        self.t_b2ec = self.t_ec2b.transpose();

        let q_b2i = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(
            self.t_b2i,
        ));
        self.state.attitude_eci = q_b2i.into_inner();

        self.state.pqr_i = self.state.pqr + self.t_i2b * self.omega_earth;
        self.state.inertial_position = self.t_ec2i * self.state.location.ecef();
        self.state.inertial_velocity = self.t_b2i * self.state.uvw
            + self.omega_earth.cross(&self.state.inertial_position);
        self.vel_ned = self.t_b2l * self.state.uvw;

        self.state.history.reset();
        self.pqr_dot = Vector3::zeros();
        self.uvw_dot = Vector3::zeros();
        self.quat_dot = Quaternion::new(0.0, 0.0, 0.0, 0.0);

        self.recompute_local_terrain_radius();
        self.vehicle_radius = self.radius();
    }

    /// Inject a complete state, bypassing integration. Derivative histories
    /// are reset and every dependent transform recomputed.
    pub fn set_state(&mut self, state: &VehicleState) {
        self.state.location = state.location.clone();
        self.state.uvw = state.uvw;
        self.state.pqr = state.pqr;
        self.state.attitude_local = state.attitude_local.clone();
        self.recompute_derived_state();
    }

    fn recompute_local_terrain_radius(&mut self) {
        self.local_terrain_radius = self.sea_level_radius + self.terrain_elevation;
    }

    // ----- read accessors -------------------------------------------------

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Body-frame velocity (u, v, w) in ft/s.
    pub fn uvw(&self) -> &Vector3<f64> {
        &self.state.uvw
    }

    /// Body-frame angular rates (p, q, r) relative to the rotating frame, rad/s.
    pub fn pqr(&self) -> &Vector3<f64> {
        &self.state.pqr
    }

    /// Body-frame angular rates relative to the inertial frame, rad/s.
    pub fn pqr_i(&self) -> &Vector3<f64> {
        &self.state.pqr_i
    }

    /// Body-axis translational acceleration from the last step, ft/s^2.
    pub fn uvw_dot(&self) -> &Vector3<f64> {
        &self.uvw_dot
    }

    /// Body-axis angular acceleration from the last step, rad/s^2.
    pub fn pqr_dot(&self) -> &Vector3<f64> {
        &self.pqr_dot
    }

    pub fn quat_dot(&self) -> &Quaternion<f64> {
        &self.quat_dot
    }

    /// Gravity acceleration in body axes from the last step, ft/s^2.
    pub fn grav_accel(&self) -> &Vector3<f64> {
        &self.grav_accel
    }

    /// Velocity over the ground frame expressed in local axes
    /// (Vnorth, Veast, Vdown), ft/s.
    pub fn vel_ned(&self) -> &Vector3<f64> {
        &self.vel_ned
    }

    /// Rate of climb, ft/s.
    pub fn hdot(&self) -> f64 {
        -self.vel_ned.z
    }

    pub fn euler(&self) -> &Vector3<f64> {
        self.state.attitude_local.euler()
    }

    pub fn attitude_local(&self) -> &Attitude {
        &self.state.attitude_local
    }

    pub fn inertial_velocity(&self) -> &Vector3<f64> {
        &self.state.inertial_velocity
    }

    pub fn inertial_velocity_magnitude(&self) -> f64 {
        self.state.inertial_velocity.norm()
    }

    pub fn inertial_position(&self) -> &Vector3<f64> {
        &self.state.inertial_position
    }

    pub fn location(&self) -> &Location {
        &self.state.location
    }

    pub fn latitude(&self) -> f64 {
        self.state.location.latitude()
    }

    pub fn latitude_deg(&self) -> f64 {
        rad_to_deg(self.latitude())
    }

    pub fn longitude(&self) -> f64 {
        self.state.location.longitude()
    }

    pub fn longitude_deg(&self) -> f64 {
        rad_to_deg(self.longitude())
    }

    pub fn geodetic_latitude(&self) -> f64 {
        self.state.location.geodetic_latitude()
    }

    pub fn geodetic_latitude_deg(&self) -> f64 {
        rad_to_deg(self.geodetic_latitude())
    }

    pub fn geodetic_altitude(&self) -> f64 {
        self.state.location.geodetic_altitude()
    }

    /// Distance from the planet center, guarded against zero (ft).
    pub fn radius(&self) -> f64 {
        self.state.location.radius()
    }

    pub fn altitude_asl(&self) -> f64 {
        self.state.location.radius() - self.sea_level_radius
    }

    pub fn altitude_asl_meters(&self) -> f64 {
        self.altitude_asl() * FT_TO_M
    }

    pub fn sea_level_radius(&self) -> f64 {
        self.sea_level_radius
    }

    pub fn terrain_elevation(&self) -> f64 {
        self.terrain_elevation
    }

    pub fn local_terrain_radius(&self) -> f64 {
        self.local_terrain_radius
    }

    pub fn distance_agl(&self) -> f64 {
        self.state.location.radius() - self.local_terrain_radius
    }

    pub fn earth_position_angle(&self) -> f64 {
        self.earth_position_angle
    }

    /// Rotation matrix between any two maintained frames.
    pub fn transform(&self, from: Frame, to: Frame) -> Matrix3<f64> {
        use Frame::*;
        match (from, to) {
            (Body, Body) | (Local, Local) | (Ecef, Ecef) | (Eci, Eci) => Matrix3::identity(),
            (Local, Body) => self.t_l2b,
            (Body, Local) => self.t_b2l,
            (Ecef, Body) => self.t_ec2b,
            (Body, Ecef) => self.t_b2ec,
            (Eci, Body) => self.t_i2b,
            (Body, Eci) => self.t_b2i,
            (Local, Ecef) => self.t_l2ec,
            (Ecef, Local) => self.t_ec2l,
            (Eci, Ecef) => self.t_i2ec,
            (Ecef, Eci) => self.t_ec2i,
            (Eci, Local) => self.t_i2l,
            (Local, Eci) => self.t_l2i,
        }
    }

    // ----- state injection setters ---------------------------------------

    pub fn set_uvw(&mut self, uvw: Vector3<f64>) {
        self.state.uvw = uvw;
        self.recompute_derived_state();
    }

    pub fn set_pqr(&mut self, pqr: Vector3<f64>) {
        self.state.pqr = pqr;
        self.recompute_derived_state();
    }

    pub fn set_attitude(&mut self, phi: f64, theta: f64, psi: f64) {
        self.state.attitude_local = Attitude::from_euler(phi, theta, psi);
        self.recompute_derived_state();
    }

    pub fn set_latitude(&mut self, latitude: f64) {
        self.state.location.set_latitude(latitude);
        self.recompute_derived_state();
    }

    pub fn set_longitude(&mut self, longitude: f64) {
        self.state.location.set_longitude(longitude);
        self.recompute_derived_state();
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.state.location.set_radius(radius);
        self.recompute_derived_state();
    }

    pub fn set_altitude_asl(&mut self, altitude: f64) {
        self.set_radius(self.sea_level_radius + altitude);
    }

    pub fn set_terrain_elevation(&mut self, elevation: f64) {
        self.terrain_elevation = elevation;
        self.recompute_local_terrain_radius();
    }

    pub fn set_distance_agl(&mut self, agl: f64) {
        self.set_radius(self.local_terrain_radius + agl);
    }

    pub fn set_sea_level_radius(&mut self, radius: f64) {
        self.sea_level_radius = radius;
        self.recompute_local_terrain_radius();
    }

    /// Shift the vehicle by a small body-frame offset (ft) without touching
    /// velocities or derivative histories. Used by ground-contact handling
    /// to back the structure out of the terrain; the location-dependent
    /// transforms are rebuilt immediately.
    pub fn nudge_body_location(&mut self, delta_body: Vector3<f64>) {
        let delta_ecef = self.t_b2ec * delta_body;
        let ecef = *self.state.location.ecef() - delta_ecef;
        self.state.location.set_ecef(ecef);

        self.update_location_matrices();
        self.update_body_matrices();
        self.state.attitude_local = Attitude::from_local_to_body(&self.t_l2b);
        self.state.inertial_position = self.t_ec2i * self.state.location.ecef();
        self.vel_ned = self.t_b2l * self.state.uvw;
        self.vehicle_radius = self.radius();
    }
}
