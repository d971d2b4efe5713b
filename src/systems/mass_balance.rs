use nalgebra::{Matrix3, Vector3};
use tracing::error;

use crate::components::{PointMass, PointMassShape};
use crate::resources::{ConfigError, MassConfig};
use crate::utils::constants::{INCH_TO_FT, LB_TO_SLUG};

/// Weight, balance and moment of inertia aggregation.
///
/// Maintains the base airframe inertia plus a list of point masses and sums
/// the contribution of all of them into the total mass, center of gravity
/// and inertia tensor handed to the propagator. The tensor inverse is
/// recomputed immediately after every tensor update, so `j()` and `j_inv()`
/// are always consistent for the current point-mass configuration.
#[derive(Debug, Clone)]
pub struct MassBalance {
    empty_weight: f64,
    weight: f64,
    mass: f64,
    base_inertia: Matrix3<f64>,
    j: Matrix3<f64>,
    j_inv: Matrix3<f64>,
    base_cg: Vector3<f64>,
    cg: Vector3<f64>,
    last_cg: Vector3<f64>,
    delta_cg: Vector3<f64>,
    point_masses: Vec<PointMass>,
    loaded: bool,
}

impl MassBalance {
    pub fn new() -> Self {
        Self {
            empty_weight: 0.0,
            weight: 0.0,
            mass: 0.0,
            base_inertia: Matrix3::zeros(),
            j: Matrix3::zeros(),
            j_inv: Matrix3::zeros(),
            base_cg: Vector3::zeros(),
            cg: Vector3::zeros(),
            last_cg: Vector3::zeros(),
            delta_cg: Vector3::zeros(),
            point_masses: Vec::new(),
            loaded: false,
        }
    }

    /// Load the mass/balance configuration. Fails without touching the
    /// current state if the configuration is invalid; the model must not be
    /// stepped before a successful load.
    pub fn load(&mut self, config: &MassConfig) -> Result<(), ConfigError> {
        config.validate()?;

        self.empty_weight = config.empty_weight;
        self.base_inertia = Matrix3::new(
            config.ixx, -config.ixy, -config.ixz,
            -config.ixy, config.iyy, -config.iyz,
            -config.ixz, -config.iyz, config.izz,
        );
        self.base_cg = config.cg;
        self.cg = config.cg;
        self.last_cg = config.cg;
        self.point_masses = config
            .point_masses
            .iter()
            .map(|pm| match &pm.shape {
                Some(shape) => PointMass::with_shape(
                    pm.name.clone(),
                    pm.weight,
                    pm.location,
                    shape.kind,
                    shape.radius,
                    shape.length,
                ),
                None => PointMass::new(pm.name.clone(), pm.weight, pm.location),
            })
            .collect();

        self.loaded = true;
        self.run();
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Recompute mass, CG and the inertia tensor from the current
    /// point-mass configuration. Must be called whenever a point-mass
    /// weight changes; `load` and `set_point_mass_weight` do so themselves.
    pub fn run(&mut self) {
        self.weight = self.empty_weight + self.total_point_mass_weight();
        self.mass = self.weight * LB_TO_SLUG;

        if self.weight > 0.0 {
            self.cg = (self.base_cg * self.empty_weight + self.point_mass_moment()) / self.weight;
        } else {
            self.cg = self.base_cg;
        }
        self.delta_cg = self.cg - self.last_cg;
        self.last_cg = self.cg;

        self.j = self.base_inertia + self.point_mass_inertia_sum();
        self.j_inv = self.j.try_inverse().unwrap_or_else(|| {
            error!("inertia tensor is not invertible, using zero inverse");
            Matrix3::zeros()
        });
    }

    /// Inertia contribution of a point mass of `slugs` at structural-frame
    /// position `r` (in), taken about the vehicle reference in body axes.
    pub fn pointmass_inertia(&self, slugs: f64, r: &Vector3<f64>) -> Matrix3<f64> {
        let v = self.structural_to_body(r);
        let sv = v * slugs;
        let xx = sv.x * v.x;
        let yy = sv.y * v.y;
        let zz = sv.z * v.z;
        let xy = -sv.x * v.y;
        let xz = -sv.x * v.z;
        let yz = -sv.y * v.z;
        Matrix3::new(
            yy + zz, xy, xz,
            xy, xx + zz, yz,
            xz, yz, xx + yy,
        )
    }

    /// Convert a structural-frame coordinate (inches, X positive aft,
    /// Z positive up) to the body frame (feet, X forward, Z down): subtract
    /// the CG, rotate 180 degrees about Y, change units.
    pub fn structural_to_body(&self, r: &Vector3<f64>) -> Vector3<f64> {
        let cg_offset = r - self.cg;
        Vector3::new(-cg_offset.x, cg_offset.y, -cg_offset.z) * INCH_TO_FT
    }

    /// Total inertia tensor (slug-ft^2) about the vehicle reference.
    pub fn j(&self) -> &Matrix3<f64> {
        &self.j
    }

    /// Inverse of the total inertia tensor.
    pub fn j_inv(&self) -> &Matrix3<f64> {
        &self.j_inv
    }

    /// Total mass (slugs).
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Total weight (lbs).
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn empty_weight(&self) -> f64 {
        self.empty_weight
    }

    /// Center of gravity, structural frame (in).
    pub fn cg(&self) -> &Vector3<f64> {
        &self.cg
    }

    /// CG movement over the last recomputation, structural frame (in).
    pub fn delta_cg(&self) -> &Vector3<f64> {
        &self.delta_cg
    }

    pub fn point_masses(&self) -> &[PointMass] {
        &self.point_masses
    }

    /// Change a point mass's weight and immediately re-aggregate.
    pub fn set_point_mass_weight(&mut self, index: usize, weight: f64) -> bool {
        match self.point_masses.get_mut(index) {
            Some(pm) => {
                pm.set_weight(weight);
                self.run();
                true
            }
            None => false,
        }
    }

    pub fn total_point_mass_weight(&self) -> f64 {
        self.point_masses.iter().map(PointMass::weight).sum()
    }

    fn point_mass_moment(&self) -> Vector3<f64> {
        self.point_masses
            .iter()
            .map(|pm| pm.location() * pm.weight())
            .sum()
    }

    fn point_mass_inertia_sum(&self) -> Matrix3<f64> {
        let mut sum = Matrix3::zeros();
        for pm in &self.point_masses {
            sum += self.pointmass_inertia(pm.weight() * LB_TO_SLUG, pm.location());
            sum += pm.shape_inertia();
        }
        sum
    }
}

impl Default for MassBalance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::resources::PointMassConfig;
    use crate::utils::constants::SLUG_TO_LB;

    fn base_config() -> MassConfig {
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
    fn base_tensor_and_inverse_are_consistent() {
        let mut mb = MassBalance::new();
        mb.load(&base_config()).unwrap();

        let product = mb.j() * mb.j_inv();
        assert_relative_eq!(product, Matrix3::identity(), epsilon = 1e-9);
        assert_relative_eq!(mb.mass(), 7500.0 * LB_TO_SLUG, epsilon = 1e-12);
    }

    #[test]
    fn structural_to_body_flips_x_and_z() {
        let mut mb = MassBalance::new();
        mb.load(&base_config()).unwrap();

        // 12 inches aft of the CG, 12 inches above it.
        let r = Vector3::new(202.0, 0.0, 48.0);
        let body = mb.structural_to_body(&r);
        assert_relative_eq!(body, Vector3::new(-1.0, 0.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn single_point_mass_matches_parallel_axis_closed_form() {
        let mut config = base_config();
        config.point_masses.push(PointMassConfig {
            name: "ballast".into(),
            weight: SLUG_TO_LB, // exactly one slug
            location: Vector3::new(190.0 - 24.0, 12.0, 36.0), // 2 ft fwd, 1 ft right of CG
            shape: None,
        });
        let mut mb = MassBalance::new();
        mb.load(&config).unwrap();

        // CG moves toward the point mass, so compute the offset the
        // aggregator actually used.
        let v = mb.structural_to_body(&Vector3::new(166.0, 12.0, 36.0));
        let m = 1.0;
        let expected = Matrix3::new(
            m * (v.y * v.y + v.z * v.z), -m * v.x * v.y, -m * v.x * v.z,
            -m * v.x * v.y, m * (v.x * v.x + v.z * v.z), -m * v.y * v.z,
            -m * v.x * v.z, -m * v.y * v.z, m * (v.x * v.x + v.y * v.y),
        );
        let contribution = mb.j() - mb.base_inertia;
        assert_relative_eq!(contribution, expected, epsilon = 1e-9);
    }

    #[test]
    fn weight_change_reaggregates_tensor_and_inverse() {
        let mut config = base_config();
        config.point_masses.push(PointMassConfig {
            name: "fuel".into(),
            weight: 500.0,
            location: Vector3::new(220.0, 0.0, 36.0),
            shape: None,
        });
        let mut mb = MassBalance::new();
        mb.load(&config).unwrap();
        let j_before = *mb.j();
        let weight_before = mb.weight();

        assert!(mb.set_point_mass_weight(0, 100.0));
        assert_relative_eq!(mb.weight(), weight_before - 400.0, epsilon = 1e-9);
        assert!(mb.j()[(0, 0)] != j_before[(0, 0)] || mb.j()[(1, 1)] != j_before[(1, 1)]);
        let product = mb.j() * mb.j_inv();
        assert_relative_eq!(product, Matrix3::identity(), epsilon = 1e-9);

        assert!(!mb.set_point_mass_weight(7, 1.0));
    }

    #[test]
    fn cg_shifts_toward_added_mass() {
        let mut config = base_config();
        config.point_masses.push(PointMassConfig {
            name: "aft baggage".into(),
            weight: 750.0,
            location: Vector3::new(300.0, 0.0, 36.0),
            shape: None,
        });
        let mut mb = MassBalance::new();
        mb.load(&config).unwrap();

        // 750 lbs at 110 in aft of the base CG moves the CG aft 10 in.
        assert_relative_eq!(mb.cg().x, 200.0, epsilon = 1e-9);
        assert_relative_eq!(mb.delta_cg().x, 10.0, epsilon = 1e-9);

        // A recomputation with nothing changed reports no further movement.
        mb.run();
        assert_relative_eq!(mb.delta_cg().x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn invalid_config_leaves_model_unloaded() {
        let mut config = base_config();
        config.empty_weight = -1.0;
        let mut mb = MassBalance::new();
        assert!(mb.load(&config).is_err());
        assert!(!mb.is_loaded());
    }
}
