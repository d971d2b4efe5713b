use nalgebra::{Matrix3, Vector3};

use crate::components::LagrangeMultiplier;

const MAX_ITERATIONS: usize = 50;
const CONVERGENCE_NORM: f64 = 1e-5;

/// Fold externally supplied contact constraints into the body-frame
/// accelerations.
///
/// Each multiplier carries force/moment Jacobians describing how one
/// constrained degree of freedom couples into the rigid body. The
/// multiplier values are resolved with a projected Gauss-Seidel iteration
/// over the system `J M^-1 J^T lambda = -J a`, clamping every multiplier
/// into its bounds, and the resulting constraint force/moment is added to
/// `uvw_dot`/`pqr_dot`. Values persist in the records between steps to
/// warm-start the next resolution.
///
/// The RHS includes a velocity-cancellation term so the solver drives the
/// relative motion between vehicle and (static) ground to zero over one
/// step rather than merely zeroing the acceleration.
#[allow(clippy::too_many_arguments)]
pub fn resolve_contact_forces(
    uvw_dot: &mut Vector3<f64>,
    pqr_dot: &mut Vector3<f64>,
    uvw: &Vector3<f64>,
    pqr: &Vector3<f64>,
    mass: f64,
    j_inv: &Matrix3<f64>,
    multipliers: &mut [LagrangeMultiplier],
    dt: f64,
) {
    let n = multipliers.len();
    if n == 0 {
        return;
    }

    let inv_mass = 1.0 / mass;
    let jac_f: Vec<Vector3<f64>> = multipliers.iter().map(|m| m.force_jacobian).collect();
    let jac_m: Vec<Vector3<f64>> = multipliers.iter().map(|m| m.moment_jacobian).collect();

    // J M^-1 J^T, symmetric.
    let mut a = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..i {
            a[i * n + j] = a[j * n + i];
        }
        for j in i..n {
            a[i * n + j] =
                jac_f[i].dot(&(jac_f[j] * inv_mass)) + jac_m[i].dot(&(j_inv * jac_m[j]));
        }
    }

    // Cancel out both the residual acceleration and, over one step, the
    // relative movement between vehicle and ground.
    let mut vdot = *uvw_dot;
    let mut wdot = *pqr_dot;
    if dt > 0.0 {
        vdot += uvw / dt;
        wdot += pqr / dt;
    }

    // Normalize each row by its diagonal so the iteration below needs no
    // divisions.
    let mut rhs = vec![0.0; n];
    for i in 0..n {
        let diagonal = a[i * n + i];
        if diagonal <= f64::EPSILON {
            // Degenerate (zero) Jacobian; leave this row inert.
            rhs[i] = 0.0;
            continue;
        }
        let d = 1.0 / diagonal;
        rhs[i] = -(jac_f[i].dot(&vdot) + jac_m[i].dot(&wdot)) * d;
        for j in 0..n {
            a[i * n + j] *= d;
        }
    }

    // Projected Gauss-Seidel.
    for _ in 0..MAX_ITERATIONS {
        let mut norm = 0.0;
        for i in 0..n {
            let lambda0 = multipliers[i].value;
            let mut dlambda = rhs[i];
            for j in 0..n {
                dlambda -= a[i * n + j] * multipliers[j].value;
            }
            multipliers[i].value =
                (lambda0 + dlambda).clamp(multipliers[i].min, multipliers[i].max);
            norm += (multipliers[i].value - lambda0).abs();
        }
        if norm < CONVERGENCE_NORM {
            break;
        }
    }

    let mut force = Vector3::zeros();
    let mut moment = Vector3::zeros();
    for i in 0..n {
        force += jac_f[i] * multipliers[i].value;
        moment += jac_m[i] * multipliers[i].value;
    }

    *uvw_dot += force * inv_mass;
    *pqr_dot += j_inv * moment;
}
