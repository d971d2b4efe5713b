use std::collections::VecDeque;
use std::ops::{Add, Mul};

use crate::resources::Integrator;
use crate::utils::constants::HISTORY_DEPTH;

/// Advance `integrand` by one step of `dt` using the selected scheme.
///
/// The freshest derivative sample is pushed onto the front of `history`
/// (which is truncated back to [`HISTORY_DEPTH`]) before the scheme is
/// applied, so the history stays current even when the scheme is `None`
/// and the integrand itself is frozen. The multistep coefficients are the
/// standard Adams-Bashforth sets.
pub fn integrate<T>(
    integrand: &mut T,
    derivative: T,
    history: &mut VecDeque<T>,
    dt: f64,
    scheme: Integrator,
) where
    T: Copy + Add<Output = T> + Mul<f64, Output = T>,
{
    history.push_front(derivative);
    history.truncate(HISTORY_DEPTH);

    let h = |i: usize| history[i];
    match scheme {
        Integrator::None => {}
        Integrator::RectEuler => {
            *integrand = *integrand + h(0) * dt;
        }
        Integrator::Trapezoidal => {
            *integrand = *integrand + (h(0) + h(1)) * (0.5 * dt);
        }
        Integrator::AdamsBashforth2 => {
            *integrand = *integrand + (h(0) * 1.5 + h(1) * -0.5) * dt;
        }
        Integrator::AdamsBashforth3 => {
            *integrand = *integrand + (h(0) * 23.0 + h(1) * -16.0 + h(2) * 5.0) * (dt / 12.0);
        }
        Integrator::AdamsBashforth4 => {
            *integrand = *integrand
                + (h(0) * 55.0 + h(1) * -59.0 + h(2) * 37.0 + h(3) * -9.0) * (dt / 24.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn run_constant_derivative(scheme: Integrator, steps: usize, dt: f64) -> Vector3<f64> {
        let derivative = Vector3::new(2.0, -1.0, 0.5);
        let mut value = Vector3::new(10.0, 0.0, -3.0);
        let mut history: VecDeque<Vector3<f64>> = VecDeque::new();
        history.resize(HISTORY_DEPTH, derivative);

        for _ in 0..steps {
            integrate(&mut value, derivative, &mut history, dt, scheme);
        }
        value
    }

    #[test]
    fn all_schemes_exact_for_constant_derivative() {
        // Every scheme's coefficients sum to dt, so a constant derivative
        // integrates exactly.
        let schemes = [
            Integrator::RectEuler,
            Integrator::Trapezoidal,
            Integrator::AdamsBashforth2,
            Integrator::AdamsBashforth3,
            Integrator::AdamsBashforth4,
        ];
        let (steps, dt) = (100, 1.0 / 120.0);
        let expected = Vector3::new(10.0, 0.0, -3.0)
            + Vector3::new(2.0, -1.0, 0.5) * (steps as f64 * dt);

        for scheme in schemes {
            let value = run_constant_derivative(scheme, steps, dt);
            assert_relative_eq!(value, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn frozen_integrator_holds_value() {
        let value = run_constant_derivative(Integrator::None, 50, 0.01);
        assert_relative_eq!(value, Vector3::new(10.0, 0.0, -3.0));
    }

    #[test]
    fn frozen_integrator_still_records_history() {
        // Freezing an axis must not starve its derivative history: after
        // unfreezing, the multistep schemes pick up fresh samples, not the
        // ones from before the freeze.
        let mut value = 0.0f64;
        let mut history: VecDeque<f64> = VecDeque::new();
        history.resize(HISTORY_DEPTH, 0.0);

        for i in 1..=4 {
            integrate(&mut value, i as f64, &mut history, 0.1, Integrator::None);
        }
        assert_eq!(value, 0.0);
        assert_eq!(history.len(), HISTORY_DEPTH);
        assert_eq!(Vec::from(history.clone()), vec![4.0, 3.0, 2.0, 1.0]);

        // One AB2 step now uses the recorded samples.
        integrate(&mut value, 5.0, &mut history, 0.1, Integrator::AdamsBashforth2);
        assert_relative_eq!(value, 0.1 * (1.5 * 5.0 - 0.5 * 4.0));
    }

    #[test]
    fn adams_bashforth2_matches_hand_expansion() {
        let mut value = 0.0f64;
        let mut history: VecDeque<f64> = VecDeque::new();
        history.resize(HISTORY_DEPTH, 0.0);
        let dt = 0.1;

        integrate(&mut value, 1.0, &mut history, dt, Integrator::AdamsBashforth2);
        // history = [1, 0, ...]
        assert_relative_eq!(value, dt * 1.5);
        integrate(&mut value, 2.0, &mut history, dt, Integrator::AdamsBashforth2);
        assert_relative_eq!(value, dt * 1.5 + dt * (1.5 * 2.0 - 0.5 * 1.0));
    }

    #[test]
    fn history_depth_is_bounded() {
        let mut value = 0.0f64;
        let mut history: VecDeque<f64> = VecDeque::new();
        history.resize(HISTORY_DEPTH, 0.0);
        for i in 0..20 {
            integrate(&mut value, i as f64, &mut history, 0.01, Integrator::RectEuler);
            assert_eq!(history.len(), HISTORY_DEPTH);
        }
        assert_eq!(history[0], 19.0);
    }
}
