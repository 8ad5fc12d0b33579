//! Adam update rule over 2D positions.

use nalgebra::{Point2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Adam hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdamParams {
    /// Decay of the first-moment estimate.
    pub beta1: f64,
    /// Decay of the second-moment estimate.
    pub beta2: f64,
    /// Denominator stabilizer.
    pub eps: f64,
}

impl Default for AdamParams {
    fn default() -> Self {
        Self {
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

/// Per-coordinate Adam state for one layout.
#[derive(Debug, Clone)]
pub struct Adam {
    params: AdamParams,
    m: Vec<Vector2<f64>>,
    v: Vec<Vector2<f64>>,
    t: i32,
}

impl Adam {
    /// Creates zeroed state for `n` positions.
    pub fn new(n: usize, params: AdamParams) -> Self {
        Self {
            params,
            m: vec![Vector2::zeros(); n],
            v: vec![Vector2::zeros(); n],
            t: 0,
        }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> i32 {
        self.t
    }

    /// Applies one bias-corrected update with step size `lr`.
    pub fn step(&mut self, positions: &mut [Point2<f64>], gradient: &[Vector2<f64>], lr: f64) {
        debug_assert_eq!(positions.len(), self.m.len());
        debug_assert_eq!(gradient.len(), self.m.len());

        self.t = self.t.saturating_add(1);
        let AdamParams { beta1, beta2, eps } = self.params;
        let bias1 = 1.0 - beta1.powi(self.t);
        let bias2 = 1.0 - beta2.powi(self.t);

        for ((p, g), (m, v)) in positions
            .iter_mut()
            .zip(gradient)
            .zip(self.m.iter_mut().zip(self.v.iter_mut()))
        {
            *m = *m * beta1 + g * (1.0 - beta1);
            *v = *v * beta2 + g.component_mul(g) * (1.0 - beta2);

            let m_hat = *m / bias1;
            let v_hat = *v / bias2;
            let step = m_hat.zip_map(&v_hat, |mh, vh| mh / (vh.sqrt() + eps));
            *p -= step * lr;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_step_moves_by_lr() {
        let mut adam = Adam::new(1, AdamParams::default());
        let mut p = vec![Point2::new(1.0, 1.0)];
        adam.step(&mut p, &[Vector2::new(3.0, -0.5)], 0.1);

        // Bias correction makes the first step ±lr per nonzero coordinate.
        assert_relative_eq!(p[0].x, 0.9, epsilon = 1e-6);
        assert_relative_eq!(p[0].y, 1.1, epsilon = 1e-6);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn test_zero_gradient_does_not_move() {
        let mut adam = Adam::new(2, AdamParams::default());
        let mut p = vec![Point2::new(0.0, 0.0), Point2::new(2.0, 3.0)];
        let before = p.clone();
        for _ in 0..10 {
            adam.step(&mut p, &[Vector2::zeros(), Vector2::zeros()], 0.5);
        }
        assert_eq!(p, before);
    }

    #[test]
    fn test_minimizes_quadratic() {
        // f(p) = |p - (3, -2)|^2
        let target = Point2::new(3.0, -2.0);
        let mut adam = Adam::new(1, AdamParams::default());
        let mut p = vec![Point2::new(0.0, 0.0)];

        for k in 0..2000 {
            let g = (p[0] - target) * 2.0;
            let lr = if k < 1500 { 0.05 } else { 0.005 };
            adam.step(&mut p, &[g], lr);
        }

        assert_relative_eq!(p[0].x, 3.0, epsilon = 1e-2);
        assert_relative_eq!(p[0].y, -2.0, epsilon = 1e-2);
    }
}
