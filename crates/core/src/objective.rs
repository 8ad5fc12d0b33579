//! Packing objective and its gradient.
//!
//! The objective combines the two geometric measurements into one scalar:
//!
//! ```text
//! f(p) = side(p)^2 + λ · Σ_{i<j} max(0, 2r - ‖p_i - p_j‖)^2
//! ```
//!
//! The overlap penalty weight λ is large relative to 1, so separation
//! dominates while any overlap remains and the squared side drives
//! compaction once the circles are apart.
//!
//! The side term is piecewise linear in the extreme coordinates. Where
//! several objects share an extreme coordinate, or width equals height, the
//! gradient is split evenly among the tied terms.

use crate::geometry::{overlap_depth, DISTANCE_EPSILON};
use nalgebra::{Point2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default overlap penalty weight.
pub const DEFAULT_PENALTY_WEIGHT: f64 = 100.0;

/// Component breakdown of one objective evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectiveBreakdown {
    /// `enclosure_term + overlap_term`.
    pub total: f64,
    /// Side of the square enclosing all centers.
    pub enclosure_side: f64,
    /// `enclosure_side^2`.
    pub enclosure_term: f64,
    /// Σ overlap² over unordered pairs.
    pub overlap_sum_sq: f64,
    /// `λ · overlap_sum_sq`.
    pub overlap_term: f64,
    /// Number of pairs with positive overlap.
    pub overlapping_pairs: usize,
}

impl ObjectiveBreakdown {
    /// True if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.total.is_finite()
            && self.enclosure_side.is_finite()
            && self.enclosure_term.is_finite()
            && self.overlap_sum_sq.is_finite()
            && self.overlap_term.is_finite()
    }

    /// True if no pair overlaps.
    pub fn is_overlap_free(&self) -> bool {
        self.overlapping_pairs == 0
    }
}

/// Enclosure-plus-penalty objective for circles of one radius.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Objective {
    /// Circle radius.
    pub radius: f64,
    /// Overlap penalty weight λ.
    pub penalty_weight: f64,
}

impl Objective {
    /// Creates an objective with the default penalty weight.
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            penalty_weight: DEFAULT_PENALTY_WEIGHT,
        }
    }

    /// Sets the overlap penalty weight.
    pub fn with_penalty_weight(mut self, weight: f64) -> Self {
        self.penalty_weight = weight;
        self
    }

    /// Evaluates the objective without computing a gradient.
    pub fn evaluate(&self, positions: &[Point2<f64>]) -> ObjectiveBreakdown {
        self.evaluate_inner(positions, None)
    }

    /// Evaluates the objective and writes `∂f/∂p_i` into `gradient`.
    ///
    /// `gradient` is resized to `positions.len()` and overwritten.
    pub fn evaluate_with_gradient(
        &self,
        positions: &[Point2<f64>],
        gradient: &mut Vec<Vector2<f64>>,
    ) -> ObjectiveBreakdown {
        gradient.clear();
        gradient.resize(positions.len(), Vector2::zeros());
        self.evaluate_inner(positions, Some(gradient))
    }

    fn evaluate_inner(
        &self,
        positions: &[Point2<f64>],
        mut gradient: Option<&mut Vec<Vector2<f64>>>,
    ) -> ObjectiveBreakdown {
        let enclosure_side = match gradient.as_deref_mut() {
            Some(grad) => enclosure_with_gradient(positions, grad),
            None => crate::geometry::enclosure_side(positions),
        };

        let mut overlap_sum_sq = 0.0;
        let mut overlapping_pairs = 0;
        let two_lambda = 2.0 * self.penalty_weight;

        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let diff = positions[i] - positions[j];
                let distance = (diff.norm_squared() + DISTANCE_EPSILON).sqrt();
                let overlap = overlap_depth(distance, self.radius);
                if overlap <= 0.0 {
                    continue;
                }

                overlap_sum_sq += overlap * overlap;
                overlapping_pairs += 1;

                if let Some(grad) = gradient.as_deref_mut() {
                    // d(λ o²)/dp_i = -2λ o · diff / d
                    let g = diff * (-two_lambda * overlap / distance);
                    grad[i] += g;
                    grad[j] -= g;
                }
            }
        }

        let enclosure_term = enclosure_side * enclosure_side;
        let overlap_term = self.penalty_weight * overlap_sum_sq;

        ObjectiveBreakdown {
            total: enclosure_term + overlap_term,
            enclosure_side,
            enclosure_term,
            overlap_sum_sq,
            overlap_term,
            overlapping_pairs,
        }
    }
}

/// Computes the enclosure side and accumulates `∂(side²)/∂p` into `grad`.
fn enclosure_with_gradient(positions: &[Point2<f64>], grad: &mut [Vector2<f64>]) -> f64 {
    if positions.len() < 2 {
        return 0.0;
    }

    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in positions {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    let width = max_x - min_x;
    let height = max_y - min_y;
    let side = width.max(height);
    if side <= 0.0 || !side.is_finite() {
        return side;
    }

    let d_side = 2.0 * side;
    let (wx, wy) = if width > height {
        (1.0, 0.0)
    } else if height > width {
        (0.0, 1.0)
    } else {
        (0.5, 0.5)
    };

    if wx > 0.0 {
        spread_extreme(positions, grad, 0, min_x, max_x, d_side * wx);
    }
    if wy > 0.0 {
        spread_extreme(positions, grad, 1, min_y, max_y, d_side * wy);
    }

    side
}

/// Adds `+coeff` split over the objects at `max` and `-coeff` over those at `min`.
fn spread_extreme(
    positions: &[Point2<f64>],
    grad: &mut [Vector2<f64>],
    axis: usize,
    min: f64,
    max: f64,
    coeff: f64,
) {
    let at_max = positions.iter().filter(|p| p[axis] == max).count();
    let at_min = positions.iter().filter(|p| p[axis] == min).count();
    let up = coeff / at_max as f64;
    let down = coeff / at_min as f64;

    for (p, g) in positions.iter().zip(grad.iter_mut()) {
        if p[axis] == max {
            g[axis] += up;
        }
        if p[axis] == min {
            g[axis] -= down;
        }
    }
}
