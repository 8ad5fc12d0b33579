//! Initial placement policies.
//!
//! - [`Initialization::Gaussian`]: centers drawn from `N(0, σ²)` per axis with
//!   `σ = spread_per_object · N`, so larger layouts start spread out.
//! - [`Initialization::Line`]: the deterministic baseline `x = spacing · i, y = 0`.
//! - [`Initialization::Grid`]: row-major grid with `⌈√N⌉` columns.

use nalgebra::Point2;
use rand::Rng;
use rand_distr::StandardNormal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default Gaussian spread per object.
pub const DEFAULT_SPREAD_PER_OBJECT: f64 = 0.1;

/// Placement policy for the starting layout.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Initialization {
    /// Random normal centers with standard deviation `spread_per_object · N`.
    Gaussian {
        /// Standard deviation contributed by each object.
        spread_per_object: f64,
    },
    /// Objects on the x axis, `spacing` apart. `None` uses `4r`.
    Line {
        /// Distance between consecutive centers.
        spacing: Option<f64>,
    },
    /// Square-ish grid. `None` uses `2r`.
    Grid {
        /// Distance between neighbouring centers.
        spacing: Option<f64>,
    },
}

impl Default for Initialization {
    fn default() -> Self {
        Self::Gaussian {
            spread_per_object: DEFAULT_SPREAD_PER_OBJECT,
        }
    }
}

impl Initialization {
    /// Deterministic line baseline with the default spacing.
    pub fn line() -> Self {
        Self::Line { spacing: None }
    }

    /// Grid with the default spacing.
    pub fn grid() -> Self {
        Self::Grid { spacing: None }
    }

    /// Returns true if the policy consumes randomness.
    pub fn is_random(&self) -> bool {
        matches!(self, Self::Gaussian { .. })
    }

    /// Checks the policy parameters.
    pub fn validate(&self) -> crate::Result<()> {
        let (name, value) = match self {
            Self::Gaussian { spread_per_object } => ("gaussian spread", Some(*spread_per_object)),
            Self::Line { spacing } => ("line spacing", *spacing),
            Self::Grid { spacing } => ("grid spacing", *spacing),
        };
        match value {
            Some(v) if !(v > 0.0 && v.is_finite()) => Err(crate::Error::config(format!(
                "{} must be positive, got {}",
                name, v
            ))),
            _ => Ok(()),
        }
    }

    /// Produces `n` starting centers for circles of `radius`.
    pub fn positions<R: Rng>(&self, n: usize, radius: f64, rng: &mut R) -> Vec<Point2<f64>> {
        match *self {
            Self::Gaussian { spread_per_object } => {
                let sigma = spread_per_object * n as f64;
                (0..n)
                    .map(|_| {
                        let x: f64 = rng.sample(StandardNormal);
                        let y: f64 = rng.sample(StandardNormal);
                        Point2::new(x * sigma, y * sigma)
                    })
                    .collect()
            }
            Self::Line { spacing } => {
                let spacing = spacing.unwrap_or(4.0 * radius);
                (0..n)
                    .map(|i| Point2::new(spacing * i as f64, 0.0))
                    .collect()
            }
            Self::Grid { spacing } => {
                let spacing = spacing.unwrap_or(2.0 * radius);
                let cols = grid_columns(n);
                (0..n)
                    .map(|i| {
                        let (row, col) = (i / cols, i % cols);
                        Point2::new(spacing * col as f64, spacing * row as f64)
                    })
                    .collect()
            }
        }
    }
}

/// Number of columns for a near-square grid of `n` cells.
pub fn grid_columns(n: usize) -> usize {
    let mut cols = (n as f64).sqrt().ceil() as usize;
    while cols * cols < n {
        cols += 1;
    }
    cols.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{enclosure_side, min_pair_distance};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_line_matches_baseline() {
        let mut rng = StdRng::seed_from_u64(0);
        let p = Initialization::line().positions(4, 0.5, &mut rng);

        assert_eq!(p.len(), 4);
        for (i, pt) in p.iter().enumerate() {
            assert_relative_eq!(pt.x, 2.0 * i as f64);
            assert_eq!(pt.y, 0.0);
        }
        assert_relative_eq!(enclosure_side(&p), 6.0);
    }

    #[test]
    fn test_grid_is_overlap_free() {
        let mut rng = StdRng::seed_from_u64(0);
        let p = Initialization::grid().positions(10, 0.5, &mut rng);

        assert_eq!(p.len(), 10);
        assert_relative_eq!(min_pair_distance(&p).unwrap(), 1.0);
        // 4 columns, 3 rows
        assert_relative_eq!(enclosure_side(&p), 3.0);
    }

    #[test]
    fn test_grid_columns() {
        assert_eq!(grid_columns(0), 1);
        assert_eq!(grid_columns(1), 1);
        assert_eq!(grid_columns(4), 2);
        assert_eq!(grid_columns(5), 3);
        assert_eq!(grid_columns(200), 15);
    }

    #[test]
    fn test_gaussian_is_seeded() {
        let init = Initialization::default();
        let a = init.positions(20, 0.5, &mut StdRng::seed_from_u64(7));
        let b = init.positions(20, 0.5, &mut StdRng::seed_from_u64(7));
        let c = init.positions(20, 0.5, &mut StdRng::seed_from_u64(8));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_gaussian_spread_scales_with_n() {
        let init = Initialization::default();
        let small = init.positions(5, 0.5, &mut StdRng::seed_from_u64(1));
        let large = init.positions(100, 0.5, &mut StdRng::seed_from_u64(1));

        let rms = |p: &[Point2<f64>]| {
            (p.iter().map(|q| q.coords.norm_squared()).sum::<f64>() / p.len() as f64).sqrt()
        };
        assert!(rms(&large) > rms(&small));
    }

    #[test]
    fn test_validate() {
        assert!(Initialization::default().validate().is_ok());
        assert!(Initialization::line().validate().is_ok());
        assert!(Initialization::Line { spacing: Some(-1.0) }.validate().is_err());
        assert!(Initialization::Gaussian {
            spread_per_object: 0.0
        }
        .validate()
        .is_err());
        assert!(Initialization::Grid {
            spacing: Some(f64::NAN)
        }
        .validate()
        .is_err());
    }
}
