//! Fixed-budget descent loop.
//!
//! Each step evaluates the [`Objective`] and its gradient at the current
//! centers and applies one [`Adam`] update. The loop tracks the lowest
//! objective seen, records diagnostics every `report_every` steps and stops
//! when the budget is exhausted, the early-stop policy fires, or the cancel
//! handle is set.
//!
//! A run is a pure function of `(n, config)`: every run owns its buffers, so
//! independent runs can execute on separate threads.

use crate::adam::Adam;
use crate::geometry::Layout;
use crate::objective::{Objective, ObjectiveBreakdown};
use crate::result::{HistoryEntry, PackResult, Termination};
use crate::solver::{PackConfig, PackProgress};
use crate::{Error, Result};
use nalgebra::{Point2, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Optimizes a layout of `n` circles with the given budget.
///
/// Uses [`PackConfig`] defaults for everything not passed explicitly.
pub fn optimize(
    n: usize,
    radius: f64,
    steps: usize,
    learning_rate: f64,
    seed: Option<u64>,
) -> Result<PackResult> {
    let mut config = PackConfig::new()
        .with_radius(radius)
        .with_steps(steps)
        .with_learning_rate(learning_rate);
    config.seed = seed;
    PackRunner::new(config).run(n)
}

/// Returns the starting layout of `config` for `n` objects, with no steps taken.
pub fn baseline_layout(n: usize, config: &PackConfig) -> Result<PackResult> {
    PackRunner::new(config.clone()).baseline(n)
}

/// Drives the descent loop for one configuration.
pub struct PackRunner {
    config: PackConfig,
    cancelled: Arc<AtomicBool>,
}

impl PackRunner {
    /// Creates a new runner.
    pub fn new(config: PackConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Returns a handle to cancel the run between steps.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Optimizes a fresh layout of `n` circles.
    pub fn run(&self, n: usize) -> Result<PackResult> {
        self.run_with_progress_opt::<fn(PackProgress)>(n, None)
    }

    /// Optimizes a fresh layout, reporting progress at the configured cadence.
    pub fn run_with_progress<F>(&self, n: usize, progress_callback: F) -> Result<PackResult>
    where
        F: Fn(PackProgress),
    {
        self.run_with_progress_opt(n, Some(progress_callback))
    }

    /// Optimizes starting from caller-supplied centers.
    pub fn run_from(&self, initial: Vec<Point2<f64>>) -> Result<PackResult> {
        if initial.is_empty() {
            return Err(Error::EmptyLayout);
        }
        self.config.validate(initial.len())?;
        self.descend::<fn(PackProgress)>(initial, None, None)
    }

    /// Returns the initial layout without taking any step.
    ///
    /// With [`Initialization::Line`](crate::Initialization::Line) this is the
    /// naive baseline layout.
    pub fn baseline(&self, n: usize) -> Result<PackResult> {
        self.config.validate_layout(n)?;
        let start = Instant::now();
        let (positions, seed) = self.initial_positions(n);
        let objective = self.objective();
        let breakdown = objective.evaluate(&positions);
        check_finite(n, 0, &positions, &breakdown, &[])?;

        Ok(PackResult {
            layout: Layout::new(self.config.radius, positions),
            breakdown,
            best_objective: breakdown.total,
            best_step: 0,
            steps_run: 0,
            termination: Termination::BudgetExhausted,
            seed: Some(seed),
            history: vec![HistoryEntry { step: 0, breakdown }],
            elapsed: start.elapsed(),
        })
    }

    fn run_with_progress_opt<F>(&self, n: usize, progress_callback: Option<F>) -> Result<PackResult>
    where
        F: Fn(PackProgress),
    {
        self.config.validate(n)?;
        let (positions, seed) = self.initial_positions(n);
        self.descend(positions, Some(seed), progress_callback)
    }

    fn objective(&self) -> Objective {
        Objective::new(self.config.radius).with_penalty_weight(self.config.penalty_weight)
    }

    /// Draws the starting layout; returns it with the seed used.
    fn initial_positions(&self, n: usize) -> (Vec<Point2<f64>>, u64) {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let positions = self
            .config
            .initialization
            .positions(n, self.config.radius, &mut rng);
        (positions, seed)
    }

    fn descend<F>(
        &self,
        mut positions: Vec<Point2<f64>>,
        seed: Option<u64>,
        progress_callback: Option<F>,
    ) -> Result<PackResult>
    where
        F: Fn(PackProgress),
    {
        let start = Instant::now();
        let config = &self.config;
        let n = positions.len();
        let objective = self.objective();

        let mut adam = Adam::new(n, config.adam);
        let mut gradient: Vec<Vector2<f64>> = Vec::with_capacity(n);
        let mut history = Vec::new();

        let mut best_objective = f64::INFINITY;
        let mut best_step = 0;
        let mut best_snapshot: Option<(Vec<Point2<f64>>, ObjectiveBreakdown)> = None;

        let early_stop = config.early_stop.filter(|es| es.applies_to(n));
        let mut stalled = 0usize;
        let mut termination = Termination::BudgetExhausted;
        let mut step = 0usize;

        while step < config.steps {
            if self.cancelled.load(Ordering::Relaxed) {
                termination = Termination::Cancelled;
                break;
            }

            let breakdown = objective.evaluate_with_gradient(&positions, &mut gradient);
            check_finite(n, step, &positions, &breakdown, &gradient)?;

            let previous_best = best_objective;
            if breakdown.total < best_objective {
                best_objective = breakdown.total;
                best_step = step;
                if config.keep_best {
                    best_snapshot = Some((positions.clone(), breakdown));
                }
            }

            let lr = config.schedule.rate(config.learning_rate, step, config.steps);

            if config.report_every > 0 && step % config.report_every == 0 {
                history.push(HistoryEntry { step, breakdown });
                log::debug!(
                    "n={} step {}/{}: objective={:.6} side={:.4} overlap={:.6} lr={:.5}",
                    n,
                    step,
                    config.steps,
                    breakdown.total,
                    breakdown.enclosure_side,
                    breakdown.overlap_sum_sq,
                    lr
                );
                if let Some(ref callback) = progress_callback {
                    callback(PackProgress {
                        n,
                        step,
                        total_steps: config.steps,
                        learning_rate: lr,
                        breakdown,
                        best_objective,
                        elapsed: start.elapsed(),
                        running: true,
                    });
                }
            }

            if let Some(es) = early_stop {
                let scale = previous_best.abs().max(f64::MIN_POSITIVE);
                let improvement = if previous_best.is_finite() {
                    (previous_best - breakdown.total) / scale
                } else {
                    f64::INFINITY
                };
                if improvement < es.tolerance {
                    stalled += 1;
                } else {
                    stalled = 0;
                }
                if stalled >= es.patience {
                    log::debug!("n={} stalled for {} steps at step {}", n, stalled, step);
                    termination = Termination::Converged;
                    break;
                }
            }

            adam.step(&mut positions, &gradient, lr);
            step += 1;
        }

        let final_breakdown = objective.evaluate(&positions);
        check_finite(n, step, &positions, &final_breakdown, &[])?;

        if final_breakdown.total < best_objective {
            best_objective = final_breakdown.total;
            best_step = step;
            if config.keep_best {
                best_snapshot = Some((positions.clone(), final_breakdown));
            }
        }
        history.push(HistoryEntry {
            step,
            breakdown: final_breakdown,
        });

        if let Some(ref callback) = progress_callback {
            callback(PackProgress {
                n,
                step,
                total_steps: config.steps,
                learning_rate: config.schedule.rate(config.learning_rate, step, config.steps),
                breakdown: final_breakdown,
                best_objective,
                elapsed: start.elapsed(),
                running: false,
            });
        }

        let (positions, breakdown) = match best_snapshot {
            Some(snapshot) if config.keep_best => snapshot,
            _ => (positions, final_breakdown),
        };

        Ok(PackResult {
            layout: Layout::new(config.radius, positions),
            breakdown,
            best_objective,
            best_step,
            steps_run: step,
            termination,
            seed,
            history,
            elapsed: start.elapsed(),
        })
    }
}

/// Fails the run if the positions, objective or gradient are not finite.
fn check_finite(
    n: usize,
    step: usize,
    positions: &[Point2<f64>],
    breakdown: &ObjectiveBreakdown,
    gradient: &[Vector2<f64>],
) -> Result<()> {
    let detail = if !positions.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
        "positions"
    } else if !breakdown.is_finite() {
        "objective"
    } else if !gradient.iter().all(|g| g.x.is_finite() && g.y.is_finite()) {
        "gradient"
    } else {
        return Ok(());
    };

    log::warn!("n={}: non-finite {} at step {}, aborting run", n, detail, step);
    Err(Error::NonFinite {
        n,
        step,
        detail: detail.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::Initialization;
    use crate::schedule::StepSchedule;
    use crate::solver::EarlyStop;
    use std::cell::RefCell;

    #[test]
    fn test_single_object() {
        let result = optimize(1, 0.5, 100, 0.1, Some(1)).unwrap();
        assert_eq!(result.n(), 1);
        assert_eq!(result.enclosure_side(), 0.0);
        assert_eq!(result.breakdown.overlap_term, 0.0);
        assert_eq!(result.steps_run, 100);
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            optimize(0, 0.5, 10, 0.1, None),
            Err(Error::InvalidConfig(_))
        ));
        assert!(optimize(3, -0.5, 10, 0.1, None).is_err());
        assert!(optimize(3, 0.5, 0, 0.1, None).is_err());
        assert!(optimize(3, 0.5, 10, 0.0, None).is_err());
    }

    #[test]
    fn test_seed_is_recorded() {
        let result = optimize(3, 0.5, 5, 0.1, None).unwrap();
        let seed = result.seed.unwrap();

        let replay = optimize(3, 0.5, 5, 0.1, Some(seed)).unwrap();
        assert_eq!(result.layout.positions, replay.layout.positions);
    }

    #[test]
    fn test_history_cadence() {
        let config = PackConfig::new()
            .with_steps(500)
            .with_seed(1)
            .with_report_every(100);
        let result = PackRunner::new(config).run(5).unwrap();

        let steps: Vec<usize> = result.history.iter().map(|h| h.step).collect();
        assert_eq!(steps, vec![0, 100, 200, 300, 400, 500]);
    }

    #[test]
    fn test_progress_callback() {
        let calls = RefCell::new(Vec::new());
        let config = PackConfig::new()
            .with_steps(50)
            .with_seed(2)
            .with_report_every(10);

        PackRunner::new(config)
            .run_with_progress(4, |p| calls.borrow_mut().push((p.step, p.running)))
            .unwrap();

        let calls = calls.into_inner();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls.last(), Some(&(50, false)));
        assert!(calls[..5].iter().all(|&(_, running)| running));
    }

    #[test]
    fn test_cancel_before_start() {
        let runner = PackRunner::new(PackConfig::new().with_seed(3));
        runner.cancel_handle().store(true, Ordering::Relaxed);

        let result = runner.run(6).unwrap();
        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.steps_run, 0);
        assert_eq!(result.n(), 6);
    }

    #[test]
    fn test_keep_best_never_worse_than_final() {
        let config = PackConfig::new()
            .with_steps(300)
            .with_seed(4)
            .with_learning_rate(0.2);
        let final_run = PackRunner::new(config.clone()).run(6).unwrap();
        let best_run = PackRunner::new(config.with_keep_best(true)).run(6).unwrap();

        assert!(best_run.breakdown.total <= final_run.breakdown.total);
        assert_eq!(best_run.best_objective, final_run.best_objective);
        assert_eq!(best_run.breakdown.total, best_run.best_objective);
    }

    #[test]
    fn test_early_stop_respects_min_n() {
        let early = EarlyStop {
            tolerance: 1.0,
            patience: 5,
            min_n: 3,
        };
        let config = PackConfig::new().with_steps(200).with_seed(5);

        let small_plain = PackRunner::new(config.clone()).run(2).unwrap();
        let small_early = PackRunner::new(config.clone().with_early_stop(early))
            .run(2)
            .unwrap();
        assert_eq!(small_plain.layout.positions, small_early.layout.positions);
        assert_eq!(small_early.termination, Termination::BudgetExhausted);

        // A relative tolerance of 1.0 stalls on every step once a best exists.
        let large = PackRunner::new(config.with_early_stop(early)).run(4).unwrap();
        assert_eq!(large.termination, Termination::Converged);
        assert!(large.steps_run < 200);
    }

    #[test]
    fn test_run_from_rejects_empty() {
        let runner = PackRunner::new(PackConfig::default());
        assert_eq!(runner.run_from(Vec::new()).unwrap_err(), Error::EmptyLayout);
    }

    #[test]
    fn test_run_from_warm_start() {
        let start = vec![Point2::new(0.0, 0.0), Point2::new(3.0, 0.0)];
        let config = PackConfig::new()
            .with_steps(600)
            .with_schedule(StepSchedule::Cosine { min_factor: 0.0 });
        let result = PackRunner::new(config).run_from(start).unwrap();

        assert!(result.seed.is_none());
        assert!(result.enclosure_side() < 1.1);
        assert!(result.layout.is_overlap_free(0.05));
    }

    #[test]
    fn test_baseline_takes_no_steps() {
        let runner = PackRunner::new(
            PackConfig::new()
                .with_steps(1)
                .with_initialization(Initialization::line()),
        );
        let result = runner.baseline(5).unwrap();
        let same = baseline_layout(5, runner.config()).unwrap();
        assert_eq!(result.layout.positions, same.layout.positions);

        assert_eq!(result.steps_run, 0);
        assert_eq!(result.enclosure_side(), 8.0);
        assert!(result.is_overlap_free(0.0));
    }

    #[test]
    fn test_divergence_is_reported() {
        let err = optimize(3, 0.5, 10, 1e300, Some(1)).unwrap_err();
        assert!(err.is_numerical());
    }

    #[test]
    fn test_non_finite_start_is_reported() {
        let runner = PackRunner::new(PackConfig::default());
        let err = runner
            .run_from(vec![Point2::new(0.0, 0.0), Point2::new(f64::NAN, 1.0)])
            .unwrap_err();
        assert!(matches!(err, Error::NonFinite { step: 0, .. }));
    }
}
