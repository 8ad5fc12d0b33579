//! Solver configuration and progress reporting.

use crate::adam::AdamParams;
use crate::init::Initialization;
use crate::objective::{ObjectiveBreakdown, DEFAULT_PENALTY_WEIGHT};
use crate::schedule::StepSchedule;
use crate::{Error, Result};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Early-stop policy: stop once the objective has stalled.
///
/// A step counts as stalled when it improves on the best objective seen so
/// far by less than `tolerance` (relative). The run stops after `patience`
/// consecutive stalled steps. Layouts with fewer than `min_n` objects are
/// never stopped early, so their results match a plain fixed-budget run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EarlyStop {
    /// Relative improvement below which a step counts as stalled.
    pub tolerance: f64,
    /// Consecutive stalled steps before stopping.
    pub patience: usize,
    /// Smallest N the policy applies to.
    pub min_n: usize,
}

impl Default for EarlyStop {
    fn default() -> Self {
        Self {
            tolerance: 1e-7,
            patience: 200,
            min_n: 50,
        }
    }
}

impl EarlyStop {
    /// Returns true if the policy is active for a layout of `n` objects.
    pub fn applies_to(&self, n: usize) -> bool {
        n >= self.min_n
    }
}

/// Configuration for one packing run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PackConfig {
    /// Circle radius shared by all objects.
    pub radius: f64,

    /// Number of optimizer steps (hard cap).
    pub steps: usize,

    /// Base learning rate.
    pub learning_rate: f64,

    /// Random seed. `None` draws one and records it in the result.
    pub seed: Option<u64>,

    /// Overlap penalty weight λ.
    pub penalty_weight: f64,

    /// Starting layout policy.
    pub initialization: Initialization,

    /// Learning-rate schedule.
    pub schedule: StepSchedule,

    /// Adam hyperparameters.
    pub adam: AdamParams,

    /// Diagnostics cadence in steps (0 = only the final state).
    pub report_every: usize,

    /// Optional early-stop policy.
    pub early_stop: Option<EarlyStop>,

    /// Return the lowest-objective snapshot instead of the final positions.
    pub keep_best: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            steps: 1000,
            learning_rate: 0.1,
            seed: None,
            penalty_weight: DEFAULT_PENALTY_WEIGHT,
            initialization: Initialization::default(),
            schedule: StepSchedule::default(),
            adam: AdamParams::default(),
            report_every: 200,
            early_stop: None,
            keep_best: false,
        }
    }
}

impl PackConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the circle radius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Sets the step budget.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Sets the base learning rate.
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the overlap penalty weight.
    pub fn with_penalty_weight(mut self, weight: f64) -> Self {
        self.penalty_weight = weight;
        self
    }

    /// Sets the initialization policy.
    pub fn with_initialization(mut self, init: Initialization) -> Self {
        self.initialization = init;
        self
    }

    /// Sets the learning-rate schedule.
    pub fn with_schedule(mut self, schedule: StepSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sets the diagnostics cadence.
    pub fn with_report_every(mut self, steps: usize) -> Self {
        self.report_every = steps;
        self
    }

    /// Enables early stopping.
    pub fn with_early_stop(mut self, early_stop: EarlyStop) -> Self {
        self.early_stop = Some(early_stop);
        self
    }

    /// Returns the best snapshot instead of the final positions.
    pub fn with_keep_best(mut self, keep_best: bool) -> Self {
        self.keep_best = keep_best;
        self
    }

    /// Checks everything except the step budget.
    pub(crate) fn validate_layout(&self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(Error::config("n must be at least 1"));
        }
        positive("radius", self.radius)?;
        positive("penalty weight", self.penalty_weight)?;
        self.initialization.validate()
    }

    /// Rejects configurations that cannot start a run of `n` objects.
    pub fn validate(&self, n: usize) -> Result<()> {
        self.validate_layout(n)?;
        if self.steps == 0 {
            return Err(Error::config("steps must be at least 1"));
        }
        positive("learning rate", self.learning_rate)?;
        self.schedule.validate()?;

        let AdamParams { beta1, beta2, eps } = self.adam;
        if !(0.0..1.0).contains(&beta1) || !(0.0..1.0).contains(&beta2) {
            return Err(Error::config(format!(
                "adam betas must be in [0, 1), got ({}, {})",
                beta1, beta2
            )));
        }
        positive("adam eps", eps)?;

        if let Some(es) = &self.early_stop {
            if es.patience == 0 {
                return Err(Error::config("early-stop patience must be at least 1"));
            }
            if !(es.tolerance >= 0.0 && es.tolerance.is_finite()) {
                return Err(Error::config(format!(
                    "early-stop tolerance must be non-negative, got {}",
                    es.tolerance
                )));
            }
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{} must be positive and finite, got {}",
            name, value
        )))
    }
}

/// Progress callback for long-running batches.
pub type ProgressCallback = Box<dyn Fn(PackProgress) + Send + Sync>;

/// Snapshot emitted at the reporting cadence.
#[derive(Debug, Clone)]
pub struct PackProgress {
    /// Number of objects.
    pub n: usize,
    /// Current step.
    pub step: usize,
    /// Step budget.
    pub total_steps: usize,
    /// Learning rate used for this step.
    pub learning_rate: f64,
    /// Objective at this step.
    pub breakdown: ObjectiveBreakdown,
    /// Lowest objective so far.
    pub best_objective: f64,
    /// Time since the run started.
    pub elapsed: Duration,
    /// False on the final report.
    pub running: bool,
}

impl PackProgress {
    /// Fraction of the budget consumed (0.0 to 1.0).
    pub fn progress_percent(&self) -> f64 {
        if self.total_steps > 0 {
            self.step as f64 / self.total_steps as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PackConfig::default();
        assert!(config.validate(1).is_ok());
        assert!(config.validate(200).is_ok());
        assert_eq!(config.radius, 0.5);
        assert_eq!(config.report_every, 200);
    }

    #[test]
    fn test_builder() {
        let config = PackConfig::new()
            .with_radius(1.0)
            .with_steps(50)
            .with_learning_rate(0.01)
            .with_seed(9)
            .with_penalty_weight(500.0)
            .with_keep_best(true);

        assert_eq!(config.radius, 1.0);
        assert_eq!(config.steps, 50);
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.penalty_weight, 500.0);
        assert!(config.keep_best);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(PackConfig::default().validate(0).is_err());
        assert!(PackConfig::default().with_radius(0.0).validate(3).is_err());
        assert!(PackConfig::default().with_radius(-1.0).validate(3).is_err());
        assert!(PackConfig::default().with_steps(0).validate(3).is_err());
        assert!(PackConfig::default()
            .with_learning_rate(0.0)
            .validate(3)
            .is_err());
        assert!(PackConfig::default()
            .with_learning_rate(f64::INFINITY)
            .validate(3)
            .is_err());
        assert!(PackConfig::default()
            .with_penalty_weight(f64::NAN)
            .validate(3)
            .is_err());
        assert!(PackConfig::default()
            .with_early_stop(EarlyStop {
                patience: 0,
                ..Default::default()
            })
            .validate(3)
            .is_err());
    }

    #[test]
    fn test_error_is_config_error() {
        let err = PackConfig::default().with_radius(0.0).validate(1).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_early_stop_applies_to() {
        let es = EarlyStop::default();
        assert!(!es.applies_to(10));
        assert!(es.applies_to(50));
    }

    #[test]
    fn test_progress_percent() {
        let progress = PackProgress {
            n: 3,
            step: 25,
            total_steps: 100,
            learning_rate: 0.1,
            breakdown: ObjectiveBreakdown::default(),
            best_objective: 0.0,
            elapsed: Duration::ZERO,
            running: true,
        };
        assert_eq!(progress.progress_percent(), 0.25);
    }
}
