//! Step-size schedules for the descent loop.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the learning rate evolves over a run.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum StepSchedule {
    /// Fixed learning rate.
    #[default]
    Constant,
    /// `lr · decay^step`.
    Exponential {
        /// Per-step multiplier in (0, 1].
        decay: f64,
    },
    /// Cosine annealing from `lr` down to `lr · min_factor` at the last step.
    Cosine {
        /// Final fraction of the base rate.
        min_factor: f64,
    },
    /// Piecewise constant: multiplied by `factor` at every milestone step.
    Staged {
        /// Steps at which the rate drops.
        milestones: Vec<usize>,
        /// Multiplier applied at each milestone.
        factor: f64,
    },
}

impl StepSchedule {
    /// Learning rate for `step` of a run with `total_steps` steps.
    pub fn rate(&self, base: f64, step: usize, total_steps: usize) -> f64 {
        match self {
            Self::Constant => base,
            Self::Exponential { decay } => base * decay.powf(step as f64),
            Self::Cosine { min_factor } => {
                let span = total_steps.saturating_sub(1).max(1) as f64;
                let t = (step as f64 / span).min(1.0);
                let cos = 0.5 * (1.0 + (std::f64::consts::PI * t).cos());
                base * (min_factor + (1.0 - min_factor) * cos)
            }
            Self::Staged { milestones, factor } => {
                let passed = milestones.iter().filter(|&&m| step >= m).count();
                base * factor.powi(passed as i32)
            }
        }
    }

    /// Checks the schedule parameters.
    pub fn validate(&self) -> crate::Result<()> {
        match self {
            Self::Constant => Ok(()),
            Self::Exponential { decay } => {
                if *decay > 0.0 && *decay <= 1.0 {
                    Ok(())
                } else {
                    Err(crate::Error::config(format!(
                        "exponential decay must be in (0, 1], got {}",
                        decay
                    )))
                }
            }
            Self::Cosine { min_factor } => {
                if (0.0..=1.0).contains(min_factor) {
                    Ok(())
                } else {
                    Err(crate::Error::config(format!(
                        "cosine min_factor must be in [0, 1], got {}",
                        min_factor
                    )))
                }
            }
            Self::Staged { factor, .. } => {
                if *factor > 0.0 && factor.is_finite() {
                    Ok(())
                } else {
                    Err(crate::Error::config(format!(
                        "staged factor must be positive, got {}",
                        factor
                    )))
                }
            }
        }
    }
}
