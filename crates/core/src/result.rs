//! Packing result representation.

use crate::geometry::Layout;
use crate::objective::ObjectiveBreakdown;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Termination {
    /// The full step budget was used.
    #[default]
    BudgetExhausted,
    /// The early-stop policy fired.
    Converged,
    /// The cancel handle was set.
    Cancelled,
}

/// Objective breakdown recorded at the reporting cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryEntry {
    /// Step at which the objective was evaluated.
    pub step: usize,
    /// Objective components at that step.
    pub breakdown: ObjectiveBreakdown,
}

/// Result of one packing run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackResult {
    /// Returned layout (final positions, or the best snapshot with `keep_best`).
    pub layout: Layout,

    /// Objective breakdown of `layout`.
    pub breakdown: ObjectiveBreakdown,

    /// Lowest objective observed during the run.
    pub best_objective: f64,

    /// Step at which `best_objective` was observed.
    pub best_step: usize,

    /// Number of optimizer updates applied.
    pub steps_run: usize,

    /// Why the run stopped.
    pub termination: Termination,

    /// Seed used for the initial layout (`None` for caller-supplied starts).
    pub seed: Option<u64>,

    /// Objective at each reporting step, plus the final state.
    pub history: Vec<HistoryEntry>,

    /// Wall-clock time.
    pub elapsed: Duration,
}

impl PackResult {
    /// Number of objects.
    pub fn n(&self) -> usize {
        self.layout.n()
    }

    /// Enclosure side of the returned layout.
    pub fn enclosure_side(&self) -> f64 {
        self.breakdown.enclosure_side
    }

    /// Side of the square enclosing the discs (`side + 2r`).
    pub fn padded_side(&self) -> f64 {
        self.layout.padded_side()
    }

    /// True if no two circles are closer than `2r - tolerance`.
    ///
    /// A false value after a full budget means the run did not converge to a
    /// feasible layout; callers may retry with more steps or another seed.
    pub fn is_overlap_free(&self, tolerance: f64) -> bool {
        self.layout.is_overlap_free(tolerance)
    }

    /// Returns true if the run was not cancelled.
    pub fn completed_normally(&self) -> bool {
        self.termination != Termination::Cancelled
    }

    /// Objective values of the history, in step order.
    pub fn objective_history(&self) -> Vec<f64> {
        self.history.iter().map(|h| h.breakdown.total).collect()
    }

    /// Computation time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Compact per-run summary for reports.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackSummary {
    /// Number of objects.
    pub n: usize,
    /// Enclosure side over centers.
    pub enclosure_side: f64,
    /// Side including the circle radius.
    pub padded_side: f64,
    /// Final Σ overlap².
    pub overlap_sum_sq: f64,
    /// Pairs still overlapping.
    pub overlapping_pairs: usize,
    /// Optimizer updates applied.
    pub steps_run: usize,
    /// Why the run stopped.
    pub termination: Termination,
    /// Seed used.
    pub seed: Option<u64>,
    /// Computation time in milliseconds.
    pub time_ms: u64,
}

impl From<&PackResult> for PackSummary {
    fn from(result: &PackResult) -> Self {
        Self {
            n: result.n(),
            enclosure_side: result.enclosure_side(),
            padded_side: result.padded_side(),
            overlap_sum_sq: result.breakdown.overlap_sum_sq,
            overlapping_pairs: result.breakdown.overlapping_pairs,
            steps_run: result.steps_run,
            termination: result.termination,
            seed: result.seed,
            time_ms: result.elapsed_ms(),
        }
    }
}
