//! Parallel batch runner.

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::result::BatchResult;
use instant::Instant;
use rayon::prelude::*;
use u_circlepack_core::{baseline_layout, Initialization, PackResult, PackRunner};

/// How each N is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Optimize,
    Baseline,
}

/// Runs the optimizer for every selected N.
pub struct BatchRunner {
    config: BatchConfig,
}

impl BatchRunner {
    /// Creates a new batch runner.
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Optimizes every selected N in parallel.
    ///
    /// Per-N failures are collected in the result; only configuration and
    /// thread-pool errors abort the batch.
    pub fn run(&self) -> Result<BatchResult, BatchError> {
        self.execute(Mode::Optimize)
    }

    /// Produces the deterministic line layout for every selected N.
    pub fn run_baseline(&self) -> Result<BatchResult, BatchError> {
        self.execute(Mode::Baseline)
    }

    /// Runs a single N with the batch settings.
    pub fn run_one(&self, n: usize) -> u_circlepack_core::Result<PackResult> {
        self.solve(n, Mode::Optimize)
    }

    fn execute(&self, mode: Mode) -> Result<BatchResult, BatchError> {
        self.config.validate()?;
        let ns = self.config.selected_n();
        log::info!(
            "packing {} layouts (n={}..={}) with {} steps each",
            ns.len(),
            self.config.min_n,
            self.config.max_n,
            if mode == Mode::Baseline { 0 } else { self.config.pack.steps }
        );

        let start = Instant::now();
        let outcomes = if self.config.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()?;
            pool.install(|| self.solve_all(&ns, mode))
        } else {
            self.solve_all(&ns, mode)
        };
        let time_ms = start.elapsed().as_millis() as u64;

        let result = BatchResult::from_outcomes(outcomes, self.config.overlap_tolerance, time_ms);
        for n in result.unresolved() {
            log::warn!("n={}: layout still overlaps after the full budget", n);
        }
        log::info!(
            "batch finished: {} ok, {} failed, score {:.4} in {}ms",
            result.runs.len(),
            result.failures.len(),
            result.score(),
            time_ms
        );
        Ok(result)
    }

    fn solve_all(
        &self,
        ns: &[usize],
        mode: Mode,
    ) -> Vec<(usize, u_circlepack_core::Result<PackResult>)> {
        ns.par_iter().map(|&n| (n, self.solve(n, mode))).collect()
    }

    fn solve(&self, n: usize, mode: Mode) -> u_circlepack_core::Result<PackResult> {
        let pack = self.config.pack_config_for(n);
        let outcome = match mode {
            Mode::Optimize => PackRunner::new(pack).run(n),
            Mode::Baseline => baseline_layout(n, &pack.with_initialization(Initialization::line())),
        };

        match &outcome {
            Ok(result) => log::info!(
                "n={}: side={:.4} overlap={:.2e} steps={} ({}ms)",
                n,
                result.enclosure_side(),
                result.breakdown.overlap_sum_sq,
                result.steps_run,
                result.elapsed_ms()
            ),
            Err(e) => log::warn!("n={}: run failed: {}", n, e),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use u_circlepack_core::PackConfig;

    fn small_batch() -> BatchConfig {
        BatchConfig::new()
            .with_range(1, 5)
            .with_threads(2)
            .with_pack(PackConfig::new().with_steps(100).with_seed(7))
    }

    #[test]
    fn test_run_produces_all_records() {
        let result = BatchRunner::new(small_batch()).run().unwrap();

        assert_eq!(result.runs.len(), 5);
        assert!(result.failures.is_empty());

        let ids: Vec<String> = result.records().iter().map(|r| r.id()).collect();
        assert_eq!(ids.len(), 15);
        assert_eq!(ids[0], "1_0");
        assert_eq!(ids[1], "2_0");
        assert_eq!(ids[14], "5_4");
    }

    #[test]
    fn test_records_are_non_negative() {
        let result = BatchRunner::new(small_batch()).run().unwrap();
        assert!(result.records().iter().all(|r| r.x >= 0.0 && r.y >= 0.0));
    }

    #[test]
    fn test_thread_count_does_not_change_layouts() {
        let one = BatchRunner::new(small_batch().with_threads(1)).run().unwrap();
        let four = BatchRunner::new(small_batch().with_threads(4)).run().unwrap();
        assert_eq!(one.records(), four.records());
    }

    #[test]
    fn test_run_one_matches_batch() {
        let runner = BatchRunner::new(small_batch());
        let single = runner.run_one(4).unwrap().layout.normalized();
        let batch = runner.run().unwrap();
        assert_eq!(batch.runs[3].layout, single);
    }

    #[test]
    fn test_baseline() {
        let result = BatchRunner::new(small_batch()).run_baseline().unwrap();

        let last = &result.runs[4];
        assert_eq!(last.summary.steps_run, 0);
        assert_eq!(last.layout.enclosure_side(), 8.0);
        assert!(result.unresolved().is_empty());
    }

    #[test]
    fn test_invalid_config_aborts() {
        let runner = BatchRunner::new(small_batch().with_range(3, 2));
        assert!(matches!(runner.run(), Err(BatchError::InvalidConfig(_))));
    }
}
