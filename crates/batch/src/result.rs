//! Batch result types and output.

use crate::error::BatchError;
use crate::record::{RunRecord, CSV_HEADER};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use u_circlepack_core::{Layout, PackResult, PackSummary};

/// A finished run for one N.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Layout translated to non-negative coordinates.
    pub layout: Layout,
    /// Run statistics.
    pub summary: PackSummary,
    /// True if the layout still overlaps beyond the batch tolerance.
    pub unresolved: bool,
}

/// A run that produced no layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    /// Layout size.
    pub n: usize,
    /// Error message.
    pub error: String,
    /// True for NaN/Inf failures, false for rejected input.
    pub numerical: bool,
}

/// Results of a batch, ordered by N.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    /// Successful runs.
    pub runs: Vec<RunOutcome>,
    /// Failed runs; these produce no records.
    pub failures: Vec<RunFailure>,
    /// Tolerance used to flag unresolved layouts.
    pub overlap_tolerance: f64,
    /// Wall-clock time of the whole batch.
    pub time_ms: u64,
}

impl BatchResult {
    /// Builds a result from per-N outcomes.
    ///
    /// Successful layouts are normalized to non-negative coordinates and the
    /// runs are sorted by N.
    pub fn from_outcomes(
        outcomes: Vec<(usize, u_circlepack_core::Result<PackResult>)>,
        overlap_tolerance: f64,
        time_ms: u64,
    ) -> Self {
        let mut runs = Vec::new();
        let mut failures = Vec::new();

        for (n, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    let summary = PackSummary::from(&result);
                    let layout = result.layout.normalized();
                    let unresolved = !layout.is_overlap_free(overlap_tolerance);
                    runs.push(RunOutcome {
                        layout,
                        summary,
                        unresolved,
                    });
                }
                Err(e) => failures.push(RunFailure {
                    n,
                    numerical: e.is_numerical(),
                    error: e.to_string(),
                }),
            }
        }

        runs.sort_by_key(|r| r.layout.n());
        failures.sort_by_key(|f| f.n);

        Self {
            runs,
            failures,
            overlap_tolerance,
            time_ms,
        }
    }

    /// Output rows, N blocks in increasing order.
    pub fn records(&self) -> Vec<RunRecord> {
        self.runs
            .iter()
            .flat_map(|r| RunRecord::from_layout(&r.layout))
            .collect()
    }

    /// Aggregate score: Σ padded_side² / N over successful runs.
    pub fn score(&self) -> f64 {
        self.runs
            .iter()
            .map(|r| {
                let side = r.layout.padded_side();
                side * side / r.layout.n() as f64
            })
            .sum()
    }

    /// N values whose final layout still overlaps beyond tolerance.
    pub fn unresolved(&self) -> Vec<usize> {
        self.runs
            .iter()
            .filter(|r| r.unresolved)
            .map(|r| r.layout.n())
            .collect()
    }

    /// Returns true if every N produced an overlap-free layout.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.runs.iter().all(|r| !r.unresolved)
    }

    /// Writes the `id,x,y,deg` table.
    pub fn write_csv<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", CSV_HEADER)?;
        for record in self.records() {
            record.write_csv_row(out)?;
        }
        Ok(())
    }

    /// Saves the `id,x,y,deg` table to a file.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<(), BatchError> {
        let mut file = BufWriter::new(File::create(path)?);
        self.write_csv(&mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Saves the full report as JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), BatchError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Prints a summary table to stdout.
    pub fn print_summary(&self) {
        println!("\n{:=<80}", "");
        println!("CIRCLE PACKING RESULTS");
        println!("{:=<80}", "");
        println!(
            "{:>5} {:>12} {:>12} {:>12} {:>8} {:>10}",
            "N", "Side", "Padded", "Overlap²", "Steps", "Time(ms)"
        );
        println!("{:-<80}", "");

        for run in &self.runs {
            let s = &run.summary;
            println!(
                "{:>5} {:>12.4} {:>12.4} {:>12.2e} {:>8} {:>10}{}",
                s.n,
                s.enclosure_side,
                s.padded_side,
                s.overlap_sum_sq,
                s.steps_run,
                s.time_ms,
                if run.unresolved { "  (overlap)" } else { "" }
            );
        }

        if !self.failures.is_empty() {
            println!("{:-<80}", "");
            for failure in &self.failures {
                println!("{:>5} FAILED: {}", failure.n, failure.error);
            }
        }

        println!("{:-<80}", "");
        println!(
            "runs={} failed={} unresolved={} score={:.4} time={}ms",
            self.runs.len(),
            self.failures.len(),
            self.unresolved().len(),
            self.score(),
            self.time_ms
        );
        println!("{:=<80}\n", "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;
    use u_circlepack_core::{Error, PackConfig, PackRunner};

    fn run_from(positions: Vec<Point2<f64>>) -> u_circlepack_core::Result<PackResult> {
        // One negligible step, so the layout stays where it was placed.
        PackRunner::new(PackConfig::new().with_steps(1).with_learning_rate(1e-9))
            .run_from(positions)
    }

    #[test]
    fn test_from_outcomes_sorts_and_normalizes() {
        let outcomes = vec![
            (
                2,
                run_from(vec![Point2::new(-3.0, 5.0), Point2::new(-1.0, 5.0)]),
            ),
            (1, run_from(vec![Point2::new(4.0, -2.0)])),
        ];
        let result = BatchResult::from_outcomes(outcomes, 0.05, 7);

        assert_eq!(result.runs.len(), 2);
        assert_eq!(result.runs[0].layout.n(), 1);
        assert_eq!(result.runs[1].layout.n(), 2);
        for run in &result.runs {
            let bb = run.layout.bounding_box().unwrap();
            assert_relative_eq!(bb.min_x, 0.0);
            assert_relative_eq!(bb.min_y, 0.0);
        }

        let ids: Vec<String> = result.records().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["1_0", "2_0", "2_1"]);
    }

    #[test]
    fn test_score() {
        let outcomes = vec![
            (1, run_from(vec![Point2::new(0.0, 0.0)])),
            (
                2,
                run_from(vec![Point2::new(0.0, 0.0), Point2::new(2.0, 0.0)]),
            ),
        ];
        let result = BatchResult::from_outcomes(outcomes, 0.05, 0);

        // N=1: padded side 1 -> 1/1; N=2: padded side ~3 -> ~9/2
        assert_relative_eq!(result.score(), 1.0 + 4.5, epsilon = 1e-6);
        assert!(result.unresolved().is_empty());
        assert!(result.is_complete());
    }

    #[test]
    fn test_failures_produce_no_records() {
        let outcomes = vec![
            (1, run_from(vec![Point2::new(0.0, 0.0)])),
            (
                3,
                Err(Error::NonFinite {
                    n: 3,
                    step: 4,
                    detail: "objective".into(),
                }),
            ),
        ];
        let result = BatchResult::from_outcomes(outcomes, 0.05, 0);

        assert_eq!(result.records().len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].n, 3);
        assert!(result.failures[0].numerical);
        assert!(!result.is_complete());
    }

    #[test]
    fn test_unresolved_overlap() {
        let outcomes = vec![(
            2,
            run_from(vec![Point2::new(0.0, 0.0), Point2::new(0.3, 0.0)]),
        )];
        let result = BatchResult::from_outcomes(outcomes, 0.05, 0);
        assert_eq!(result.unresolved(), vec![2]);
    }

    #[test]
    fn test_write_csv() {
        let outcomes = vec![(1, run_from(vec![Point2::new(2.0, 3.0)]))];
        let result = BatchResult::from_outcomes(outcomes, 0.05, 0);

        let mut out = Vec::new();
        result.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,x,y,deg\n1_0,0,0,0.0\n");
    }

    #[test]
    fn test_save_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let outcomes = vec![(1, run_from(vec![Point2::new(0.0, 0.0)]))];
        BatchResult::from_outcomes(outcomes, 0.05, 0)
            .save_json(&path)
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["runs"][0]["summary"]["n"], 1);
        assert!(value["failures"].as_array().unwrap().is_empty());
    }
}
