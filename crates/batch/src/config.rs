//! Batch configuration.
//!
//! Loadable from TOML; every field has a default, so a file only needs the
//! values it changes:
//!
//! ```toml
//! min_n = 1
//! max_n = 50
//! output = "layouts.csv"
//!
//! [pack]
//! steps = 2000
//! seed = 42
//! ```

use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use u_circlepack_core::PackConfig;

/// Default overlap tolerance used to flag unresolved layouts.
pub const DEFAULT_OVERLAP_TOLERANCE: f64 = 0.05;

/// Configuration for a batch over a range of N.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Smallest N (inclusive).
    pub min_n: usize,

    /// Largest N (inclusive).
    pub max_n: usize,

    /// When set, only `min_n`, multiples of `stride`, and `max_n` are run.
    pub stride: Option<usize>,

    /// Worker threads (0 = rayon default).
    pub threads: usize,

    /// CSV output path.
    pub output: PathBuf,

    /// Optional JSON report path.
    pub json: Option<PathBuf>,

    /// Layouts whose closest pair is nearer than `2r - overlap_tolerance`
    /// are reported as unresolved.
    pub overlap_tolerance: f64,

    /// Per-run optimizer settings. With a seed set, N runs with `seed + N`.
    pub pack: PackConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_n: 1,
            max_n: 200,
            stride: None,
            threads: 0,
            output: PathBuf::from("submission.csv"),
            json: None,
            overlap_tolerance: DEFAULT_OVERLAP_TOLERANCE,
            pack: PackConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inclusive N range.
    pub fn with_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.min_n = min_n;
        self.max_n = max_n;
        self
    }

    /// Restricts the range to `min_n`, multiples of `stride`, and `max_n`.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }

    /// Sets the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the CSV output path.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    /// Sets the JSON report path.
    pub fn with_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.json = Some(path.into());
        self
    }

    /// Sets the per-run optimizer settings.
    pub fn with_pack(mut self, pack: PackConfig) -> Self {
        self.pack = pack;
        self
    }

    /// Loads a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, BatchError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, BatchError> {
        Ok(toml::from_str(content)?)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, BatchError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// N values to run, in increasing order.
    pub fn selected_n(&self) -> Vec<usize> {
        (self.min_n..=self.max_n)
            .filter(|&n| match self.stride {
                Some(stride) if stride > 0 => {
                    n == self.min_n || n == self.max_n || n % stride == 0
                }
                _ => true,
            })
            .collect()
    }

    /// Optimizer settings for one N, with the seed offset by N.
    pub fn pack_config_for(&self, n: usize) -> PackConfig {
        let mut pack = self.pack.clone();
        pack.seed = pack.seed.map(|seed| seed.wrapping_add(n as u64));
        pack
    }

    /// Rejects ranges and settings that cannot start a batch.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.min_n == 0 {
            return Err(BatchError::InvalidConfig("min_n must be at least 1".into()));
        }
        if self.min_n > self.max_n {
            return Err(BatchError::InvalidConfig(format!(
                "min_n ({}) exceeds max_n ({})",
                self.min_n, self.max_n
            )));
        }
        if self.stride == Some(0) {
            return Err(BatchError::InvalidConfig("stride must be at least 1".into()));
        }
        if !(self.overlap_tolerance >= 0.0 && self.overlap_tolerance.is_finite()) {
            return Err(BatchError::InvalidConfig(format!(
                "overlap_tolerance must be non-negative, got {}",
                self.overlap_tolerance
            )));
        }
        self.pack.validate(self.min_n)?;
        Ok(())
    }
}
