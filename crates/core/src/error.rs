//! Error types for circle packing.

use thiserror::Error;

/// Errors produced while configuring or running an optimization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A configuration value is out of range (non-positive N, radius, steps, ...).
    ///
    /// Raised before any optimization step is taken.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The objective or its gradient became NaN or infinite.
    ///
    /// The run for this N is aborted; other runs are unaffected.
    #[error("non-finite objective for n={n} at step {step}: {detail}")]
    NonFinite {
        /// Number of objects in the failed run.
        n: usize,
        /// Step at which the non-finite value was observed.
        step: usize,
        /// Which quantity went non-finite.
        detail: String,
    },

    /// A warm start was requested with no positions.
    #[error("initial layout is empty")]
    EmptyLayout,
}

impl Error {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Returns true for numerical failures (as opposed to rejected input).
    pub fn is_numerical(&self) -> bool {
        matches!(self, Error::NonFinite { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
