//! Batch driver for U-CirclePack
//!
//! This crate provides:
//! - TOML-loadable batch configuration over a range of N
//! - Parallel execution with rayon, one independent optimizer run per N
//! - Failure isolation: a diverging N is reported, the rest still finish
//! - `id,x,y,deg` CSV output, JSON reports and an aggregate score

mod config;
mod error;
mod record;
mod result;
mod runner;

pub use config::{BatchConfig, DEFAULT_OVERLAP_TOLERANCE};
pub use error::BatchError;
pub use record::{RunRecord, CSV_HEADER};
pub use result::{BatchResult, RunFailure, RunOutcome};
pub use runner::BatchRunner;
