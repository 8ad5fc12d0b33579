//! # U-CirclePack Core
//!
//! Gradient-based packing of N identical circles into the smallest
//! axis-aligned square.
//!
//! The enclosure is measured over circle centers; overlap between circles is
//! handled by a quadratic penalty, so the whole problem is a smooth-ish
//! unconstrained minimization that a first-order method can descend.
//!
//! ## Core Components
//!
//! - **Geometry**: [`Layout`], [`BoundingBox`], [`enclosure_side`], [`pairwise_overlap`]
//! - **Objective**: [`Objective`] - `side² + λ · Σ overlap²` with its subgradient
//! - **Optimizer**: [`PackRunner`], [`optimize`] - fixed-budget Adam descent
//! - **Configuration**: [`PackConfig`], [`Initialization`], [`StepSchedule`], [`EarlyStop`]
//! - **Results**: [`PackResult`], [`PackSummary`]
//!
//! ## Example
//!
//! ```rust
//! use u_circlepack_core::{PackConfig, PackRunner};
//!
//! let config = PackConfig::new()
//!     .with_radius(0.5)
//!     .with_steps(200)
//!     .with_learning_rate(0.1)
//!     .with_seed(42);
//!
//! let result = PackRunner::new(config).run(3).unwrap();
//! assert_eq!(result.n(), 3);
//! assert!(result.enclosure_side().is_finite());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod adam;
pub mod error;
pub mod geometry;
pub mod init;
pub mod objective;
pub mod optimizer;
pub mod result;
pub mod schedule;
pub mod solver;

// Re-exports
pub use adam::{Adam, AdamParams};
pub use error::{Error, Result};
pub use geometry::{
    enclosure_side, min_pair_distance, overlap_depth, overlap_sum_squares, pairwise_overlap,
    smoothed_distance, translate_to_origin, BoundingBox, Layout, OverlapPair, PlacedCircle,
    DISTANCE_EPSILON,
};
pub use init::{Initialization, DEFAULT_SPREAD_PER_OBJECT};
pub use objective::{Objective, ObjectiveBreakdown, DEFAULT_PENALTY_WEIGHT};
pub use optimizer::{baseline_layout, optimize, PackRunner};
pub use result::{HistoryEntry, PackResult, PackSummary, Termination};
pub use schedule::StepSchedule;
pub use solver::{EarlyStop, PackConfig, PackProgress, ProgressCallback};
