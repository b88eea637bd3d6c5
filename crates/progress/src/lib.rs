//! Progress analytics engine.
//!
//! Rate estimation, per-task projections, and the multi-task workload
//! feasibility envelope. Every entry point is a pure function of a
//! [`ProgressLog`](paceline_core::ProgressLog) snapshot and a reference instant.

#![warn(missing_docs)]

pub mod config;
pub mod estimator;
pub mod projector;
pub mod envelope;
pub mod workload;

pub use config::{EngineConfig, ConfigError};
pub use estimator::{RateEstimator, RateEstimate, Attribution};
pub use projector::{TaskProjector, ProjectionSnapshot};
pub use envelope::{Envelope, Binding};
pub use workload::{WorkloadAggregator, WorkloadReport, PaceCheck, SafeLine};
