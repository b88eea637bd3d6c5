//! Paceline core data models.
//!
//! This crate defines the task list, the progress log and the derived
//! statistics that the analytics engine produces from them.

#![warn(missing_docs)]

// Identities
mod id;

// Input data
mod task;
mod progress_record;
mod log;

// Derived data
mod stats;
mod workload;

pub mod time;

// Re-exports
pub use id::TaskName;

pub use task::{Task, TaskState};
pub use progress_record::{ProgressRecord, DurationUnit};
pub use log::{ProgressLog, LogError, Result};

pub use stats::{TaskStats, TotalStats};
pub use workload::{WorkloadPoint, WorkloadHistory, DeadlineConstraint, EnvelopeNode};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
