//! Log sources for paceline.
//!
//! This crate provides a trait-based ingestion interface with a JSON file
//! reference implementation. Sources hand back validated
//! [`ProgressLog`](paceline_core::ProgressLog) snapshots; the engine never
//! touches I/O itself.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;

pub use trait_::{LogSource, StorageError, Result};
pub use json_storage::{JsonLogStorage, LogDocument};
