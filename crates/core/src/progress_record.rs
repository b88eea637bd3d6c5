//! Progress record model - one timestamped observation of a task.

use serde::{Deserialize, Serialize};
use crate::id::TaskName;
use crate::Time;

/// A progress record says: "after `active_duration` of effort, task `name`
/// reached `cumulative_done` at `time`".
///
/// Records without an active duration are plain checkpoints. They still
/// bound the interval of the next record but carry no effort of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// When the observation was made
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: Time,

    /// Task this record belongs to
    pub name: TaskName,

    /// Cumulative quantity done at `time`
    #[serde(alias = "done")]
    pub cumulative_done: f64,

    /// Effort spent since the previous record, in the log's duration unit
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "active")]
    pub active_duration: Option<f64>,
}

impl ProgressRecord {
    /// Create a checkpoint record with no attributed effort.
    pub fn new(name: impl Into<TaskName>, time: Time, cumulative_done: f64) -> Self {
        Self {
            time,
            name: name.into(),
            cumulative_done,
            active_duration: None,
        }
    }

    /// Attribute an active duration to this record.
    pub fn with_active(mut self, duration: f64) -> Self {
        self.active_duration = Some(duration);
        self
    }

    /// Active duration converted to hours.
    ///
    /// Returns `None` for checkpoints and for non-positive durations, which
    /// carry no usable effort.
    pub fn active_hours(&self, unit: DurationUnit) -> Option<f64> {
        self.active_duration
            .filter(|d| *d > 0.0)
            .map(|d| d * unit.hours())
    }
}

/// Unit in which a log expresses active durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    /// Durations are hours
    Hours,
    /// Durations are days
    #[default]
    Days,
}

impl DurationUnit {
    /// Number of hours in one unit.
    pub fn hours(&self) -> f64 {
        match self {
            DurationUnit::Hours => 1.0,
            DurationUnit::Days => 24.0,
        }
    }
}

impl std::str::FromStr for DurationUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "h" | "hour" | "hours" => Ok(DurationUnit::Hours),
            "d" | "day" | "days" => Ok(DurationUnit::Days),
            other => Err(format!("unknown duration unit: {other}")),
        }
    }
}
