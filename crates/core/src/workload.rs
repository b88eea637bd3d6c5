//! Aggregate workload series shared by the engine and its consumers.

use serde::{Deserialize, Serialize};
use crate::id::TaskName;
use crate::Time;

/// One point of the aggregate work series.
///
/// Work is measured in hours at each task's current rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadPoint {
    /// Observation instant
    pub time: Time,

    /// Work hours completed up to and including `time`
    pub completed_work_hours: f64,

    /// Work hours still outstanding after `time`
    pub remaining_work_hours: f64,
}

/// The aggregate work series plus its grand total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadHistory {
    /// Work hours for every contributing task combined
    pub total_work_hours: f64,

    /// Chronological points
    pub points: Vec<WorkloadPoint>,
}

impl WorkloadHistory {
    /// The most recent point, if any.
    pub fn last(&self) -> Option<&WorkloadPoint> {
        self.points.last()
    }

    /// Work completed as of `at`.
    pub fn completed_at(&self, at: Time) -> f64 {
        self.points
            .iter()
            .take_while(|p| p.time <= at)
            .last()
            .map(|p| p.completed_work_hours)
            .unwrap_or(0.0)
    }
}

/// One deadline's contribution to the feasibility envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineConstraint {
    /// Task the constraint comes from
    pub name: TaskName,

    /// Deadline
    pub deadline: Time,

    /// Work hours the task needs in total
    pub required_work_hours: f64,
}

/// A node of the piecewise-linear minimum-pace schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeNode {
    /// Deadline instant, or the schedule origin for the first node
    pub time: Time,

    /// Work hours that must be done by `time`
    pub cumulative_required_work_hours: f64,

    /// Whether the node is a vertex of the reduced envelope
    pub is_key_point: bool,
}
