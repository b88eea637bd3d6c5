//! Derived per-task and aggregate statistics.
//!
//! None of these are persisted; they are recomputed from a [`ProgressLog`]
//! on every call.
//!
//! [`ProgressLog`]: crate::ProgressLog

use serde::{Deserialize, Serialize};
use crate::id::TaskName;
use crate::task::{Task, TaskState};
use crate::Time;

/// Projection for a single task.
///
/// `None` always means "unknown", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// Task name
    pub name: TaskName,

    /// Cumulative quantity of the latest record
    pub completed: f64,

    /// `total - completed`; negative when over target
    pub remaining: f64,

    /// Quantity per active hour, `None` with fewer than two records
    pub rate: Option<f64>,

    /// Active hours per calendar day, `None` with fewer than two records
    pub daily_active_time: Option<f64>,

    /// Active hours still needed, `None` while stalled
    pub remaining_time: Option<f64>,

    /// Projected completion instant, `None` while stalled
    pub estimated_completion: Option<Time>,
}

impl TaskStats {
    /// Whether the target has been reached.
    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Whether the task has no bounded remaining-time estimate.
    pub fn is_unresolved(&self) -> bool {
        !self.rate.is_some_and(|r| r > 0.0)
    }

    /// Classify the task at `now`.
    pub fn state(&self, task: &Task, has_records: bool, now: Time) -> TaskState {
        if !has_records {
            TaskState::NoData
        } else if self.is_finished() {
            TaskState::Finished
        } else if task.is_past_deadline(now) {
            TaskState::Overdue
        } else {
            TaskState::InProgress
        }
    }
}

/// Aggregate projection across every task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalStats {
    /// Sum of positive per-task daily active times, in hours per day
    pub total_daily_active_time: f64,

    /// Sum of remaining active hours over tasks with a positive rate
    pub total_remaining_time: f64,

    /// When all resolvable work is projected to finish
    pub estimated_completion: Option<Time>,

    /// Tasks without forward progress, excluded from the totals above
    pub unresolved_task_count: usize,
}
