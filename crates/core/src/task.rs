//! Task model - a long-running, quantity-based target with a deadline.

use serde::{Deserialize, Serialize};
use crate::id::TaskName;
use crate::Time;

/// A task is a target quantity to reach between a start time and a deadline.
///
/// Tasks are immutable for the duration of a computation pass; the
/// ingestion layer owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique name, referenced by progress records
    pub name: TaskName,

    /// Target quantity
    pub total: f64,

    /// When work on the task may begin
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: Time,

    /// Deadline
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: Time,

    /// Display hint, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Task {
    /// Create a new task.
    pub fn new(name: impl Into<TaskName>, total: f64, start_time: Time, end_time: Time) -> Self {
        Self {
            name: name.into(),
            total,
            start_time,
            end_time,
            color: None,
        }
    }

    /// Attach a display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Whether the deadline lies strictly after the start.
    ///
    /// Tasks failing this check are left out of the feasibility envelope.
    pub fn has_valid_window(&self) -> bool {
        self.end_time > self.start_time
    }

    /// Whether the deadline has passed at `now`.
    pub fn is_past_deadline(&self, now: Time) -> bool {
        now >= self.end_time
    }
}

/// Where a task stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// No progress has been recorded yet
    NoData,
    /// Progress recorded, target not reached, deadline not passed
    InProgress,
    /// Target not reached and the deadline has passed
    Overdue,
    /// Target reached or exceeded
    Finished,
}

impl TaskState {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::NoData => "no-data",
            TaskState::InProgress => "in-progress",
            TaskState::Overdue => "overdue",
            TaskState::Finished => "finished",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_task_wire_format_uses_millisecond_timestamps() {
        let json =
            r##"{"name":"novel","total":300,"startTime":0,"endTime":86400000,"color":"#ff0000"}"##;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.name.as_str(), "novel");
        assert_eq!(task.total, 300.0);
        assert_eq!(task.start_time, Utc.timestamp_opt(0, 0).unwrap());
        assert_eq!(task.end_time - task.start_time, Duration::days(1));
        assert_eq!(task.color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_valid_window() {
        let start = Utc.timestamp_opt(1_000, 0).unwrap();
        assert!(Task::new("a", 1.0, start, start + Duration::hours(1)).has_valid_window());
        assert!(!Task::new("b", 1.0, start, start).has_valid_window());
        assert!(!Task::new("c", 1.0, start, start - Duration::hours(1)).has_valid_window());
    }

    #[test]
    fn test_past_deadline_is_inclusive() {
        let start = Utc.timestamp_opt(0, 0).unwrap();
        let end = start + Duration::days(2);
        let task = Task::new("a", 1.0, start, end);
        assert!(!task.is_past_deadline(end - Duration::seconds(1)));
        assert!(task.is_past_deadline(end));
    }
}
