//! Validated snapshot of the task list and progress log.
//!
//! Every engine operation works against a [`ProgressLog`]. Building one is
//! the only place records get checked and sorted, so downstream code can rely
//! on each task's history being in ascending time order.

use std::collections::HashMap;

use serde::Serialize;
use crate::id::TaskName;
use crate::progress_record::ProgressRecord;
use crate::task::Task;
use crate::Time;

/// Error type for log validation.
pub type Result<T> = std::result::Result<T, LogError>;

/// Structural problems that make a log unusable.
///
/// Sparse or stalled data is not an error; these variants only cover input
/// that breaks the contract with the ingestion layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LogError {
    /// A progress record names a task that is not in the task list
    #[error("progress record at {time} refers to unknown task '{name}'")]
    UnknownTask {
        /// Task name on the record
        name: TaskName,
        /// Record timestamp
        time: Time,
    },

    /// A numeric field is NaN or infinite
    #[error("non-finite {field} on '{name}'{}", at_suffix(.time))]
    NonFinite {
        /// Offending field
        field: &'static str,
        /// Task name
        name: TaskName,
        /// Record timestamp, `None` for task fields
        time: Option<Time>,
    },

    /// Two tasks share a name
    #[error("duplicate task name '{name}'")]
    DuplicateTask {
        /// The repeated name
        name: TaskName,
    },
}

/// Tasks plus their progress histories, each sorted by time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressLog {
    tasks: Vec<Task>,
    histories: HashMap<TaskName, Vec<ProgressRecord>>,
}

impl ProgressLog {
    /// Validate and index a raw log.
    ///
    /// Records are grouped per task and sorted ascending by time. Records
    /// sharing a timestamp keep their input order.
    pub fn new(tasks: Vec<Task>, records: Vec<ProgressRecord>) -> Result<Self> {
        let mut histories: HashMap<TaskName, Vec<ProgressRecord>> =
            HashMap::with_capacity(tasks.len());

        for task in &tasks {
            if !task.total.is_finite() {
                return Err(LogError::NonFinite {
                    field: "total",
                    name: task.name.clone(),
                    time: None,
                });
            }
            if histories.insert(task.name.clone(), Vec::new()).is_some() {
                return Err(LogError::DuplicateTask { name: task.name.clone() });
            }
        }

        for record in records {
            check_record(&record)?;
            let Some(history) = histories.get_mut(&record.name) else {
                return Err(LogError::UnknownTask {
                    name: record.name,
                    time: record.time,
                });
            };
            history.push(record);
        }

        for history in histories.values_mut() {
            history.sort_by(|a, b| a.time.cmp(&b.time));
        }

        Ok(Self { tasks, histories })
    }

    /// All tasks, in input order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task by name.
    pub fn task(&self, name: &TaskName) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.name == name)
    }

    /// A task's history in ascending time order. Empty for unknown names.
    pub fn history(&self, name: &TaskName) -> &[ProgressRecord] {
        self.histories
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The chronologically last record of a task.
    pub fn latest(&self, name: &TaskName) -> Option<&ProgressRecord> {
        self.history(name).last()
    }

    /// Cumulative quantity done, or 0 with no records.
    pub fn completed(&self, name: &TaskName) -> f64 {
        self.latest(name).map(|r| r.cumulative_done).unwrap_or(0.0)
    }

    /// Cumulative quantity done as of `at`, ignoring later records.
    pub fn completed_at(&self, name: &TaskName, at: Time) -> f64 {
        self.history(name)
            .iter()
            .take_while(|r| r.time <= at)
            .last()
            .map(|r| r.cumulative_done)
            .unwrap_or(0.0)
    }

    /// Total number of records across all tasks.
    pub fn record_count(&self) -> usize {
        self.histories.values().map(Vec::len).sum()
    }
}

fn at_suffix(time: &Option<Time>) -> String {
    time.map(|t| format!(" at {t}")).unwrap_or_default()
}

fn check_record(record: &ProgressRecord) -> Result<()> {
    let non_finite = |field| LogError::NonFinite {
        field,
        name: record.name.clone(),
        time: Some(record.time),
    };
    if !record.cumulative_done.is_finite() {
        return Err(non_finite("cumulativeDone"));
    }
    if record.active_duration.is_some_and(|d| !d.is_finite()) {
        return Err(non_finite("activeDuration"));
    }
    Ok(())
}
