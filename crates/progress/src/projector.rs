//! Per-task and aggregate projections.

use paceline_core::time::add_hours;
use paceline_core::{ProgressLog, Task, TaskStats, Time, TotalStats};
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::estimator::RateEstimator;

/// Turns a task's history into remaining-time and completion projections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskProjector {
    estimator: RateEstimator,
}

/// All projections computed at one instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSnapshot {
    /// Instant the projections refer to
    pub timestamp: Time,

    /// Per-task stats, in task-list order
    pub tasks: Vec<TaskStats>,

    /// Aggregate over all tasks
    pub total: TotalStats,
}

impl TaskProjector {
    /// Create a projector from engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            estimator: RateEstimator::new(config),
        }
    }

    /// The estimator used for rates.
    pub fn estimator(&self) -> &RateEstimator {
        &self.estimator
    }

    /// Project a single task.
    pub fn project(&self, log: &ProgressLog, task: &Task, now: Time) -> TaskStats {
        let history = log.history(&task.name);
        let completed = log.completed(&task.name);
        let remaining = task.total - completed;
        let estimate = self.estimator.estimate(history, now);

        let rate = estimate.map(|e| e.rate);
        let daily_active_time = estimate.map(|e| e.daily_active_time);

        let remaining_time = rate.filter(|r| *r > 0.0).map(|r| remaining / r);
        let estimated_completion = match (remaining_time, daily_active_time) {
            (Some(hours), Some(daily)) if daily > 0.0 => add_hours(now, hours / daily * 24.0),
            _ => None,
        };

        if remaining_time.is_none() && !history.is_empty() {
            debug!(task = %task.name, records = history.len(), "task is stalled");
        }

        TaskStats {
            name: task.name.clone(),
            completed,
            remaining,
            rate,
            daily_active_time,
            remaining_time,
            estimated_completion,
        }
    }

    /// Project every task, in task-list order.
    pub fn project_all(&self, log: &ProgressLog, now: Time) -> Vec<TaskStats> {
        log.tasks()
            .iter()
            .map(|task| self.project(log, task, now))
            .collect()
    }

    /// Aggregate projection over every task.
    pub fn total(&self, log: &ProgressLog, now: Time) -> TotalStats {
        Self::total_from(&self.project_all(log, now), now)
    }

    /// Aggregate already-computed per-task stats.
    ///
    /// Over-target tasks contribute no remaining time. Tasks without a
    /// positive rate are counted as unresolved instead of being summed.
    pub fn total_from(stats: &[TaskStats], now: Time) -> TotalStats {
        let mut total_daily_active_time = 0.0;
        let mut total_remaining_time = 0.0;
        let mut unresolved_task_count = 0;

        for s in stats {
            if let Some(daily) = s.daily_active_time.filter(|d| *d > 0.0) {
                total_daily_active_time += daily;
            }
            match s.rate.filter(|r| *r > 0.0) {
                Some(rate) => total_remaining_time += s.remaining.max(0.0) / rate,
                None => unresolved_task_count += 1,
            }
        }

        let estimated_completion = if total_daily_active_time > 0.0 {
            add_hours(now, total_remaining_time / total_daily_active_time * 24.0)
        } else {
            None
        };

        TotalStats {
            total_daily_active_time,
            total_remaining_time,
            estimated_completion,
            unresolved_task_count,
        }
    }

    /// Per-task and aggregate projections together.
    pub fn snapshot(&self, log: &ProgressLog, now: Time) -> ProjectionSnapshot {
        let tasks = self.project_all(log, now);
        let total = Self::total_from(&tasks, now);
        ProjectionSnapshot {
            timestamp: now,
            tasks,
            total,
        }
    }
}
