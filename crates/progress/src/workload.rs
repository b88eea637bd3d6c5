//! Aggregate workload across tasks.
//!
//! Quantities of different tasks are not comparable, so everything here is
//! expressed in work hours: a task's quantity divided by its current rate.
//! Tasks without a positive rate cannot be converted and are left out.

use paceline_core::time::{add_hours, hours_between};
use paceline_core::{
    DeadlineConstraint, ProgressLog, Task, TaskStats, Time, WorkloadHistory, WorkloadPoint,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::estimator::RateEstimator;

/// A task together with the rate used to convert it to work hours.
#[derive(Debug, Clone, Copy)]
struct TaskLoad<'a> {
    task: &'a Task,
    rate: f64,
    in_envelope: bool,
}

/// Actual progress compared with the envelope at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaceCheck {
    /// Instant of the comparison
    pub time: Time,
    /// Work the envelope requires by `time`
    pub required_work_hours: f64,
    /// Work actually done by `time`
    pub completed_work_hours: f64,
    /// `completed - required`; negative when behind
    pub surplus_hours: f64,
    /// Calendar hours ahead of (positive) or behind (negative) the envelope
    pub lead_hours: f64,
}

impl PaceCheck {
    /// Whether actual work meets the requirement.
    pub fn is_on_track(&self) -> bool {
        self.surplus_hours >= 0.0
    }
}

/// Straight-line pace from a point on the actual curve to the deadline that
/// binds within a short horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeLine {
    /// Start of the line
    pub start_time: Time,
    /// Work done at the start
    pub start_work_hours: f64,
    /// End of the horizon
    pub end_time: Time,
    /// Work needed by the end of the horizon at the safe pace
    pub end_work_hours: f64,
    /// Work hours per calendar day, never negative
    pub daily_pace: f64,
    /// Deadline that sets the pace
    pub binding_deadline: Time,
}

/// Everything the workload view needs, computed at one instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadReport {
    /// Aggregate history of completed and remaining work
    pub history: WorkloadHistory,
    /// Feasibility envelope
    pub envelope: Envelope,
    /// Pace check at the report instant
    pub pace: Option<PaceCheck>,
    /// Near-term safe line from the report instant
    pub safe_line: Option<SafeLine>,
}

/// Combines every task's history into workload views.
#[derive(Debug, Clone)]
pub struct WorkloadAggregator<'a> {
    log: &'a ProgressLog,
    now: Time,
    loads: Vec<TaskLoad<'a>>,
}

impl<'a> WorkloadAggregator<'a> {
    /// Estimate each task's rate and keep the ones with forward progress.
    pub fn new(log: &'a ProgressLog, estimator: &RateEstimator, now: Time) -> Self {
        let rates = log
            .tasks()
            .iter()
            .map(|task| estimator.rate(log.history(&task.name), now));
        Self::with_rates(log, rates, now)
    }

    /// Reuse rates from already-computed stats.
    pub fn from_stats(log: &'a ProgressLog, stats: &[TaskStats], now: Time) -> Self {
        let rates = log.tasks().iter().map(|task| {
            stats
                .iter()
                .find(|s| s.name == task.name)
                .and_then(|s| s.rate)
                .unwrap_or(0.0)
        });
        Self::with_rates(log, rates, now)
    }

    fn with_rates(log: &'a ProgressLog, rates: impl Iterator<Item = f64>, now: Time) -> Self {
        let loads = log
            .tasks()
            .iter()
            .zip(rates)
            .filter_map(|(task, rate)| {
                if rate > 0.0 {
                    let in_envelope = task.has_valid_window() && task.total > 0.0;
                    if !in_envelope {
                        warn!(task = %task.name, "malformed deadline, left out of envelope");
                    }
                    Some(TaskLoad { task, rate, in_envelope })
                } else {
                    debug!(task = %task.name, "no forward progress, left out of workload");
                    None
                }
            })
            .collect();
        Self { log, now, loads }
    }

    /// Number of tasks contributing work hours.
    pub fn contributing_tasks(&self) -> usize {
        self.loads.len()
    }

    /// Completed and remaining work over time, merged across tasks.
    ///
    /// Every record up to `now` adds its quantity delta over the task's rate.
    /// Later records are ignored. A final point at `now` is appended when
    /// `now` is after the last record taken.
    pub fn history(&self) -> WorkloadHistory {
        let mut steps: Vec<(Time, f64)> = Vec::with_capacity(self.log.record_count());
        let mut total_work_hours = 0.0;

        for load in &self.loads {
            let mut prev = 0.0;
            let history = self.log.history(&load.task.name);
            for record in history.iter().take_while(|r| r.time <= self.now) {
                steps.push((record.time, (record.cumulative_done - prev) / load.rate));
                prev = record.cumulative_done;
            }
            // Over-target tasks have nothing left, not negative work.
            total_work_hours += load.task.total.max(prev) / load.rate;
        }
        steps.sort_by(|a, b| a.0.cmp(&b.0));

        let mut completed = 0.0;
        let mut points: Vec<WorkloadPoint> = steps
            .into_iter()
            .map(|(time, work)| {
                completed += work;
                WorkloadPoint {
                    time,
                    completed_work_hours: completed,
                    remaining_work_hours: total_work_hours - completed,
                }
            })
            .collect();

        if points.last().map_or(true, |p| p.time < self.now) {
            points.push(WorkloadPoint {
                time: self.now,
                completed_work_hours: completed,
                remaining_work_hours: total_work_hours - completed,
            });
        }

        WorkloadHistory {
            total_work_hours,
            points,
        }
    }

    /// One constraint per task with a positive rate and a sane window.
    pub fn constraints(&self) -> Vec<DeadlineConstraint> {
        self.envelope_loads()
            .map(|load| DeadlineConstraint {
                name: load.task.name.clone(),
                deadline: load.task.end_time,
                required_work_hours: load.task.total / load.rate,
            })
            .collect()
    }

    /// The deadline-feasibility envelope, starting at the earliest task start.
    pub fn envelope(&self) -> Envelope {
        let Some(origin) = self.envelope_loads().map(|l| l.task.start_time).min() else {
            return Envelope::default();
        };
        Envelope::build(origin, &self.constraints())
    }

    /// Compare work done by `now` with what the envelope requires.
    ///
    /// Only tasks that take part in the envelope are counted.
    pub fn pace(&self, envelope: &Envelope) -> Option<PaceCheck> {
        if envelope.is_empty() {
            return None;
        }
        let completed: f64 = self
            .envelope_loads()
            .map(|load| self.log.completed_at(&load.task.name, self.now) / load.rate)
            .sum();
        let required = envelope.required_at(self.now);
        let lead_hours = envelope
            .time_for(completed)
            .map(|t| hours_between(self.now, t))
            .unwrap_or(0.0);

        Some(PaceCheck {
            time: self.now,
            required_work_hours: required,
            completed_work_hours: completed,
            surplus_hours: completed - required,
            lead_hours,
        })
    }

    /// Safe line starting at `(at, work)` over the next `days`.
    pub fn safe_line(
        &self,
        envelope: &Envelope,
        at: Time,
        work: f64,
        days: f64,
    ) -> Option<SafeLine> {
        let horizon = add_hours(at, days * 24.0)?;
        let binding = envelope.binding_from(at, work, Some(horizon))?;
        let pace = binding.pace.max(0.0);

        Some(SafeLine {
            start_time: at,
            start_work_hours: work,
            end_time: horizon,
            end_work_hours: work + pace * days * 24.0,
            daily_pace: pace * 24.0,
            binding_deadline: binding.node.time,
        })
    }

    /// Safe line from every point of the actual history.
    pub fn safe_lines(&self, days: f64) -> Vec<SafeLine> {
        let envelope = self.envelope();
        self.history()
            .points
            .iter()
            .filter_map(|p| self.safe_line(&envelope, p.time, p.completed_work_hours, days))
            .collect()
    }

    /// History, envelope, pace and the current safe line in one pass.
    pub fn report(&self, safe_line_days: f64) -> WorkloadReport {
        let history = self.history();
        let envelope = self.envelope();
        let pace = self.pace(&envelope);
        let safe_line = pace.and_then(|p| {
            self.safe_line(&envelope, self.now, p.completed_work_hours, safe_line_days)
        });

        WorkloadReport {
            history,
            envelope,
            pace,
            safe_line,
        }
    }

    fn envelope_loads(&self) -> impl Iterator<Item = &TaskLoad<'a>> + '_ {
        self.loads.iter().filter(|load| load.in_envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use chrono::{Duration, TimeZone, Utc};
    use paceline_core::{DurationUnit, ProgressRecord};

    fn t(hours: f64) -> Time {
        Utc.timestamp_opt(0, 0).unwrap() + Duration::seconds((hours * 3600.0) as i64)
    }

    fn estimator() -> RateEstimator {
        RateEstimator::new(&EngineConfig {
            rate_window_hours: 1000.0,
            daily_window_days: 30.0,
            active_duration_unit: DurationUnit::Hours,
            ..Default::default()
        })
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    /// Two tasks at 1 unit/h ("a") and 2 units/h ("b"), plus one stalled task.
    fn sample_log() -> ProgressLog {
        ProgressLog::new(
            vec![
                Task::new("a", 10.0, t(0.0), t(100.0)),
                Task::new("b", 20.0, t(5.0), t(50.0)),
                Task::new("stalled", 10.0, t(0.0), t(20.0)),
            ],
            vec![
                ProgressRecord::new("a", t(0.0), 0.0),
                ProgressRecord::new("a", t(10.0), 2.0).with_active(2.0),
                ProgressRecord::new("a", t(30.0), 4.0).with_active(2.0),
                ProgressRecord::new("b", t(5.0), 0.0),
                ProgressRecord::new("b", t(20.0), 8.0).with_active(4.0),
                ProgressRecord::new("stalled", t(1.0), 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_stalled_tasks_do_not_contribute() {
        let log = sample_log();
        let agg = WorkloadAggregator::new(&log, &estimator(), t(40.0));
        assert_eq!(agg.contributing_tasks(), 2);
    }

    #[test]
    fn test_history_accumulates_in_time_order() {
        let log = sample_log();
        let agg = WorkloadAggregator::new(&log, &estimator(), t(40.0));
        let history = agg.history();

        // a: 10 units at 1/h = 10h. b: 20 units at 2/h = 10h.
        assert!(approx(history.total_work_hours, 20.0));

        let times: Vec<_> = history.points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![t(0.0), t(5.0), t(10.0), t(20.0), t(30.0), t(40.0)]);

        let done: Vec<_> = history.points.iter().map(|p| p.completed_work_hours).collect();
        let expected = [0.0, 0.0, 2.0, 6.0, 8.0, 8.0];
        for (got, want) in done.iter().zip(expected) {
            assert!(approx(*got, want));
        }

        for w in history.points.windows(2) {
            assert!(w[1].completed_work_hours >= w[0].completed_work_hours);
            assert!(w[1].remaining_work_hours <= w[0].remaining_work_hours);
        }
        assert!(approx(history.last().unwrap().remaining_work_hours, 12.0));
    }

    #[test]
    fn test_final_cumulative_as_total_leaves_nothing_remaining() {
        let log = sample_log();
        let history = WorkloadAggregator::new(&log, &estimator(), t(40.0)).history();
        let final_work = history.last().unwrap().completed_work_hours;

        let synthetic = ProgressLog::new(
            vec![Task::new("all", final_work, t(0.0), t(100.0))],
            vec![ProgressRecord::new("all", t(40.0), final_work)],
        )
        .unwrap();
        let stats = crate::TaskProjector::default().project(
            &synthetic,
            &synthetic.tasks()[0],
            t(40.0),
        );
        assert_eq!(stats.remaining, 0.0);
    }

    #[test]
    fn test_over_target_task_has_no_negative_remaining_work() {
        let log = ProgressLog::new(
            vec![Task::new("a", 4.0, t(0.0), t(100.0))],
            vec![
                ProgressRecord::new("a", t(0.0), 0.0),
                ProgressRecord::new("a", t(6.0), 6.0).with_active(6.0),
            ],
        )
        .unwrap();
        let history = WorkloadAggregator::new(&log, &estimator(), t(6.0)).history();

        assert!(approx(history.total_work_hours, 6.0));
        assert!(approx(history.last().unwrap().remaining_work_hours, 0.0));
    }

    #[test]
    fn test_envelope_uses_each_task_workload() {
        let log = sample_log();
        let agg = WorkloadAggregator::new(&log, &estimator(), t(40.0));

        let constraints = agg.constraints();
        assert_eq!(constraints.len(), 2);

        let envelope = agg.envelope();
        let nodes = envelope.nodes();
        assert_eq!(nodes[0].time, t(0.0));
        assert_eq!(nodes[1].time, t(50.0));
        assert!(approx(nodes[1].cumulative_required_work_hours, 10.0));
        assert_eq!(nodes[2].time, t(100.0));
        assert!(approx(nodes[2].cumulative_required_work_hours, 20.0));
    }

    #[test]
    fn test_malformed_deadline_is_left_out_of_envelope() {
        let log = ProgressLog::new(
            vec![
                Task::new("ok", 10.0, t(0.0), t(20.0)),
                Task::new("backwards", 10.0, t(30.0), t(10.0)),
            ],
            vec![
                ProgressRecord::new("ok", t(0.0), 0.0),
                ProgressRecord::new("ok", t(2.0), 2.0).with_active(2.0),
                ProgressRecord::new("backwards", t(0.0), 0.0),
                ProgressRecord::new("backwards", t(2.0), 2.0).with_active(2.0),
            ],
        )
        .unwrap();
        let agg = WorkloadAggregator::new(&log, &estimator(), t(2.0));

        assert_eq!(agg.constraints().len(), 1);
        assert_eq!(agg.envelope().nodes().len(), 2);
        // The history still counts both tasks.
        assert!(approx(agg.history().total_work_hours, 20.0));
    }

    #[test]
    fn test_pace_reports_ahead_and_behind() {
        let log = sample_log();
        let agg = WorkloadAggregator::new(&log, &estimator(), t(40.0));
        let envelope = agg.envelope();

        // Envelope: 10h by t=50 from t=0, so 8h required at t=40.
        let pace = agg.pace(&envelope).unwrap();
        assert!(approx(pace.required_work_hours, 8.0));
        assert!(approx(pace.completed_work_hours, 8.0));
        assert!(approx(pace.surplus_hours, 0.0));
        assert!(pace.is_on_track());
        assert!(approx(pace.lead_hours, 0.0));

        let later = WorkloadAggregator::new(&log, &estimator(), t(45.0));
        let pace = later.pace(&later.envelope()).unwrap();
        assert!(approx(pace.required_work_hours, 9.0));
        assert!(!pace.is_on_track());
        // 8h of work was due at t=40, five hours ago.
        assert!(approx(pace.lead_hours, -5.0));
    }

    #[test]
    fn test_pace_without_envelope_is_none() {
        let log = ProgressLog::new(vec![Task::new("a", 1.0, t(0.0), t(5.0))], vec![]).unwrap();
        let agg = WorkloadAggregator::new(&log, &estimator(), t(1.0));
        assert!(agg.pace(&agg.envelope()).is_none());
        let report = agg.report(3.0);
        assert!(report.pace.is_none());
        assert!(report.safe_line.is_none());
    }

    #[test]
    fn test_safe_line_targets_nearest_binding_deadline() {
        let log = sample_log();
        let agg = WorkloadAggregator::new(&log, &estimator(), t(40.0));
        let envelope = agg.envelope();

        // From (40h, 8h done): 10h due at t=50 needs 0.2/h, 20h at t=100 needs 0.2/h.
        // Within a one-day horizon only t=50 is reachable.
        let line = agg.safe_line(&envelope, t(40.0), 8.0, 1.0).unwrap();
        assert_eq!(line.binding_deadline, t(50.0));
        assert!(approx(line.daily_pace, 4.8));
        assert_eq!(line.end_time, t(64.0));
        assert!(approx(line.end_work_hours, 8.0 + 4.8));
    }

    #[test]
    fn test_safe_line_pace_is_never_negative() {
        let log = sample_log();
        let agg = WorkloadAggregator::new(&log, &estimator(), t(40.0));
        let envelope = agg.envelope();

        let line = agg.safe_line(&envelope, t(40.0), 15.0, 1.0).unwrap();
        assert_eq!(line.daily_pace, 0.0);
        assert_eq!(line.end_work_hours, 15.0);
    }

    #[test]
    fn test_safe_lines_follow_history_points() {
        let log = sample_log();
        let agg = WorkloadAggregator::new(&log, &estimator(), t(40.0));

        let lines = agg.safe_lines(3.0);
        assert_eq!(lines.len(), agg.history().points.len());
        assert!(lines.iter().all(|l| l.daily_pace >= 0.0));
    }

    #[test]
    fn test_from_stats_matches_fresh_estimate() {
        let log = sample_log();
        let projector = crate::TaskProjector::new(&EngineConfig {
            rate_window_hours: 1000.0,
            daily_window_days: 30.0,
            active_duration_unit: DurationUnit::Hours,
            ..Default::default()
        });
        let stats = projector.project_all(&log, t(40.0));

        let reused = WorkloadAggregator::from_stats(&log, &stats, t(40.0)).history();
        let fresh = WorkloadAggregator::new(&log, &estimator(), t(40.0)).history();
        assert_eq!(reused, fresh);
    }

    #[test]
    fn test_history_stops_at_now() {
        let log = ProgressLog::new(
            vec![Task::new("a", 100.0, t(0.0), t(200.0))],
            vec![
                ProgressRecord::new("a", t(0.0), 0.0),
                ProgressRecord::new("a", t(10.0), 10.0).with_active(10.0),
                ProgressRecord::new("a", t(50.0), 90.0).with_active(40.0),
            ],
        )
        .unwrap();
        let stats = vec![TaskStats {
            name: "a".into(),
            completed: 10.0,
            remaining: 90.0,
            rate: Some(1.0),
            daily_active_time: Some(24.0),
            remaining_time: Some(90.0),
            estimated_completion: None,
        }];
        let agg = WorkloadAggregator::from_stats(&log, &stats, t(20.0));
        let history = agg.history();

        let times: Vec<_> = history.points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![t(0.0), t(10.0), t(20.0)]);
        assert!(approx(history.total_work_hours, 100.0));

        let last = history.last().unwrap();
        assert!(approx(last.completed_work_hours, 10.0));
        assert!(approx(last.remaining_work_hours, 90.0));

        let pace = agg.pace(&agg.envelope()).unwrap();
        assert!(approx(pace.completed_work_hours, last.completed_work_hours));
        assert!(agg.safe_lines(3.0).iter().all(|l| l.start_time <= t(20.0)));
    }
}
