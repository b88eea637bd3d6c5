//! Windowed rate estimation.
//!
//! Progress logs are sparse: a record may arrive after days of silence, yet
//! only an hour of that gap was spent working. The estimator therefore
//! weights each interval by the active effort attributed to it rather than by
//! calendar time, walking backwards from `now` until the trailing window of
//! effort is filled.

use chrono::{DateTime, Utc};
use paceline_core::time::{add_hours, hours_between};
use paceline_core::{DurationUnit, ProgressRecord, Time};
use tracing::debug;

use crate::config::EngineConfig;

/// Quantity and effort attributed to a trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Attribution {
    /// Prorated quantity done inside the window
    pub quantity: f64,
    /// Prorated active hours inside the window, never above the window length
    pub active_hours: f64,
}

/// Rate and daily effort for one task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateEstimate {
    /// Quantity per active hour
    pub rate: f64,
    /// Active hours per calendar day
    pub daily_active_time: f64,
}

/// Estimates a task's recent pace from its history.
#[derive(Debug, Clone, Copy)]
pub struct RateEstimator {
    rate_window_hours: f64,
    daily_window_days: f64,
    unit: DurationUnit,
}

impl RateEstimator {
    /// Create an estimator from engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            rate_window_hours: config.rate_window_hours,
            daily_window_days: config.daily_window_days,
            unit: config.active_duration_unit,
        }
    }

    /// Walk `history` (ascending by time) from the newest pair backwards and
    /// attribute quantity and effort to the trailing window of
    /// `window_hours` ending at `now`.
    ///
    /// Each pair is prorated by how much of its calendar interval overlaps
    /// `[now - window, now]`. Accumulation stops at the pair that fills the
    /// window, which contributes only the fraction needed to reach it exactly.
    pub fn attribute(
        &self,
        history: &[ProgressRecord],
        now: Time,
        window_hours: f64,
    ) -> Attribution {
        let mut acc = Attribution::default();
        if history.len() < 2 || window_hours <= 0.0 {
            return acc;
        }
        let window_start = add_hours(now, -window_hours).unwrap_or(DateTime::<Utc>::MIN_UTC);

        for pair in history.windows(2).rev() {
            let (prev, cur) = (&pair[0], &pair[1]);
            let Some(active) = cur.active_hours(self.unit) else {
                continue;
            };

            let span = hours_between(prev.time, cur.time);
            if span <= 0.0 {
                debug!(task = %cur.name, time = %cur.time, "skipping zero-length interval");
                continue;
            }

            let overlap_start = prev.time.max(window_start);
            let overlap_end = cur.time.min(now);
            let fraction = hours_between(overlap_start, overlap_end) / span;
            if fraction <= 0.0 {
                continue;
            }

            // Regressions count negative here; the final rate is clamped.
            let quantity = (cur.cumulative_done - prev.cumulative_done) * fraction;
            let active = active * fraction;

            if acc.active_hours + active >= window_hours {
                let scale = (window_hours - acc.active_hours) / active;
                acc.quantity += quantity * scale;
                acc.active_hours = window_hours;
                break;
            }
            acc.quantity += quantity;
            acc.active_hours += active;
        }

        acc
    }

    /// Quantity per active hour over the rate window. 0 without data.
    pub fn rate(&self, history: &[ProgressRecord], now: Time) -> f64 {
        let acc = self.attribute(history, now, self.rate_window_hours);
        if acc.active_hours <= 0.0 {
            return 0.0;
        }
        (acc.quantity / acc.active_hours).max(0.0)
    }

    /// Average active hours per calendar day over the daily window.
    pub fn daily_active_time(&self, history: &[ProgressRecord], now: Time) -> f64 {
        let acc = self.attribute(history, now, self.daily_window_days * 24.0);
        (acc.active_hours / self.daily_window_days).max(0.0)
    }

    /// Both estimates, or `None` when the history has fewer than two records.
    pub fn estimate(&self, history: &[ProgressRecord], now: Time) -> Option<RateEstimate> {
        if history.len() < 2 {
            return None;
        }
        let estimate = RateEstimate {
            rate: self.rate(history, now),
            daily_active_time: self.daily_active_time(history, now),
        };
        debug!(
            task = %history[0].name,
            rate = estimate.rate,
            daily_active_time = estimate.daily_active_time,
            "estimated pace"
        );
        Some(estimate)
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
