//! Engine configuration.

use paceline_core::DurationUnit;
use serde::{Deserialize, Serialize};

/// Errors that make a configuration unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A window or horizon is zero, negative, NaN or infinite
    #[error("{field} must be a positive finite number, got {value}")]
    InvalidWindow {
        /// Offending field
        field: &'static str,
        /// Supplied value
        value: f64,
    },
}

/// Configuration for the analytics engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Trailing window for the rate estimate, in active hours
    pub rate_window_hours: f64,
    /// Trailing window for the daily active time, in days
    pub daily_window_days: f64,
    /// Unit of `activeDuration` in the log
    pub active_duration_unit: DurationUnit,
    /// Horizon of the near-term safe line, in days
    pub safe_line_days: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_window_hours: 24.0,
            daily_window_days: 7.0,
            active_duration_unit: DurationUnit::Days,
            safe_line_days: 3.0,
        }
    }
}

impl EngineConfig {
    /// Check that every window is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("rate_window_hours", self.rate_window_hours),
            ("daily_window_days", self.daily_window_days),
            ("safe_line_days", self.safe_line_days),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidWindow { field, value });
            }
        }
        Ok(())
    }
}
