//! Engine configuration assembly: defaults, then file, then flags.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use paceline_core::DurationUnit;
use paceline_progress::EngineConfig;

/// Command-line overrides for [`EngineConfig`].
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Rate window, in active hours
    #[arg(long, global = true)]
    pub rate_window: Option<f64>,

    /// Daily active time window, in days
    #[arg(long, global = true)]
    pub daily_window: Option<f64>,

    /// Safe line horizon, in days
    #[arg(long, global = true)]
    pub safe_days: Option<f64>,

    /// Unit of active durations in the log (hours|days)
    #[arg(long, global = true)]
    pub unit: Option<DurationUnit>,
}

impl ConfigOverrides {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(v) = self.rate_window {
            config.rate_window_hours = v;
        }
        if let Some(v) = self.daily_window {
            config.daily_window_days = v;
        }
        if let Some(v) = self.safe_days {
            config.safe_line_days = v;
        }
        if let Some(v) = self.unit {
            config.active_duration_unit = v;
        }
        config
    }
}

/// Build the effective configuration and validate it.
pub async fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<EngineConfig> {
    let base = match file {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading config {}", path.display()))?;
            parse(&content).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    let config = overrides.apply(base);
    config.validate()?;
    Ok(config)
}

fn parse(content: &str) -> serde_json::Result<EngineConfig> {
    serde_json::from_str(content)
}
