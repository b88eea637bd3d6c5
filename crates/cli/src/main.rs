//! paceline CLI - progress rate and deadline-feasibility analytics.

mod render;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use paceline_core::{ProgressLog, Time};
use paceline_progress::{EngineConfig, TaskProjector, WorkloadAggregator};
use paceline_storage::{JsonLogStorage, LogSource};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use render::{Direction, DisplayOptions, OutputFormat};
use settings::ConfigOverrides;

#[derive(Parser)]
#[command(name = "paceline")]
#[command(about = "Progress rate and deadline-feasibility analytics", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LogArgs {
    /// Progress log file
    #[arg(long)]
    log: PathBuf,

    /// Reference instant (RFC 3339), defaults to the current time
    #[arg(long, value_parser = parse_time)]
    now: Option<Time>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-task rates and projections
    Stats {
        #[command(flatten)]
        args: LogArgs,
        /// Include tasks that reached their target
        #[arg(long)]
        show_finished: bool,
    },
    /// Aggregate totals over all tasks
    Total {
        #[command(flatten)]
        args: LogArgs,
    },
    /// Workload history, deadline envelope, pace and safe line
    Workload {
        #[command(flatten)]
        args: LogArgs,
        /// Show work left or work finished
        #[arg(long, value_enum, default_value = "left")]
        direction: Direction,
    },
    /// Re-read the log periodically and print stats and totals
    Watch {
        /// Progress log file
        #[arg(long)]
        log: PathBuf,
        /// Refresh interval in seconds
        #[arg(long, default_value = "10")]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = settings::load(cli.config.as_deref(), &cli.overrides).await?;
    let projector = TaskProjector::new(&config);

    match cli.command {
        Commands::Stats { args, show_finished } => {
            let (log, now) = open(&args).await?;
            let opts = DisplayOptions {
                show_finished,
                format: args.format,
                ..Default::default()
            };
            let stats = projector.project_all(&log, now);
            print!("{}", render::render_stats(&log, &stats, now, &opts)?);
        }
        Commands::Total { args } => {
            let (log, now) = open(&args).await?;
            let opts = DisplayOptions {
                format: args.format,
                ..Default::default()
            };
            let total = projector.total(&log, now);
            info!(unresolved = total.unresolved_task_count, "computed totals");
            print!("{}", render::render_total(&total, &opts)?);
        }
        Commands::Workload { args, direction } => {
            let (log, now) = open(&args).await?;
            let opts = DisplayOptions {
                direction,
                format: args.format,
                ..Default::default()
            };
            let report = workload_report(&projector, &config, &log, now);
            print!("{}", render::render_workload(&report, &opts)?);
        }
        Commands::Watch { log, interval } => {
            let source = JsonLogStorage::new(&log);
            watch(&source, &projector, Duration::from_secs(interval.max(1))).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_time(s: &str) -> std::result::Result<Time, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 time: {e}"))
}

async fn open(args: &LogArgs) -> Result<(ProgressLog, Time)> {
    let log = load_log(&args.log).await?;
    Ok((log, args.now.unwrap_or_else(Utc::now)))
}

async fn load_log(path: &Path) -> Result<ProgressLog> {
    let source = JsonLogStorage::new(path);
    let log = source
        .load()
        .await
        .with_context(|| format!("loading {}", source.describe()))?;
    info!(
        tasks = log.tasks().len(),
        records = log.record_count(),
        "loaded progress log"
    );
    Ok(log)
}

fn workload_report(
    projector: &TaskProjector,
    config: &EngineConfig,
    log: &ProgressLog,
    now: Time,
) -> paceline_progress::WorkloadReport {
    let stats = projector.project_all(log, now);
    let aggregator = WorkloadAggregator::from_stats(log, &stats, now);
    info!(tasks = aggregator.contributing_tasks(), "computed workload");
    aggregator.report(config.safe_line_days)
}

async fn watch(source: &dyn LogSource, projector: &TaskProjector, every: Duration) -> Result<()> {
    let opts = DisplayOptions::default();
    let mut ticker = tokio::time::interval(every);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(source = %source.describe(), interval = ?every, "watching");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let log = match source.load().await {
                    Ok(log) => log,
                    Err(e) => {
                        warn!(error = %e, "refresh failed, keeping previous output");
                        continue;
                    }
                };
                let snapshot = projector.snapshot(&log, Utc::now());
                println!("== {} ==", snapshot.timestamp.to_rfc3339());
                let stats = render::render_stats(&log, &snapshot.tasks, snapshot.timestamp, &opts)?;
                print!("{stats}");
                print!("{}", render::render_total(&snapshot.total, &opts)?);
            }
            res = &mut ctrl_c => {
                res?;
                info!("stopped");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_time() {
        let t = parse_time("2024-03-07T09:00:00+02:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 3, 7, 7, 0, 0).unwrap());
        assert!(parse_time("yesterday").is_err());
    }

    #[test]
    fn test_cli_parses_workload_flags() {
        let cli = Cli::try_parse_from([
            "paceline",
            "--safe-days",
            "2",
            "workload",
            "--log",
            "log.json",
            "--direction",
            "fin",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.overrides.safe_days, Some(2.0));
        match cli.command {
            Commands::Workload { args, direction } => {
                assert_eq!(direction, Direction::Fin);
                assert_eq!(args.format, OutputFormat::Json);
                assert!(args.now.is_none());
            }
            _ => panic!("expected workload"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "paceline", "stats", "--log", "l.json", "--unit", "hours", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.overrides.unit, Some(paceline_core::DurationUnit::Hours));
    }
}
