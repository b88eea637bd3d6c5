//! Text and JSON presentation of engine results.

use std::fmt::Write as _;

use clap::ValueEnum;
use paceline_core::{ProgressLog, TaskState, TaskStats, Time, TotalStats};
use paceline_progress::WorkloadReport;
use serde::Serialize;

/// Output encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Which way cumulative work is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// Work still to do
    #[default]
    Left,
    /// Work already done
    Fin,
}

/// Presentation toggles. Never passed to the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    pub show_finished: bool,
    pub direction: Direction,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct StatsRow<'a> {
    #[serde(flatten)]
    stats: &'a TaskStats,
    state: TaskState,
}

/// Hours as `HHHH:MM`, or a placeholder when unknown or negative.
pub fn format_hours(hours: Option<f64>) -> String {
    match hours {
        Some(h) if h.is_finite() && h >= 0.0 => {
            let minutes = (h * 60.0).floor() as u64;
            format!("{:>4}:{:02}", minutes / 60, minutes % 60)
        }
        _ => "   -:--".to_string(),
    }
}

/// Instant as `M/D HH:MM` (UTC), or `-` when unknown.
pub fn format_instant(at: Option<Time>) -> String {
    match at {
        Some(t) => t.format("%-m/%-d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn format_number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn state_of(log: &ProgressLog, stats: &TaskStats, now: Time) -> TaskState {
    let has_records = !log.history(&stats.name).is_empty();
    match log.task(&stats.name) {
        Some(task) => stats.state(task, has_records, now),
        None => TaskState::NoData,
    }
}

/// Per-task table.
pub fn render_stats(
    log: &ProgressLog,
    stats: &[TaskStats],
    now: Time,
    opts: &DisplayOptions,
) -> serde_json::Result<String> {
    let rows: Vec<StatsRow<'_>> = stats
        .iter()
        .map(|s| StatsRow {
            stats: s,
            state: state_of(log, s, now),
        })
        .filter(|row| opts.show_finished || row.state != TaskState::Finished)
        .collect();

    if opts.format == OutputFormat::Json {
        return serde_json::to_string_pretty(&rows);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:<12} {:>10} {:>10} {:>8} {:>8} {:>8}  {}",
        "TASK", "STATE", "DONE", "LEFT", "RATE", "DAILY", "NEEDS", "ETA"
    );
    for row in &rows {
        let s = row.stats;
        let _ = writeln!(
            out,
            "{:<20} {:<12} {:>10.2} {:>10.2} {:>8} {:>8} {:>8}  {}",
            s.name.as_str(),
            row.state.as_str(),
            s.completed,
            s.remaining,
            format_number(s.rate),
            format_hours(s.daily_active_time),
            format_hours(s.remaining_time),
            format_instant(s.estimated_completion),
        );
    }
    Ok(out)
}

/// Aggregate summary.
pub fn render_total(total: &TotalStats, opts: &DisplayOptions) -> serde_json::Result<String> {
    if opts.format == OutputFormat::Json {
        return serde_json::to_string_pretty(total);
    }

    let mut out = String::new();
    let _ = writeln!(out, "daily active   {}", format_hours(Some(total.total_daily_active_time)));
    let _ = writeln!(out, "remaining      {}", format_hours(Some(total.total_remaining_time)));
    let _ = writeln!(out, "eta            {}", format_instant(total.estimated_completion));
    let _ = writeln!(out, "unresolved     {}", total.unresolved_task_count);
    Ok(out)
}

/// History, envelope key points, pace and safe line.
pub fn render_workload(
    report: &WorkloadReport,
    opts: &DisplayOptions,
) -> serde_json::Result<String> {
    if opts.format == OutputFormat::Json {
        return serde_json::to_string_pretty(report);
    }

    let total = report.history.total_work_hours;
    let required_total = report.envelope.total_required();
    let shown = |completed: f64, of: f64| match opts.direction {
        Direction::Fin => completed,
        Direction::Left => of - completed,
    };

    let mut out = String::new();
    let _ = writeln!(out, "total work     {}", format_hours(Some(total)));

    let _ = writeln!(out, "\nhistory");
    for p in &report.history.points {
        let _ = writeln!(
            out,
            "  {:<12} {}",
            format_instant(Some(p.time)),
            format_hours(Some(shown(p.completed_work_hours, total).max(0.0)))
        );
    }

    let _ = writeln!(out, "\ndeadlines");
    for node in report.envelope.key_points() {
        let _ = writeln!(
            out,
            "  {:<12} {}",
            format_instant(Some(node.time)),
            format_hours(Some(shown(node.cumulative_required_work_hours, required_total)))
        );
    }

    if let Some(pace) = &report.pace {
        let verdict = if pace.is_on_track() { "ahead" } else { "behind" };
        let lead = format_hours(Some(pace.lead_hours.abs()));
        let _ = writeln!(out, "\npace           {verdict} by {lead}");
        let _ = writeln!(out, "  required     {}", format_hours(Some(pace.required_work_hours)));
        let _ = writeln!(out, "  completed    {}", format_hours(Some(pace.completed_work_hours)));
    }

    if let Some(line) = &report.safe_line {
        let _ = writeln!(
            out,
            "\nsafe line      {} per day until {} (binding {})",
            format_hours(Some(line.daily_pace)),
            format_instant(Some(line.end_time)),
            format_instant(Some(line.binding_deadline)),
        );
    }
    Ok(out)
}
