//! `roadmap timeline` — flattened rows placed in a Monday-aligned window.

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use roadmap_core::config::ProjectConfig;
use roadmap_core::filter::IntervalFilter;
use roadmap_core::index::PortfolioIndex;
use roadmap_core::model::{ItemType, Portfolio, Priority, Status};
use roadmap_core::timeline::window::MAX_WINDOW_DAYS;
use roadmap_core::timeline::{BarPosition, Interval, Period, TimelineView, TimelineWindow, flatten_portfolio};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cmd::{load_portfolio, truncate};
use crate::output::{OutputMode, pretty_kv, pretty_rule, render_mode};

/// Character cells in the pretty gantt strip.
const GANTT_COLUMNS: usize = 56;
const TITLE_WIDTH: usize = 30;

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,

    /// Any day inside the first window (defaults to today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<NaiveDate>,

    /// Shift by whole windows; negative moves back.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i64,

    /// Window length in days (overrides `timeline.window_days`).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS)))]
    pub days: Option<u32>,

    /// Column grouping: weekly, bi-weekly, monthly.
    #[arg(long)]
    pub view: Option<TimelineView>,

    /// Case-insensitive match on title, theme, or initiative.
    #[arg(long)]
    pub search: Option<String>,

    /// Keep only these statuses (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<Status>,

    /// Keep only these item types (comma-separated).
    #[arg(long = "type", value_delimiter = ',')]
    pub item_type: Vec<ItemType>,

    /// Keep only these priorities (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub priority: Vec<Priority>,

    /// Keep only items carrying this release label.
    #[arg(long)]
    pub release: Option<String>,

    /// Include rows that fall outside the window.
    #[arg(long)]
    pub all: bool,
}

/// Resolved inputs for [`build_report`].
#[derive(Debug, Clone)]
struct TimelineOptions {
    reference: NaiveDate,
    offset: i64,
    days: u32,
    view: TimelineView,
    filter: IntervalFilter,
    include_outside: bool,
}

impl TimelineOptions {
    fn resolve(args: &TimelineArgs, config: &ProjectConfig) -> Self {
        let days = args.days.unwrap_or(config.timeline.window_days);
        if days > MAX_WINDOW_DAYS {
            warn!(days, max = MAX_WINDOW_DAYS, "timeline.window_days too large; clamped");
        }
        Self {
            reference: args
                .from
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            offset: args.offset,
            days,
            view: args.view.unwrap_or(config.timeline.view),
            filter: IntervalFilter {
                search: args.search.clone(),
                statuses: args.status.clone(),
                item_types: args.item_type.clone(),
                priorities: args.priority.clone(),
                release_label: args.release.clone(),
            },
            include_outside: args.all,
        }
    }
}

#[derive(Debug, Serialize)]
struct TimelineRow {
    #[serde(flatten)]
    interval: Interval,
    #[serde(skip_serializing_if = "Option::is_none")]
    bar: Option<BarPosition>,
}

#[derive(Debug, Serialize)]
struct TimelineReport {
    window_start: NaiveDate,
    window_end: NaiveDate,
    days: u32,
    view: TimelineView,
    periods: Vec<Period>,
    rows: Vec<TimelineRow>,
    /// Rows that passed the filter but fall outside the window.
    hidden: usize,
}

pub fn run_timeline(
    args: &TimelineArgs,
    output: OutputMode,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let portfolio = load_portfolio(&args.snapshot)?;
    let options = TimelineOptions::resolve(args, config);
    let report = build_report(&portfolio, &options)?;
    render_mode(output, &report, render_text, render_pretty)
}

fn build_report(portfolio: &Portfolio, options: &TimelineOptions) -> anyhow::Result<TimelineReport> {
    let index = PortfolioIndex::build(portfolio)?;
    let window = TimelineWindow::with_days(options.reference, options.days).offset(options.offset);
    let intervals = options.filter.apply(flatten_portfolio(portfolio, &index));

    let mut rows = Vec::with_capacity(intervals.len());
    let mut hidden = 0;
    for interval in intervals {
        let bar = window.bar_position(interval.start_date, interval.end_date);
        if bar.is_none() && !options.include_outside {
            hidden += 1;
            continue;
        }
        rows.push(TimelineRow { interval, bar });
    }
    debug!(
        window_start = %window.start,
        visible = rows.len(),
        hidden,
        "timeline built"
    );

    Ok(TimelineReport {
        window_start: window.start,
        window_end: window.end(),
        days: window.days,
        view: options.view,
        periods: window.periods(options.view),
        rows,
        hidden,
    })
}

fn render_text(report: &TimelineReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "window  {}  {}  {}",
        report.window_start, report.window_end, report.view
    )?;
    for row in &report.rows {
        let interval = &row.interval;
        let (left, width) = row
            .bar
            .map_or_else(|| ("-".to_string(), "-".to_string()), |bar| {
                (format!("{:.1}", bar.left_pct), format!("{:.1}", bar.width_pct))
            });
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}  {}  {}  {}",
            interval.depth,
            interval.id,
            interval.item_type,
            interval.status,
            interval.completion_percentage,
            interval.start_date,
            interval.end_date,
            left,
            width,
        )?;
    }
    Ok(())
}

fn render_pretty(report: &TimelineReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_kv(
        w,
        "Window",
        format!(
            "{} to {} ({} days)",
            report.window_start.format("%b %-d, %Y"),
            report.window_end.format("%b %-d, %Y"),
            report.days
        ),
    )?;
    let labels: Vec<&str> = report.periods.iter().map(|p| p.label.as_str()).collect();
    pretty_kv(w, "Periods", labels.join(" | "))?;
    pretty_rule(w)?;

    if report.rows.is_empty() {
        writeln!(w, "(nothing scheduled in this window)")?;
    }
    for row in &report.rows {
        let interval = &row.interval;
        let label = format!(
            "{}{}",
            "  ".repeat(interval.depth),
            truncate(&interval.title, TITLE_WIDTH.saturating_sub(interval.depth * 2))
        );
        writeln!(
            w,
            "{label:<width$} {} {:>3}%",
            gantt_cells(
                report.window_start,
                report.days,
                interval.start_date,
                interval.end_date
            ),
            interval.completion_percentage,
            width = TITLE_WIDTH,
        )?;
    }
    if report.hidden > 0 {
        pretty_rule(w)?;
        writeln!(w, "{} item(s) outside this window (use --all to list)", report.hidden)?;
    }
    Ok(())
}

/// Strip of [`GANTT_COLUMNS`] cells with the visible part of the range filled.
fn gantt_cells(window_start: NaiveDate, days: u32, start: NaiveDate, end: NaiveDate) -> String {
    let days = usize::try_from(days.max(1)).unwrap_or(1);
    let day_index = |date: NaiveDate| -> Option<usize> {
        let offset = date.signed_duration_since(window_start).num_days();
        usize::try_from(offset).ok()
    };

    let last = days - 1;
    let first_day = day_index(start).unwrap_or(0);
    let last_day = day_index(end).map(|d| d.min(last));
    let filled = match last_day {
        Some(last_day) if first_day <= last => {
            let from = first_day * GANTT_COLUMNS / days;
            let to = ((last_day + 1) * GANTT_COLUMNS).div_ceil(days);
            from..to.max(from + 1)
        }
        _ => 0..0,
    };

    (0..GANTT_COLUMNS)
        .map(|cell| if filled.contains(&cell) { '█' } else { '·' })
        .collect()
}
