//! `roadmap grid` — one summary row per business request.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use roadmap_core::config::ProjectConfig;
use roadmap_core::filter::{
    HealthThresholds, RequestSummary, SortDirection, SortField, sort_summaries, summarize_requests,
};
use roadmap_core::index::PortfolioIndex;
use roadmap_core::model::Portfolio;
use serde::Serialize;

use crate::cmd::{load_portfolio, truncate};
use crate::output::{OutputMode, completion_bar, pretty_rule, render_mode};

#[derive(Args, Debug)]
pub struct GridArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,

    /// Sort column: title, priority, completion, blocked.
    #[arg(long, default_value = "title")]
    pub sort: SortField,

    /// Sort descending.
    #[arg(long)]
    pub desc: bool,

    /// Case-insensitive match on title, theme, or initiative.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct GridReport {
    rows: Vec<RequestSummary>,
}

pub fn run_grid(args: &GridArgs, output: OutputMode, config: &ProjectConfig) -> anyhow::Result<()> {
    let portfolio = load_portfolio(&args.snapshot)?;
    let direction = if args.desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    let report = build_report(
        &portfolio,
        &config.health,
        args.search.as_deref(),
        args.sort,
        direction,
    )?;
    render_mode(output, &report, render_text, render_pretty)
}

fn build_report(
    portfolio: &Portfolio,
    thresholds: &HealthThresholds,
    search: Option<&str>,
    sort: SortField,
    direction: SortDirection,
) -> anyhow::Result<GridReport> {
    let index = PortfolioIndex::build(portfolio)?;
    let mut rows = summarize_requests(portfolio, &index, thresholds);
    if let Some(query) = search {
        rows.retain(|row| row.matches_search(query));
    }
    sort_summaries(&mut rows, sort, direction);
    Ok(GridReport { rows })
}

fn render_text(report: &GridReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "id  priority  status  completion  blocked  health  title")?;
    for row in &report.rows {
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}  {}",
            row.id,
            row.priority,
            row.status,
            row.completion_percentage,
            row.blocked_count,
            row.health,
            row.title
        )?;
    }
    Ok(())
}

fn render_pretty(report: &GridReport, w: &mut dyn Write) -> io::Result<()> {
    if report.rows.is_empty() {
        return writeln!(w, "(no matching business requests)");
    }
    writeln!(
        w,
        "{:<8} {:<28} {:<20} {:<8} {:<12} {:>4}  {:<16} {:>7}  {}",
        "ID", "TITLE", "INITIATIVE", "PRIORITY", "STATUS", "DONE", "", "BLOCKED", "HEALTH"
    )?;
    pretty_rule(w)?;
    for row in &report.rows {
        writeln!(
            w,
            "{:<8} {:<28} {:<20} {:<8} {:<12} {:>3}%  {} {:>7}  {}",
            row.id,
            truncate(&row.title, 28),
            truncate(row.initiative_name.as_deref().unwrap_or("-"), 20),
            row.priority.as_str(),
            row.status.as_str(),
            row.completion_percentage,
            completion_bar(row.completion_percentage),
            row.blocked_count,
            row.health,
        )?;
    }
    Ok(())
}
