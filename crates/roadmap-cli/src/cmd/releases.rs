//! `roadmap releases` — stories grouped by fix version.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use roadmap_core::breakdown::{ReleaseSummary, release_summaries};
use roadmap_core::index::PortfolioIndex;
use roadmap_core::model::Portfolio;
use serde::Serialize;

use crate::cmd::load_portfolio;
use crate::output::{OutputMode, completion_bar, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ReleasesArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,

    /// Only stories under this business request.
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct ReleasesReport {
    releases: Vec<ReleaseSummary>,
}

pub fn run_releases(args: &ReleasesArgs, output: OutputMode) -> anyhow::Result<()> {
    let portfolio = load_portfolio(&args.snapshot)?;
    let report = build_report(&portfolio, args.id.as_deref())?;
    render_mode(output, &report, render_text, render_pretty)
}

fn build_report(portfolio: &Portfolio, id: Option<&str>) -> anyhow::Result<ReleasesReport> {
    let releases = match id {
        Some(id) => {
            let index = PortfolioIndex::build(portfolio)?;
            release_summaries(index.linked_items(id)?.stories)
        }
        None => release_summaries(
            portfolio
                .business_requests
                .iter()
                .flat_map(|br| br.stories()),
        ),
    };
    Ok(ReleasesReport { releases })
}

fn render_text(report: &ReleasesReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "fix_version  stories  done  percent_done  points  done_points  points_completion"
    )?;
    for release in &report.releases {
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}  {}",
            release.fix_version,
            release.breakdown.total(),
            release.breakdown.done,
            release.percent_done,
            release.total_points,
            release.done_points,
            release.points_completion,
        )?;
    }
    Ok(())
}

fn render_pretty(report: &ReleasesReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Releases")?;
    if report.releases.is_empty() {
        return writeln!(w, "(no stories)");
    }
    for release in &report.releases {
        writeln!(
            w,
            "{:<16} {} {:>3}%  {}/{} done  blocked {}  points {}/{} ({}%)",
            release.fix_version,
            completion_bar(release.percent_done),
            release.percent_done,
            release.breakdown.done,
            release.breakdown.total(),
            release.breakdown.blocked,
            release.done_points,
            release.total_points,
            release.points_completion,
        )?;
    }
    Ok(())
}
