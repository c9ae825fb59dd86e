//! `roadmap breakdown` — status counts per scope.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use roadmap_core::RoadmapError;
use roadmap_core::breakdown::{RequestBreakdown, StatusBreakdown, compute_breakdown, initiative_breakdown};
use roadmap_core::index::PortfolioIndex;
use roadmap_core::model::{Node, Portfolio};
use roadmap_core::rollup::Rollup;
use serde::Serialize;

use crate::cmd::load_portfolio;
use crate::output::{OutputMode, completion_bar, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct BreakdownArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,

    /// Count the direct children of this item.
    #[arg(long, conflicts_with = "initiative")]
    pub id: Option<String>,

    /// Count the business requests filed under this initiative.
    #[arg(long)]
    pub initiative: Option<String>,
}

/// Counts for one scope: an item's direct children, or an initiative's
/// business requests.
#[derive(Debug, Serialize)]
struct ScopeBreakdown {
    id: String,
    title: String,
    scope: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_percentage: Option<u8>,
    children: StatusBreakdown,
    /// Every level beneath a business request, counted independently.
    #[serde(skip_serializing_if = "Option::is_none")]
    levels: Option<RequestBreakdown>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct BreakdownReport {
    scopes: Vec<ScopeBreakdown>,
}

pub fn run_breakdown(args: &BreakdownArgs, output: OutputMode) -> anyhow::Result<()> {
    let portfolio = load_portfolio(&args.snapshot)?;
    let report = build_report(&portfolio, args.id.as_deref(), args.initiative.as_deref())?;
    render_mode(output, &report, render_text, render_pretty)
}

fn build_report(
    portfolio: &Portfolio,
    id: Option<&str>,
    initiative: Option<&str>,
) -> anyhow::Result<BreakdownReport> {
    let index = PortfolioIndex::build(portfolio)?;

    if let Some(initiative_id) = initiative {
        let found = index
            .initiative(initiative_id)
            .ok_or_else(|| RoadmapError::ItemNotFound(initiative_id.to_string()))?;
        return Ok(BreakdownReport {
            scopes: vec![ScopeBreakdown {
                id: found.id.clone(),
                title: found.name.clone(),
                scope: "initiative",
                completion_percentage: None,
                children: initiative_breakdown(&index, initiative_id),
                levels: None,
            }],
        });
    }

    let scopes = match id {
        Some(id) => vec![scope_for(index.require(id)?)],
        None => portfolio.roots().map(scope_for).collect(),
    };
    Ok(BreakdownReport { scopes })
}

fn scope_for(node: Node<'_>) -> ScopeBreakdown {
    let fields = node.fields();
    ScopeBreakdown {
        id: fields.id.clone(),
        title: fields.title.clone(),
        scope: node.item_type().as_str(),
        completion_percentage: Some(Rollup::of(node).completion(node)),
        children: compute_breakdown(node.children()),
        levels: match node {
            Node::BusinessRequest(br) => Some(RequestBreakdown::of(br)),
            _ => None,
        },
    }
}

fn counts_line(breakdown: &StatusBreakdown) -> String {
    format!(
        "done {}  in-progress {}  blocked {}  not-started {}  ({} total)",
        breakdown.done,
        breakdown.in_progress,
        breakdown.blocked,
        breakdown.not_started,
        breakdown.total()
    )
}

fn render_text(report: &BreakdownReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "id  level  done  in_progress  blocked  not_started")?;
    for scope in &report.scopes {
        let mut rows = vec![("children", scope.children)];
        if let Some(levels) = scope.levels {
            rows.extend([
                ("features", levels.features),
                ("epics", levels.epics),
                ("stories", levels.stories),
            ]);
        }
        for (level, counts) in rows {
            writeln!(
                w,
                "{}  {level}  {}  {}  {}  {}",
                scope.id, counts.done, counts.in_progress, counts.blocked, counts.not_started
            )?;
        }
    }
    Ok(())
}

fn render_pretty(report: &BreakdownReport, w: &mut dyn Write) -> io::Result<()> {
    for scope in &report.scopes {
        let heading = match scope.completion_percentage {
            Some(pct) => format!("{}  {}  [{}]  {pct}%", scope.id, scope.title, scope.scope),
            None => format!("{}  {}  [{}]", scope.id, scope.title, scope.scope),
        };
        pretty_section(w, &heading)?;
        writeln!(w, "{:<10} {}", "Children", counts_line(&scope.children))?;
        if let Some(levels) = &scope.levels {
            for (label, counts) in [
                ("Features", &levels.features),
                ("Epics", &levels.epics),
                ("Stories", &levels.stories),
            ] {
                writeln!(
                    w,
                    "{label:<10} {} {:>3}% done  {}",
                    completion_bar(counts.percent_done()),
                    counts.percent_done(),
                    counts_line(counts)
                )?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}
