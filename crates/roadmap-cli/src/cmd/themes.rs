//! `roadmap themes` — completion and risk per strategic theme.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use roadmap_core::breakdown::{ThemeSummary, theme_summary};
use roadmap_core::config::ProjectConfig;
use roadmap_core::filter::HealthThresholds;
use roadmap_core::index::PortfolioIndex;
use roadmap_core::model::Portfolio;
use serde::Serialize;

use crate::cmd::load_portfolio;
use crate::output::{OutputMode, completion_bar, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ThemesArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,

    /// Only this theme.
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct ThemesReport {
    themes: Vec<ThemeSummary>,
}

pub fn run_themes(args: &ThemesArgs, output: OutputMode, config: &ProjectConfig) -> anyhow::Result<()> {
    let portfolio = load_portfolio(&args.snapshot)?;
    let report = build_report(&portfolio, config.health, args.id.as_deref())?;
    render_mode(output, &report, render_text, render_pretty)
}

fn build_report(
    portfolio: &Portfolio,
    thresholds: HealthThresholds,
    id: Option<&str>,
) -> anyhow::Result<ThemesReport> {
    let index = PortfolioIndex::build(portfolio)?;
    let themes = match id {
        Some(id) => vec![theme_summary(&index, id, thresholds)?],
        None => portfolio
            .themes
            .iter()
            .map(|theme| theme_summary(&index, &theme.id, thresholds))
            .collect::<Result<_, _>>()?,
    };
    Ok(ThemesReport { themes })
}

fn render_text(report: &ThemesReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "id  completion  initiatives  items  at_risk  health  name")?;
    for theme in &report.themes {
        writeln!(
            w,
            "{}  {}  {}/{}  {}/{}  {}  {}  {}",
            theme.id,
            theme.completion_percentage,
            theme.completed_initiatives,
            theme.total_initiatives,
            theme.completed_items,
            theme.total_items,
            theme.at_risk_items,
            theme.health,
            theme.name,
        )?;
    }
    Ok(())
}

fn render_pretty(report: &ThemesReport, w: &mut dyn Write) -> io::Result<()> {
    if report.themes.is_empty() {
        return writeln!(w, "(no themes)");
    }
    for (i, theme) in report.themes.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        pretty_section(w, &format!("{} ({})", theme.name, theme.id))?;
        pretty_kv(
            w,
            "Completion",
            format!(
                "{} {}%",
                completion_bar(theme.completion_percentage),
                theme.completion_percentage
            ),
        )?;
        pretty_kv(
            w,
            "Initiatives",
            format!(
                "{}/{} complete",
                theme.completed_initiatives, theme.total_initiatives
            ),
        )?;
        let risk = &theme.at_risk_by_priority;
        pretty_kv(
            w,
            "Items",
            format!(
                "{}/{} done, {} at risk (high {}, medium {}, low {})",
                theme.completed_items,
                theme.total_items,
                theme.at_risk_items,
                risk.high,
                risk.medium,
                risk.low
            ),
        )?;
        pretty_kv(w, "Health", theme.health.as_str())?;
    }
    Ok(())
}
