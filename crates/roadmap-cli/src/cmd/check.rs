//! `roadmap check` — report completion drift and inverted date ranges.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use roadmap_core::check::{CheckReport, check_portfolio};
use roadmap_core::config::ProjectConfig;
use tracing::warn;

use crate::cmd::load_portfolio;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,

    /// Allowed gap, in percentage points, between reported and computed
    /// completion (overrides `check.drift_tolerance`).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub tolerance: Option<u8>,

    /// Exit non-zero when any issue is found.
    #[arg(long)]
    pub strict: bool,
}

pub fn run_check(args: &CheckArgs, output: OutputMode, config: &ProjectConfig) -> anyhow::Result<()> {
    let portfolio = load_portfolio(&args.snapshot)?;
    let tolerance = args.tolerance.unwrap_or(config.check.drift_tolerance);
    let report = check_portfolio(&portfolio, tolerance);
    render_mode(output, &report, render_text, render_pretty)?;

    if !report.is_clean() {
        warn!(issues = report.issue_count(), "snapshot has consistency issues");
        if args.strict {
            anyhow::bail!("check found {} issue(s)", report.issue_count());
        }
    }
    Ok(())
}

fn render_text(report: &CheckReport, w: &mut dyn Write) -> io::Result<()> {
    for drift in &report.drift {
        writeln!(
            w,
            "drift  {}  {}  reported={}  computed={}",
            drift.id, drift.item_type, drift.reported, drift.computed
        )?;
    }
    for range in &report.inverted_ranges {
        writeln!(
            w,
            "inverted  {}  {}  start={}  end={}",
            range.id, range.item_type, range.start_date, range.end_date
        )?;
    }
    writeln!(
        w,
        "checked={}  issues={}",
        report.nodes_checked,
        report.issue_count()
    )
}

fn render_pretty(report: &CheckReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Snapshot check")?;
    pretty_kv(w, "Items", report.nodes_checked.to_string())?;
    pretty_kv(w, "Tolerance", format!("±{} pts", report.drift_tolerance))?;

    if report.is_clean() {
        writeln!(w)?;
        return writeln!(w, "No issues found.");
    }

    if !report.drift.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Completion drift")?;
        for drift in &report.drift {
            writeln!(
                w,
                "  {:<12} {:<18} reported {:>3}%  computed {:>3}%  (off by {})",
                drift.id,
                drift.item_type.as_str(),
                drift.reported,
                drift.computed,
                drift.delta()
            )?;
        }
    }
    if !report.inverted_ranges.is_empty() {
        writeln!(w)?;
        pretty_section(w, "End before start")?;
        for range in &report.inverted_ranges {
            writeln!(
                w,
                "  {:<12} {:<18} {} > {}",
                range.id,
                range.item_type.as_str(),
                range.start_date,
                range.end_date
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::fixtures;

    #[test]
    fn fixture_request_drifts_from_reported_value() {
        let report = check_portfolio(&fixtures::portfolio(), 0);
        assert_eq!(report.nodes_checked, 8);
        assert_eq!(report.drift.len(), 1);
        assert_eq!(report.drift[0].id, "br-1");
        assert_eq!(report.drift[0].reported, 20);
        assert_eq!(report.drift[0].computed, 35);
        assert!(report.inverted_ranges.is_empty());
    }

    #[test]
    fn tolerance_absorbs_small_drift() {
        assert!(check_portfolio(&fixtures::portfolio(), 15).is_clean());
        assert!(!check_portfolio(&fixtures::portfolio(), 14).is_clean());
    }

    #[test]
    fn text_render_lists_issues_then_totals() {
        let report = check_portfolio(&fixtures::portfolio(), 0);
        let mut out = Vec::new();
        render_text(&report, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            lines,
            [
                "drift  br-1  business-request  reported=20  computed=35",
                "checked=8  issues=1",
            ]
        );
    }

    #[test]
    fn pretty_render_for_clean_report() {
        let report = check_portfolio(&fixtures::portfolio(), 50);
        let mut out = Vec::new();
        render_pretty(&report, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("±50 pts"));
        assert!(rendered.contains("No issues found."));
    }

    #[test]
    fn pretty_render_shows_drift_delta() {
        let report = check_portfolio(&fixtures::portfolio(), 0);
        let mut out = Vec::new();
        render_pretty(&report, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("Completion drift"));
        assert!(rendered.contains("(off by 15)"));
    }
}
