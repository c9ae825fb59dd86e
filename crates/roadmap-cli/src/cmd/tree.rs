//! `roadmap tree` — hierarchy with computed completion.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use roadmap_core::index::PortfolioIndex;
use roadmap_core::model::Portfolio;
use roadmap_core::rollup::Rollup;
use roadmap_core::tree::{TreeNode, build_forest, project};

use crate::cmd::{load_portfolio, truncate};
use crate::output::{OutputMode, completion_bar, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,

    /// Show only the subtree rooted at this item.
    #[arg(long)]
    pub id: Option<String>,
}

/// Serializes as the bare array of roots.
#[derive(Debug, Serialize)]
#[serde(transparent)]
struct TreeReport {
    roots: Vec<TreeNode>,
}

pub fn run_tree(args: &TreeArgs, output: OutputMode) -> anyhow::Result<()> {
    let portfolio = load_portfolio(&args.snapshot)?;
    let forest = build(&portfolio, args.id.as_deref())?;
    render_mode(output, &forest, render_text, render_pretty)
}

fn build(portfolio: &Portfolio, id: Option<&str>) -> anyhow::Result<TreeReport> {
    let Some(id) = id else {
        return Ok(TreeReport {
            roots: build_forest(&portfolio.business_requests),
        });
    };
    let index = PortfolioIndex::build(portfolio)?;
    let node = index.require(id)?;
    Ok(TreeReport {
        roots: vec![project(node, &Rollup::of(node))],
    })
}

fn render_text(report: &TreeReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "depth  id  type  status  completion  title")?;
    for root in &report.roots {
        write_text_rows(root, 0, w)?;
    }
    Ok(())
}

fn write_text_rows(node: &TreeNode, depth: usize, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{depth}  {}  {}  {}  {}  {}",
        node.id, node.node_type, node.status, node.completion_percentage, node.title
    )?;
    for child in &node.children {
        write_text_rows(child, depth + 1, w)?;
    }
    Ok(())
}

fn render_pretty(report: &TreeReport, w: &mut dyn Write) -> io::Result<()> {
    if report.roots.is_empty() {
        return writeln!(w, "(no business requests)");
    }
    for root in &report.roots {
        pretty_section(
            w,
            &format!("{}  {}  {}%", root.id, root.title, root.completion_percentage),
        )?;
        write_pretty_node(root, 0, w)?;
        writeln!(w)?;
    }
    Ok(())
}

const TITLE_WIDTH: usize = 36;

fn write_pretty_node(node: &TreeNode, indent: usize, w: &mut dyn Write) -> io::Result<()> {
    let prefix = "  ".repeat(indent);
    let width = TITLE_WIDTH.saturating_sub(indent * 2);
    let title = truncate(&node.title, width);
    writeln!(
        w,
        "{prefix}{title:<width$} [{}, {}] {:>3}% {}",
        node.node_type,
        node.status,
        node.completion_percentage,
        completion_bar(node.completion_percentage),
    )?;
    for child in &node.children {
        write_pretty_node(child, indent + 1, w)?;
    }
    Ok(())
}
