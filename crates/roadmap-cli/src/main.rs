#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use roadmap_core::config::{UserConfig, load_project_config, load_user_config};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "roadmap: completion roll-ups and timelines over portfolio snapshots",
    long_about = None
)]
struct Cli {
    /// Log at debug level unless `ROADMAP_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Views",
        about = "Show the hierarchy with computed completion",
        long_about = "Show business requests, features, epics, and stories as a tree. \
                      Completion on every non-story node is computed from its children.",
        after_help = "EXAMPLES:\n    # Whole portfolio\n    roadmap tree snapshot.json\n\n    # One subtree\n    roadmap tree snapshot.json --id br-1\n\n    # Emit machine-readable output\n    roadmap tree snapshot.json --format json"
    )]
    Tree(cmd::tree::TreeArgs),

    #[command(
        next_help_heading = "Views",
        about = "Place items in a Monday-aligned date window",
        long_about = "Flatten the hierarchy in pre-order and position each item inside \
                      a fixed-length window that starts on a Monday.",
        after_help = "EXAMPLES:\n    # Eight weeks starting this week\n    roadmap timeline snapshot.json\n\n    # The window after the one containing a date\n    roadmap timeline snapshot.json --from 2025-01-08 --offset 1\n\n    # Only blocked stories, grouped by month\n    roadmap timeline snapshot.json --status blocked --type story --view monthly"
    )]
    Timeline(cmd::timeline::TimelineArgs),

    #[command(
        next_help_heading = "Views",
        about = "Summarize every business request",
        after_help = "EXAMPLES:\n    # Sorted by title\n    roadmap grid snapshot.json\n\n    # Least complete first\n    roadmap grid snapshot.json --sort completion\n\n    # Search titles, themes, and initiatives\n    roadmap grid snapshot.json --search compliance"
    )]
    Grid(cmd::grid::GridArgs),

    #[command(
        next_help_heading = "Counts",
        about = "Count items by status",
        long_about = "Count the direct children of an item by status. For business \
                      requests, also count each level beneath it.",
        after_help = "EXAMPLES:\n    # Every business request\n    roadmap breakdown snapshot.json\n\n    # Children of one epic\n    roadmap breakdown snapshot.json --id e-1\n\n    # Business requests under an initiative\n    roadmap breakdown snapshot.json --initiative in-1"
    )]
    Breakdown(cmd::breakdown::BreakdownArgs),

    #[command(
        next_help_heading = "Counts",
        about = "Group stories by fix version",
        after_help = "EXAMPLES:\n    # All stories\n    roadmap releases snapshot.json\n\n    # Stories under one business request\n    roadmap releases snapshot.json --id br-1"
    )]
    Releases(cmd::releases::ReleasesArgs),

    #[command(
        next_help_heading = "Counts",
        about = "Completion and risk per strategic theme",
        long_about = "Roll up the business requests under each theme, directly or through \
                      an initiative, and count done and blocked items beneath them.",
        after_help = "EXAMPLES:\n    # Every theme\n    roadmap themes snapshot.json\n\n    # One theme\n    roadmap themes snapshot.json --id th-1"
    )]
    Themes(cmd::themes::ThemesArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Report completion drift and inverted date ranges",
        after_help = "EXAMPLES:\n    # Report issues\n    roadmap check snapshot.json\n\n    # Allow a 5 point gap and fail on anything larger\n    roadmap check snapshot.json --tolerance 5 --strict"
    )]
    Check(cmd::check::CheckArgs),
}

/// Filter used when `ROADMAP_LOG` is unset.
const fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "roadmap=debug,info"
    } else {
        "roadmap=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let verbose = verbose || env::var("DEBUG").is_ok();
    let filter = EnvFilter::try_from_env("ROADMAP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let format = env::var("ROADMAP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output; logs always go to stderr.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    let config = load_project_config(&project_root)?;

    match &cli.command {
        Commands::Tree(args) => cmd::tree::run_tree(args, output),
        Commands::Timeline(args) => cmd::timeline::run_timeline(args, output, &config),
        Commands::Grid(args) => cmd::grid::run_grid(args, output, &config),
        Commands::Breakdown(args) => cmd::breakdown::run_breakdown(args, output),
        Commands::Releases(args) => cmd::releases::run_releases(args, output),
        Commands::Themes(args) => cmd::themes::run_themes(args, output, &config),
        Commands::Check(args) => cmd::check::run_check(args, output, &config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(command = ?cli.command, "starting");

    let user_config = load_user_config().unwrap_or_else(|err| {
        warn!("ignoring user config: {err:#}");
        UserConfig::default()
    });
    let output = resolve_output_mode(cli.format, cli.json, user_config.output.as_deref());

    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["roadmap", "--format", "json", "tree", "s.json"]);
        assert_eq!(cli.format, Some(OutputMode::Json));
        assert!(matches!(cli.command, Commands::Tree(_)));
    }

    #[test]
    fn format_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["roadmap", "grid", "s.json", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn hidden_json_flag_still_parses() {
        let cli = Cli::parse_from(["roadmap", "releases", "s.json", "--json"]);
        assert!(cli.json);
        assert!(cli.format.is_none());
    }

    #[test]
    fn timeline_accepts_negative_offset_and_filters() {
        let cli = Cli::parse_from([
            "roadmap",
            "timeline",
            "s.json",
            "--from",
            "2025-01-08",
            "--offset",
            "-2",
            "--status",
            "blocked,in-progress",
            "--type",
            "story",
            "--view",
            "month",
        ]);
        let Commands::Timeline(args) = cli.command else {
            panic!("expected timeline");
        };
        assert_eq!(args.offset, -2);
        assert_eq!(args.status.len(), 2);
        assert_eq!(args.item_type.len(), 1);
        assert_eq!(
            args.view,
            Some(roadmap_core::timeline::TimelineView::Monthly)
        );
        assert_eq!(
            args.from,
            chrono::NaiveDate::from_ymd_opt(2025, 1, 8)
        );
    }

    #[test]
    fn timeline_rejects_unknown_status() {
        let result = Cli::try_parse_from(["roadmap", "timeline", "s.json", "--status", "paused"]);
        assert!(result.is_err());
    }

    #[test]
    fn grid_sort_accepts_aliases() {
        let cli = Cli::parse_from(["roadmap", "grid", "s.json", "--sort", "progress", "--desc"]);
        let Commands::Grid(args) = cli.command else {
            panic!("expected grid");
        };
        assert_eq!(args.sort, roadmap_core::filter::SortField::Completion);
        assert!(args.desc);
    }

    #[test]
    fn breakdown_id_conflicts_with_initiative() {
        let result = Cli::try_parse_from([
            "roadmap",
            "breakdown",
            "s.json",
            "--id",
            "br-1",
            "--initiative",
            "in-1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn check_tolerance_is_bounded() {
        assert!(Cli::try_parse_from(["roadmap", "check", "s.json", "--tolerance", "101"]).is_err());
        let cli = Cli::parse_from(["roadmap", "check", "s.json", "--tolerance", "5", "--strict"]);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.tolerance, Some(5));
        assert!(args.strict);
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["roadmap", "tree", "s.json"],
            vec!["roadmap", "timeline", "s.json"],
            vec!["roadmap", "grid", "s.json"],
            vec!["roadmap", "breakdown", "s.json"],
            vec!["roadmap", "releases", "s.json"],
            vec!["roadmap", "themes", "s.json"],
            vec!["roadmap", "check", "s.json"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(
                result.is_ok(),
                "Failed to parse: {:?}: {:?}",
                args,
                result.err()
            );
        }
    }

    #[test]
    fn verbose_raises_default_filter() {
        let cli = Cli::parse_from(["roadmap", "tree", "s.json", "-v"]);
        assert!(cli.verbose);
        assert_eq!(default_directive(cli.verbose), "roadmap=debug,info");
        assert_eq!(default_directive(false), "roadmap=info,warn");
    }

    #[test]
    fn timeline_days_is_bounded() {
        for days in ["0", "3654"] {
            assert!(
                Cli::try_parse_from(["roadmap", "timeline", "s.json", "--days", days]).is_err(),
                "--days {days} should be rejected"
            );
        }
        let cli = Cli::parse_from(["roadmap", "timeline", "s.json", "--days", "3653"]);
        let Commands::Timeline(args) = cli.command else {
            panic!("expected timeline");
        };
        assert_eq!(args.days, Some(3653));
    }

    #[test]
    fn snapshot_argument_is_required() {
        assert!(Cli::try_parse_from(["roadmap", "tree"]).is_err());
    }
}
