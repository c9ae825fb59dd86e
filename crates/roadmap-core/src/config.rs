use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RoadmapError;
use crate::filter::HealthThresholds;
use crate::timeline::window::{DEFAULT_WINDOW_DAYS, TimelineView};

/// Project config, read from `.roadmap/config.toml` under the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub health: HealthThresholds,
    #[serde(default)]
    pub check: CheckConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default)]
    pub view: TimelineView,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            view: TimelineView::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Percentage points a reported completion may differ from the computed
    /// one before `check` flags it.
    #[serde(default)]
    pub drift_tolerance: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// Parse project config text.
///
/// # Errors
///
/// Returns [`RoadmapError::ConfigParse`] for malformed TOML or mistyped
/// fields.
pub fn parse_project_config(content: &str) -> Result<ProjectConfig, RoadmapError> {
    Ok(toml::from_str::<ProjectConfig>(content)?)
}

/// Missing file means defaults.
///
/// # Errors
///
/// Returns an error naming the path if the file exists but cannot be read
/// or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".roadmap/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_project_config(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// # Errors
///
/// Returns an error if the user config file exists but is unreadable or
/// malformed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("roadmap/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Precedence: CLI flag, then `FORMAT`, then user config, then TTY
/// detection. Unrecognized values at any layer fall through.
#[must_use]
pub fn resolve_output(
    cli_format: Option<&str>,
    user_output: Option<&str>,
    env_format: Option<&str>,
    is_tty: bool,
) -> &'static str {
    [cli_format, env_format, user_output]
        .into_iter()
        .flatten()
        .find_map(normalize_output_mode)
        .unwrap_or(if is_tty { "pretty" } else { "text" })
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

const fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}
