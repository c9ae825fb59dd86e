pub mod breakdown;
pub mod check;
pub mod grid;
pub mod releases;
pub mod themes;
pub mod timeline;
pub mod tree;

use std::path::Path;

use anyhow::Context;
use roadmap_core::ingest::load_snapshot;
use roadmap_core::model::Portfolio;
use tracing::debug;

/// Load and assemble a snapshot, naming the file in any error.
pub fn load_portfolio(path: &Path) -> anyhow::Result<Portfolio> {
    let portfolio = load_snapshot(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
    debug!(
        path = %path.display(),
        business_requests = portfolio.business_requests.len(),
        "snapshot loaded"
    );
    Ok(portfolio)
}

/// Trim `text` to at most `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
