//! Consistency checks over an assembled portfolio.
//!
//! Nothing here changes aggregation results. Reported completion values on
//! non-story nodes are advisory, so a mismatch against the computed value is
//! surfaced as drift rather than corrected.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::model::{ItemType, Node, Portfolio};
use crate::rollup::Rollup;

/// A non-story whose upstream completion disagrees with the roll-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drift {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub reported: u8,
    pub computed: u8,
}

impl Drift {
    #[must_use]
    pub const fn delta(&self) -> u8 {
        self.reported.abs_diff(self.computed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvertedRange {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub nodes_checked: usize,
    pub drift_tolerance: u8,
    pub drift: Vec<Drift>,
    pub inverted_ranges: Vec<InvertedRange>,
}

impl CheckReport {
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.drift.len() + self.inverted_ranges.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }
}

/// Walk every node in pre-order and collect drift beyond `drift_tolerance`
/// percentage points, plus every node whose end date precedes its start.
#[must_use]
#[instrument(skip_all, fields(roots = portfolio.business_requests.len(), drift_tolerance = drift_tolerance))]
pub fn check_portfolio(portfolio: &Portfolio, drift_tolerance: u8) -> CheckReport {
    let rollup = Rollup::of_forest(&portfolio.business_requests);
    let mut report = CheckReport {
        drift_tolerance,
        ..CheckReport::default()
    };

    let mut stack: Vec<Node<'_>> = portfolio.roots().collect();
    stack.reverse();
    while let Some(node) = stack.pop() {
        report.nodes_checked += 1;
        let fields = node.fields();

        if !matches!(node, Node::Story(_)) {
            if let Some(reported) = node.reported_completion() {
                let drift = Drift {
                    id: fields.id.clone(),
                    item_type: node.item_type(),
                    reported,
                    computed: rollup.completion(node),
                };
                if drift.delta() > drift_tolerance {
                    report.drift.push(drift);
                }
            }
        }

        if fields.has_inverted_range() {
            report.inverted_ranges.push(InvertedRange {
                id: fields.id.clone(),
                item_type: node.item_type(),
                start_date: fields.start_date,
                end_date: fields.end_date,
            });
        }

        stack.extend(node.children().into_iter().rev());
    }

    debug!(
        nodes = report.nodes_checked,
        drift = report.drift.len(),
        inverted = report.inverted_ranges.len(),
        "check complete"
    );
    report
}
