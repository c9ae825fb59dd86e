//! Flat projection for timeline views.
//!
//! [`flatten_to_intervals`] emits one [`Interval`] per node in depth-first
//! pre-order: a parent always precedes its descendants and siblings keep
//! input order. Timeline rows render in emission order, so this ordering is
//! part of the contract. The result is a fully built `Vec` so callers can
//! filter and search it freely.
//!
//! Placing intervals inside a visible date range lives in [`window`] and is
//! independent of flattening.

pub mod window;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::instrument;

use crate::index::{PortfolioIndex, RequestContext};
use crate::model::{BusinessRequest, ItemType, Node, Portfolio, Priority, Status};
use crate::rollup::Rollup;

pub use window::{BarPosition, Period, TimelineView, TimelineWindow};

/// One timeline row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub status: Status,
    pub priority: Priority,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub completion_percentage: u8,
    /// 0 for the business request, 1 for its children, and so on.
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiative_name: Option<String>,
}

/// Flatten one business request, stamping each row with `context`. Pass
/// `RequestContext::default()` when theme and initiative names don't matter.
#[must_use]
pub fn flatten_to_intervals(root: &BusinessRequest, context: RequestContext<'_>) -> Vec<Interval> {
    let rollup = Rollup::of(root);
    let mut out = Vec::new();
    flatten_into(root, &rollup, context, &mut out);
    out
}

/// Flatten every business request in the portfolio, in input order.
#[must_use]
#[instrument(skip_all, fields(roots = portfolio.business_requests.len()))]
pub fn flatten_portfolio(portfolio: &Portfolio, index: &PortfolioIndex<'_>) -> Vec<Interval> {
    let rollup = Rollup::of_forest(&portfolio.business_requests);
    let mut out = Vec::with_capacity(rollup.len());
    for root in &portfolio.business_requests {
        flatten_into(root, &rollup, index.context_for(root), &mut out);
    }
    out
}

fn flatten_into(
    root: &BusinessRequest,
    rollup: &Rollup,
    context: RequestContext<'_>,
    out: &mut Vec<Interval>,
) {
    let mut stack: Vec<(Node<'_>, usize)> = vec![(Node::BusinessRequest(root), 0)];
    while let Some((node, depth)) = stack.pop() {
        out.push(interval_for(node, depth, rollup, context));
        stack.extend(
            node.children()
                .into_iter()
                .rev()
                .map(|child| (child, depth + 1)),
        );
    }
}

fn interval_for(node: Node<'_>, depth: usize, rollup: &Rollup, context: RequestContext<'_>) -> Interval {
    let fields = node.fields();
    Interval {
        id: fields.id.clone(),
        title: fields.title.clone(),
        item_type: node.item_type(),
        status: fields.status,
        priority: fields.priority,
        start_date: fields.start_date,
        end_date: fields.end_date,
        completion_percentage: rollup.completion(node),
        depth,
        release_label: fields.release_label.clone(),
        story_points: node.story_points(),
        theme_name: context.theme_name.map(str::to_string),
        initiative_name: context.initiative_name.map(str::to_string),
    }
}
