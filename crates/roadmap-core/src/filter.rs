//! Filtering and sorting for list-style views.
//!
//! [`IntervalFilter`] narrows timeline rows. [`RequestSummary`] rows back
//! the business-request grid and sort with [`sort_summaries`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::breakdown::{RequestBreakdown, blocked_descendants};
use crate::index::PortfolioIndex;
use crate::model::{ItemType, ParseEnumError, Portfolio, Priority, Status};
use crate::rollup::Rollup;
use crate::timeline::Interval;

// ---------------------------------------------------------------------------
// Interval filter
// ---------------------------------------------------------------------------

/// Filter criteria for timeline rows.
///
/// Set fields combine with AND semantics; within a list field any entry
/// matches. An empty filter keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalFilter {
    /// Case-insensitive substring over title, theme name, and initiative name.
    pub search: Option<String>,
    pub statuses: Vec<Status>,
    pub item_types: Vec<ItemType>,
    pub priorities: Vec<Priority>,
    /// Exact match on the row's release label.
    pub release_label: Option<String>,
}

impl IntervalFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().is_none_or(|q| q.trim().is_empty())
            && self.statuses.is_empty()
            && self.item_types.is_empty()
            && self.priorities.is_empty()
            && self.release_label.is_none()
    }

    /// Keep only matching rows, preserving order.
    #[must_use]
    pub fn apply(&self, rows: Vec<Interval>) -> Vec<Interval> {
        if self.is_empty() {
            return rows;
        }
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }

    #[must_use]
    pub fn matches(&self, row: &Interval) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&row.status) {
            return false;
        }
        if !self.item_types.is_empty() && !self.item_types.contains(&row.item_type) {
            return false;
        }
        if !self.priorities.is_empty() && !self.priorities.contains(&row.priority) {
            return false;
        }
        if let Some(label) = &self.release_label {
            if row.release_label.as_deref() != Some(label.as_str()) {
                return false;
            }
        }
        match self.search.as_deref() {
            Some(query) => matches_search(
                query,
                [
                    Some(row.title.as_str()),
                    row.theme_name.as_deref(),
                    row.initiative_name.as_deref(),
                ],
            ),
            None => true,
        }
    }
}

fn matches_search<'a>(query: &str, haystacks: impl IntoIterator<Item = Option<&'a str>>) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    haystacks
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(&query))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Completion cut-offs for [`Health`], in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    pub healthy: u8,
    pub watch: u8,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            healthy: 75,
            watch: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Health {
    /// Something beneath the request is blocked.
    AtRisk,
    OnTrack,
    Watch,
    Early,
}

impl Health {
    /// Blocked work wins over any completion level.
    #[must_use]
    pub const fn classify(completion: u8, blocked: usize, thresholds: HealthThresholds) -> Self {
        if blocked > 0 {
            Self::AtRisk
        } else if completion >= thresholds.healthy {
            Self::OnTrack
        } else if completion >= thresholds.watch {
            Self::Watch
        } else {
            Self::Early
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AtRisk => "at-risk",
            Self::OnTrack => "on-track",
            Self::Watch => "watch",
            Self::Early => "early",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request grid
// ---------------------------------------------------------------------------

/// One grid row per business request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiative_name: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub completion_percentage: u8,
    pub blocked_count: usize,
    pub breakdown: RequestBreakdown,
    pub health: Health,
}

impl RequestSummary {
    /// Case-insensitive substring over title, theme name, and initiative name.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        matches_search(
            query,
            [
                Some(self.title.as_str()),
                self.theme_name.as_deref(),
                self.initiative_name.as_deref(),
            ],
        )
    }
}

/// Summarize every business request, in input order.
#[must_use]
#[instrument(skip_all, fields(roots = portfolio.business_requests.len()))]
pub fn summarize_requests(
    portfolio: &Portfolio,
    index: &PortfolioIndex<'_>,
    thresholds: &HealthThresholds,
) -> Vec<RequestSummary> {
    let rollup = Rollup::of_forest(&portfolio.business_requests);
    portfolio
        .business_requests
        .iter()
        .map(|br| {
            let context = index.context_for(br);
            let completion = rollup.completion(br.into());
            let blocked = blocked_descendants(br);
            RequestSummary {
                id: br.fields.id.clone(),
                title: br.fields.title.clone(),
                theme_name: context.theme_name.map(str::to_string),
                initiative_name: context.initiative_name.map(str::to_string),
                status: br.fields.status,
                priority: br.fields.priority,
                completion_percentage: completion,
                blocked_count: blocked,
                breakdown: RequestBreakdown::of(br),
                health: Health::classify(completion, blocked, *thresholds),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Title,
    /// Ranked low < medium < high.
    Priority,
    Completion,
    Blocked,
}

impl SortField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Priority => "priority",
            Self::Completion => "completion",
            Self::Blocked => "blocked",
        }
    }

    fn compare(self, a: &RequestSummary, b: &RequestSummary) -> Ordering {
        match self {
            Self::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            Self::Priority => a.priority.cmp(&b.priority),
            Self::Completion => a.completion_percentage.cmp(&b.completion_percentage),
            Self::Blocked => a.blocked_count.cmp(&b.blocked_count),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" | "name" => Ok(Self::Title),
            "priority" => Ok(Self::Priority),
            "completion" | "progress" => Ok(Self::Completion),
            "blocked" => Ok(Self::Blocked),
            _ => Err(ParseEnumError {
                expected: "sort field",
                got: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Stable sort; equal rows keep their input order in both directions.
pub fn sort_summaries(rows: &mut [RequestSummary], field: SortField, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ordering = field.compare(a, b);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BusinessRequest, Epic, ItemFields, RequestChild, Story};
    use crate::model::{Initiative, Theme};
    use crate::timeline::flatten_portfolio;
    use chrono::NaiveDate;

    fn fields(id: &str, title: &str, status: Status) -> ItemFields {
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date");
        ItemFields::new(id, title, status, day, day)
    }

    fn request(id: &str, title: &str, priority: Priority, stories: Vec<Story>) -> BusinessRequest {
        let mut br = BusinessRequest::new(
            fields(id, title, Status::InProgress).with_priority(priority),
            vec![RequestChild::Epic(Epic::new(
                fields(&format!("{id}-epic"), "Epic", Status::InProgress),
                stories,
            ))],
        );
        br.initiative_id = Some("init-1".to_string());
        br
    }

    fn portfolio() -> Portfolio {
        Portfolio {
            themes: vec![Theme {
                id: "theme-1".to_string(),
                name: "Customer Experience".to_string(),
                description: None,
            }],
            initiatives: vec![Initiative {
                id: "init-1".to_string(),
                name: "Self Service".to_string(),
                theme_id: Some("theme-1".to_string()),
                owner: None,
                description: None,
            }],
            business_requests: vec![
                request(
                    "br-a",
                    "Billing portal",
                    Priority::Low,
                    vec![Story::new(fields("a1", "s", Status::Done), 100)],
                ),
                request(
                    "br-b",
                    "Account recovery",
                    Priority::High,
                    vec![
                        Story::new(fields("b1", "s", Status::Blocked), 20),
                        Story::new(fields("b2", "s", Status::InProgress), 40),
                    ],
                ),
                request(
                    "br-c",
                    "Chat support",
                    Priority::Medium,
                    vec![Story::new(fields("c1", "s", Status::InProgress), 60)],
                ),
            ],
        }
    }

    #[test]
    fn health_thresholds_and_blocked_override() {
        let t = HealthThresholds::default();
        assert_eq!(Health::classify(100, 1, t), Health::AtRisk);
        assert_eq!(Health::classify(75, 0, t), Health::OnTrack);
        assert_eq!(Health::classify(74, 0, t), Health::Watch);
        assert_eq!(Health::classify(50, 0, t), Health::Watch);
        assert_eq!(Health::classify(49, 0, t), Health::Early);
    }

    #[test]
    fn summaries_carry_rollup_context_and_health() {
        let portfolio = portfolio();
        let index = PortfolioIndex::build(&portfolio).unwrap();
        let rows = summarize_requests(&portfolio, &index, &HealthThresholds::default());
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].completion_percentage, 100);
        assert_eq!(rows[0].health, Health::OnTrack);
        assert_eq!(rows[0].initiative_name.as_deref(), Some("Self Service"));
        assert_eq!(rows[0].theme_name.as_deref(), Some("Customer Experience"));

        assert_eq!(rows[1].completion_percentage, 30);
        assert_eq!(rows[1].blocked_count, 1);
        assert_eq!(rows[1].health, Health::AtRisk);
        assert_eq!(rows[1].breakdown.stories.total(), 2);

        assert_eq!(rows[2].health, Health::Watch);
    }

    #[test]
    fn sort_by_each_field() {
        let portfolio = portfolio();
        let index = PortfolioIndex::build(&portfolio).unwrap();
        let mut rows = summarize_requests(&portfolio, &index, &HealthThresholds::default());
        let ids = |rows: &[RequestSummary]| -> Vec<String> {
            rows.iter().map(|r| r.id.clone()).collect()
        };

        sort_summaries(&mut rows, SortField::Title, SortDirection::Ascending);
        assert_eq!(ids(&rows), vec!["br-b", "br-a", "br-c"]);

        sort_summaries(&mut rows, SortField::Priority, SortDirection::Descending);
        assert_eq!(ids(&rows), vec!["br-b", "br-c", "br-a"]);

        sort_summaries(&mut rows, SortField::Completion, SortDirection::Ascending);
        assert_eq!(ids(&rows), vec!["br-b", "br-c", "br-a"]);

        sort_summaries(&mut rows, SortField::Blocked, SortDirection::Descending);
        assert_eq!(rows[0].id, "br-b");
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let portfolio = portfolio();
        let index = PortfolioIndex::build(&portfolio).unwrap();
        let mut rows = summarize_requests(&portfolio, &index, &HealthThresholds::default());
        // br-a and br-c both have zero blocked items.
        sort_summaries(&mut rows, SortField::Blocked, SortDirection::Descending);
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["br-b", "br-a", "br-c"]);
    }

    #[test]
    fn search_matches_title_theme_and_initiative() {
        let portfolio = portfolio();
        let index = PortfolioIndex::build(&portfolio).unwrap();
        let rows = summarize_requests(&portfolio, &index, &HealthThresholds::default());
        assert!(rows[0].matches_search("billing"));
        assert!(rows[0].matches_search("SELF service"));
        assert!(rows[0].matches_search("customer"));
        assert!(!rows[0].matches_search("recovery"));
        assert!(rows[0].matches_search("   "));
    }

    #[test]
    fn interval_filter_combines_criteria() {
        let portfolio = portfolio();
        let index = PortfolioIndex::build(&portfolio).unwrap();
        let rows = flatten_portfolio(&portfolio, &index);
        assert_eq!(rows.len(), 10);

        assert!(IntervalFilter::default().is_empty());
        assert_eq!(IntervalFilter::default().apply(rows.clone()).len(), 10);

        let stories = IntervalFilter {
            item_types: vec![ItemType::Story],
            ..IntervalFilter::default()
        };
        assert_eq!(stories.apply(rows.clone()).len(), 4);

        let blocked_stories = IntervalFilter {
            item_types: vec![ItemType::Story],
            statuses: vec![Status::Blocked],
            ..IntervalFilter::default()
        };
        let kept = blocked_stories.apply(rows.clone());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "b1");

        // Every row inherits the initiative name, so this keeps everything.
        let by_initiative = IntervalFilter {
            search: Some("self serv".to_string()),
            ..IntervalFilter::default()
        };
        assert_eq!(by_initiative.apply(rows.clone()).len(), 10);

        let by_title = IntervalFilter {
            search: Some("chat".to_string()),
            ..IntervalFilter::default()
        };
        let kept = by_title.apply(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "br-c");
    }

    #[test]
    fn sort_field_parses() {
        assert_eq!("name".parse::<SortField>().ok(), Some(SortField::Title));
        assert_eq!(" Completion ".parse::<SortField>().ok(), Some(SortField::Completion));
        assert!("age".parse::<SortField>().is_err());
    }
}
