//! Four-bucket status counts, plus the release and theme aggregates built
//! on them.
//!
//! A breakdown looks at one level of items and counts each by its own
//! status. It never recurses and never looks at rolled-up values; views that
//! report several levels ask for one breakdown per level.

use serde::Serialize;

use crate::error::RoadmapError;
use crate::filter::{Health, HealthThresholds};
use crate::index::PortfolioIndex;
use crate::model::{BusinessRequest, ItemType, Node, Priority, Status, Story, WorkItem};
use crate::rollup::{compute_completion, round_half_up_mean};

/// Group name for stories with no fix version.
pub const UNSCHEDULED_RELEASE: &str = "unscheduled";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub done: usize,
    pub in_progress: usize,
    pub blocked: usize,
    pub not_started: usize,
}

impl StatusBreakdown {
    pub const fn record(&mut self, status: Status) {
        match status {
            Status::Done => self.done += 1,
            Status::InProgress => self.in_progress += 1,
            Status::Blocked => self.blocked += 1,
            Status::NotStarted => self.not_started += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.done + self.in_progress + self.blocked + self.not_started
    }

    #[must_use]
    pub const fn count(&self, status: Status) -> usize {
        match status {
            Status::Done => self.done,
            Status::InProgress => self.in_progress,
            Status::Blocked => self.blocked,
            Status::NotStarted => self.not_started,
        }
    }

    /// Share of items marked done, rounded half-up; 0 for an empty set.
    #[must_use]
    pub fn percent_done(&self) -> u8 {
        let done = u64::try_from(self.done).unwrap_or(u64::MAX / 200);
        round_half_up_mean(done.saturating_mul(100), self.total())
    }
}

/// Count `items` by their own status.
pub fn compute_breakdown<W: WorkItem>(items: impl IntoIterator<Item = W>) -> StatusBreakdown {
    let mut breakdown = StatusBreakdown::default();
    for item in items {
        breakdown.record(item.status());
    }
    breakdown
}

/// Per-level counts for one business request: features, epics, and stories
/// anywhere beneath it, each level counted independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestBreakdown {
    pub features: StatusBreakdown,
    pub epics: StatusBreakdown,
    pub stories: StatusBreakdown,
}

impl RequestBreakdown {
    #[must_use]
    pub fn of(br: &BusinessRequest) -> Self {
        Self {
            features: compute_breakdown(br.features()),
            epics: compute_breakdown(br.epics()),
            stories: compute_breakdown(br.stories()),
        }
    }

    #[must_use]
    pub const fn level(&self, item_type: ItemType) -> Option<&StatusBreakdown> {
        match item_type {
            ItemType::Feature => Some(&self.features),
            ItemType::Epic => Some(&self.epics),
            ItemType::Story => Some(&self.stories),
            ItemType::BusinessRequest => None,
        }
    }
}

/// Blocked items anywhere under `br` (features, epics, and stories).
#[must_use]
pub fn blocked_descendants(br: &BusinessRequest) -> usize {
    let counts = RequestBreakdown::of(br);
    counts.features.blocked + counts.epics.blocked + counts.stories.blocked
}

/// Breakdown of the business requests filed under one initiative.
#[must_use]
pub fn initiative_breakdown(index: &PortfolioIndex<'_>, initiative_id: &str) -> StatusBreakdown {
    compute_breakdown(index.business_requests_for_initiative(initiative_id))
}

/// Stories sharing one fix version.
///
/// `percent_done` counts stories; `points_completion` weighs them by story
/// points, with unestimated stories contributing nothing to either total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSummary {
    pub fix_version: String,
    pub story_ids: Vec<String>,
    pub breakdown: StatusBreakdown,
    pub percent_done: u8,
    pub total_points: u64,
    pub done_points: u64,
    pub points_completion: u8,
}

/// Group stories by fix version, in order of first appearance.
#[must_use]
pub fn release_summaries<'a>(stories: impl IntoIterator<Item = &'a Story>) -> Vec<ReleaseSummary> {
    let mut summaries: Vec<ReleaseSummary> = Vec::new();
    for story in stories {
        let version = story.fix_version.as_deref().unwrap_or(UNSCHEDULED_RELEASE);
        let position = summaries
            .iter()
            .position(|s| s.fix_version == version)
            .unwrap_or_else(|| {
                summaries.push(ReleaseSummary {
                    fix_version: version.to_string(),
                    story_ids: Vec::new(),
                    breakdown: StatusBreakdown::default(),
                    percent_done: 0,
                    total_points: 0,
                    done_points: 0,
                    points_completion: 0,
                });
                summaries.len() - 1
            });
        let summary = &mut summaries[position];
        summary.story_ids.push(story.fields.id.clone());
        summary.breakdown.record(story.status());

        let points = u64::from(story.story_points.unwrap_or(0));
        summary.total_points += points;
        if story.status() == Status::Done {
            summary.done_points += points;
        }
    }

    for summary in &mut summaries {
        summary.percent_done = summary.breakdown.percent_done();
        summary.points_completion = points_completion(summary.done_points, summary.total_points);
    }
    summaries
}

/// Blocked items counted by their own priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityCounts {
    pub const fn record(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Roll-up of every business request filed under one strategic theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeSummary {
    pub id: String,
    pub name: String,
    /// Unweighted mean of the requests' computed completion.
    pub completion_percentage: u8,
    pub business_requests: usize,
    pub total_initiatives: usize,
    /// Initiatives with at least one request, every one of them done.
    pub completed_initiatives: usize,
    pub total_items: usize,
    pub completed_items: usize,
    pub at_risk_items: usize,
    pub at_risk_by_priority: PriorityCounts,
    pub health: Health,
}

/// Summarize the theme `theme_id`.
///
/// A request belongs to the theme it names, or failing that to its
/// initiative's theme. Items are every node beneath those requests plus the
/// requests themselves; an item is at risk when its own status is blocked.
///
/// # Errors
///
/// Returns [`RoadmapError::ItemNotFound`] if no theme has that ID.
pub fn theme_summary(
    index: &PortfolioIndex<'_>,
    theme_id: &str,
    thresholds: HealthThresholds,
) -> Result<ThemeSummary, RoadmapError> {
    let theme = index
        .theme(theme_id)
        .ok_or_else(|| RoadmapError::ItemNotFound(theme_id.to_string()))?;
    let initiatives: Vec<&str> = index
        .initiatives_for_theme(theme_id)
        .map(|initiative| initiative.id.as_str())
        .collect();

    let requests: Vec<&BusinessRequest> = index
        .portfolio()
        .business_requests
        .iter()
        .filter(|br| match br.theme_id.as_deref() {
            Some(id) => id == theme_id,
            None => br
                .initiative_id
                .as_deref()
                .is_some_and(|id| initiatives.contains(&id)),
        })
        .collect();

    let completion_sum: u64 = requests
        .iter()
        .map(|br| u64::from(compute_completion(*br)))
        .sum();

    let completed_initiatives = initiatives
        .iter()
        .filter(|&&initiative_id| {
            let mut filed = requests
                .iter()
                .filter(|br| br.initiative_id.as_deref() == Some(initiative_id))
                .peekable();
            filed.peek().is_some() && filed.all(|br| br.status() == Status::Done)
        })
        .count();

    let mut items = StatusBreakdown::default();
    let mut at_risk_by_priority = PriorityCounts::default();
    let mut stack: Vec<Node<'_>> = requests.iter().map(|br| Node::from(*br)).collect();
    while let Some(node) = stack.pop() {
        let fields = node.fields();
        items.record(fields.status);
        if fields.status == Status::Blocked {
            at_risk_by_priority.record(fields.priority);
        }
        stack.extend(node.children());
    }

    let completion_percentage = round_half_up_mean(completion_sum, requests.len());
    Ok(ThemeSummary {
        id: theme.id.clone(),
        name: theme.name.clone(),
        completion_percentage,
        business_requests: requests.len(),
        total_initiatives: initiatives.len(),
        completed_initiatives,
        total_items: items.total(),
        completed_items: items.done,
        at_risk_items: items.blocked,
        at_risk_by_priority,
        health: Health::classify(completion_percentage, items.blocked, thresholds),
    })
}

/// Done points as a rounded share of all points; 0 when nothing is estimated.
fn points_completion(done: u64, total: u64) -> u8 {
    let total = usize::try_from(total).unwrap_or(usize::MAX);
    round_half_up_mean(done.saturating_mul(100), total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Epic, Feature, Initiative, ItemFields, Portfolio, RequestChild, Theme};
    use chrono::NaiveDate;

    fn fields(id: &str, status: Status) -> ItemFields {
        let day = NaiveDate::from_ymd_opt(2025, 5, 5).expect("valid date");
        ItemFields::new(id, id, status, day, day)
    }

    fn story(id: &str, status: Status, version: Option<&str>) -> Story {
        let mut s = Story::new(fields(id, status), 0);
        s.fix_version = version.map(str::to_string);
        s
    }

    #[test]
    fn counts_each_child_once() {
        let stories = vec![
            story("a", Status::Done, None),
            story("b", Status::Done, None),
            story("c", Status::Blocked, None),
            story("d", Status::InProgress, None),
            story("e", Status::NotStarted, None),
        ];
        let counts = compute_breakdown(&stories);
        assert_eq!(counts.done, 2);
        assert_eq!(counts.blocked, 1);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.not_started, 1);
        assert_eq!(counts.total(), stories.len());
        assert_eq!(counts.count(Status::Done), 2);
    }

    #[test]
    fn empty_request_has_zero_breakdown() {
        let br = BusinessRequest::new(fields("br", Status::NotStarted), vec![]);
        let counts = compute_breakdown(&br.children);
        assert_eq!(counts, StatusBreakdown::default());
        assert_eq!(counts.percent_done(), 0);
        assert_eq!(RequestBreakdown::of(&br), RequestBreakdown::default());
    }

    #[test]
    fn breakdown_uses_own_status_not_children() {
        // A done epic full of blocked stories still counts as done.
        let epic = Epic::new(
            fields("e", Status::Done),
            vec![story("s", Status::Blocked, None)],
        );
        let counts = compute_breakdown([&epic]);
        assert_eq!(counts.done, 1);
        assert_eq!(counts.blocked, 0);
    }

    #[test]
    fn request_breakdown_counts_each_level() {
        let br = BusinessRequest::new(
            fields("br", Status::InProgress),
            vec![
                RequestChild::Feature(Feature::new(
                    fields("f", Status::Blocked),
                    vec![Epic::new(
                        fields("e1", Status::InProgress),
                        vec![
                            story("s1", Status::Done, None),
                            story("s2", Status::Blocked, None),
                        ],
                    )],
                )),
                RequestChild::Epic(Epic::new(
                    fields("e2", Status::Done),
                    vec![story("s3", Status::Done, None)],
                )),
            ],
        );
        let counts = RequestBreakdown::of(&br);
        assert_eq!(counts.features.total(), 1);
        assert_eq!(counts.features.blocked, 1);
        assert_eq!(counts.epics.total(), 2);
        assert_eq!(counts.epics.done, 1);
        assert_eq!(counts.stories.total(), 3);
        assert_eq!(counts.stories.done, 2);
        assert_eq!(counts.level(ItemType::Story), Some(&counts.stories));
        assert_eq!(counts.level(ItemType::BusinessRequest), None);
        assert_eq!(blocked_descendants(&br), 2);
    }

    #[test]
    fn release_summaries_group_in_first_seen_order() {
        let stories = vec![
            story("a", Status::Done, Some("2.0")),
            story("b", Status::InProgress, Some("1.5")),
            story("c", Status::Done, Some("2.0")),
            story("d", Status::NotStarted, None),
            story("e", Status::Blocked, Some("2.0")),
        ];
        let summaries = release_summaries(&stories);
        let versions: Vec<&str> = summaries.iter().map(|s| s.fix_version.as_str()).collect();
        assert_eq!(versions, vec!["2.0", "1.5", UNSCHEDULED_RELEASE]);

        let v2 = &summaries[0];
        assert_eq!(v2.story_ids, vec!["a", "c", "e"]);
        assert_eq!(v2.breakdown.done, 2);
        assert_eq!(v2.percent_done, 67);
        assert_eq!(summaries[1].percent_done, 0);
    }

    #[test]
    fn release_points_weigh_done_stories() {
        let pointed = |id: &str, status: Status, points: Option<u32>| {
            let mut s = story(id, status, Some("3.1"));
            s.story_points = points;
            s
        };
        let stories = vec![
            pointed("a", Status::Done, Some(3)),
            pointed("b", Status::InProgress, Some(5)),
            pointed("c", Status::Done, None),
        ];
        let summary = &release_summaries(&stories)[0];
        assert_eq!(summary.total_points, 8);
        assert_eq!(summary.done_points, 3);
        // 37.5 rounds half-up.
        assert_eq!(summary.points_completion, 38);
        assert_eq!(summary.percent_done, 67);
    }

    #[test]
    fn unestimated_release_has_zero_points_completion() {
        let stories = vec![story("a", Status::Done, Some("1.0"))];
        let summary = &release_summaries(&stories)[0];
        assert_eq!(summary.total_points, 0);
        assert_eq!(summary.points_completion, 0);
        assert_eq!(summary.percent_done, 100);
    }

    fn themed_portfolio() -> Portfolio {
        let theme = |id: &str, name: &str| Theme {
            id: id.into(),
            name: name.into(),
            description: None,
        };
        let initiative = |id: &str, theme_id: &str| Initiative {
            id: id.into(),
            name: id.to_uppercase(),
            theme_id: Some(theme_id.into()),
            owner: None,
            description: None,
        };
        let request = |id: &str, status: Status, initiative_id: &str, epics: Vec<Epic>| {
            let mut br = BusinessRequest::new(
                fields(id, status),
                epics.into_iter().map(RequestChild::Epic).collect(),
            );
            br.initiative_id = Some(initiative_id.into());
            br
        };
        let mut high_blocked = story("s-b1", Status::Blocked, None);
        high_blocked.fields.priority = Priority::High;
        let mut done = story("s-b2", Status::Done, None);
        done.completion_percentage = 100;
        let mut finished = story("s-a", Status::Done, None);
        finished.completion_percentage = 100;

        let mut elsewhere = request("br-c", Status::InProgress, "in-1", vec![]);
        elsewhere.theme_id = Some("th-2".into());

        Portfolio {
            themes: vec![theme("th-1", "Compliance"), theme("th-2", "Growth")],
            initiatives: vec![
                initiative("in-1", "th-1"),
                initiative("in-2", "th-1"),
                initiative("in-3", "th-2"),
            ],
            business_requests: vec![
                request(
                    "br-a",
                    Status::Done,
                    "in-1",
                    vec![Epic::new(fields("e-a", Status::Done), vec![finished])],
                ),
                request(
                    "br-b",
                    Status::InProgress,
                    "in-2",
                    vec![Epic::new(
                        fields("e-b", Status::InProgress),
                        vec![high_blocked, done],
                    )],
                ),
                elsewhere,
                request("br-d", Status::NotStarted, "in-2", vec![]),
            ],
        }
    }

    #[test]
    fn theme_summary_rolls_up_requests_through_initiatives() {
        let portfolio = themed_portfolio();
        let index = PortfolioIndex::build(&portfolio).expect("index");
        let summary = theme_summary(&index, "th-1", HealthThresholds::default()).expect("theme");

        assert_eq!(summary.name, "Compliance");
        // br-a 100, br-b 50, br-d 0; br-c names th-2 directly.
        assert_eq!(summary.business_requests, 3);
        assert_eq!(summary.completion_percentage, 50);
        assert_eq!(summary.total_initiatives, 2);
        assert_eq!(summary.completed_initiatives, 1);
        assert_eq!(summary.total_items, 8);
        assert_eq!(summary.completed_items, 4);
        assert_eq!(summary.at_risk_items, 1);
        assert_eq!(summary.at_risk_by_priority.high, 1);
        assert_eq!(summary.at_risk_by_priority.total(), 1);
        assert_eq!(summary.health, Health::AtRisk);
    }

    #[test]
    fn explicit_theme_wins_and_empty_initiative_is_not_complete() {
        let portfolio = themed_portfolio();
        let index = PortfolioIndex::build(&portfolio).expect("index");
        let summary = theme_summary(&index, "th-2", HealthThresholds::default()).expect("theme");

        assert_eq!(summary.business_requests, 1);
        assert_eq!(summary.total_initiatives, 1);
        assert_eq!(summary.completed_initiatives, 0);
        assert_eq!(summary.total_items, 1);
        assert_eq!(summary.completion_percentage, 0);
        assert_eq!(summary.health, Health::Early);
    }

    #[test]
    fn unknown_theme_is_not_found() {
        let portfolio = themed_portfolio();
        let index = PortfolioIndex::build(&portfolio).expect("index");
        assert!(matches!(
            theme_summary(&index, "th-9", HealthThresholds::default()),
            Err(RoadmapError::ItemNotFound(id)) if id == "th-9"
        ));
    }
}
