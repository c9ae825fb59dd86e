//! Snapshot ingest: flat table rows → typed hierarchy.
//!
//! The data-access layer exports one row per item, each child naming its
//! parent by foreign key (`business_request_id`, `feature_id`, `epic_id`).
//! [`assemble`] resolves those references into a [`Portfolio`].
//!
//! # Ordering
//!
//! Children keep snapshot row order. A business request lists its features
//! first, then its directly attached epics, each group in row order.
//!
//! # Validation
//!
//! - IDs are unique across all four hierarchy tables.
//! - Every feature, epic, and story must reference an existing parent of the
//!   right level. Since each level attaches only to a strictly higher level,
//!   a cyclic parent chain cannot be assembled.
//! - Story percentages outside `0..=100` are clamped (logged at `warn`).
//! - Inverted date ranges and unknown theme/initiative references are kept
//!   and logged; neither affects aggregation.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::RoadmapError;
use crate::model::{
    BusinessRequest, Epic, Feature, Initiative, ItemFields, ItemType, ParseEnumError, Portfolio,
    Priority, RequestChild, Status, Story, Theme,
};

/// Tables whose rows carry `status` and `priority`.
const ITEM_TABLES: [&str; 4] = ["business_requests", "features", "epics", "stories"];

/// Flat export of the hierarchy tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub initiatives: Vec<Initiative>,
    #[serde(default)]
    pub business_requests: Vec<BusinessRequestRow>,
    #[serde(default)]
    pub features: Vec<FeatureRow>,
    #[serde(default)]
    pub epics: Vec<EpicRow>,
    #[serde(default)]
    pub stories: Vec<StoryRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRequestRow {
    #[serde(flatten)]
    pub fields: ItemFields,
    #[serde(default)]
    pub completion_percentage: Option<i64>,
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub initiative_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(flatten)]
    pub fields: ItemFields,
    #[serde(default)]
    pub completion_percentage: Option<i64>,
    #[serde(default)]
    pub business_request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicRow {
    #[serde(flatten)]
    pub fields: ItemFields,
    #[serde(default)]
    pub completion_percentage: Option<i64>,
    #[serde(default)]
    pub story_points: Option<u32>,
    /// Takes precedence over `business_request_id` when both are set.
    #[serde(default)]
    pub feature_id: Option<String>,
    #[serde(default)]
    pub business_request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRow {
    #[serde(flatten)]
    pub fields: ItemFields,
    pub completion_percentage: i64,
    #[serde(default)]
    pub story_points: Option<u32>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub fix_version: Option<String>,
    #[serde(default)]
    pub epic_id: Option<String>,
}

/// Parse a JSON snapshot. Unknown status/priority values fail here.
///
/// # Errors
///
/// - [`RoadmapError::InvalidEnumValue`] for a status or priority outside
///   the closed sets, naming the offending row.
/// - [`RoadmapError::SnapshotParse`] for malformed JSON, bad dates, or
///   mistyped fields.
pub fn parse_snapshot(json: &str) -> Result<Snapshot, RoadmapError> {
    let value: Value = serde_json::from_str(json)?;
    check_enum_values(&value)?;
    Ok(serde_json::from_value(value)?)
}

fn check_enum_values(snapshot: &Value) -> Result<(), RoadmapError> {
    let rows = ITEM_TABLES
        .iter()
        .filter_map(|table| snapshot.get(*table).and_then(Value::as_array))
        .flatten();
    for row in rows {
        let id = row.get("id").and_then(Value::as_str).unwrap_or("?");
        let invalid = |source: ParseEnumError| RoadmapError::InvalidEnumValue {
            id: id.to_string(),
            source,
        };
        if let Some(raw) = row.get("status").and_then(Value::as_str) {
            Status::from_str(raw).map_err(invalid)?;
        }
        if let Some(raw) = row.get("priority").and_then(Value::as_str) {
            Priority::from_str(raw).map_err(invalid)?;
        }
    }
    Ok(())
}

/// Read, parse, and assemble a snapshot file.
///
/// # Errors
///
/// Returns [`RoadmapError::Io`] when the file cannot be read, plus every
/// error [`parse_snapshot`] and [`assemble`] can produce.
pub fn load_snapshot(path: &Path) -> Result<Portfolio, RoadmapError> {
    let content = std::fs::read_to_string(path)?;
    let snapshot = parse_snapshot(&content)?;
    assemble(snapshot)
}

/// Resolve foreign keys into the typed forest.
///
/// # Errors
///
/// - [`RoadmapError::DuplicateId`] if an ID appears twice.
/// - [`RoadmapError::OrphanItem`] if a feature, epic, or story names no parent.
/// - [`RoadmapError::MissingParent`] if the named parent does not exist at
///   the required level.
#[instrument(skip_all, fields(
    business_requests = snapshot.business_requests.len(),
    features = snapshot.features.len(),
    epics = snapshot.epics.len(),
    stories = snapshot.stories.len(),
))]
pub fn assemble(snapshot: Snapshot) -> Result<Portfolio, RoadmapError> {
    let Snapshot {
        themes,
        initiatives,
        business_requests,
        features,
        epics,
        stories,
    } = snapshot;

    let levels = register_ids(&business_requests, &features, &epics, &stories)?;

    let mut stories_by_epic: HashMap<String, Vec<Story>> = HashMap::new();
    for row in stories {
        warn_on_inverted_range(&row.fields, ItemType::Story);
        let parent = require_parent(
            &levels,
            &row.fields.id,
            ItemType::Story,
            row.epic_id.as_deref(),
            ItemType::Epic,
        )?
        .to_string();
        let story = Story {
            completion_percentage: clamp_percentage(&row.fields.id, row.completion_percentage),
            story_points: row.story_points,
            assignee: row.assignee,
            fix_version: row.fix_version,
            fields: row.fields,
        };
        stories_by_epic.entry(parent).or_default().push(story);
    }

    let mut epics_by_feature: HashMap<String, Vec<Epic>> = HashMap::new();
    let mut epics_by_request: HashMap<String, Vec<Epic>> = HashMap::new();
    for row in epics {
        warn_on_inverted_range(&row.fields, ItemType::Epic);
        let epic = Epic {
            reported_completion: row
                .completion_percentage
                .map(|raw| clamp_percentage(&row.fields.id, raw)),
            story_points: row.story_points,
            stories: stories_by_epic.remove(&row.fields.id).unwrap_or_default(),
            fields: row.fields,
        };

        if let Some(feature_id) = row.feature_id.as_deref() {
            let parent = require_parent(
                &levels,
                &epic.fields.id,
                ItemType::Epic,
                Some(feature_id),
                ItemType::Feature,
            )?
            .to_string();
            epics_by_feature.entry(parent).or_default().push(epic);
        } else {
            let parent = require_parent(
                &levels,
                &epic.fields.id,
                ItemType::Epic,
                row.business_request_id.as_deref(),
                ItemType::BusinessRequest,
            )?
            .to_string();
            epics_by_request.entry(parent).or_default().push(epic);
        }
    }

    let mut features_by_request: HashMap<String, Vec<Feature>> = HashMap::new();
    for row in features {
        warn_on_inverted_range(&row.fields, ItemType::Feature);
        let parent = require_parent(
            &levels,
            &row.fields.id,
            ItemType::Feature,
            row.business_request_id.as_deref(),
            ItemType::BusinessRequest,
        )?
        .to_string();
        let feature = Feature {
            reported_completion: row
                .completion_percentage
                .map(|raw| clamp_percentage(&row.fields.id, raw)),
            epics: epics_by_feature.remove(&row.fields.id).unwrap_or_default(),
            fields: row.fields,
        };
        features_by_request.entry(parent).or_default().push(feature);
    }

    let mut assembled = Vec::with_capacity(business_requests.len());
    for row in business_requests {
        warn_on_inverted_range(&row.fields, ItemType::BusinessRequest);
        warn_on_unknown_context(&row, &themes, &initiatives);

        let mut children: Vec<RequestChild> = features_by_request
            .remove(&row.fields.id)
            .unwrap_or_default()
            .into_iter()
            .map(RequestChild::Feature)
            .collect();
        children.extend(
            epics_by_request
                .remove(&row.fields.id)
                .unwrap_or_default()
                .into_iter()
                .map(RequestChild::Epic),
        );

        assembled.push(BusinessRequest {
            reported_completion: row
                .completion_percentage
                .map(|raw| clamp_percentage(&row.fields.id, raw)),
            theme_id: row.theme_id,
            initiative_id: row.initiative_id,
            children,
            fields: row.fields,
        });
    }

    let portfolio = Portfolio {
        themes,
        initiatives,
        business_requests: assembled,
    };
    debug!(nodes = portfolio.node_count(), "snapshot assembled");
    Ok(portfolio)
}

/// Clamp a raw upstream percentage into `0..=100`.
#[must_use]
pub fn clamp_percentage(id: &str, raw: i64) -> u8 {
    let clamped = raw.clamp(0, 100);
    if clamped != raw {
        warn!(id, raw, clamped, "completion percentage out of range; clamped");
    }
    u8::try_from(clamped).unwrap_or(100)
}

fn register_ids(
    business_requests: &[BusinessRequestRow],
    features: &[FeatureRow],
    epics: &[EpicRow],
    stories: &[StoryRow],
) -> Result<HashMap<String, ItemType>, RoadmapError> {
    let ids = business_requests
        .iter()
        .map(|row| (&row.fields.id, ItemType::BusinessRequest))
        .chain(features.iter().map(|row| (&row.fields.id, ItemType::Feature)))
        .chain(epics.iter().map(|row| (&row.fields.id, ItemType::Epic)))
        .chain(stories.iter().map(|row| (&row.fields.id, ItemType::Story)));

    let mut levels: HashMap<String, ItemType> = HashMap::new();
    for (id, item_type) in ids {
        if let Some(first) = levels.insert(id.clone(), item_type) {
            return Err(RoadmapError::DuplicateId {
                id: id.clone(),
                first,
                second: item_type,
            });
        }
    }
    Ok(levels)
}

fn require_parent<'p>(
    levels: &HashMap<String, ItemType>,
    id: &str,
    item_type: ItemType,
    parent_id: Option<&'p str>,
    parent_type: ItemType,
) -> Result<&'p str, RoadmapError> {
    let Some(parent_id) = parent_id.filter(|p| !p.is_empty()) else {
        return Err(RoadmapError::OrphanItem {
            id: id.to_string(),
            item_type,
        });
    };

    if levels.get(parent_id) == Some(&parent_type) {
        Ok(parent_id)
    } else {
        Err(RoadmapError::MissingParent {
            id: id.to_string(),
            item_type,
            parent_id: parent_id.to_string(),
            parent_type,
        })
    }
}

fn warn_on_inverted_range(fields: &ItemFields, item_type: ItemType) {
    if fields.has_inverted_range() {
        warn!(
            id = %fields.id,
            %item_type,
            start = %fields.start_date,
            end = %fields.end_date,
            "end date precedes start date"
        );
    }
}

fn warn_on_unknown_context(row: &BusinessRequestRow, themes: &[Theme], initiatives: &[Initiative]) {
    if let Some(theme_id) = row.theme_id.as_deref() {
        if !themes.iter().any(|t| t.id == theme_id) {
            warn!(id = %row.fields.id, theme_id, "business request references unknown theme");
        }
    }
    if let Some(initiative_id) = row.initiative_id.as_deref() {
        if !initiatives.iter().any(|i| i.id == initiative_id) {
            warn!(
                id = %row.fields.id,
                initiative_id,
                "business request references unknown initiative"
            );
        }
    }
}
