//! Typed hierarchy nodes.
//!
//! The level rules live in the types: a [`BusinessRequest`] holds
//! [`RequestChild`] values (feature or bare epic), a [`Feature`] holds epics,
//! an [`Epic`] holds stories, and a [`Story`] holds nothing. [`Node`] is a
//! borrowed, `Copy` view over any of the four used by traversal code.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::item::{ItemFields, ItemType, Priority, Status};

/// Read access shared by every hierarchy level.
pub trait WorkItem {
    fn fields(&self) -> &ItemFields;

    fn item_type(&self) -> ItemType;

    fn id(&self) -> &str {
        &self.fields().id
    }

    fn title(&self) -> &str {
        &self.fields().title
    }

    fn status(&self) -> Status {
        self.fields().status
    }

    fn priority(&self) -> Priority {
        self.fields().priority
    }

    fn start_date(&self) -> NaiveDate {
        self.fields().start_date
    }

    fn end_date(&self) -> NaiveDate {
        self.fields().end_date
    }
}

/// Leaf work item with an authoritative completion value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    #[serde(flatten)]
    pub fields: ItemFields,
    pub completion_percentage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_version: Option<String>,
}

impl Story {
    #[must_use]
    pub const fn new(fields: ItemFields, completion_percentage: u8) -> Self {
        Self {
            fields,
            completion_percentage,
            story_points: None,
            assignee: None,
            fix_version: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    #[serde(flatten)]
    pub fields: ItemFields,
    /// Value supplied upstream; never an input to the roll-up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_completion: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(default)]
    pub stories: Vec<Story>,
}

impl Epic {
    #[must_use]
    pub const fn new(fields: ItemFields, stories: Vec<Story>) -> Self {
        Self {
            fields,
            reported_completion: None,
            story_points: None,
            stories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(flatten)]
    pub fields: ItemFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_completion: Option<u8>,
    #[serde(default)]
    pub epics: Vec<Epic>,
}

impl Feature {
    #[must_use]
    pub const fn new(fields: ItemFields, epics: Vec<Epic>) -> Self {
        Self {
            fields,
            reported_completion: None,
            epics,
        }
    }
}

/// A business request may parent features or epics directly, mixed freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RequestChild {
    Feature(Feature),
    Epic(Epic),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRequest {
    #[serde(flatten)]
    pub fields: ItemFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_completion: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative_id: Option<String>,
    #[serde(default)]
    pub children: Vec<RequestChild>,
}

impl BusinessRequest {
    #[must_use]
    pub const fn new(fields: ItemFields, children: Vec<RequestChild>) -> Self {
        Self {
            fields,
            reported_completion: None,
            theme_id: None,
            initiative_id: None,
            children,
        }
    }

    /// Features directly under this request, in input order.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.children.iter().filter_map(|child| match child {
            RequestChild::Feature(feature) => Some(feature),
            RequestChild::Epic(_) => None,
        })
    }

    /// Every epic under this request, whether attached directly or via a
    /// feature, in pre-order.
    pub fn epics(&self) -> impl Iterator<Item = &Epic> {
        self.children.iter().flat_map(|child| match child {
            RequestChild::Feature(feature) => feature.epics.iter().collect::<Vec<_>>(),
            RequestChild::Epic(epic) => vec![epic],
        })
    }

    /// Every story under this request, in pre-order.
    pub fn stories(&self) -> impl Iterator<Item = &Story> {
        self.epics().flat_map(|epic| epic.stories.iter())
    }
}

macro_rules! impl_work_item {
    ($ty:ty, $item_type:expr) => {
        impl WorkItem for $ty {
            fn fields(&self) -> &ItemFields {
                &self.fields
            }

            fn item_type(&self) -> ItemType {
                $item_type
            }
        }
    };
}

impl_work_item!(Story, ItemType::Story);
impl_work_item!(Epic, ItemType::Epic);
impl_work_item!(Feature, ItemType::Feature);
impl_work_item!(BusinessRequest, ItemType::BusinessRequest);

impl WorkItem for RequestChild {
    fn fields(&self) -> &ItemFields {
        match self {
            Self::Feature(feature) => &feature.fields,
            Self::Epic(epic) => &epic.fields,
        }
    }

    fn item_type(&self) -> ItemType {
        match self {
            Self::Feature(_) => ItemType::Feature,
            Self::Epic(_) => ItemType::Epic,
        }
    }
}

impl<T: WorkItem + ?Sized> WorkItem for &T {
    fn fields(&self) -> &ItemFields {
        (**self).fields()
    }

    fn item_type(&self) -> ItemType {
        (**self).item_type()
    }
}

/// Borrowed view of one node at any level.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    BusinessRequest(&'a BusinessRequest),
    Feature(&'a Feature),
    Epic(&'a Epic),
    Story(&'a Story),
}

impl<'a> Node<'a> {
    #[must_use]
    pub const fn item_type(self) -> ItemType {
        match self {
            Self::BusinessRequest(_) => ItemType::BusinessRequest,
            Self::Feature(_) => ItemType::Feature,
            Self::Epic(_) => ItemType::Epic,
            Self::Story(_) => ItemType::Story,
        }
    }

    #[must_use]
    pub const fn fields(self) -> &'a ItemFields {
        match self {
            Self::BusinessRequest(br) => &br.fields,
            Self::Feature(feature) => &feature.fields,
            Self::Epic(epic) => &epic.fields,
            Self::Story(story) => &story.fields,
        }
    }

    #[must_use]
    pub fn id(self) -> &'a str {
        &self.fields().id
    }

    /// Immediate children in input order. Empty for stories.
    #[must_use]
    pub fn children(self) -> Vec<Node<'a>> {
        match self {
            Self::BusinessRequest(br) => br.children.iter().map(Node::from).collect(),
            Self::Feature(feature) => feature.epics.iter().map(Node::Epic).collect(),
            Self::Epic(epic) => epic.stories.iter().map(Node::Story).collect(),
            Self::Story(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn child_count(self) -> usize {
        match self {
            Self::BusinessRequest(br) => br.children.len(),
            Self::Feature(feature) => feature.epics.len(),
            Self::Epic(epic) => epic.stories.len(),
            Self::Story(_) => 0,
        }
    }

    /// The upstream completion value: authoritative for stories, advisory
    /// for every other level.
    #[must_use]
    pub const fn reported_completion(self) -> Option<u8> {
        match self {
            Self::BusinessRequest(br) => br.reported_completion,
            Self::Feature(feature) => feature.reported_completion,
            Self::Epic(epic) => epic.reported_completion,
            Self::Story(story) => Some(story.completion_percentage),
        }
    }

    #[must_use]
    pub const fn story_points(self) -> Option<u32> {
        match self {
            Self::Epic(epic) => epic.story_points,
            Self::Story(story) => story.story_points,
            Self::BusinessRequest(_) | Self::Feature(_) => None,
        }
    }
}

impl WorkItem for Node<'_> {
    fn fields(&self) -> &ItemFields {
        Node::fields(*self)
    }

    fn item_type(&self) -> ItemType {
        Node::item_type(*self)
    }
}

impl<'a> From<&'a BusinessRequest> for Node<'a> {
    fn from(br: &'a BusinessRequest) -> Self {
        Self::BusinessRequest(br)
    }
}

impl<'a> From<&'a Feature> for Node<'a> {
    fn from(feature: &'a Feature) -> Self {
        Self::Feature(feature)
    }
}

impl<'a> From<&'a Epic> for Node<'a> {
    fn from(epic: &'a Epic) -> Self {
        Self::Epic(epic)
    }
}

impl<'a> From<&'a Story> for Node<'a> {
    fn from(story: &'a Story) -> Self {
        Self::Story(story)
    }
}

impl<'a> From<&'a RequestChild> for Node<'a> {
    fn from(child: &'a RequestChild) -> Self {
        match child {
            RequestChild::Feature(feature) => Self::Feature(feature),
            RequestChild::Epic(epic) => Self::Epic(epic),
        }
    }
}
