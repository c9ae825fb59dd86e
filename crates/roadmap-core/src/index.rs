//! Lookup tables over a loaded [`Portfolio`].
//!
//! Built once per snapshot and passed by reference to whatever needs
//! cross-references (linked items per business request, ancestors,
//! theme/initiative names). Borrowing keeps it in lock-step with the
//! portfolio it indexes.

use std::collections::HashMap;

use tracing::debug;

use crate::error::RoadmapError;
use crate::model::{BusinessRequest, Epic, Feature, Initiative, Node, Portfolio, Story, Theme};

#[derive(Debug)]
pub struct PortfolioIndex<'a> {
    portfolio: &'a Portfolio,
    nodes: HashMap<&'a str, Node<'a>>,
    parents: HashMap<&'a str, &'a str>,
    themes: HashMap<&'a str, &'a Theme>,
    initiatives: HashMap<&'a str, &'a Initiative>,
}

/// Everything beneath one business request, grouped by level, pre-order.
#[derive(Debug, Clone, Default)]
pub struct LinkedItems<'a> {
    pub features: Vec<&'a Feature>,
    pub epics: Vec<&'a Epic>,
    pub stories: Vec<&'a Story>,
}

/// Display names a business request inherits from its portfolio context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext<'a> {
    pub theme_name: Option<&'a str>,
    pub initiative_name: Option<&'a str>,
}

impl<'a> PortfolioIndex<'a> {
    /// Index every node in `portfolio`.
    ///
    /// # Errors
    ///
    /// Returns [`RoadmapError::DuplicateId`] if two nodes share an ID.
    pub fn build(portfolio: &'a Portfolio) -> Result<Self, RoadmapError> {
        let mut nodes: HashMap<&'a str, Node<'a>> = HashMap::new();
        let mut parents: HashMap<&'a str, &'a str> = HashMap::new();

        let mut stack: Vec<(Node<'a>, Option<&'a str>)> =
            portfolio.roots().map(|root| (root, None)).collect();
        stack.reverse();
        while let Some((node, parent)) = stack.pop() {
            let id = node.id();
            if let Some(existing) = nodes.insert(id, node) {
                return Err(RoadmapError::DuplicateId {
                    id: id.to_string(),
                    first: existing.item_type(),
                    second: node.item_type(),
                });
            }
            if let Some(parent) = parent {
                parents.insert(id, parent);
            }
            stack.extend(node.children().into_iter().rev().map(|child| (child, Some(id))));
        }

        let themes = portfolio
            .themes
            .iter()
            .map(|theme| (theme.id.as_str(), theme))
            .collect();
        let initiatives = portfolio
            .initiatives
            .iter()
            .map(|initiative| (initiative.id.as_str(), initiative))
            .collect();

        debug!(nodes = nodes.len(), "portfolio index built");
        Ok(Self {
            portfolio,
            nodes,
            parents,
            themes,
            initiatives,
        })
    }

    #[must_use]
    pub const fn portfolio(&self) -> &'a Portfolio {
        self.portfolio
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Node<'a>> {
        self.nodes.get(id).copied()
    }

    /// Like [`get`](Self::get) but reports a missing ID as an error.
    ///
    /// # Errors
    ///
    /// Returns [`RoadmapError::ItemNotFound`] if `id` is not indexed.
    pub fn require(&self, id: &str) -> Result<Node<'a>, RoadmapError> {
        self.get(id)
            .ok_or_else(|| RoadmapError::ItemNotFound(id.to_string()))
    }

    /// Business request by ID; `None` if absent or at another level.
    #[must_use]
    pub fn business_request(&self, id: &str) -> Option<&'a BusinessRequest> {
        match self.get(id)? {
            Node::BusinessRequest(br) => Some(br),
            _ => None,
        }
    }

    #[must_use]
    pub fn parent_of(&self, id: &str) -> Option<Node<'a>> {
        self.parents.get(id).and_then(|parent| self.get(parent))
    }

    /// Ancestor chain from immediate parent up to the business request.
    #[must_use]
    pub fn ancestors(&self, id: &str) -> Vec<Node<'a>> {
        let mut chain = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(node) = current {
            chain.push(node);
            current = self.parent_of(node.id());
        }
        chain
    }

    /// The business request at the root of `id`'s tree.
    #[must_use]
    pub fn root_of(&self, id: &str) -> Option<&'a BusinessRequest> {
        let node = self.get(id)?;
        let root = self.ancestors(id).last().copied().unwrap_or(node);
        match root {
            Node::BusinessRequest(br) => Some(br),
            _ => None,
        }
    }

    /// Features, epics, and stories under one business request.
    ///
    /// # Errors
    ///
    /// Returns [`RoadmapError::ItemNotFound`] if no business request has
    /// that ID.
    pub fn linked_items(&self, business_request_id: &str) -> Result<LinkedItems<'a>, RoadmapError> {
        let br = self
            .business_request(business_request_id)
            .ok_or_else(|| RoadmapError::ItemNotFound(business_request_id.to_string()))?;
        Ok(LinkedItems {
            features: br.features().collect(),
            epics: br.epics().collect(),
            stories: br.stories().collect(),
        })
    }

    #[must_use]
    pub fn theme(&self, id: &str) -> Option<&'a Theme> {
        self.themes.get(id).copied()
    }

    #[must_use]
    pub fn initiative(&self, id: &str) -> Option<&'a Initiative> {
        self.initiatives.get(id).copied()
    }

    pub fn business_requests_for_initiative<'s>(
        &'s self,
        initiative_id: &'s str,
    ) -> impl Iterator<Item = &'a BusinessRequest> + 's {
        self.portfolio
            .business_requests
            .iter()
            .filter(move |br| br.initiative_id.as_deref() == Some(initiative_id))
    }

    pub fn initiatives_for_theme<'s>(
        &'s self,
        theme_id: &'s str,
    ) -> impl Iterator<Item = &'a Initiative> + 's {
        self.portfolio
            .initiatives
            .iter()
            .filter(move |initiative| initiative.theme_id.as_deref() == Some(theme_id))
    }

    /// Theme and initiative names for a business request. The theme falls
    /// back to the initiative's theme when the request names none.
    #[must_use]
    pub fn context_for(&self, br: &BusinessRequest) -> RequestContext<'a> {
        let initiative = br
            .initiative_id
            .as_deref()
            .and_then(|id| self.initiative(id));
        let theme_id = br
            .theme_id
            .as_deref()
            .or_else(|| initiative.and_then(|i| i.theme_id.as_deref()));
        RequestContext {
            theme_name: theme_id
                .and_then(|id| self.theme(id))
                .map(|theme| theme.name.as_str()),
            initiative_name: initiative.map(|i| i.name.as_str()),
        }
    }

    /// IDs in pre-order, roots in input order.
    #[must_use]
    pub fn ids_in_order(&self) -> Vec<&'a str> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<Node<'a>> = self.portfolio.roots().collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            ids.push(node.fields().id.as_str());
            stack.extend(node.children().into_iter().rev());
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemFields, ItemType, RequestChild, Status, WorkItem};
    use chrono::NaiveDate;

    fn fields(id: &str) -> ItemFields {
        let day = NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date");
        ItemFields::new(id, format!("Title {id}"), Status::InProgress, day, day)
    }

    fn portfolio() -> Portfolio {
        let mut br1 = BusinessRequest::new(
            fields("br-1"),
            vec![
                RequestChild::Feature(Feature::new(
                    fields("f-1"),
                    vec![Epic::new(
                        fields("e-1"),
                        vec![Story::new(fields("s-1"), 10), Story::new(fields("s-2"), 20)],
                    )],
                )),
                RequestChild::Epic(Epic::new(fields("e-2"), vec![Story::new(fields("s-3"), 30)])),
            ],
        );
        br1.initiative_id = Some("in-1".into());

        let mut br2 = BusinessRequest::new(fields("br-2"), vec![]);
        br2.theme_id = Some("th-2".into());
        br2.initiative_id = Some("in-2".into());

        Portfolio {
            themes: vec![
                Theme {
                    id: "th-1".into(),
                    name: "Compliance".into(),
                    description: None,
                },
                Theme {
                    id: "th-2".into(),
                    name: "Growth".into(),
                    description: None,
                },
            ],
            initiatives: vec![
                Initiative {
                    id: "in-1".into(),
                    name: "Data Protection".into(),
                    theme_id: Some("th-1".into()),
                    owner: None,
                    description: None,
                },
                Initiative {
                    id: "in-2".into(),
                    name: "Onboarding".into(),
                    theme_id: Some("th-1".into()),
                    owner: None,
                    description: None,
                },
            ],
            business_requests: vec![br1, br2],
        }
    }

    #[test]
    fn indexes_every_node() {
        let p = portfolio();
        let index = PortfolioIndex::build(&p).unwrap();
        assert_eq!(index.len(), 8);
        assert_eq!(index.get("s-3").map(Node::item_type), Some(ItemType::Story));
        assert!(index.get("nope").is_none());
        assert!(matches!(
            index.require("nope"),
            Err(RoadmapError::ItemNotFound(_))
        ));
        assert_eq!(index.get("e-2").map(|n| n.fields().title.as_str()), Some("Title e-2"));
    }

    #[test]
    fn ancestors_run_nearest_first() {
        let p = portfolio();
        let index = PortfolioIndex::build(&p).unwrap();
        let chain: Vec<&str> = index.ancestors("s-2").into_iter().map(Node::id).collect();
        assert_eq!(chain, vec!["e-1", "f-1", "br-1"]);
        assert!(index.ancestors("br-1").is_empty());
        assert_eq!(index.root_of("s-3").map(|br| br.fields.id.as_str()), Some("br-1"));
        assert_eq!(index.root_of("br-2").map(|br| br.fields.id.as_str()), Some("br-2"));
        assert_eq!(index.parent_of("e-2").map(Node::id), Some("br-1"));
    }

    #[test]
    fn linked_items_group_by_level() {
        let p = portfolio();
        let index = PortfolioIndex::build(&p).unwrap();
        let linked = index.linked_items("br-1").unwrap();
        assert_eq!(linked.features.len(), 1);
        let epic_ids: Vec<&str> = linked.epics.iter().map(|e| e.id()).collect();
        assert_eq!(epic_ids, vec!["e-1", "e-2"]);
        assert_eq!(linked.stories.len(), 3);

        assert!(index.linked_items("e-1").is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut p = portfolio();
        p.business_requests[1].fields.id = "s-1".into();
        let err = PortfolioIndex::build(&p).unwrap_err();
        assert!(matches!(
            err,
            RoadmapError::DuplicateId {
                first: ItemType::Story,
                second: ItemType::BusinessRequest,
                ..
            }
        ));
    }

    #[test]
    fn context_falls_back_to_initiative_theme() {
        let p = portfolio();
        let index = PortfolioIndex::build(&p).unwrap();

        let ctx = index.context_for(&p.business_requests[0]);
        assert_eq!(ctx.initiative_name, Some("Data Protection"));
        assert_eq!(ctx.theme_name, Some("Compliance"));

        // Explicit theme wins over the initiative's theme.
        let ctx = index.context_for(&p.business_requests[1]);
        assert_eq!(ctx.theme_name, Some("Growth"));
    }

    #[test]
    fn initiative_and_theme_lookups() {
        let p = portfolio();
        let index = PortfolioIndex::build(&p).unwrap();
        assert_eq!(index.business_requests_for_initiative("in-2").count(), 1);
        assert_eq!(index.initiatives_for_theme("th-1").count(), 2);
        assert_eq!(index.initiatives_for_theme("th-2").count(), 0);
    }

    #[test]
    fn ids_in_order_is_pre_order() {
        let p = portfolio();
        let index = PortfolioIndex::build(&p).unwrap();
        assert_eq!(
            index.ids_in_order(),
            vec!["br-1", "f-1", "e-1", "s-1", "s-2", "e-2", "s-3", "br-2"]
        );
    }

    #[test]
    fn empty_portfolio_indexes_cleanly() {
        let p = Portfolio::default();
        let index = PortfolioIndex::build(&p).unwrap();
        assert!(index.is_empty());
        assert!(index.ids_in_order().is_empty());
    }
}
