//! Nested projection for hierarchy views.
//!
//! Each [`TreeNode`] carries its computed completion, never the stored
//! value. Children keep input order; sorting is left to the caller.

use serde::Serialize;
use tracing::instrument;

use crate::model::{BusinessRequest, ItemType, Node, Priority, Status};
use crate::rollup::Rollup;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub node_type: ItemType,
    pub status: Status,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_label: Option<String>,
    pub completion_percentage: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Self::size).sum::<usize>()
    }

    /// Depth-first search by ID.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Self> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Project one business request.
#[must_use]
pub fn build_tree(root: &BusinessRequest) -> TreeNode {
    let rollup = Rollup::of(root);
    project(Node::BusinessRequest(root), &rollup)
}

/// Project every business request, in input order.
#[must_use]
#[instrument(skip_all, fields(roots = roots.len()))]
pub fn build_forest(roots: &[BusinessRequest]) -> Vec<TreeNode> {
    let rollup = Rollup::of_forest(roots);
    roots
        .iter()
        .map(|root| project(Node::BusinessRequest(root), &rollup))
        .collect()
}

/// Project any subtree using an existing roll-up.
#[must_use]
pub fn project(node: Node<'_>, rollup: &Rollup) -> TreeNode {
    let fields = node.fields();
    TreeNode {
        id: fields.id.clone(),
        title: fields.title.clone(),
        node_type: node.item_type(),
        status: fields.status,
        priority: fields.priority,
        release_label: fields.release_label.clone(),
        completion_percentage: rollup.completion(node),
        children: node
            .children()
            .into_iter()
            .map(|child| project(child, rollup))
            .collect(),
    }
}
