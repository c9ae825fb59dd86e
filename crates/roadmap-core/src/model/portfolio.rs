use serde::{Deserialize, Serialize};

use super::node::{BusinessRequest, Node};

/// Strategic theme grouping initiatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiative {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A forest of business requests plus the theme/initiative context they
/// hang off. Plain data; every derived value is computed on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub initiatives: Vec<Initiative>,
    #[serde(default)]
    pub business_requests: Vec<BusinessRequest>,
}

impl Portfolio {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.business_requests.is_empty()
    }

    /// Root nodes of the forest, in input order.
    pub fn roots(&self) -> impl Iterator<Item = Node<'_>> {
        self.business_requests.iter().map(Node::BusinessRequest)
    }

    /// Total number of hierarchy nodes across the forest.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<Node<'_>> = self.roots().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }
}
