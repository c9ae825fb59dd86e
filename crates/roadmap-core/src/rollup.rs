//! Completion roll-up over the work-item hierarchy.
//!
//! # Rules
//!
//! 1. A story's completion is its own `completion_percentage`, unchanged.
//! 2. A non-story with no children is 0% complete. Any reported value on the
//!    node is ignored.
//! 3. Otherwise completion is the unweighted mean of the immediate children's
//!    computed completion, rounded half-up.
//!
//! Rounding happens at every level, so error compounds going up the tree.
//! Feature and epic siblings under one business request each count once,
//! whatever the size of their subtrees.
//!
//! # Variants
//!
//! - [`compute_completion`] recurses, one frame per level.
//! - [`compute_completion_iterative`] uses an explicit stack and has no
//!   recursion depth bound.
//! - [`Rollup`] records every node's value in one post-order pass; the tree
//!   and timeline projections read from it.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::model::{BusinessRequest, Node};

/// Completion of `node` in `0..=100` (for in-range leaf inputs).
#[must_use]
pub fn compute_completion<'a>(node: impl Into<Node<'a>>) -> u8 {
    completion_of(node.into())
}

fn completion_of(node: Node<'_>) -> u8 {
    if let Node::Story(story) = node {
        return story.completion_percentage;
    }

    let children = node.children();
    let count = children.len();
    let sum: u64 = children
        .into_iter()
        .map(|child| u64::from(completion_of(child)))
        .sum();
    round_half_up_mean(sum, count)
}

/// Same result as [`compute_completion`] without recursion.
#[must_use]
pub fn compute_completion_iterative<'a>(node: impl Into<Node<'a>>) -> u8 {
    let mut value = 0;
    walk_post_order(node.into(), |_, completion| value = completion);
    value
}

/// `round(sum / count)` with ties rounding up; 0 when `count` is 0.
///
/// Exact integer arithmetic: `floor((2 * sum + count) / (2 * count))`.
#[must_use]
pub fn round_half_up_mean(sum: u64, count: usize) -> u8 {
    let Ok(count) = u64::try_from(count) else {
        return 0;
    };
    if count == 0 {
        return 0;
    }
    let mean = (2 * sum + count) / (2 * count);
    u8::try_from(mean).unwrap_or(u8::MAX)
}

/// One pending node on the explicit stack.
struct Frame<'a> {
    node: Node<'a>,
    children: Vec<Node<'a>>,
    next: usize,
    sum: u64,
}

impl<'a> Frame<'a> {
    fn enter(node: Node<'a>) -> Self {
        Self {
            node,
            children: node.children(),
            next: 0,
            sum: 0,
        }
    }

    fn settle(&self) -> u8 {
        match self.node {
            Node::Story(story) => story.completion_percentage,
            _ => round_half_up_mean(self.sum, self.children.len()),
        }
    }
}

/// Post-order walk calling `visit(node, completion)` once per node; the
/// root is visited last.
fn walk_post_order<'a>(root: Node<'a>, mut visit: impl FnMut(Node<'a>, u8)) {
    let mut stack = vec![Frame::enter(root)];
    let mut finished: Option<u8> = None;

    while let Some(frame) = stack.last_mut() {
        if let Some(child_value) = finished.take() {
            frame.sum += u64::from(child_value);
            frame.next += 1;
        }

        if let Some(&child) = frame.children.get(frame.next) {
            stack.push(Frame::enter(child));
            continue;
        }

        let value = frame.settle();
        let node = frame.node;
        stack.pop();
        visit(node, value);
        finished = Some(value);
    }
}

/// Computed completion for every node under one or more roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rollup {
    by_id: HashMap<String, u8>,
}

impl Rollup {
    /// Roll up a single tree.
    #[must_use]
    pub fn of<'a>(root: impl Into<Node<'a>>) -> Self {
        let mut rollup = Self::default();
        rollup.absorb(root.into());
        rollup
    }

    /// Roll up every business request in a forest.
    #[must_use]
    #[instrument(skip_all, fields(roots = roots.len()))]
    pub fn of_forest(roots: &[BusinessRequest]) -> Self {
        let mut rollup = Self::default();
        for root in roots {
            rollup.absorb(Node::BusinessRequest(root));
        }
        debug!(nodes = rollup.len(), "roll-up complete");
        rollup
    }

    fn absorb(&mut self, root: Node<'_>) {
        walk_post_order(root, |node, value| {
            self.by_id.insert(node.id().to_string(), value);
        });
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<u8> {
        self.by_id.get(id).copied()
    }

    /// Completion for `node`, computing it directly if the node was not
    /// part of this roll-up.
    #[must_use]
    pub fn completion(&self, node: Node<'_>) -> u8 {
        self.get(node.id())
            .unwrap_or_else(|| compute_completion(node))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
