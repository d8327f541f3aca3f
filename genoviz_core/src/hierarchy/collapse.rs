// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Score-driven collapse and click toggling.

use core::mem;
use std::collections::BTreeSet;

use super::NodeId;
use super::tree::{Node, Tree};
use crate::scale::Domain;

/// A collapse configuration that cannot be applied.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CollapseError {
    /// No score attribute was configured.
    #[error("option 'attribute' is not defined")]
    MissingAttribute,
}

/// Inputs to [`Tree::sort_and_scale`].
#[derive(Clone, Debug, PartialEq)]
pub struct CollapseConfig {
    /// Score attribute used for ordering and collapsing.
    pub attribute: Option<String>,
    /// Normalized score below which a subtree starts collapsed.
    pub collapse_threshold: f64,
    /// A parent hides its low-score children behind an aggregate only when
    /// there are more than this many of them.
    pub min_non_collapsable_children: usize,
    /// Record ids that always start collapsed.
    pub collapsed: BTreeSet<String>,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            attribute: Some("aggregatescore".into()),
            collapse_threshold: 0.4,
            min_non_collapsable_children: 2,
            collapsed: BTreeSet::new(),
        }
    }
}

impl Tree {
    /// Resets every node to fully expanded, sorts children by descending
    /// score, and collapses low-score subtrees.
    ///
    /// Scores are normalized against the range of the real leaves. Aggregate
    /// nodes from a previous call are destroyed, so their handles go stale.
    pub fn sort_and_scale(&mut self, config: &CollapseConfig) -> Result<(), CollapseError> {
        let attribute = config
            .attribute
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or(CollapseError::MissingAttribute)?;
        self.min_non_collapsable = config.min_non_collapsable_children;
        self.reset();

        let order = self.all_preorder();
        for &idx in &order {
            let mut children = mem::take(&mut self.nodes[idx as usize].children);
            children.sort_by(|&a, &b| {
                self.score_of(b, attribute)
                    .total_cmp(&self.score_of(a, attribute))
            });
            self.nodes[idx as usize].children = children;
        }

        self.score_range = Domain::from_values(
            order
                .iter()
                .filter(|&&idx| self.nodes[idx as usize].children.is_empty())
                .map(|&idx| self.score_of(idx, attribute)),
        )
        .unwrap_or(Domain::EMPTY);

        // Reversed pre-order visits every node after its descendants.
        for &idx in order.iter().rev() {
            self.collapse_by_score(idx, attribute, config);
        }

        tracing::debug!(
            nodes = self.len(),
            min = self.score_range.min,
            max = self.score_range.max,
            "tree sorted and scaled"
        );
        Ok(())
    }

    /// Flips the collapse state of `id` and returns the node whose children
    /// changed (the parent, when `id` is an aggregate).
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn toggle_collapse(&mut self, id: NodeId) -> NodeId {
        self.validate(id);
        let idx = id.idx;
        let mut updated = idx;

        let node = &mut self.nodes[idx as usize];
        let all_collapsed = node.children.is_empty() && !node.collapsed.is_empty();
        let all_visible = !node.children.is_empty() && node.collapsed.is_empty();
        if all_collapsed || all_visible {
            mem::swap(&mut node.children, &mut node.collapsed);
            if node.collapsed.is_empty() {
                node.collapsed = mem::take(&mut node.hidden);
            }
        } else if !node.collapsed.is_empty() {
            node.hidden = mem::take(&mut node.collapsed);
            node.collapsed = mem::take(&mut node.children);
        } else if node.aggregated {
            if let Some(parent) = node.parent {
                let p = &mut self.nodes[parent as usize];
                p.children.retain(|&c| c != idx);
                let mut revealed = mem::take(&mut p.collapsed);
                p.children.append(&mut revealed);
                self.free(idx);
                updated = parent;
            }
        }

        for child in self.nodes[updated as usize].children.clone() {
            self.expand_trivial(child);
        }

        tracing::debug!(node = %self.nodes[updated as usize].key, "collapse toggled");
        self.id_of(updated)
    }

    /// Merges all child lists back into `children` and destroys aggregates.
    fn reset(&mut self) {
        for idx in self.all_preorder() {
            let node = &mut self.nodes[idx as usize];
            if !node.live || node.aggregated {
                continue;
            }
            let mut merged = mem::take(&mut node.children);
            merged.append(&mut node.collapsed);
            merged.append(&mut node.hidden);
            self.nodes[idx as usize].children = self.drop_aggregates(merged);
        }
    }

    fn drop_aggregates(&mut self, slots: Vec<u32>) -> Vec<u32> {
        let (aggregates, real): (Vec<u32>, Vec<u32>) = slots
            .into_iter()
            .partition(|&c| self.nodes[c as usize].aggregated);
        for a in aggregates {
            self.free(a);
        }
        real
    }

    fn is_low(&self, idx: u32, attribute: &str, threshold: f64) -> bool {
        !self.nodes[idx as usize].highlight
            && self.normalize(self.score_of(idx, attribute)) < threshold
    }

    fn collapse_by_score(&mut self, idx: u32, attribute: &str, config: &CollapseConfig) {
        let threshold = config.collapse_threshold;
        if config.collapsed.contains(&self.nodes[idx as usize].key)
            || self.is_low(idx, attribute, threshold)
        {
            let node = &mut self.nodes[idx as usize];
            node.collapsed = mem::take(&mut node.children);
            return;
        }
        if self.nodes[idx as usize].children.is_empty() {
            return;
        }
        let (low, high): (Vec<u32>, Vec<u32>) = self.nodes[idx as usize]
            .children
            .iter()
            .copied()
            .partition(|&c| self.is_low(c, attribute, threshold));
        if low.len() <= config.min_non_collapsable_children {
            return;
        }
        let has_visible = !high.is_empty();
        let node = &mut self.nodes[idx as usize];
        node.children = high;
        node.collapsed = low;
        if has_visible {
            self.push_aggregate(idx);
        }
    }

    /// Appends an `other-{id}` child summarizing the collapsed children.
    fn push_aggregate(&mut self, parent: u32) {
        let p = &self.nodes[parent as usize];
        let label = format!("({})", p.collapsed.len());
        let first = &self.nodes[p.collapsed[0] as usize];
        let node = Node {
            key: format!("other-{}", p.key),
            name: Some(label.clone()),
            common_name: Some(label),
            // Borrowed from the first hidden child; only used for sizing.
            values: first.values.clone(),
            highlight: p
                .collapsed
                .iter()
                .any(|&c| self.nodes[c as usize].highlight),
            aggregated: true,
            live: true,
            parent: Some(parent),
            depth: p.depth + 1,
            children: Vec::new(),
            collapsed: Vec::new(),
            hidden: Vec::new(),
            position: p.position,
            previous: p.position,
        };
        let idx = self.alloc(node);
        self.nodes[parent as usize].children.push(idx);
    }

    /// Expands `idx` and its descendants while their collapsed subtree is
    /// trivial: few collapsed children, or an unnamed node.
    fn expand_trivial(&mut self, idx: u32) {
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i as usize];
            let trivial = node.collapsed.len() <= self.min_non_collapsable || node.name.is_none();
            if node.collapsed.is_empty() || !trivial {
                continue;
            }
            let node = &mut self.nodes[i as usize];
            let mut merged = mem::take(&mut node.children);
            merged.append(&mut node.collapsed);
            let real = self.drop_aggregates(merged);
            stack.extend(real.iter().copied());
            self.nodes[i as usize].children = real;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{NodeState, TreeRecord};

    const ATTR: &str = "aggregatescore";

    fn rec(id: &str, parent: Option<&str>, score: f64) -> TreeRecord {
        TreeRecord::new(id, parent).with_value(ATTR, score)
    }

    fn keys(tree: &Tree, ids: Vec<NodeId>) -> Vec<String> {
        ids.into_iter().map(|id| tree.key(id).to_owned()).collect()
    }

    /// root with two strong and three weak leaf children.
    fn wide_tree() -> Tree {
        let mut tree = Tree::stratify([
            rec("root", None, 100.0),
            rec("c", Some("root"), 5.0),
            rec("a", Some("root"), 90.0),
            rec("e", Some("root"), 1.0),
            rec("b", Some("root"), 80.0),
            rec("d", Some("root"), 3.0),
        ])
        .unwrap();
        tree.sort_and_scale(&CollapseConfig::default()).unwrap();
        tree
    }

    #[test]
    fn low_scores_hide_behind_aggregate() {
        let tree = wide_tree();
        let root = tree.root();
        assert_eq!(tree.state(root), NodeState::PartiallyCollapsed);
        assert_eq!(keys(&tree, tree.children(root)), vec!["a", "b", "other-root"]);
        assert_eq!(keys(&tree, tree.collapsed_children(root)), vec!["c", "d", "e"]);

        let agg = tree.find("other-root").unwrap();
        assert_eq!(tree.state(agg), NodeState::AggregatedLeaf);
        assert_eq!(tree.name(agg), Some("(3)"));
        assert_eq!(tree.score(agg, ATTR), 5.0, "borrows the first hidden child's values");
        assert_eq!(tree.depth(agg), 1);
        assert!(!tree.is_highlighted(agg));
    }

    #[test]
    fn few_low_children_stay_visible() {
        let mut tree = Tree::stratify([
            rec("root", None, 100.0),
            rec("a", Some("root"), 90.0),
            rec("b", Some("root"), 1.0),
            rec("c", Some("root"), 2.0),
        ])
        .unwrap();
        tree.sort_and_scale(&CollapseConfig::default()).unwrap();
        let root = tree.root();
        assert_eq!(tree.state(root), NodeState::Expanded, "two low children <= minimum");
        assert_eq!(keys(&tree, tree.children(root)), vec!["a", "c", "b"], "sorted descending");
    }

    #[test]
    fn collapse_threshold_invariant() {
        let mut tree = Tree::stratify([
            rec("root", None, 100.0),
            rec("x", Some("root"), 10.0),
            rec("x1", Some("x"), 9.0),
            rec("x2", Some("x"), 1.0),
            rec("y", Some("root"), 95.0),
            rec("y1", Some("y"), 95.0),
            rec("y2", Some("y"), 2.0).highlighted(),
            rec("y2a", Some("y2"), 1.0),
        ])
        .unwrap();
        let config = CollapseConfig::default();
        tree.sort_and_scale(&config).unwrap();
        for key in ["root", "x", "x1", "x2", "y", "y1", "y2", "y2a"] {
            let id = tree.find(key).unwrap();
            let low = !tree.is_highlighted(id)
                && tree.normalized_score(id, ATTR) < config.collapse_threshold;
            if low {
                assert!(tree.children(id).is_empty(), "{key} is low but shows children");
            }
        }
        let y2 = tree.find("y2").unwrap();
        assert_eq!(tree.state(y2), NodeState::Expanded, "highlight keeps a low node open");
        let x = tree.find("x").unwrap();
        assert_eq!(tree.state(x), NodeState::Collapsed);
    }

    #[test]
    fn toggle_round_trip_restores_partition() {
        let mut tree = wide_tree();
        let root = tree.root();
        let visible = tree.children(root);
        let collapsed = tree.collapsed_children(root);

        assert_eq!(tree.toggle_collapse(root), root);
        assert_eq!(tree.state(root), NodeState::Collapsed);
        assert_eq!(tree.hidden_children(root), collapsed, "low children stashed");

        assert_eq!(tree.toggle_collapse(root), root);
        assert_eq!(tree.children(root), visible, "visible set restored with its aggregate");
        assert_eq!(tree.collapsed_children(root), collapsed);
        assert!(tree.hidden_children(root).is_empty());
    }

    #[test]
    fn toggle_expanded_round_trip() {
        let mut tree = Tree::stratify([
            rec("root", None, 10.0),
            rec("a", Some("root"), 10.0),
            rec("b", Some("root"), 9.0),
        ])
        .unwrap();
        tree.sort_and_scale(&CollapseConfig::default()).unwrap();
        let root = tree.root();
        let before = tree.children(root);
        tree.toggle_collapse(root);
        assert_eq!(tree.state(root), NodeState::Collapsed);
        tree.toggle_collapse(root);
        assert_eq!(tree.children(root), before);
        assert_eq!(tree.state(root), NodeState::Expanded);
    }

    #[test]
    fn clicking_aggregate_reveals_all_children() {
        let mut tree = wide_tree();
        let root = tree.root();
        let agg = tree.find("other-root").unwrap();
        assert_eq!(tree.toggle_collapse(agg), root, "parent is the updated node");
        assert!(!tree.is_alive(agg), "aggregate destroyed");
        assert_eq!(keys(&tree, tree.children(root)), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(tree.state(root), NodeState::Expanded);
        assert_eq!(tree.find("other-root"), None);
    }

    #[test]
    fn expanding_auto_opens_trivial_subtrees() {
        let mut tree = Tree::stratify([
            rec("root", None, 100.0),
            rec("a", Some("root"), 1.0),
            rec("a1", Some("a"), 1.0),
            rec("a1x", Some("a1"), 1.0),
            rec("z", Some("root"), 100.0),
        ])
        .unwrap();
        let config = CollapseConfig {
            collapsed: BTreeSet::from(["root".to_owned()]),
            ..CollapseConfig::default()
        };
        tree.sort_and_scale(&config).unwrap();
        let root = tree.root();
        let a = tree.find("a").unwrap();
        let a1 = tree.find("a1").unwrap();
        assert_eq!(tree.state(root), NodeState::Collapsed, "forced by the collapsed set");
        assert_eq!(tree.state(a), NodeState::Collapsed);

        tree.toggle_collapse(root);
        assert_eq!(tree.state(a), NodeState::Expanded, "single child is trivial");
        assert_eq!(tree.state(a1), NodeState::Expanded, "recursively");
    }

    #[test]
    fn unnamed_nodes_auto_expand() {
        let mut unnamed = rec("u", Some("root"), 1.0);
        unnamed.name = None;
        let mut tree = Tree::stratify([
            rec("root", None, 100.0),
            rec("big", Some("root"), 100.0),
            unnamed,
            rec("u1", Some("u"), 1.0),
            rec("u2", Some("u"), 1.0),
            rec("u3", Some("u"), 1.0),
        ])
        .unwrap();
        tree.sort_and_scale(&CollapseConfig::default()).unwrap();
        let root = tree.root();
        let u = tree.find("u").unwrap();
        assert_eq!(tree.state(u), NodeState::Collapsed);
        tree.toggle_collapse(root);
        tree.toggle_collapse(root);
        assert_eq!(tree.state(u), NodeState::Expanded, "unnamed node opened on reveal");
    }

    #[test]
    fn rescaling_destroys_old_aggregates() {
        let mut tree = wide_tree();
        let old = tree.find("other-root").unwrap();
        tree.sort_and_scale(&CollapseConfig::default()).unwrap();
        assert!(!tree.is_alive(old), "stale after rescale");
        assert!(tree.find("other-root").is_some(), "rebuilt");
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let mut tree = wide_tree();
        let config = CollapseConfig {
            attribute: None,
            ..CollapseConfig::default()
        };
        assert_eq!(tree.sort_and_scale(&config), Err(CollapseError::MissingAttribute));
    }

    #[test]
    fn highlighted_low_children_stay_out_of_the_aggregate() {
        let mut tree = Tree::stratify([
            rec("root", None, 100.0),
            rec("a", Some("root"), 90.0),
            rec("c", Some("root"), 5.0).highlighted(),
            rec("d", Some("root"), 3.0),
            rec("e", Some("root"), 1.0),
            rec("f", Some("root"), 1.0),
        ])
        .unwrap();
        tree.sort_and_scale(&CollapseConfig::default()).unwrap();
        let root = tree.root();
        assert_eq!(keys(&tree, tree.children(root)), vec!["a", "c", "other-root"]);
        let agg = tree.find("other-root").unwrap();
        assert_eq!(tree.name(agg), Some("(3)"));
        assert!(!tree.is_highlighted(agg), "only unhighlighted children are hidden");
    }
}
