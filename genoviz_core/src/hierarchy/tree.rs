// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena storage, stratification and read access.

use std::collections::{BTreeMap, HashMap};

use kurbo::Point;

use super::{NodeId, NodeState, TreeRecord};
use crate::scale::Domain;

/// Why a record set could not be turned into a tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StratifyError {
    /// Every record has a parent.
    #[error("no root record")]
    NoRoot,
    /// More than one record has no parent.
    #[error("multiple roots: {0:?} and {1:?}")]
    MultipleRoots(String, String),
    /// Two records share an id.
    #[error("duplicate id {0:?}")]
    DuplicateId(String),
    /// A record names a parent that does not exist.
    #[error("record {id:?} has unknown parent {parent:?}")]
    UnknownParent {
        /// The offending record.
        id: String,
        /// The missing parent id.
        parent: String,
    },
    /// Some records form a cycle detached from the root.
    #[error("{0} records are not reachable from the root")]
    Unreachable(usize),
}

#[derive(Clone, Debug)]
pub(super) struct Node {
    pub(super) key: String,
    pub(super) name: Option<String>,
    pub(super) common_name: Option<String>,
    pub(super) values: BTreeMap<String, f64>,
    pub(super) highlight: bool,
    pub(super) aggregated: bool,
    pub(super) live: bool,
    pub(super) parent: Option<u32>,
    pub(super) depth: u32,
    pub(super) children: Vec<u32>,
    pub(super) collapsed: Vec<u32>,
    pub(super) hidden: Vec<u32>,
    pub(super) position: Point,
    pub(super) previous: Point,
}

impl Node {
    fn from_record(record: TreeRecord) -> Self {
        Self {
            key: record.id,
            name: record.name.filter(|n| !n.is_empty()),
            common_name: record.common_name.filter(|n| !n.is_empty()),
            values: record.values,
            highlight: record.highlight,
            aggregated: false,
            live: true,
            parent: None,
            depth: 0,
            children: Vec::new(),
            collapsed: Vec::new(),
            hidden: Vec::new(),
            position: Point::ZERO,
            previous: Point::ZERO,
        }
    }
}

/// A collapsible tree.
#[derive(Clone, Debug)]
pub struct Tree {
    pub(super) nodes: Vec<Node>,
    pub(super) generation: Vec<u32>,
    pub(super) free_list: Vec<u32>,
    pub(super) root: u32,
    pub(super) by_key: HashMap<String, u32>,
    pub(super) score_range: Domain,
    pub(super) min_non_collapsable: usize,
}

impl Tree {
    /// Builds a tree from flat `{id, parent_id}` records.
    ///
    /// Children keep the order in which their records appear. A record whose
    /// `parent_id` is `None` or empty is the root.
    pub fn stratify(records: impl IntoIterator<Item = TreeRecord>) -> Result<Self, StratifyError> {
        let records: Vec<TreeRecord> = records.into_iter().collect();
        let mut by_key = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "record counts are far below u32::MAX"
            )]
            let slot = i as u32;
            if by_key.insert(record.id.clone(), slot).is_some() {
                return Err(StratifyError::DuplicateId(record.id.clone()));
            }
        }

        let mut root: Option<u32> = None;
        let mut parents: Vec<Option<u32>> = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            match record.parent_id.as_deref().filter(|p| !p.is_empty()) {
                None => {
                    if let Some(first) = root {
                        return Err(StratifyError::MultipleRoots(
                            records[first as usize].id.clone(),
                            record.id.clone(),
                        ));
                    }
                    #[expect(clippy::cast_possible_truncation, reason = "checked above")]
                    let i = i as u32;
                    root = Some(i);
                    parents.push(None);
                }
                Some(parent) => {
                    let Some(&p) = by_key.get(parent) else {
                        return Err(StratifyError::UnknownParent {
                            id: record.id.clone(),
                            parent: parent.into(),
                        });
                    };
                    parents.push(Some(p));
                }
            }
        }
        let root = root.ok_or(StratifyError::NoRoot)?;

        let mut nodes: Vec<Node> = records.into_iter().map(Node::from_record).collect();
        for (i, parent) in parents.iter().enumerate() {
            if let Some(p) = *parent {
                #[expect(clippy::cast_possible_truncation, reason = "checked above")]
                let child = i as u32;
                nodes[p as usize].children.push(child);
                nodes[i].parent = Some(p);
            }
        }

        let mut reached = 0_usize;
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            reached += 1;
            let depth = nodes[idx as usize].depth;
            for k in 0..nodes[idx as usize].children.len() {
                let child = nodes[idx as usize].children[k];
                nodes[child as usize].depth = depth + 1;
                stack.push(child);
            }
        }
        if reached < nodes.len() {
            return Err(StratifyError::Unreachable(nodes.len() - reached));
        }

        let generation = vec![0; nodes.len()];
        Ok(Self {
            nodes,
            generation,
            free_list: Vec::new(),
            root,
            by_key,
            score_range: Domain::EMPTY,
            min_non_collapsable: 2,
        })
    }

    // -- Arena --

    #[inline]
    #[track_caller]
    pub(super) fn validate(&self, id: NodeId) {
        assert!(self.is_alive(id), "stale node id {id:?}");
    }

    pub(super) fn id_of(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(super) fn alloc(&mut self, node: Node) -> u32 {
        let key = node.key.clone();
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generation[idx as usize] += 1;
            self.nodes[idx as usize] = node;
            idx
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "node counts are far below u32::MAX"
            )]
            let idx = self.nodes.len() as u32;
            self.nodes.push(node);
            self.generation.push(0);
            idx
        };
        self.by_key.entry(key).or_insert(idx);
        idx
    }

    pub(super) fn free(&mut self, idx: u32) {
        let node = &mut self.nodes[idx as usize];
        node.live = false;
        node.children.clear();
        node.collapsed.clear();
        node.hidden.clear();
        if self.by_key.get(&node.key) == Some(&idx) {
            self.by_key.remove(&node.key);
        }
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
    }

    /// Every live node reachable through any child list, parents first.
    pub(super) fn all_preorder(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            let n = &self.nodes[idx as usize];
            stack.extend(n.hidden.iter().rev());
            stack.extend(n.collapsed.iter().rev());
            stack.extend(n.children.iter().rev());
        }
        out
    }

    pub(super) fn visible_preorder(&self) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.nodes[idx as usize].children.iter().rev());
        }
        out
    }

    // -- Queries --

    /// Returns whether `id` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx as usize) < self.nodes.len()
            && self.generation[id.idx as usize] == id.generation
            && self.nodes[id.idx as usize].live
    }

    /// Returns the root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.id_of(self.root)
    }

    /// Returns the number of live nodes, aggregates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Always false; a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Looks a node up by record id (or `other-{id}` for aggregates).
    #[must_use]
    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.by_key.get(key).map(|&idx| self.id_of(idx))
    }

    /// Returns the node's record id.
    #[must_use]
    pub fn key(&self, id: NodeId) -> &str {
        self.validate(id);
        &self.nodes[id.idx as usize].key
    }

    /// Returns the node's name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.validate(id);
        self.nodes[id.idx as usize].name.as_deref()
    }

    /// Returns the node's common name.
    #[must_use]
    pub fn common_name(&self, id: NodeId) -> Option<&str> {
        self.validate(id);
        self.nodes[id.idx as usize].common_name.as_deref()
    }

    /// Returns the common name when requested and present, else the name.
    #[must_use]
    pub fn label(&self, id: NodeId, use_common_name: bool) -> Option<&str> {
        let common = if use_common_name {
            self.common_name(id)
        } else {
            None
        };
        common.or_else(|| self.name(id))
    }

    /// Returns the node's scores.
    #[must_use]
    pub fn values(&self, id: NodeId) -> &BTreeMap<String, f64> {
        self.validate(id);
        &self.nodes[id.idx as usize].values
    }

    /// Returns the score for `attribute`, treating a missing value as `0`.
    #[must_use]
    pub fn score(&self, id: NodeId, attribute: &str) -> f64 {
        self.validate(id);
        self.score_of(id.idx, attribute)
    }

    pub(super) fn score_of(&self, idx: u32, attribute: &str) -> f64 {
        self.nodes[idx as usize]
            .values
            .get(attribute)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Returns the score range computed by the last
    /// [`sort_and_scale`](Self::sort_and_scale).
    #[must_use]
    pub fn score_range(&self) -> Domain {
        self.score_range
    }

    /// Returns the score normalized against [`score_range`](Self::score_range).
    #[must_use]
    pub fn normalized_score(&self, id: NodeId, attribute: &str) -> f64 {
        self.validate(id);
        self.normalize(self.score_of(id.idx, attribute))
    }

    pub(super) fn normalize(&self, score: f64) -> f64 {
        let Domain { min, max } = self.score_range;
        if max > min { (score - min) / (max - min) } else { 0.5 }
    }

    /// Returns whether the node is highlighted.
    #[must_use]
    pub fn is_highlighted(&self, id: NodeId) -> bool {
        self.validate(id);
        self.nodes[id.idx as usize].highlight
    }

    /// Returns whether the node is a synthetic aggregate.
    #[must_use]
    pub fn is_aggregated(&self, id: NodeId) -> bool {
        self.validate(id);
        self.nodes[id.idx as usize].aggregated
    }

    /// Returns the parent, or `None` for the root.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.nodes[id.idx as usize].parent.map(|p| self.id_of(p))
    }

    /// Returns the depth (root = 0).
    #[must_use]
    pub fn depth(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.nodes[id.idx as usize].depth
    }

    /// Returns the visible children.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.validate(id);
        self.ids(&self.nodes[id.idx as usize].children)
    }

    /// Returns the collapsed children.
    #[must_use]
    pub fn collapsed_children(&self, id: NodeId) -> Vec<NodeId> {
        self.validate(id);
        self.ids(&self.nodes[id.idx as usize].collapsed)
    }

    /// Returns the children stashed while a partially collapsed node is
    /// fully collapsed.
    #[must_use]
    pub fn hidden_children(&self, id: NodeId) -> Vec<NodeId> {
        self.validate(id);
        self.ids(&self.nodes[id.idx as usize].hidden)
    }

    fn ids(&self, slots: &[u32]) -> Vec<NodeId> {
        slots.iter().map(|&idx| self.id_of(idx)).collect()
    }

    /// Returns whether the node has visible or collapsed children.
    #[must_use]
    pub fn has_children(&self, id: NodeId) -> bool {
        self.validate(id);
        let n = &self.nodes[id.idx as usize];
        !n.children.is_empty() || !n.collapsed.is_empty()
    }

    /// Returns the node's collapse state.
    #[must_use]
    pub fn state(&self, id: NodeId) -> NodeState {
        self.validate(id);
        let n = &self.nodes[id.idx as usize];
        if n.aggregated {
            return NodeState::AggregatedLeaf;
        }
        match (n.children.is_empty(), n.collapsed.is_empty()) {
            (true, true) => NodeState::Leaf,
            (true, false) => NodeState::Collapsed,
            (false, true) => NodeState::Expanded,
            (false, false) => NodeState::PartiallyCollapsed,
        }
    }

    /// Returns the node's position from the last layout.
    #[must_use]
    pub fn position(&self, id: NodeId) -> Point {
        self.validate(id);
        self.nodes[id.idx as usize].position
    }

    /// Returns the node's position before the last layout.
    #[must_use]
    pub fn previous_position(&self, id: NodeId) -> Point {
        self.validate(id);
        self.nodes[id.idx as usize].previous
    }

    /// Returns the visible nodes, parents before children.
    #[must_use]
    pub fn visible(&self) -> Vec<NodeId> {
        self.ids(&self.visible_preorder())
    }

    /// Returns `(parent, child)` pairs for every visible edge.
    #[must_use]
    pub fn visible_links(&self) -> Vec<(NodeId, NodeId)> {
        self.visible_preorder()
            .into_iter()
            .filter_map(|idx| {
                self.nodes[idx as usize]
                    .parent
                    .map(|p| (self.id_of(p), self.id_of(idx)))
            })
            .collect()
    }

    /// Returns the number of visible nodes without visible children.
    #[must_use]
    pub fn visible_leaf_count(&self) -> usize {
        self.visible_preorder()
            .into_iter()
            .filter(|&idx| self.nodes[idx as usize].children.is_empty())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, parent: Option<&str>) -> TreeRecord {
        TreeRecord::new(id, parent)
    }

    #[test]
    fn stratify_links_children_in_record_order() {
        let tree = Tree::stratify([
            rec("root", None),
            rec("b", Some("root")),
            rec("a", Some("root")),
            rec("a1", Some("a")),
        ])
        .unwrap();
        let root = tree.root();
        let kids: Vec<&str> = tree.children(root).into_iter().map(|c| tree.key(c)).collect();
        assert_eq!(kids, vec!["b", "a"]);
        let a1 = tree.find("a1").unwrap();
        assert_eq!(tree.depth(a1), 2);
        assert_eq!(tree.parent(a1), tree.find("a"));
        assert_eq!(tree.state(root), NodeState::Expanded);
        assert_eq!(tree.state(a1), NodeState::Leaf);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn stratify_errors() {
        assert_eq!(
            Tree::stratify([rec("a", Some("b")), rec("b", Some("a"))]).unwrap_err(),
            StratifyError::NoRoot
        );
        assert_eq!(
            Tree::stratify([rec("a", None), rec("b", None)]).unwrap_err(),
            StratifyError::MultipleRoots("a".into(), "b".into())
        );
        assert_eq!(
            Tree::stratify([rec("a", None), rec("a", Some("a"))]).unwrap_err(),
            StratifyError::DuplicateId("a".into())
        );
        assert!(matches!(
            Tree::stratify([rec("a", None), rec("b", Some("zzz"))]).unwrap_err(),
            StratifyError::UnknownParent { .. }
        ));
        assert_eq!(
            Tree::stratify([
                rec("r", None),
                rec("x", Some("y")),
                rec("y", Some("x")),
            ])
            .unwrap_err(),
            StratifyError::Unreachable(2)
        );
    }

    #[test]
    fn empty_parent_id_marks_root() {
        let mut root = rec("r", None);
        root.parent_id = Some(String::new());
        let tree = Tree::stratify([root, rec("c", Some("r"))]).unwrap();
        assert_eq!(tree.key(tree.root()), "r");
    }

    #[test]
    fn labels_prefer_common_name_when_asked() {
        let mut r = rec("r", None);
        r.common_name = Some("Common".into());
        let tree = Tree::stratify([r, rec("c", Some("r"))]).unwrap();
        let root = tree.root();
        assert_eq!(tree.label(root, true), Some("Common"));
        assert_eq!(tree.label(root, false), Some("r"));
        let c = tree.find("c").unwrap();
        assert_eq!(tree.label(c, true), Some("c"), "falls back to name");
    }

    #[test]
    fn missing_scores_read_as_zero() {
        let tree = Tree::stratify([rec("r", None).with_value("s", 3.0)]).unwrap();
        assert_eq!(tree.score(tree.root(), "s"), 3.0);
        assert_eq!(tree.score(tree.root(), "missing"), 0.0);
    }

    #[test]
    #[should_panic(expected = "stale node id")]
    fn stale_handle_panics() {
        let tree = Tree::stratify([rec("r", None)]).unwrap();
        let bogus = NodeId {
            idx: 0,
            generation: 7,
        };
        let _ = tree.key(bogus);
    }
}
