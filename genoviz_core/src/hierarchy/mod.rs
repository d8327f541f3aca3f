// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collapsible hierarchy built from flat parent-pointer records.
//!
//! A [`Tree`] is an arena of nodes addressed by generational [`NodeId`]
//! handles. Every node keeps three child lists:
//!
//! - `children`: currently visible.
//! - `collapsed_children`: folded away behind the node (or behind its
//!   aggregate sibling when partially collapsed).
//! - `hidden_children`: stashed while a partially collapsed node is fully
//!   collapsed, restored when it is expanded again.
//!
//! [`Tree::sort_and_scale`] derives the initial state from a score attribute,
//! [`Tree::toggle_collapse`] flips a node in response to a click, and
//! [`Tree::layout_tidy`] / [`Tree::layout_cluster`] place the visible nodes.

mod collapse;
mod layout;
mod tree;

pub use collapse::{CollapseConfig, CollapseError};
pub use tree::{StratifyError, Tree};

use core::fmt;
use std::collections::BTreeMap;

/// A handle to a node in a [`Tree`].
///
/// Aggregate nodes are created and destroyed by collapse operations; the
/// generation counter detects handles that outlived their node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// The collapse state of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// A real node without children.
    Leaf,
    /// All children visible.
    Expanded,
    /// All children folded away.
    Collapsed,
    /// Some children visible, the rest behind an aggregate node.
    PartiallyCollapsed,
    /// A synthetic `other-{id}` node standing in for its parent's collapsed
    /// children.
    AggregatedLeaf,
}

impl NodeState {
    /// Returns whether clicking the node changes the tree.
    #[must_use]
    pub const fn is_toggleable(self) -> bool {
        !matches!(self, Self::Leaf)
    }
}

/// One flat input record.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct TreeRecord {
    /// Unique identifier.
    pub id: String,
    /// Parent identifier; `None` (or empty) marks the root.
    pub parent_id: Option<String>,
    /// Display name. Unnamed nodes are auto-expanded and drawn without a
    /// marker.
    pub name: Option<String>,
    /// Alternative display name.
    pub common_name: Option<String>,
    /// Named numeric scores.
    pub values: BTreeMap<String, f64>,
    /// Highlighted nodes are never collapsed by score.
    pub highlight: bool,
}

impl TreeRecord {
    /// Creates a record with a name and no scores.
    #[must_use]
    pub fn new(id: impl Into<String>, parent_id: Option<&str>) -> Self {
        let id = id.into();
        Self {
            name: Some(id.clone()),
            id,
            parent_id: parent_id.map(String::from),
            ..Self::default()
        }
    }

    /// Returns the record with `attribute` set to `value`.
    #[must_use]
    pub fn with_value(mut self, attribute: &str, value: f64) -> Self {
        self.values.insert(attribute.into(), value);
        self
    }

    /// Returns the record marked as highlighted.
    #[must_use]
    pub fn highlighted(mut self) -> Self {
        self.highlight = true;
        self
    }
}
