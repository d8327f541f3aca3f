// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene evaluation and change tracking.
//!
//! Evaluation drains each dirty channel and recomputes what depends on it:
//!
//! 1. **TRANSFORM**: world transform is `parent_world * local`, and
//!    effective hidden is `parent_hidden || hidden`.
//! 2. **OPACITY**: effective opacity is `parent_effective * local`.
//! 3. **SHAPE** / **STYLE**: collected only; presenters read the current
//!    values from the store.
//! 4. **TOPOLOGY**: drained and discarded, since the traversal order was
//!    already rebuilt.
//!
//! [`SceneChanges`] carries raw slot indices so presenters can use the
//! `*_at()` accessors directly.

use kurbo::Affine;

use super::id::INVALID;
use super::store::SceneStore;
use crate::dirty;

/// The set of changes produced by a single [`SceneStore::evaluate`] call.
#[derive(Clone, Debug, Default)]
pub struct SceneChanges {
    /// Elements whose world transform was recomputed.
    pub transforms: Vec<u32>,
    /// Elements whose effective opacity was recomputed.
    pub opacities: Vec<u32>,
    /// Elements whose shape changed.
    pub shapes: Vec<u32>,
    /// Elements whose style changed.
    pub styles: Vec<u32>,
    /// Elements that became effectively hidden.
    pub hidden: Vec<u32>,
    /// Elements that became visible again.
    pub unhidden: Vec<u32>,
    /// Elements created since the last evaluate.
    pub added: Vec<u32>,
    /// Elements destroyed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether the traversal order was rebuilt.
    pub topology_changed: bool,
}

impl SceneChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.opacities.clear();
        self.shapes.clear();
        self.styles.clear();
        self.hidden.clear();
        self.unhidden.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.opacities.is_empty()
            && self.shapes.is_empty()
            && self.styles.is_empty()
            && self.hidden.is_empty()
            && self.unhidden.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }

    /// Folds a later change set into this one, so that a presenter that
    /// skipped an evaluation still converges.
    ///
    /// A slot added here and removed in `later` is dropped from every
    /// property list; it is reported as removed only.
    pub fn absorb(&mut self, later: &Self) {
        for &slot in &later.removed {
            if let Some(pos) = self.added.iter().position(|&s| s == slot) {
                self.added.swap_remove(pos);
                for list in [
                    &mut self.transforms,
                    &mut self.opacities,
                    &mut self.shapes,
                    &mut self.styles,
                    &mut self.hidden,
                    &mut self.unhidden,
                ] {
                    list.retain(|&s| s != slot);
                }
            }
            self.removed.push(slot);
        }
        self.transforms.extend_from_slice(&later.transforms);
        self.opacities.extend_from_slice(&later.opacities);
        self.shapes.extend_from_slice(&later.shapes);
        self.styles.extend_from_slice(&later.styles);
        self.hidden.extend_from_slice(&later.hidden);
        self.unhidden.extend_from_slice(&later.unhidden);
        self.added.extend_from_slice(&later.added);
        self.topology_changed |= later.topology_changed;
    }
}

impl SceneStore {
    /// Evaluates the scene, recomputing dirty properties and returning the
    /// set of changes.
    pub fn evaluate(&mut self) -> SceneChanges {
        let mut changes = SceneChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut SceneChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        let dirty_transforms: Vec<u32> = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_transforms {
            let parent_idx = self.parent[idx as usize];
            let (parent_world, parent_hidden) = if parent_idx != INVALID {
                (
                    self.world_transform[parent_idx as usize],
                    self.effective_hidden[parent_idx as usize],
                )
            } else {
                (Affine::IDENTITY, false)
            };
            self.world_transform[idx as usize] = parent_world * self.local_transform[idx as usize];

            let new_hidden = parent_hidden || self.hidden[idx as usize];
            if new_hidden != self.effective_hidden[idx as usize] {
                if new_hidden {
                    changes.hidden.push(idx);
                } else {
                    changes.unhidden.push(idx);
                }
                self.effective_hidden[idx as usize] = new_hidden;
            }
        }
        changes.transforms = dirty_transforms;

        let dirty_opacities: Vec<u32> = self
            .dirty
            .drain(dirty::OPACITY)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &dirty_opacities {
            let parent_idx = self.parent[idx as usize];
            let parent_opacity = if parent_idx != INVALID {
                self.effective_opacity[parent_idx as usize]
            } else {
                1.0
            };
            self.effective_opacity[idx as usize] =
                parent_opacity * self.local_opacity[idx as usize];
        }
        changes.opacities = dirty_opacities;

        changes.shapes = self
            .dirty
            .drain(dirty::SHAPE)
            .deterministic()
            .run()
            .collect();

        changes.styles = self
            .dirty
            .drain(dirty::STYLE)
            .deterministic()
            .run()
            .collect();

        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        // Slots destroyed before the evaluate would otherwise be reported
        // as stale transform or shape changes.
        if !self.pending_removed.is_empty() {
            let removed = &self.pending_removed;
            let live = |idx: &u32| !(removed.contains(idx) && self.free_list.contains(idx));
            changes.transforms.retain(live);
            changes.opacities.retain(live);
            changes.shapes.retain(live);
            changes.styles.retain(live);
        }

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the current traversal order (depth-first pre-order).
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                self.dfs_collect(idx);
            }
        }
    }

    fn dfs_collect(&mut self, idx: u32) {
        self.traversal_order.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs_collect(child);
            child = self.next_sibling[child as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Vec2};

    use super::*;
    use crate::scene::{Shape, Style};

    #[test]
    fn evaluate_computes_world_transforms() {
        let mut store = SceneStore::new();
        let parent = store.create_element();
        let child = store.create_element();

        let parent_xf = Affine::translate((10.0, 0.0));
        let child_xf = Affine::translate((0.0, 5.0));
        store.set_transform(parent, parent_xf);
        store.set_transform(child, child_xf);
        store.add_child(parent, child);

        let _changes = store.evaluate();

        assert_eq!(store.world_transform(parent), parent_xf);
        assert_eq!(
            store.world_transform(child).translation(),
            Vec2::new(10.0, 5.0)
        );
    }

    #[test]
    fn evaluate_computes_effective_opacity() {
        let mut store = SceneStore::new();
        let parent = store.create_element();
        let child = store.create_element();
        store.set_opacity(parent, 0.5);
        store.set_opacity(child, 0.8);
        store.add_child(parent, child);

        let _changes = store.evaluate();
        assert!((store.effective_opacity(child) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn parent_change_propagates_to_children() {
        let mut store = SceneStore::new();
        let parent = store.create_element();
        let child = store.create_element();
        store.add_child(parent, child);
        let _ = store.evaluate();

        store.set_transform(parent, Affine::translate((3.0, 0.0)));
        let changes = store.evaluate();
        assert!(changes.transforms.contains(&child.idx), "child recomputed");
        assert_eq!(store.world_transform(child).translation(), Vec2::new(3.0, 0.0));
    }

    #[test]
    fn hidden_is_inherited() {
        let mut store = SceneStore::new();
        let parent = store.create_element();
        let child = store.create_element();
        store.add_child(parent, child);
        let _ = store.evaluate();

        store.set_hidden(parent, true);
        let changes = store.evaluate();
        assert!(store.effective_hidden(child));
        assert_eq!(changes.hidden, vec![parent.idx, child.idx]);

        store.set_hidden(parent, false);
        let changes = store.evaluate();
        assert!(!store.effective_hidden(child));
        assert_eq!(changes.unhidden.len(), 2);
    }

    #[test]
    fn shape_and_style_changes_are_reported() {
        let mut store = SceneStore::new();
        let id = store.create_element();
        let _ = store.evaluate();

        store.set_shape(id, Shape::Rect(Rect::new(0.0, 0.0, 4.0, 4.0)));
        store.set_style(id, Style::default().with_class("bar"));
        let changes = store.evaluate();
        assert_eq!(changes.shapes, vec![id.idx]);
        assert_eq!(changes.styles, vec![id.idx]);
        assert!(store.evaluate().is_empty(), "second evaluate is clean");
    }

    #[test]
    fn traversal_is_preorder_and_lifecycle_is_reported() {
        let mut store = SceneStore::new();
        let root = store.create_element();
        let a = store.create_element();
        let b = store.create_element();
        let a1 = store.create_element();
        store.add_child(root, a);
        store.add_child(root, b);
        store.add_child(a, a1);

        let changes = store.evaluate();
        assert!(changes.topology_changed);
        assert_eq!(changes.added.len(), 4);
        assert_eq!(store.traversal_order(), &[root.idx, a.idx, a1.idx, b.idx]);

        store.remove_from_parent(a1);
        store.destroy_element(a1);
        let changes = store.evaluate();
        assert_eq!(changes.removed, vec![a1.idx]);
        assert!(!changes.transforms.contains(&a1.idx));
        assert_eq!(store.traversal_order(), &[root.idx, a.idx, b.idx]);
    }

    #[test]
    fn absorb_cancels_short_lived_slots() {
        let mut store = SceneStore::new();
        let keep = store.create_element();
        let gone = store.create_element();
        let mut pending = store.evaluate();

        store.destroy_element(gone);
        store.set_opacity(keep, 0.5);
        pending.absorb(&store.evaluate());

        assert_eq!(pending.added, vec![keep.idx]);
        assert_eq!(pending.removed, vec![gone.idx]);
        assert!(!pending.transforms.contains(&gone.idx));
        assert!(pending.opacities.contains(&keep.idx));
        assert!(pending.topology_changed);
    }
}
