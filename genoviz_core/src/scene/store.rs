// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays element storage with allocation, topology, and property
//! management.

use kurbo::Affine;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{ElementId, INVALID};
use super::shape::{Shape, Style};
use super::traverse::Children;
use crate::dirty;

/// Struct-of-arrays storage for all scene elements.
///
/// Elements are addressed by [`ElementId`] handles. Internally, each element
/// occupies a slot in parallel arrays. Destroyed elements are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// Setting an element hidden suppresses its whole subtree. Properties can
/// still be mutated while hidden.
#[derive(Debug)]
pub struct SceneStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) local_transform: Vec<Affine>,
    pub(crate) local_opacity: Vec<f32>,
    pub(crate) shape: Vec<Shape>,
    pub(crate) style: Vec<Style>,
    pub(crate) hidden: Vec<bool>,

    // -- Computed properties (written by evaluate) --
    pub(crate) world_transform: Vec<Affine>,
    pub(crate) effective_opacity: Vec<f32>,
    pub(crate) effective_hidden: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            local_transform: Vec::new(),
            local_opacity: Vec::new(),
            shape: Vec::new(),
            style: Vec::new(),
            hidden: Vec::new(),
            world_transform: Vec::new(),
            effective_opacity: Vec::new(),
            effective_hidden: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new element and returns its handle.
    ///
    /// The element starts as a visible, fully opaque [`Shape::Group`] with an
    /// identity transform, default style and no parent.
    pub fn create_element(&mut self) -> ElementId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.local_transform[i] = Affine::IDENTITY;
            self.local_opacity[i] = 1.0;
            self.shape[i] = Shape::Group;
            self.style[i] = Style::default();
            self.hidden[i] = false;
            self.world_transform[i] = Affine::IDENTITY;
            self.effective_opacity[i] = 1.0;
            self.effective_hidden[i] = false;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.local_transform.push(Affine::IDENTITY);
            self.local_opacity.push(1.0);
            self.shape.push(Shape::Group);
            self.style.push(Style::default());
            self.hidden.push(false);
            self.world_transform.push(Affine::IDENTITY);
            self.effective_opacity.push(1.0);
            self.effective_hidden.push(false);
            self.generation.push(0);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        ElementId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Creates an element with the given shape and style as the last child
    /// of `parent`.
    pub fn create_child(&mut self, parent: ElementId, shape: Shape, style: Style) -> ElementId {
        let id = self.create_element();
        self.shape[id.idx as usize] = shape;
        self.style[id.idx as usize] = style;
        self.add_child(parent, id);
        id
    }

    /// Destroys an element, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the element has children (remove them first) or if the
    /// handle is stale.
    pub fn destroy_element(&mut self, id: ElementId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy element with children"
        );

        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::TOPOLOGY);
        }

        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;

        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Destroys every descendant of `id`, leaving `id` itself in place.
    pub fn clear_children(&mut self, id: ElementId) {
        self.validate(id);
        let mut stack = vec![id.idx];
        let mut doomed = Vec::new();
        while let Some(idx) = stack.pop() {
            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                doomed.push(child);
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }
        // Children were pushed after their parents; destroy leaves first.
        for &idx in doomed.iter().rev() {
            let handle = ElementId {
                idx,
                generation: self.generation[idx as usize],
            };
            self.destroy_element(handle);
        }
    }

    /// Returns whether the given handle refers to a live element.
    #[must_use]
    pub fn is_alive(&self, id: ElementId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns the number of live elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: ElementId, child: ElementId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        self.link_last(p, c);

        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the element has no parent.
    pub fn remove_from_parent(&mut self, child: ElementId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "element has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);

        self.dirty.remove_dependency(c, p, dirty::TRANSFORM);
        self.dirty.remove_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Moves `child` to the end of its parent's child list.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the element has no parent.
    pub fn move_to_back(&mut self, child: ElementId) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "element has no parent");
        if self.next_sibling[c as usize] == INVALID {
            return;
        }
        self.unlink_from_parent(c);
        self.link_last(p, c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or
    /// `sibling` has no parent.
    pub fn insert_before(&mut self, child: ElementId, sibling: ElementId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);

        self.mark_subtree_inherited_dirty(c);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Returns the parent of an element, if any.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| ElementId {
            idx: p,
            generation: self.generation[p as usize],
        })
    }

    /// Returns an iterator over the direct children of an element.
    #[must_use]
    pub fn children(&self, id: ElementId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the live elements without a parent.
    #[must_use]
    pub fn roots(&self) -> Vec<ElementId> {
        (0..self.len)
            .filter(|&idx| self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx))
            .map(|idx| ElementId {
                idx,
                generation: self.generation[idx as usize],
            })
            .collect()
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the local transform of an element.
    #[must_use]
    pub fn local_transform(&self, id: ElementId) -> Affine {
        self.validate(id);
        self.local_transform[id.idx as usize]
    }

    /// Returns the local opacity of an element.
    #[must_use]
    pub fn local_opacity(&self, id: ElementId) -> f32 {
        self.validate(id);
        self.local_opacity[id.idx as usize]
    }

    /// Returns the shape of an element.
    #[must_use]
    pub fn shape(&self, id: ElementId) -> &Shape {
        self.validate(id);
        &self.shape[id.idx as usize]
    }

    /// Returns the style of an element.
    #[must_use]
    pub fn style(&self, id: ElementId) -> &Style {
        self.validate(id);
        &self.style[id.idx as usize]
    }

    /// Returns the element's own hidden flag.
    #[must_use]
    pub fn is_hidden(&self, id: ElementId) -> bool {
        self.validate(id);
        self.hidden[id.idx as usize]
    }

    /// Returns the computed world transform of an element.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn world_transform(&self, id: ElementId) -> Affine {
        self.validate(id);
        self.world_transform[id.idx as usize]
    }

    /// Returns the computed effective opacity of an element.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn effective_opacity(&self, id: ElementId) -> f32 {
        self.validate(id);
        self.effective_opacity[id.idx as usize]
    }

    /// Returns whether the element is effectively hidden (including by an
    /// ancestor's hidden flag).
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn effective_hidden(&self, id: ElementId) -> bool {
        self.validate(id);
        self.effective_hidden[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the local transform of an element.
    ///
    /// Marks the TRANSFORM channel dirty with eager propagation to
    /// descendants.
    pub fn set_transform(&mut self, id: ElementId, transform: Affine) {
        self.validate(id);
        if self.local_transform[id.idx as usize] == transform {
            return;
        }
        self.local_transform[id.idx as usize] = transform;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the local opacity of an element.
    ///
    /// Marks the OPACITY channel dirty with eager propagation to descendants.
    pub fn set_opacity(&mut self, id: ElementId, opacity: f32) {
        self.validate(id);
        if self.local_opacity[id.idx as usize] == opacity {
            return;
        }
        self.local_opacity[id.idx as usize] = opacity;
        self.dirty.mark_with(id.idx, dirty::OPACITY, &EagerPolicy);
    }

    /// Sets the shape of an element.
    pub fn set_shape(&mut self, id: ElementId, shape: Shape) {
        self.validate(id);
        if self.shape[id.idx as usize] == shape {
            return;
        }
        self.shape[id.idx as usize] = shape;
        self.dirty.mark(id.idx, dirty::SHAPE);
    }

    /// Sets the style of an element.
    pub fn set_style(&mut self, id: ElementId, style: Style) {
        self.validate(id);
        if self.style[id.idx as usize] == style {
            return;
        }
        self.style[id.idx as usize] = style;
        self.dirty.mark(id.idx, dirty::STYLE);
    }

    /// Sets the hidden flag of an element.
    pub fn set_hidden(&mut self, id: ElementId, hidden: bool) {
        self.validate(id);
        if self.hidden[id.idx as usize] == hidden {
            return;
        }
        self.hidden[id.idx as usize] = hidden;
        // Hidden state is inherited, so it rides on the transform channel.
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    // -- Raw-index accessors for presenters --
    //
    // These accept raw slot indices (as found in `SceneChanges`) rather than
    // `ElementId` handles, skipping generation validation. Only use with
    // indices that came from `SceneChanges` or `traversal_order()`.

    /// Returns the computed world transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_transform_at(&self, idx: u32) -> Affine {
        self.check_slot(idx);
        self.world_transform[idx as usize]
    }

    /// Returns the local transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn local_transform_at(&self, idx: u32) -> Affine {
        self.check_slot(idx);
        self.local_transform[idx as usize]
    }

    /// Returns the computed effective opacity at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn effective_opacity_at(&self, idx: u32) -> f32 {
        self.check_slot(idx);
        self.effective_opacity[idx as usize]
    }

    /// Returns the local opacity at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn local_opacity_at(&self, idx: u32) -> f32 {
        self.check_slot(idx);
        self.local_opacity[idx as usize]
    }

    /// Returns whether the element at raw slot `idx` is effectively hidden.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn effective_hidden_at(&self, idx: u32) -> bool {
        self.check_slot(idx);
        self.effective_hidden[idx as usize]
    }

    /// Returns the shape at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn shape_at(&self, idx: u32) -> &Shape {
        self.check_slot(idx);
        &self.shape[idx as usize]
    }

    /// Returns the style at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn style_at(&self, idx: u32) -> &Style {
        self.check_slot(idx);
        &self.style[idx as usize]
    }

    /// Returns the parent slot of raw slot `idx`, or [`INVALID`].
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn parent_at(&self, idx: u32) -> u32 {
        self.check_slot(idx);
        self.parent[idx as usize]
    }

    // -- Internal helpers --

    fn check_slot(&self, idx: u32) {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
    }

    /// Panics if the handle is stale.
    #[track_caller]
    pub(crate) fn validate(&self, id: ElementId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale ElementId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty
    /// state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::OPACITY, &EagerPolicy);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut store = SceneStore::new();
        let id = store.create_element();
        assert!(store.is_alive(id));
        store.destroy_element(id);
        assert!(!store.is_alive(id));
        assert_eq!(store.element_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = SceneStore::new();
        let id1 = store.create_element();
        store.destroy_element(id1);
        let id2 = store.create_element();
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut store = SceneStore::new();
        let root = store.create_element();
        let a = store.create_child(root, Shape::Rect(Rect::ZERO), Style::default());
        let c = store.create_child(root, Shape::Group, Style::default());
        let b = store.create_element();
        store.insert_before(b, c);
        assert_eq!(store.children(root).collect::<Vec<_>>(), vec![a, b, c]);

        store.move_to_back(a);
        assert_eq!(store.children(root).collect::<Vec<_>>(), vec![b, c, a]);

        store.remove_from_parent(b);
        assert_eq!(store.parent(b), None);
        assert_eq!(store.children(root).collect::<Vec<_>>(), vec![c, a]);
    }

    #[test]
    fn clear_children_destroys_descendants() {
        let mut store = SceneStore::new();
        let root = store.create_element();
        let g = store.create_child(root, Shape::Group, Style::default());
        let leaf = store.create_child(g, Shape::Rect(Rect::ZERO), Style::default());
        store.clear_children(root);
        assert!(store.is_alive(root));
        assert!(!store.is_alive(g));
        assert!(!store.is_alive(leaf));
        assert!(store.children(root).next().is_none());
        assert_eq!(store.roots(), vec![root]);
    }

    #[test]
    #[should_panic(expected = "cannot destroy element with children")]
    fn destroy_with_children_panics() {
        let mut store = SceneStore::new();
        let parent = store.create_element();
        let child = store.create_element();
        store.add_child(parent, child);
        store.destroy_element(parent);
    }

    #[test]
    #[should_panic(expected = "stale ElementId")]
    fn destroyed_handle_panics_on_set_shape() {
        let mut store = SceneStore::new();
        let id = store.create_element();
        store.destroy_element(id);
        store.set_shape(id, Shape::Group);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_parenting_panics() {
        let mut store = SceneStore::new();
        let a = store.create_element();
        let b = store.create_element();
        let c = store.create_element();
        store.add_child(a, c);
        store.add_child(b, c);
    }

    #[test]
    fn unchanged_values_do_not_mark_dirty() {
        let mut store = SceneStore::new();
        let id = store.create_element();
        let _ = store.evaluate();
        store.set_opacity(id, 1.0);
        store.set_shape(id, Shape::Group);
        store.set_style(id, Style::default());
        let changes = store.evaluate();
        assert!(changes.opacities.is_empty(), "same opacity");
        assert!(changes.shapes.is_empty(), "same shape");
        assert!(changes.styles.is_empty(), "same style");
    }
}
