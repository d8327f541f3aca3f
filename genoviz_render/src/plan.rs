// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: the visible elements of an evaluated scene, in paint order.

use genoviz_core::scene::{SceneStore, Shape, Style};
use kurbo::{Affine, Rect, Size};

/// A single draw command.
///
/// Items are produced back-to-front, matching the scene's traversal order.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// Raw slot index of the source element.
    pub slot: u32,
    /// Geometry in the element's local coordinates.
    pub shape: Shape,
    /// Paint.
    pub style: Style,
    /// World transform.
    pub world_transform: Affine,
    /// Effective opacity (accumulated from ancestors).
    pub opacity: f32,
}

impl RenderItem {
    /// Returns the world-space bounding box, or `None` for text.
    #[must_use]
    pub fn world_bounds(&self) -> Option<Rect> {
        let local = self.shape.bounds()?;
        let pad = self.style.stroke.map_or(0.0, |_| self.style.stroke_width / 2.0);
        Some(
            self.world_transform
                .transform_rect_bbox(local.inflate(pad, pad)),
        )
    }
}

/// An ordered list of draw commands for one surface.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Surface size.
    pub size: Size,
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            items: Vec::new(),
        }
    }

    /// Builds the plan for an evaluated store.
    ///
    /// Hidden elements, fully transparent elements and groups produce no
    /// items.
    #[must_use]
    pub fn build(store: &SceneStore, size: Size) -> Self {
        let mut plan = Self::new(size);
        plan.rebuild(store);
        plan
    }

    /// Clears and refills the plan from `store`.
    pub fn rebuild(&mut self, store: &SceneStore) {
        self.items.clear();
        for &slot in store.traversal_order() {
            if store.effective_hidden_at(slot) {
                continue;
            }
            let opacity = store.effective_opacity_at(slot);
            let shape = store.shape_at(slot);
            if opacity <= 0.0 || matches!(shape, Shape::Group) {
                continue;
            }
            self.items.push(RenderItem {
                slot,
                shape: shape.clone(),
                style: store.style_at(slot).clone(),
                world_transform: store.world_transform_at(slot),
                opacity,
            });
        }
    }

    /// Returns the union of all item bounds.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        self.items
            .iter()
            .filter_map(RenderItem::world_bounds)
            .reduce(|a, b| a.union(b))
    }
}

#[cfg(test)]
mod tests {
    use genoviz_core::color::Color;

    use super::*;

    #[test]
    fn plan_skips_groups_and_hidden_elements() {
        let mut store = SceneStore::new();
        let root = store.create_element();
        store.set_transform(root, Affine::translate((10.0, 20.0)));
        let visible = store.create_child(
            root,
            Shape::Rect(Rect::new(0.0, 0.0, 5.0, 5.0)),
            Style::fill(Color::rgb(1, 2, 3)),
        );
        let hidden = store.create_child(root, Shape::Rect(Rect::ZERO), Style::default());
        store.set_hidden(hidden, true);
        let clear = store.create_child(root, Shape::Rect(Rect::ZERO), Style::default());
        store.set_opacity(clear, 0.0);
        let _ = store.evaluate();

        let plan = RenderPlan::build(&store, Size::new(100.0, 100.0));
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.items[0].slot, visible.index());
        assert_eq!(plan.bounds(), Some(Rect::new(10.0, 20.0, 15.0, 25.0)));
    }

    #[test]
    fn stroke_widens_bounds() {
        let item = RenderItem {
            slot: 0,
            shape: Shape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            style: Style::stroke(Color::BLACK, 2.0),
            world_transform: Affine::IDENTITY,
            opacity: 1.0,
        };
        assert_eq!(item.world_bounds(), Some(Rect::new(-1.0, -1.0, 11.0, 11.0)));
    }
}
