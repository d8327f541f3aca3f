// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.

use std::collections::BTreeSet;

use genoviz_core::scene::{SceneChanges, SceneStore, Shape};
use kurbo::Rect;

/// A region of the surface that needs re-rendering.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire surface needs redrawing.
    #[default]
    Full,
    /// Axis-aligned rectangles in surface coordinates.
    Rects(Vec<Rect>),
    /// Nothing changed.
    None,
}

impl DamageRegion {
    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = Self::Rects(merged);
            }
        }
    }

    /// Returns the bounding box of the damage, if it is rect-based.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
            _ => None,
        }
    }
}

/// Remembers each element's last painted bounds so a change damages both
/// where the element was and where it is now.
#[derive(Clone, Debug, Default)]
pub struct DamageTracker {
    painted: Vec<Option<Rect>>,
}

impl DamageTracker {
    /// Creates a tracker with nothing painted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the damage for one evaluated change set.
    ///
    /// Text has no known extent, so any change touching text damages the
    /// whole surface, as does a traversal-order rebuild (paint order may
    /// have changed).
    pub fn track(&mut self, store: &SceneStore, changes: &SceneChanges) -> DamageRegion {
        let mut full = changes.topology_changed;
        let mut rects = Vec::new();

        for &slot in &changes.removed {
            if let Some(Some(old)) = self.painted.get_mut(slot as usize).map(Option::take) {
                rects.push(old);
            }
        }

        let touched: BTreeSet<u32> = changes
            .transforms
            .iter()
            .chain(&changes.opacities)
            .chain(&changes.shapes)
            .chain(&changes.styles)
            .chain(&changes.hidden)
            .chain(&changes.unhidden)
            .chain(&changes.added)
            .copied()
            .collect();
        for slot in touched {
            if changes.removed.contains(&slot) && !changes.added.contains(&slot) {
                continue;
            }
            let idx = slot as usize;
            if idx >= self.painted.len() {
                self.painted.resize(idx + 1, None);
            }
            if let Some(old) = self.painted[idx].take() {
                rects.push(old);
            }
            let now = Self::painted_bounds(store, slot);
            if matches!(store.shape_at(slot), Shape::Text { .. }) {
                full = true;
            }
            if let Some(r) = now {
                rects.push(r);
            }
            self.painted[idx] = now;
        }

        if full {
            DamageRegion::Full
        } else if rects.is_empty() {
            DamageRegion::None
        } else {
            DamageRegion::Rects(rects)
        }
    }

    fn painted_bounds(store: &SceneStore, slot: u32) -> Option<Rect> {
        if store.effective_hidden_at(slot) || store.effective_opacity_at(slot) <= 0.0 {
            return None;
        }
        let style = store.style_at(slot);
        let pad = style.stroke.map_or(0.0, |_| style.stroke_width / 2.0);
        let local = store.shape_at(slot).bounds()?;
        Some(
            store
                .world_transform_at(slot)
                .transform_rect_bbox(local.inflate(pad, pad)),
        )
    }
}

#[cfg(test)]
mod tests {
    use genoviz_core::scene::Style;
    use kurbo::Affine;

    use super::*;

    #[test]
    fn merge_semantics() {
        let mut d = DamageRegion::None;
        d.merge(&DamageRegion::Rects(vec![Rect::new(0.0, 0.0, 1.0, 1.0)]));
        d.merge(&DamageRegion::Rects(vec![Rect::new(2.0, 2.0, 3.0, 3.0)]));
        assert_eq!(d.bounds(), Some(Rect::new(0.0, 0.0, 3.0, 3.0)));
        d.merge(&DamageRegion::Full);
        assert_eq!(d, DamageRegion::Full);
        assert!(!d.is_empty());
    }

    #[test]
    fn moving_an_element_damages_old_and_new_bounds() {
        let mut store = SceneStore::new();
        let root = store.create_element();
        let dot = store.create_child(
            root,
            Shape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Style::default(),
        );
        let mut tracker = DamageTracker::new();
        let first = store.evaluate();
        assert_eq!(tracker.track(&store, &first), DamageRegion::Full, "new tree");

        store.set_transform(dot, Affine::translate((100.0, 0.0)));
        let moved = store.evaluate();
        let damage = tracker.track(&store, &moved);
        assert_eq!(
            damage,
            DamageRegion::Rects(vec![
                Rect::new(0.0, 0.0, 10.0, 10.0),
                Rect::new(100.0, 0.0, 110.0, 10.0),
            ])
        );

        let idle = store.evaluate();
        assert!(tracker.track(&store, &idle).is_empty());
    }
}
