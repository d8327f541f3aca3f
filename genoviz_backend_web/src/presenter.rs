// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SVG DOM element management.
//!
//! Translates [`SceneStore`] state into flat SVG elements under a container
//! `<svg>` by applying incremental updates from [`SceneChanges`]. Groups get
//! no DOM node; their transform and opacity are baked into the world
//! values of their descendants.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use genoviz_core::backend::Presenter;
use genoviz_core::color::Color;
use genoviz_core::scene::{SceneChanges, SceneStore, Shape, Style};
use kurbo::Affine;
use web_sys::Element;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Maps a [`SceneStore`] to live SVG elements, applying incremental updates
/// from [`SceneChanges`].
///
/// The presenter owns a container `<svg>` element to which child elements
/// are added and removed. Call [`apply`](Presenter::apply) after each
/// evaluate to synchronize the DOM with the store.
pub struct SvgDomPresenter {
    container: Element,
    elements: Vec<Option<Element>>,
}

impl core::fmt::Debug for SvgDomPresenter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SvgDomPresenter")
            .field("container", &"Element")
            .field("elements_len", &self.elements.len())
            .finish()
    }
}

impl SvgDomPresenter {
    /// Creates a new presenter that manages child elements of `container`,
    /// which should be an `<svg>` element.
    #[must_use]
    pub fn new(container: Element) -> Self {
        Self {
            container,
            elements: Vec::new(),
        }
    }

    /// Returns a reference to the container element.
    #[must_use]
    pub fn container(&self) -> &Element {
        &self.container
    }

    /// Sets the container's `width`, `height` and `viewBox`.
    pub fn set_size(&self, size: kurbo::Size) {
        let (w, h) = (size.width, size.height);
        let _ = self.container.set_attribute("width", &format!("{w}"));
        let _ = self.container.set_attribute("height", &format!("{h}"));
        let _ = self
            .container
            .set_attribute("viewBox", &format!("0 0 {w} {h}"));
    }

    /// Returns the DOM element for the given slot index, if it exists.
    #[must_use]
    pub fn get_element(&self, idx: u32) -> Option<&Element> {
        self.elements
            .get(idx as usize)
            .and_then(|slot| slot.as_ref())
    }

    /// Removes every managed element.
    pub fn clear(&mut self) {
        for el in self.elements.drain(..).flatten() {
            el.remove();
        }
    }

    /// Takes an element out of the slot, leaving `None`.
    fn take_element(&mut self, idx: u32) -> Option<Element> {
        self.elements.get_mut(idx as usize)?.take()
    }

    /// Stores an element at the given slot index, growing the vec if needed.
    fn put_element(&mut self, idx: u32, el: Element) {
        let slot = idx as usize;
        if self.elements.len() <= slot {
            self.elements.resize_with(slot + 1, || None);
        }
        self.elements[slot] = Some(el);
    }

    /// Makes sure slot `idx` has an element of the right kind. Returns
    /// `true` if one was created.
    fn ensure(&mut self, store: &SceneStore, idx: u32) -> bool {
        let Some(tag) = tag_for(store.shape_at(idx)) else {
            if let Some(el) = self.take_element(idx) {
                el.remove();
            }
            return false;
        };
        if self
            .get_element(idx)
            .is_some_and(|el| el.tag_name() == tag)
        {
            return false;
        }
        if let Some(el) = self.take_element(idx) {
            el.remove();
        }
        let Some(doc) = self.container.owner_document() else {
            return false;
        };
        let Ok(el) = doc.create_element_ns(Some(SVG_NS), tag) else {
            return false;
        };
        let _ = self.container.append_child(&el);
        write_all(&el, store, idx);
        self.put_element(idx, el);
        true
    }
}

impl Presenter for SvgDomPresenter {
    /// Applies incremental changes from a [`SceneChanges`] to the DOM.
    fn apply(&mut self, store: &SceneStore, changes: &SceneChanges) {
        // 1. Removals
        for &idx in &changes.removed {
            if let Some(el) = self.take_element(idx) {
                el.remove();
            }
        }

        // 2. Additions, and shape changes that switch element kind
        let mut created = false;
        for &idx in changes.added.iter().chain(&changes.shapes) {
            created |= self.ensure(store, idx);
        }

        // 3. Geometry and paint
        for &idx in &changes.shapes {
            if let Some(el) = self.get_element(idx) {
                write_geometry(el, store.shape_at(idx), store.style_at(idx));
                write_transform(el, store, idx);
            }
        }
        for &idx in &changes.styles {
            if let Some(el) = self.get_element(idx) {
                write_paint(el, store.style_at(idx));
                write_geometry(el, store.shape_at(idx), store.style_at(idx));
                write_transform(el, store, idx);
            }
        }

        // 4. Transforms
        for &idx in &changes.transforms {
            if let Some(el) = self.get_element(idx) {
                write_transform(el, store, idx);
            }
        }

        // 5. Opacities
        for &idx in &changes.opacities {
            if let Some(el) = self.get_element(idx) {
                write_opacity(el, store.effective_opacity_at(idx));
            }
        }

        // 6. Hidden/unhidden
        for &idx in &changes.hidden {
            if let Some(el) = self.get_element(idx) {
                let _ = el.set_attribute("display", "none");
            }
        }
        for &idx in &changes.unhidden {
            if let Some(el) = self.get_element(idx) {
                let _ = el.remove_attribute("display");
            }
        }

        // 7. Paint order
        if changes.topology_changed || created {
            for &idx in store.traversal_order() {
                if let Some(el) = self.get_element(idx) {
                    // Re-appending an existing child moves it to the end.
                    let _ = self.container.append_child(el);
                }
            }
        }
    }
}

/// Returns the SVG tag for `shape`, or `None` for groups.
fn tag_for(shape: &Shape) -> Option<&'static str> {
    match shape {
        Shape::Group => None,
        Shape::Rect(_) => Some("rect"),
        Shape::Circle { .. } => Some("circle"),
        Shape::Line(_) => Some("line"),
        Shape::Path(_) => Some("path"),
        Shape::Text { .. } => Some("text"),
    }
}

fn write_all(el: &Element, store: &SceneStore, idx: u32) {
    let (shape, style) = (store.shape_at(idx), store.style_at(idx));
    write_geometry(el, shape, style);
    write_paint(el, style);
    write_transform(el, store, idx);
    write_opacity(el, store.effective_opacity_at(idx));
    if store.effective_hidden_at(idx) {
        let _ = el.set_attribute("display", "none");
    }
}

fn write_geometry(el: &Element, shape: &Shape, style: &Style) {
    for (name, value) in geometry_attrs(shape, style) {
        let _ = el.set_attribute(name, &value);
    }
    if let Shape::Text { content, .. } = shape {
        el.set_text_content(Some(content));
    }
}

/// Attribute values for `shape`, excluding paint.
fn geometry_attrs(shape: &Shape, style: &Style) -> Vec<(&'static str, String)> {
    match shape {
        Shape::Group => Vec::new(),
        Shape::Rect(r) => alloc::vec![
            ("x", format!("{}", r.x0)),
            ("y", format!("{}", r.y0)),
            ("width", format!("{}", r.width())),
            ("height", format!("{}", r.height())),
        ],
        Shape::Circle { center, radius } => alloc::vec![
            ("cx", format!("{}", center.x)),
            ("cy", format!("{}", center.y)),
            ("r", format!("{radius}")),
        ],
        Shape::Line(l) => alloc::vec![
            ("x1", format!("{}", l.p0.x)),
            ("y1", format!("{}", l.p0.y)),
            ("x2", format!("{}", l.p1.x)),
            ("y2", format!("{}", l.p1.y)),
        ],
        Shape::Path(p) => alloc::vec![("d", p.to_svg())],
        Shape::Text { origin, .. } => alloc::vec![
            ("x", format!("{}", origin.x)),
            ("y", format!("{}", origin.y)),
            ("font-size", format!("{}", style.font_size)),
            ("text-anchor", String::from(style.text_anchor.as_svg())),
            (
                "dominant-baseline",
                String::from(if style.middle_baseline {
                    "middle"
                } else {
                    "auto"
                }),
            ),
        ],
    }
}

fn write_paint(el: &Element, style: &Style) {
    let fill = style.fill.map_or_else(|| String::from("none"), Color::to_hex);
    let _ = el.set_attribute("fill", &fill);
    match style.stroke {
        Some(stroke) => {
            let _ = el.set_attribute("stroke", &stroke.to_hex());
            let _ = el.set_attribute("stroke-width", &format!("{}", style.stroke_width));
        }
        None => {
            let _ = el.remove_attribute("stroke");
            let _ = el.remove_attribute("stroke-width");
        }
    }
    match &style.class {
        Some(class) => {
            let _ = el.set_attribute("class", class);
        }
        None => {
            let _ = el.remove_attribute("class");
        }
    }
}

fn write_transform(el: &Element, store: &SceneStore, idx: u32) {
    let world = text_world(store.shape_at(idx), store.style_at(idx), store.world_transform_at(idx));
    match transform_value(world) {
        Some(value) => {
            let _ = el.set_attribute("transform", &value);
        }
        None => {
            let _ = el.remove_attribute("transform");
        }
    }
}

fn write_opacity(el: &Element, opacity: f32) {
    if opacity < 1.0 {
        let _ = el.set_attribute("opacity", &format!("{opacity}"));
    } else {
        let _ = el.remove_attribute("opacity");
    }
}

/// Folds text rotation about the text origin into the world transform.
fn text_world(shape: &Shape, style: &Style, world: Affine) -> Affine {
    match shape {
        Shape::Text { origin, .. } if style.text_rotation != 0.0 => {
            world * Affine::rotate_about(style.text_rotation.to_radians(), *origin)
        }
        _ => world,
    }
}

/// Returns the SVG `transform` value, or `None` for the identity.
fn transform_value(world: Affine) -> Option<String> {
    if world == Affine::IDENTITY {
        return None;
    }
    let [a, b, c, d, e, f] = world.as_coeffs();
    if a == 1.0 && b == 0.0 && c == 0.0 && d == 1.0 {
        return Some(format!("translate({e},{f})"));
    }
    Some(format!("matrix({a},{b},{c},{d},{e},{f})"))
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect, Vec2};

    use super::*;

    #[test]
    fn groups_get_no_element() {
        assert_eq!(tag_for(&Shape::Group), None);
        assert_eq!(tag_for(&Shape::Rect(Rect::ZERO)), Some("rect"));
    }

    #[test]
    fn translations_use_the_short_form() {
        assert_eq!(transform_value(Affine::IDENTITY), None);
        assert_eq!(
            transform_value(Affine::translate(Vec2::new(20.0, 30.5))).as_deref(),
            Some("translate(20,30.5)")
        );
        assert!(
            transform_value(Affine::scale(2.0))
                .is_some_and(|v| v.starts_with("matrix(2,0,0,2,")),
            "scales fall back to a matrix"
        );
    }

    #[test]
    fn rotated_labels_turn_about_their_origin() {
        let shape = Shape::Text {
            origin: Point::new(10.0, 0.0),
            content: "chr1".into(),
        };
        let style = Style {
            text_rotation: -90.0,
            ..Style::default()
        };
        let world = text_world(&shape, &style, Affine::IDENTITY);
        let moved = world * Point::new(10.0, 0.0);
        assert!((moved - Point::new(10.0, 0.0)).hypot() < 1e-9, "origin is fixed");
    }

    #[test]
    fn text_geometry_carries_font_and_alignment() {
        let style = Style {
            font_size: 8.0,
            middle_baseline: true,
            ..Style::default()
        };
        let text = Shape::Text {
            origin: Point::new(3.0, 4.0),
            content: "Bacteria".into(),
        };
        let attrs = geometry_attrs(&text, &style);
        assert!(attrs.contains(&("font-size", String::from("8"))), "{attrs:?}");
        assert!(attrs.contains(&("dominant-baseline", String::from("middle"))), "{attrs:?}");

        let rect = geometry_attrs(&Shape::Rect(Rect::new(0.0, 0.0, 4.0, 2.0)), &style);
        assert_eq!(rect[2], ("width", String::from("4")));
    }
}
