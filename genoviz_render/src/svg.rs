// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Standalone SVG serialization of an evaluated scene.
//!
//! [`SvgDocument`] is a headless [`Presenter`]: it caches one markup
//! fragment per element and re-renders only the elements named in each
//! [`SceneChanges`]. Elements are written flat, in paint order, with their
//! world transform and effective opacity baked in.

use core::fmt::Write as _;
use std::collections::BTreeSet;

use genoviz_core::backend::Presenter;
use genoviz_core::color::Color;
use genoviz_core::scene::{SceneChanges, SceneStore, Shape, Style};
use kurbo::{Affine, Size};

/// Height reserved below the chart for a caption line.
const CAPTION_HEIGHT: f64 = 20.0;

/// An SVG document mirroring a scene.
#[derive(Clone, Debug, Default)]
pub struct SvgDocument {
    size: Size,
    caption: Option<String>,
    background: Option<Color>,
    fragments: Vec<Option<String>>,
    order: Vec<u32>,
}

impl SvgDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Builds a document from every visible element of an evaluated store.
    #[must_use]
    pub fn snapshot(store: &SceneStore, size: Size) -> Self {
        let mut doc = Self::new(size);
        doc.order = store.traversal_order().to_vec();
        for &slot in store.traversal_order() {
            doc.refresh(store, slot);
        }
        doc
    }

    /// Sets a caption written below the chart.
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Sets a background fill.
    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Changes the document size.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Returns the cached markup for a slot.
    #[must_use]
    pub fn fragment(&self, slot: u32) -> Option<&str> {
        self.fragments.get(slot as usize)?.as_deref()
    }

    /// Serializes the document.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let height = if self.caption.is_some() {
            self.size.height + CAPTION_HEIGHT
        } else {
            self.size.height
        };
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = num(self.size.width),
            h = num(height),
        );
        if let Some(bg) = self.background {
            let _ = write!(
                out,
                r#"<rect x="0" y="0" width="100%" height="100%" fill="{}"/>"#,
                bg.to_hex()
            );
        }
        for &slot in &self.order {
            if let Some(fragment) = self.fragment(slot) {
                out.push_str(fragment);
            }
        }
        if let Some(caption) = &self.caption {
            let _ = write!(
                out,
                r##"<text x="4" y="{}" font-size="12" fill="#000000">{}</text>"##,
                num(self.size.height + CAPTION_HEIGHT - 5.0),
                escape(caption)
            );
        }
        out.push_str("</svg>");
        out
    }

    fn refresh(&mut self, store: &SceneStore, slot: u32) {
        let idx = slot as usize;
        if idx >= self.fragments.len() {
            self.fragments.resize(idx + 1, None);
        }
        let visible =
            !store.effective_hidden_at(slot) && store.effective_opacity_at(slot) > 0.0;
        self.fragments[idx] = visible
            .then(|| {
                element_markup(
                    store.shape_at(slot),
                    store.style_at(slot),
                    store.world_transform_at(slot),
                    store.effective_opacity_at(slot),
                )
            })
            .flatten();
    }
}

impl Presenter for SvgDocument {
    fn apply(&mut self, store: &SceneStore, changes: &SceneChanges) {
        for &slot in &changes.removed {
            if let Some(f) = self.fragments.get_mut(slot as usize) {
                *f = None;
            }
        }
        if changes.topology_changed {
            self.order = store.traversal_order().to_vec();
        }
        let touched: BTreeSet<u32> = changes
            .added
            .iter()
            .chain(&changes.transforms)
            .chain(&changes.opacities)
            .chain(&changes.shapes)
            .chain(&changes.styles)
            .chain(&changes.hidden)
            .chain(&changes.unhidden)
            .copied()
            .collect();
        for slot in touched {
            if changes.removed.contains(&slot) && !changes.added.contains(&slot) {
                continue;
            }
            self.refresh(store, slot);
        }
    }
}

/// Serializes an evaluated store as a standalone SVG document.
#[must_use]
pub fn export_svg(store: &SceneStore, size: Size, caption: Option<&str>) -> String {
    let mut doc = SvgDocument::snapshot(store, size);
    if let Some(caption) = caption {
        doc = doc.with_caption(caption);
    }
    doc.to_svg()
}

/// Returns the markup for one element, or `None` for groups.
#[must_use]
pub fn element_markup(shape: &Shape, style: &Style, world: Affine, opacity: f32) -> Option<String> {
    let mut out = String::new();
    let paint = paint_attrs(style, opacity);
    match shape {
        Shape::Group => return None,
        Shape::Rect(r) => {
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
                num(r.x0),
                num(r.y0),
                num(r.width()),
                num(r.height()),
                transform_attr(world),
                paint
            );
        }
        Shape::Circle { center, radius } => {
            let _ = write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}"{}{}/>"#,
                num(center.x),
                num(center.y),
                num(*radius),
                transform_attr(world),
                paint
            );
        }
        Shape::Line(l) => {
            let _ = write!(
                out,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{}{}/>"#,
                num(l.p0.x),
                num(l.p0.y),
                num(l.p1.x),
                num(l.p1.y),
                transform_attr(world),
                paint
            );
        }
        Shape::Path(p) => {
            let _ = write!(
                out,
                r#"<path d="{}"{}{}/>"#,
                p.to_svg(),
                transform_attr(world),
                paint
            );
        }
        Shape::Text { origin, content } => {
            let world = if style.text_rotation == 0.0 {
                world
            } else {
                world * Affine::rotate_about(style.text_rotation.to_radians(), *origin)
            };
            let baseline = if style.middle_baseline {
                r#" dominant-baseline="middle""#
            } else {
                ""
            };
            let _ = write!(
                out,
                r#"<text x="{}" y="{}" font-size="{}" text-anchor="{}"{}{}{}>{}</text>"#,
                num(origin.x),
                num(origin.y),
                num(style.font_size),
                style.text_anchor.as_svg(),
                baseline,
                transform_attr(world),
                paint,
                escape(content)
            );
        }
    }
    Some(out)
}

fn paint_attrs(style: &Style, opacity: f32) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#" fill="{}""#,
        style.fill.map_or_else(|| "none".to_owned(), Color::to_hex)
    );
    if let Some(stroke) = style.stroke {
        let _ = write!(
            out,
            r#" stroke="{}" stroke-width="{}""#,
            stroke.to_hex(),
            num(style.stroke_width)
        );
    }
    if opacity < 1.0 {
        let _ = write!(out, r#" opacity="{}""#, num(f64::from(opacity)));
    }
    if let Some(class) = &style.class {
        let _ = write!(out, r#" class="{}""#, escape(class));
    }
    out
}

fn transform_attr(world: Affine) -> String {
    if world == Affine::IDENTITY {
        return String::new();
    }
    let [a, b, c, d, e, f] = world.as_coeffs();
    if a == 1.0 && b == 0.0 && c == 0.0 && d == 1.0 {
        return format!(r#" transform="translate({},{})""#, num(e), num(f));
    }
    format!(
        r#" transform="matrix({},{},{},{},{},{})""#,
        num(a),
        num(b),
        num(c),
        num(d),
        num(e),
        num(f)
    )
}

/// Formats a coordinate with at most three decimals.
fn num(v: f64) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    if r == 0.0 {
        "0".to_owned()
    } else {
        format!("{r}")
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
