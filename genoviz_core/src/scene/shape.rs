// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element geometry and paint.

use kurbo::{Affine, BezPath, Line, PathEl, Point, Rect};

use crate::color::Color;

/// The geometry of an element, in its local coordinate space.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Shape {
    /// A container with no geometry of its own.
    #[default]
    Group,
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A circle.
    Circle {
        /// Center.
        center: Point,
        /// Radius.
        radius: f64,
    },
    /// A straight segment.
    Line(Line),
    /// An arbitrary Bézier path.
    Path(BezPath),
    /// A run of text anchored at `origin`.
    Text {
        /// Anchor point; see [`Style::text_anchor`].
        origin: Point,
        /// The text.
        content: String,
    },
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_point(a: Point, b: Point, t: f64) -> Point {
    a.lerp(b, t)
}

fn map_path(path: &BezPath, mut f: impl FnMut(Point) -> Point) -> BezPath {
    path.elements()
        .iter()
        .map(|el| match *el {
            PathEl::MoveTo(p) => PathEl::MoveTo(f(p)),
            PathEl::LineTo(p) => PathEl::LineTo(f(p)),
            PathEl::QuadTo(p1, p2) => PathEl::QuadTo(f(p1), f(p2)),
            PathEl::CurveTo(p1, p2, p3) => PathEl::CurveTo(f(p1), f(p2), f(p3)),
            PathEl::ClosePath => PathEl::ClosePath,
        })
        .collect()
}

fn lerp_path(a: &BezPath, b: &BezPath, t: f64) -> Option<BezPath> {
    let (ea, eb) = (a.elements(), b.elements());
    if ea.len() != eb.len() {
        return None;
    }
    ea.iter()
        .zip(eb)
        .map(|(x, y)| match (*x, *y) {
            (PathEl::MoveTo(p), PathEl::MoveTo(q)) => Some(PathEl::MoveTo(lerp_point(p, q, t))),
            (PathEl::LineTo(p), PathEl::LineTo(q)) => Some(PathEl::LineTo(lerp_point(p, q, t))),
            (PathEl::QuadTo(p1, p2), PathEl::QuadTo(q1, q2)) => Some(PathEl::QuadTo(
                lerp_point(p1, q1, t),
                lerp_point(p2, q2, t),
            )),
            (PathEl::CurveTo(p1, p2, p3), PathEl::CurveTo(q1, q2, q3)) => Some(PathEl::CurveTo(
                lerp_point(p1, q1, t),
                lerp_point(p2, q2, t),
                lerp_point(p3, q3, t),
            )),
            (PathEl::ClosePath, PathEl::ClosePath) => Some(PathEl::ClosePath),
            _ => None,
        })
        .collect()
}

impl Shape {
    /// Interpolates between two shapes.
    ///
    /// Shapes of the same kind (and paths with matching element verbs)
    /// interpolate point-wise; anything else snaps to `to` once `t` reaches
    /// 1.
    #[must_use]
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        match (self, to) {
            (Self::Rect(a), Self::Rect(b)) => Self::Rect(Rect::new(
                lerp(a.x0, b.x0, t),
                lerp(a.y0, b.y0, t),
                lerp(a.x1, b.x1, t),
                lerp(a.y1, b.y1, t),
            )),
            (
                Self::Circle {
                    center: c0,
                    radius: r0,
                },
                Self::Circle {
                    center: c1,
                    radius: r1,
                },
            ) => Self::Circle {
                center: lerp_point(*c0, *c1, t),
                radius: lerp(*r0, *r1, t),
            },
            (Self::Line(a), Self::Line(b)) => Self::Line(Line::new(
                lerp_point(a.p0, b.p0, t),
                lerp_point(a.p1, b.p1, t),
            )),
            (Self::Path(a), Self::Path(b)) => match lerp_path(a, b, t) {
                Some(p) => Self::Path(p),
                None => Self::snap(self, to, t),
            },
            (Self::Text { origin: o0, .. }, Self::Text { origin: o1, content }) => Self::Text {
                origin: lerp_point(*o0, *o1, t),
                content: content.clone(),
            },
            _ => Self::snap(self, to, t),
        }
    }

    fn snap(from: &Self, to: &Self, t: f64) -> Self {
        if t >= 1.0 { to.clone() } else { from.clone() }
    }

    /// Returns the shape shrunk onto `anchor`: zero-size rects and circles,
    /// and lines and paths with every point moved to `anchor`.
    #[must_use]
    pub fn collapsed_at(&self, anchor: Point) -> Self {
        match self {
            Self::Group => Self::Group,
            Self::Rect(_) => Self::Rect(Rect::from_points(anchor, anchor)),
            Self::Circle { .. } => Self::Circle {
                center: anchor,
                radius: 0.0,
            },
            Self::Line(_) => Self::Line(Line::new(anchor, anchor)),
            Self::Path(p) => Self::Path(map_path(p, |_| anchor)),
            Self::Text { content, .. } => Self::Text {
                origin: anchor,
                content: content.clone(),
            },
        }
    }

    /// Returns the bounding box in local coordinates, or `None` for groups
    /// and text (whose extent depends on font metrics).
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        use kurbo::Shape as _;
        match self {
            Self::Group | Self::Text { .. } => None,
            Self::Rect(r) => Some(*r),
            Self::Circle { center, radius } => Some(Rect::from_center_size(
                *center,
                (radius * 2.0, radius * 2.0),
            )),
            Self::Line(l) => Some(Rect::from_points(l.p0, l.p1)),
            Self::Path(p) => Some(p.bounding_box()),
        }
    }

    /// Returns the shape with every point mapped through `affine`.
    ///
    /// Rects and circles stay axis-aligned, so only translation and scale
    /// are meaningful for them.
    #[must_use]
    pub fn transformed(&self, affine: Affine) -> Self {
        match self {
            Self::Group => Self::Group,
            Self::Rect(r) => Self::Rect(affine.transform_rect_bbox(*r)),
            Self::Circle { center, radius } => Self::Circle {
                center: affine * *center,
                radius: radius * affine.as_coeffs()[0].hypot(affine.as_coeffs()[1]),
            },
            Self::Line(l) => Self::Line(Line::new(affine * l.p0, affine * l.p1)),
            Self::Path(p) => Self::Path(affine * p.clone()),
            Self::Text { origin, content } => Self::Text {
                origin: affine * *origin,
                content: content.clone(),
            },
        }
    }
}

/// Horizontal alignment of text relative to its origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    /// Text starts at the origin.
    #[default]
    Start,
    /// Text is centered on the origin.
    Middle,
    /// Text ends at the origin.
    End,
}

impl TextAnchor {
    /// Returns the SVG `text-anchor` keyword.
    #[must_use]
    pub const fn as_svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Paint and text properties.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    /// Fill color; `None` paints nothing.
    pub fill: Option<Color>,
    /// Stroke color; `None` paints nothing.
    pub stroke: Option<Color>,
    /// Stroke width in local units.
    pub stroke_width: f64,
    /// Font size for text, in pixels.
    pub font_size: f64,
    /// Text alignment.
    pub text_anchor: TextAnchor,
    /// Whether text is drawn vertically centered on its origin instead of
    /// sitting on it.
    pub middle_baseline: bool,
    /// Rotation of text about its origin, in degrees.
    pub text_rotation: f64,
    /// Presentation class name for host styling.
    pub class: Option<String>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some(Color::BLACK),
            stroke: None,
            stroke_width: 1.0,
            font_size: 12.0,
            text_anchor: TextAnchor::Start,
            middle_baseline: false,
            text_rotation: 0.0,
            class: None,
        }
    }
}

impl Style {
    /// A filled style without stroke.
    #[must_use]
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    /// A stroked style without fill.
    #[must_use]
    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(color),
            stroke_width: width,
            ..Self::default()
        }
    }

    /// Returns the style with `class` set.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Interpolates colors and widths; discrete properties take `to`'s value.
    #[must_use]
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        let paint = |a: Option<Color>, b: Option<Color>| match (a, b) {
            (Some(a), Some(b)) => Some(a.lerp(b, t)),
            _ => b,
        };
        Self {
            fill: paint(self.fill, to.fill),
            stroke: paint(self.stroke, to.stroke),
            stroke_width: lerp(self.stroke_width, to.stroke_width, t),
            font_size: lerp(self.font_size, to.font_size, t),
            text_rotation: lerp(self.text_rotation, to.text_rotation, t),
            ..to.clone()
        }
    }
}
