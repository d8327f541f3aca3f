// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! PNG export through a small software rasterizer.
//!
//! Coverage is sampled once per pixel center (no anti-aliasing). Rects,
//! circles, lines and paths are filled and stroked; text needs font
//! metrics and is skipped.

use std::io::Cursor;

use genoviz_core::color::Color;
use genoviz_core::scene::{SceneStore, Shape};
use image::{ImageFormat, Rgba, RgbaImage};
use kurbo::{PathEl, Point, Rect, Size};

use crate::plan::{RenderItem, RenderPlan};

/// Errors from raster export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The surface has no pixels.
    #[error("cannot rasterize an empty {0:?} surface")]
    EmptySurface(Size),
    /// PNG encoding failed.
    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Rasterizes `plan` over a solid `background`.
pub fn rasterize(plan: &RenderPlan, background: Color) -> Result<RgbaImage, ExportError> {
    let size = plan.size;
    if !(size.width >= 1.0 && size.height >= 1.0) {
        return Err(ExportError::EmptySurface(size));
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "surface sizes are far below u32::MAX"
    )]
    let (width, height) = (size.width.ceil() as u32, size.height.ceil() as u32);
    let mut img = RgbaImage::from_pixel(
        width,
        height,
        Rgba([background.r, background.g, background.b, background.a]),
    );
    let mut skipped_text = 0_usize;
    for item in &plan.items {
        if matches!(item.shape, Shape::Text { .. }) {
            skipped_text += 1;
            continue;
        }
        draw_item(&mut img, item);
    }
    if skipped_text > 0 {
        tracing::debug!(skipped_text, "text is not rasterized");
    }
    Ok(img)
}

/// Encodes an image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Rasterizes an evaluated store and encodes it as PNG.
pub fn export_png(store: &SceneStore, size: Size, background: Color) -> Result<Vec<u8>, ExportError> {
    let plan = RenderPlan::build(store, size);
    encode_png(&rasterize(&plan, background)?)
}

/// Flattened world-space geometry for one item.
enum Geometry {
    Rect(Rect),
    Circle { center: Point, radius: f64 },
    Polylines(Vec<(Vec<Point>, bool)>),
}

fn draw_item(img: &mut RgbaImage, item: &RenderItem) {
    let world = item.world_transform;
    let geometry = match &item.shape {
        Shape::Group | Shape::Text { .. } => return,
        Shape::Rect(r) => Geometry::Rect(world.transform_rect_bbox(*r)),
        Shape::Circle { center, radius } => {
            let [a, b, ..] = world.as_coeffs();
            Geometry::Circle {
                center: world * *center,
                radius: radius * a.hypot(b),
            }
        }
        Shape::Line(l) => Geometry::Polylines(vec![(vec![world * l.p0, world * l.p1], false)]),
        Shape::Path(p) => Geometry::Polylines(flatten(&(world * p.clone()))),
    };

    let fill = item.style.fill.filter(|_| !matches!(item.shape, Shape::Line(_)));
    if let Some(color) = fill {
        let (bbox, inside): (Rect, Box<dyn Fn(Point) -> bool + '_>) = match &geometry {
            Geometry::Rect(r) => (*r, Box::new(move |p: Point| r.contains(p))),
            Geometry::Circle { center, radius } => (
                Rect::from_center_size(*center, (radius * 2.0, radius * 2.0)),
                Box::new(move |p: Point| p.distance(*center) <= *radius),
            ),
            Geometry::Polylines(lines) => (
                polyline_bounds(lines),
                Box::new(move |p: Point| winding(lines, p) != 0),
            ),
        };
        paint(img, bbox, color, item.opacity, inside);
    }

    if let Some(color) = item.style.stroke {
        let half = item.style.stroke_width / 2.0;
        if half <= 0.0 {
            return;
        }
        let (bbox, on_stroke): (Rect, Box<dyn Fn(Point) -> bool + '_>) = match &geometry {
            Geometry::Rect(r) => {
                let corners = vec![
                    Point::new(r.x0, r.y0),
                    Point::new(r.x1, r.y0),
                    Point::new(r.x1, r.y1),
                    Point::new(r.x0, r.y1),
                ];
                let outline = vec![(corners, true)];
                (
                    r.inflate(half, half),
                    Box::new(move |p: Point| near_polylines(&outline, p, half)),
                )
            }
            Geometry::Circle { center, radius } => (
                Rect::from_center_size(*center, ((radius + half) * 2.0, (radius + half) * 2.0)),
                Box::new(move |p: Point| (p.distance(*center) - radius).abs() <= half),
            ),
            Geometry::Polylines(lines) => (
                polyline_bounds(lines).inflate(half, half),
                Box::new(move |p: Point| near_polylines(lines, p, half)),
            ),
        };
        paint(img, bbox, color, item.opacity, on_stroke);
    }
}

fn flatten(path: &kurbo::BezPath) -> Vec<(Vec<Point>, bool)> {
    let mut lines: Vec<(Vec<Point>, bool)> = Vec::new();
    kurbo::flatten(path.iter(), 0.25, |el| match el {
        PathEl::MoveTo(p) => lines.push((vec![p], false)),
        PathEl::LineTo(p) => match lines.last_mut() {
            Some((pts, _)) => pts.push(p),
            None => lines.push((vec![p], false)),
        },
        PathEl::ClosePath => {
            if let Some((_, closed)) = lines.last_mut() {
                *closed = true;
            }
        }
        // `flatten` only emits the three variants above.
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });
    lines
}

fn polyline_bounds(lines: &[(Vec<Point>, bool)]) -> Rect {
    lines
        .iter()
        .flat_map(|(pts, _)| pts.iter())
        .fold(None, |acc: Option<Rect>, p| {
            Some(acc.map_or_else(|| Rect::from_points(*p, *p), |r| r.union_pt(*p)))
        })
        .unwrap_or(Rect::ZERO)
}

fn edges(lines: &[(Vec<Point>, bool)], close_all: bool) -> impl Iterator<Item = (Point, Point)> + '_ {
    lines.iter().flat_map(move |(pts, closed)| {
        let closing = (close_all || *closed) && pts.len() > 2;
        let wrap = closing.then(|| (pts[pts.len() - 1], pts[0]));
        pts.windows(2).map(|w| (w[0], w[1])).chain(wrap)
    })
}

/// Nonzero winding number of `p`; every subpath is treated as closed.
fn winding(lines: &[(Vec<Point>, bool)], p: Point) -> i32 {
    let mut w = 0;
    for (a, b) in edges(lines, true) {
        let cross = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
        if a.y <= p.y {
            if b.y > p.y && cross > 0.0 {
                w += 1;
            }
        } else if b.y <= p.y && cross < 0.0 {
            w -= 1;
        }
    }
    w
}

fn near_polylines(lines: &[(Vec<Point>, bool)], p: Point, half: f64) -> bool {
    edges(lines, false).any(|(a, b)| segment_distance(p, a, b) <= half)
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn paint(img: &mut RgbaImage, bbox: Rect, color: Color, opacity: f32, covered: Box<dyn Fn(Point) -> bool + '_>) {
    let alpha = color.alpha_f32() * opacity;
    if alpha <= 0.0 {
        return;
    }
    let (w, h) = img.dimensions();
    let clip = bbox.intersect(Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));
    if clip.is_zero_area() {
        return;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "clip is inside the image bounds"
    )]
    let (x0, y0, x1, y1) = (
        clip.x0.floor() as u32,
        clip.y0.floor() as u32,
        (clip.x1.ceil() as u32).min(w),
        (clip.y1.ceil() as u32).min(h),
    );
    for y in y0..y1 {
        for x in x0..x1 {
            let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if covered(center) {
                blend(img.get_pixel_mut(x, y), color, alpha);
            }
        }
    }
}

fn blend(dst: &mut Rgba<u8>, src: Color, alpha: f32) {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |s: u8, d: u8| {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "value is a convex combination of two u8 channels"
        )]
        let v = (f32::from(s) * a + f32::from(d) * (1.0 - a)).round() as u8;
        v
    };
    let Rgba([r, g, b, da]) = *dst;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "alpha stays within [0, 255]"
    )]
    let out_a = (255.0 * a + f32::from(da) * (1.0 - a)).round() as u8;
    *dst = Rgba([mix(src.r, r), mix(src.g, g), mix(src.b, b), out_a]);
}
