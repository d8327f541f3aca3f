// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pan/zoom transform applied to a chart's scene root.
//!
//! The transform maps scene (data-space) coordinates to screen coordinates
//! as `screen = scene × scale + translate`. Hit-indexes stay in scene
//! coordinates; pointer positions go through [`ZoomTransform::invert`]
//! before they are tested.

use kurbo::{Affine, Point, Size, Vec2};

/// Uniform scale followed by a translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
    /// Screen-space offset.
    pub translate: Vec2,
    /// Uniform scale factor; always positive.
    pub scale: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
    };

    /// Creates a transform. Non-positive or non-finite scales become `1`.
    #[must_use]
    pub fn new(translate: Vec2, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self { translate, scale }
    }

    /// Returns the equivalent affine transform.
    #[must_use]
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.translate) * Affine::scale(self.scale)
    }

    /// Maps a scene point to the screen.
    #[must_use]
    pub fn apply(self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.translate.x,
            p.y * self.scale + self.translate.y,
        )
    }

    /// Maps a screen point back into the scene.
    #[must_use]
    pub fn invert(self, p: Point) -> Point {
        Point::new(
            (p.x - self.translate.x) / self.scale,
            (p.y - self.translate.y) / self.scale,
        )
    }

    /// Returns the transform shifted by `delta` screen pixels.
    #[must_use]
    pub fn translated(self, delta: Vec2) -> Self {
        Self {
            translate: self.translate + delta,
            ..self
        }
    }

    /// Multiplies the scale by `factor`, clamped to `[min, max]`, keeping the
    /// scene point under the screen point `anchor` fixed.
    #[must_use]
    pub fn scaled_about(self, anchor: Point, factor: f64, min: f64, max: f64) -> Self {
        let scale = (self.scale * factor).clamp(min, max);
        if !scale.is_finite() || scale <= 0.0 {
            return self;
        }
        let fixed = self.invert(anchor);
        Self {
            translate: anchor.to_vec2() - fixed.to_vec2() * scale,
            scale,
        }
    }

    /// Clamps the translation so scaled `content` (anchored at the scene
    /// origin) cannot be dragged past `viewport` edges.
    ///
    /// Along an axis where the scaled content fits, the translation is 0.
    #[must_use]
    pub fn constrained(self, content: Size, viewport: Size) -> Self {
        let clamp_axis = |t: f64, content: f64, viewport: f64| {
            let scaled = content * self.scale;
            if scaled <= viewport {
                0.0
            } else {
                t.clamp(viewport - scaled, 0.0)
            }
        };
        Self {
            translate: Vec2::new(
                clamp_axis(self.translate.x, content.width, viewport.width),
                clamp_axis(self.translate.y, content.height, viewport.height),
            ),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_and_invert_are_inverse() {
        let z = ZoomTransform::new(Vec2::new(30.0, -10.0), 2.0);
        let p = Point::new(7.0, 3.0);
        assert_eq!(z.apply(p), Point::new(44.0, -4.0));
        assert_eq!(z.invert(z.apply(p)), p);
        assert_eq!(z.to_affine() * p, z.apply(p), "affine agrees");
    }

    #[test]
    fn scaling_keeps_anchor_fixed() {
        let z = ZoomTransform::IDENTITY;
        let anchor = Point::new(100.0, 50.0);
        let zoomed = z.scaled_about(anchor, 2.0, 0.5, 8.0);
        assert_eq!(zoomed.scale, 2.0);
        assert_eq!(zoomed.apply(Point::new(100.0, 50.0)), anchor);
        assert_eq!(zoomed.translate, Vec2::new(-100.0, -50.0));
    }

    #[test]
    fn scale_is_clamped() {
        let z = ZoomTransform::IDENTITY.scaled_about(Point::ZERO, 100.0, 0.5, 8.0);
        assert_eq!(z.scale, 8.0);
        let z = z.scaled_about(Point::ZERO, 0.0001, 0.5, 8.0);
        assert_eq!(z.scale, 0.5);
    }

    #[test]
    fn invalid_scale_falls_back_to_one() {
        assert_eq!(ZoomTransform::new(Vec2::ZERO, 0.0).scale, 1.0);
        assert_eq!(ZoomTransform::new(Vec2::ZERO, f64::NAN).scale, 1.0);
    }

    #[test]
    fn constrained_keeps_content_in_view() {
        let viewport = Size::new(100.0, 100.0);
        let content = Size::new(300.0, 50.0);
        let z = ZoomTransform::new(Vec2::new(-500.0, 20.0), 1.0).constrained(content, viewport);
        assert_eq!(z.translate, Vec2::new(-200.0, 0.0));
        let z = ZoomTransform::new(Vec2::new(40.0, 0.0), 1.0).constrained(content, viewport);
        assert_eq!(z.translate.x, 0.0, "no gap on the left");
    }
}
