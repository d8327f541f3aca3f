// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timed interpolation between two element states.

use kurbo::Affine;

use super::shape::{Shape, Style};
use crate::time::{Duration, HostTime};

/// The animatable state of one element.
#[derive(Clone, Debug, PartialEq)]
pub struct Visual {
    /// Local transform.
    pub transform: Affine,
    /// Local opacity.
    pub opacity: f32,
    /// Geometry.
    pub shape: Shape,
    /// Paint.
    pub style: Style,
}

impl Visual {
    /// Interpolates every property at `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        let a = self.transform.as_coeffs();
        let b = to.transform.as_coeffs();
        let mut coeffs = [0.0; 6];
        for (i, c) in coeffs.iter_mut().enumerate() {
            *c = a[i] + (b[i] - a[i]) * t;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "opacity is stored as f32"
        )]
        let opacity = (f64::from(self.opacity) + (f64::from(to.opacity) - f64::from(self.opacity)) * t) as f32;
        Self {
            transform: Affine::new(coeffs),
            opacity,
            shape: self.shape.lerp(&to.shape, t),
            style: self.style.lerp(&to.style, t),
        }
    }
}

/// Cubic ease-in-out.
#[must_use]
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// One running interpolation from `from` to `to`.
#[derive(Clone, Debug)]
pub struct Transition {
    /// State at the start time.
    pub from: Visual,
    /// State at the end time.
    pub to: Visual,
    /// When the transition started.
    pub start: HostTime,
    /// How long it runs.
    pub duration: Duration,
}

impl Transition {
    /// Creates a transition starting at `start`.
    #[must_use]
    pub fn new(from: Visual, to: Visual, start: HostTime, duration: Duration) -> Self {
        Self {
            from,
            to,
            start,
            duration,
        }
    }

    /// Returns the eased state at `now` and whether the transition is over.
    #[must_use]
    pub fn sample(&self, now: HostTime) -> (Visual, bool) {
        let progress = self.duration.progress(self.start, now);
        if progress >= 1.0 {
            (self.to.clone(), true)
        } else {
            (self.from.lerp(&self.to, ease_cubic_in_out(progress)), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Vec2};

    use super::*;

    fn dot(at: Point, opacity: f32) -> Visual {
        Visual {
            transform: Affine::translate(at.to_vec2()),
            opacity,
            shape: Shape::Circle {
                center: Point::ZERO,
                radius: 4.0,
            },
            style: Style::default(),
        }
    }

    #[test]
    fn easing_endpoints_and_midpoint() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert_eq!(ease_cubic_in_out(2.0), 1.0, "clamped");
        assert!(ease_cubic_in_out(0.25) < 0.25, "slow start");
    }

    #[test]
    fn sample_interpolates_then_finishes() {
        let tr = Transition::new(
            dot(Point::ZERO, 0.0),
            dot(Point::new(100.0, 0.0), 1.0),
            HostTime::from_millis(1000),
            Duration::from_millis(200),
        );
        let (mid, done) = tr.sample(HostTime::from_millis(1100));
        assert!(!done);
        assert_eq!(mid.transform.translation(), Vec2::new(50.0, 0.0));
        assert!((mid.opacity - 0.5).abs() < 1e-6);

        let (end, done) = tr.sample(HostTime::from_millis(1200));
        assert!(done, "finished exactly at start + duration");
        assert_eq!(end, tr.to);
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let tr = Transition::new(
            dot(Point::ZERO, 0.0),
            dot(Point::new(1.0, 1.0), 1.0),
            HostTime::from_millis(5),
            Duration::ZERO,
        );
        let (v, done) = tr.sample(HostTime::from_millis(5));
        assert!(done);
        assert_eq!(v.opacity, 1.0);
    }
}
