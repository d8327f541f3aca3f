// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Point;

use super::HitTester;

/// Scattered points, sorted by x, with a fixed pick radius.
///
/// Targets are caller-supplied ids. Queries scan the x-slab
/// `[x - radius, x + radius]` found by binary search.
#[derive(Clone, Debug)]
pub struct PointIndex<T> {
    points: Vec<(Point, T)>,
    radius: f64,
}

impl<T: Copy + PartialEq + core::fmt::Debug> PointIndex<T> {
    /// Builds an index. Points with non-finite coordinates are skipped.
    #[must_use]
    pub fn build(points: impl IntoIterator<Item = (Point, T)>, radius: f64) -> Self {
        let mut points: Vec<_> = points.into_iter().filter(|(p, _)| p.is_finite()).collect();
        points.sort_by(|a, b| a.0.x.total_cmp(&b.0.x));
        Self {
            points,
            radius: radius.max(0.0),
        }
    }

    /// Returns the number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the target closest to `p` within the pick radius.
    #[must_use]
    pub fn query(&self, p: Point) -> Option<T> {
        if !p.is_finite() {
            return None;
        }
        let lo = self.points.partition_point(|(q, _)| q.x < p.x - self.radius);
        let mut best: Option<(f64, T)> = None;
        for &(q, id) in self.points[lo..]
            .iter()
            .take_while(|(q, _)| q.x <= p.x + self.radius)
        {
            let d = q.distance_squared(p);
            if d <= self.radius * self.radius && best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, id));
            }
        }
        best.map(|(_, id)| id)
    }
}

impl<T: Copy + PartialEq + core::fmt::Debug> HitTester for PointIndex<T> {
    type Target = T;

    fn hit(&self, pos: Point) -> Option<T> {
        self.query(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_within_radius_wins() {
        let index = PointIndex::build(
            [
                (Point::new(0.0, 0.0), 'a'),
                (Point::new(10.0, 0.0), 'b'),
                (Point::new(12.0, 3.0), 'c'),
            ],
            4.0,
        );
        assert_eq!(index.query(Point::new(1.0, 1.0)), Some('a'));
        assert_eq!(index.query(Point::new(11.5, 2.5)), Some('c'));
        assert_eq!(index.query(Point::new(10.0, -4.0)), Some('b'), "radius inclusive");
        assert_eq!(index.query(Point::new(5.0, 0.0)), None, "between points");
    }

    #[test]
    fn non_finite_points_are_skipped() {
        let index = PointIndex::build([(Point::new(f64::NAN, 0.0), 1), (Point::ZERO, 2)], 1.0);
        assert_eq!(index.len(), 1);
        assert_eq!(index.hit(Point::ZERO), Some(2));
        assert_eq!(index.hit(Point::new(f64::INFINITY, 0.0)), None);
    }
}
