// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-dimensional interval index with containment-first queries.

use kurbo::Point;

use super::HitTester;

/// A bar's horizontal extent in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    /// Left edge.
    pub start: f64,
    /// Right edge.
    pub end: f64,
    /// Series the bar belongs to.
    pub series_index: usize,
    /// Index of the datum within its series.
    pub data_index: usize,
}

impl Interval {
    /// Creates an interval in series 0.
    #[must_use]
    pub const fn new(start: f64, end: f64, data_index: usize) -> Self {
        Self {
            start,
            end,
            series_index: 0,
            data_index,
        }
    }

    /// Returns the interval assigned to `series_index`.
    #[must_use]
    pub const fn in_series(self, series_index: usize) -> Self {
        Self {
            series_index,
            ..self
        }
    }

    /// Returns `end - start`.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    /// Returns whether `x` is within `[start, end]`.
    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        self.start <= x && x <= self.end
    }

    fn hit(&self) -> Hit {
        Hit {
            series_index: self.series_index,
            data_index: self.data_index,
        }
    }
}

/// The datum identified by a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Hit {
    /// Series of the matched interval.
    pub series_index: usize,
    /// Datum index of the matched interval.
    pub data_index: usize,
}

#[derive(Clone, Copy, Debug)]
struct Endpoint {
    x: f64,
    interval: u32,
}

/// Sorted endpoints plus start-ordered intervals.
///
/// Containment is answered from the start-ordered list: a binary search finds
/// the last interval starting at or before the cursor, then a backward walk
/// visits candidates while the running maximum of `end` still reaches the
/// cursor. The nearest-endpoint fallback uses the flat endpoint array.
#[derive(Clone, Debug, Default)]
pub struct IntervalIndex {
    intervals: Vec<Interval>,
    max_end: Vec<f64>,
    endpoints: Vec<Endpoint>,
}

impl IntervalIndex {
    /// Builds an index. Reversed intervals are normalized and non-finite ones
    /// are dropped.
    #[must_use]
    pub fn build(intervals: impl IntoIterator<Item = Interval>) -> Self {
        let mut dropped = 0_usize;
        let mut sorted: Vec<Interval> = intervals
            .into_iter()
            .filter_map(|iv| {
                if !(iv.start.is_finite() && iv.end.is_finite()) {
                    dropped += 1;
                    return None;
                }
                Some(if iv.start > iv.end {
                    Interval {
                        start: iv.end,
                        end: iv.start,
                        ..iv
                    }
                } else {
                    iv
                })
            })
            .collect();
        if dropped > 0 {
            tracing::debug!(dropped, "interval index skipped non-finite intervals");
        }
        sorted.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));

        let mut max_end = Vec::with_capacity(sorted.len());
        let mut running = f64::NEG_INFINITY;
        for iv in &sorted {
            running = running.max(iv.end);
            max_end.push(running);
        }

        let mut endpoints = Vec::with_capacity(sorted.len() * 2);
        for (i, iv) in sorted.iter().enumerate() {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "interval counts are far below u32::MAX"
            )]
            let interval = i as u32;
            endpoints.push(Endpoint {
                x: iv.start,
                interval,
            });
            endpoints.push(Endpoint {
                x: iv.end,
                interval,
            });
        }
        endpoints.sort_by(|a, b| a.x.total_cmp(&b.x));

        Self {
            intervals: sorted,
            max_end,
            endpoints,
        }
    }

    /// Returns the number of indexed intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Returns the indexed intervals ordered by start.
    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Returns the endpoint coordinates in ascending order.
    pub fn endpoints(&self) -> impl Iterator<Item = f64> + '_ {
        self.endpoints.iter().map(|e| e.x)
    }

    /// Returns the endpoint paired with the one at `x` for the interval with
    /// `data_index`, if that interval has an endpoint at `x`.
    #[must_use]
    pub fn paired_endpoint(&self, x: f64, data_index: usize) -> Option<f64> {
        let lo = self.endpoints.partition_point(|e| e.x < x);
        self.endpoints[lo..]
            .iter()
            .take_while(|e| e.x == x)
            .map(|e| &self.intervals[e.interval as usize])
            .find(|iv| iv.data_index == data_index)
            .map(|iv| if iv.start == x { iv.end } else { iv.start })
    }

    /// Visits the intervals containing `x`, greatest start first.
    fn containing(&self, x: f64) -> impl Iterator<Item = &Interval> + '_ {
        let upper = self.intervals.partition_point(|iv| iv.start <= x);
        (0..upper)
            .rev()
            .take_while(move |&i| self.max_end[i] >= x)
            .map(|i| &self.intervals[i])
            .filter(move |iv| iv.end >= x)
    }

    fn nearest_endpoint(&self, x: f64, buffer: f64) -> Option<Hit> {
        let right = self.endpoints.partition_point(|e| e.x < x);
        let left = right.checked_sub(1).map(|i| self.endpoints[i]);
        let right = self.endpoints.get(right).copied();
        let closest = match (left, right) {
            (Some(l), Some(r)) => {
                if (r.x - x).abs() < (x - l.x).abs() {
                    r
                } else {
                    l
                }
            }
            (Some(e), None) | (None, Some(e)) => e,
            (None, None) => return None,
        };
        ((closest.x - x).abs() <= buffer).then(|| self.intervals[closest.interval as usize].hit())
    }

    /// Returns the datum under `x`.
    ///
    /// An interval containing `x` always wins (the one starting last when
    /// several overlap). Otherwise the closer of the two endpoints around `x`
    /// is accepted if it is within `buffer` pixels.
    #[must_use]
    pub fn query(&self, x: f64, buffer: f64) -> Option<Hit> {
        if !x.is_finite() {
            return None;
        }
        if let Some(iv) = self.containing(x).next() {
            return Some(iv.hit());
        }
        self.nearest_endpoint(x, buffer)
    }

    /// Like [`query`](Self::query), but among containing intervals the
    /// shortest wins so narrow features stay reachable in dense tracks.
    #[must_use]
    pub fn query_smallest(&self, x: f64, buffer: f64) -> Option<Hit> {
        if !x.is_finite() {
            return None;
        }
        let mut best: Option<&Interval> = None;
        for iv in self.containing(x) {
            if best.is_none_or(|b| iv.width() < b.width()) {
                best = Some(iv);
            }
        }
        match best {
            Some(iv) => Some(iv.hit()),
            None => self.nearest_endpoint(x, buffer),
        }
    }

    /// Returns a [`HitTester`] view using the given buffer and policy.
    #[must_use]
    pub fn probe(&self, buffer: f64, policy: HitPolicy) -> IntervalProbe<'_> {
        IntervalProbe {
            index: self,
            buffer,
            policy,
        }
    }
}

/// How overlapping containing intervals are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HitPolicy {
    /// The interval starting last wins.
    #[default]
    Nearest,
    /// The shortest interval wins.
    SmallestContaining,
}

/// An [`IntervalIndex`] bound to a buffer and policy, hit-testing on the x
/// coordinate only.
#[derive(Clone, Copy, Debug)]
pub struct IntervalProbe<'a> {
    index: &'a IntervalIndex,
    buffer: f64,
    policy: HitPolicy,
}

impl HitTester for IntervalProbe<'_> {
    type Target = Hit;

    fn hit(&self, pos: Point) -> Option<Hit> {
        match self.policy {
            HitPolicy::Nearest => self.index.query(pos.x, self.buffer),
            HitPolicy::SmallestContaining => self.index.query_smallest(pos.x, self.buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bars() -> IntervalIndex {
        IntervalIndex::build([Interval::new(0.0, 100.0, 0), Interval::new(100.0, 250.0, 1)])
    }

    fn data(hit: Option<Hit>) -> Option<usize> {
        hit.map(|h| h.data_index)
    }

    #[test]
    fn adjacent_bars_scenario() {
        let index = two_bars();
        assert_eq!(data(index.query(102.0, 5.0)), Some(1), "containment");
        assert_eq!(data(index.query(-2.0, 5.0)), Some(0), "within buffer of left edge");
        assert_eq!(data(index.query(-10.0, 5.0)), None, "dead space");
    }

    #[test]
    fn containment_wins_over_closer_endpoint() {
        // The narrow bar's right edge (50) is closer to 70 than the wide
        // bar's edges, but 70 lies inside the wide bar.
        let index = IntervalIndex::build([
            Interval::new(0.0, 200.0, 0),
            Interval::new(40.0, 50.0, 1),
            Interval::new(150.0, 160.0, 2),
        ]);
        assert_eq!(data(index.query(70.0, 0.0)), Some(0));
        assert_eq!(data(index.query(45.0, 0.0)), Some(1), "latest start wins");
    }

    #[test]
    fn every_contained_point_hits_with_zero_buffer() {
        let bars = [
            Interval::new(0.0, 10.0, 0),
            Interval::new(20.0, 35.0, 1),
            Interval::new(35.5, 90.0, 2),
            Interval::new(120.0, 121.0, 3),
        ];
        let index = IntervalIndex::build(bars);
        for bar in bars {
            let steps = 16;
            for k in 0..=steps {
                let x = bar.start + bar.width() * f64::from(k) / f64::from(steps);
                assert_eq!(
                    data(index.query(x, 0.0)),
                    Some(bar.data_index),
                    "x = {x} inside {bar:?}"
                );
            }
        }
    }

    #[test]
    fn buffer_boundary_is_inclusive() {
        let index = IntervalIndex::build([Interval::new(10.0, 20.0, 7)]);
        assert_eq!(data(index.query(25.0, 5.0)), Some(7), "exactly at buffer");
        assert_eq!(data(index.query(5.0, 5.0)), Some(7), "exactly at buffer, left side");
        assert_eq!(data(index.query(25.5, 5.0)), None, "beyond buffer");
    }

    #[test]
    fn smallest_containing_variant() {
        let index = IntervalIndex::build([
            Interval::new(0.0, 1000.0, 0),
            Interval::new(400.0, 420.0, 1),
            Interval::new(380.0, 600.0, 2),
        ]);
        assert_eq!(data(index.query_smallest(410.0, 0.0)), Some(1));
        assert_eq!(data(index.query(410.0, 0.0)), Some(1), "also latest start here");
        assert_eq!(data(index.query_smallest(500.0, 0.0)), Some(2));
        assert_eq!(data(index.query(390.0, 0.0)), Some(2));
        assert_eq!(data(index.query_smallest(1003.0, 5.0)), Some(0), "fallback");
    }

    #[test]
    fn build_normalizes_input() {
        let index = IntervalIndex::build([
            Interval::new(50.0, 10.0, 0),
            Interval::new(f64::NAN, 3.0, 1),
        ]);
        assert_eq!(index.len(), 1, "non-finite interval dropped");
        assert_eq!(index.intervals()[0].start, 10.0, "reversed interval swapped");
        let xs: Vec<f64> = index.endpoints().collect();
        assert_eq!(xs, vec![10.0, 50.0]);
        assert_eq!(index.paired_endpoint(10.0, 0), Some(50.0));
        assert_eq!(index.paired_endpoint(11.0, 0), None);
    }

    #[test]
    fn empty_index_and_non_finite_cursor() {
        let empty = IntervalIndex::build(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.query(0.0, 100.0), None);
        assert_eq!(two_bars().query(f64::NAN, 5.0), None);
    }

    #[test]
    fn series_index_is_reported() {
        let index = IntervalIndex::build([Interval::new(0.0, 5.0, 3).in_series(2)]);
        assert_eq!(
            index.query(1.0, 0.0),
            Some(Hit {
                series_index: 2,
                data_index: 3
            })
        );
    }

    #[test]
    fn probe_uses_policy() {
        let index = IntervalIndex::build([Interval::new(0.0, 100.0, 0), Interval::new(10.0, 20.0, 1)]);
        let nearest = index.probe(0.0, HitPolicy::Nearest);
        let smallest = index.probe(0.0, HitPolicy::SmallestContaining);
        assert_eq!(nearest.hit(Point::new(15.0, 999.0)).map(|h| h.data_index), Some(1));
        assert_eq!(smallest.hit(Point::new(15.0, 0.0)).map(|h| h.data_index), Some(1));
        assert_eq!(nearest.hit(Point::new(50.0, 0.0)).map(|h| h.data_index), Some(0));
    }
}
