// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial indexes for pointer hit-testing.
//!
//! Indexes are built from final, untransformed geometry after a scene update
//! and are read-only while answering pointer events. Every query is
//! `O(log n)` plus the number of overlapping candidates.
//!
//! - [`IntervalIndex`]: 1D bars (histograms, genome tracks).
//! - [`GridIndex`]: uniform cell grids (heatmaps).
//! - [`PointIndex`]: scattered points with a pick radius (tree nodes).
//!
//! [`HitTester`] is the seam the
//! [`InteractionController`](crate::interaction::InteractionController)
//! queries through.

mod grid;
mod interval;
mod point;

pub use grid::{GridCell, GridIndex};
pub use interval::{Hit, HitPolicy, Interval, IntervalIndex, IntervalProbe};
pub use point::PointIndex;

use kurbo::Point;

/// Resolves a pointer position (in untransformed scene space) to a target.
pub trait HitTester {
    /// The identity of whatever can be hit.
    type Target: Copy + PartialEq + core::fmt::Debug;

    /// Returns the target under `pos`, if any.
    fn hit(&self, pos: Point) -> Option<Self::Target>;
}
