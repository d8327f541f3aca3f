// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chart engines for genomics data.
//!
//! Four engines share one shape: each owns a [`ChartSurface`] (a retained
//! scene plus its size, clock and trace sink), turns its data and options
//! into keyed element specs, and answers pointer events through an
//! [`InteractionController`](genoviz_core::interaction::InteractionController)
//! over a hit index built from the same geometry.
//!
//! - [`Histogram`]: binned bar chart of one or more series, with reference
//!   lines and linear, log or symlog axes.
//! - [`GenomeTrack`]: coverage bars over genomic ranges with hover
//!   highlight and click outline.
//! - [`TidyTree`]: collapsible taxonomy tree sized by a score attribute.
//! - [`Heatmap`]: clustered matrix with row and column dendrograms.
//!
//! Every engine implements [`Chart`]. Hosts drive it with
//! [`Chart::handle_pointer`] and [`Chart::advance`], then hand
//! [`Chart::changes`] to a presenter.
//!
//! Options are serde structs with camelCase keys. [`Chart::set_options`]
//! takes a JSON merge patch and only redoes the work the touched keys
//! require.

mod axis;
mod callbacks;
mod data;
mod error;
mod genome;
mod heatmap;
mod histogram;
mod options;
mod surface;
mod tidy_tree;

pub use callbacks::{GenomeCallbacks, HeatmapCallbacks, HistogramCallbacks, TreeCallbacks};
pub use data::{
    AxisLabel, HeatmapData, normalize_series, ranges_from_json, series_from_json,
    tree_records_from_json,
};
pub use error::ChartError;
pub use genome::{DEFAULT_BAR_COLOR, GenomeOptions, GenomeTrack};
pub use heatmap::{Heatmap, HeatmapCell, HeatmapOptions};
pub use histogram::{Bin, Histogram, HistogramOptions, RefValue};
pub use options::{Margins, Patched, merge_patch};
pub use surface::{Chart, ChartSurface};
pub use tidy_tree::{TidyTree, TidyTreeOptions};
