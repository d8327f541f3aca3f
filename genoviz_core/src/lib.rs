// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core engine for interactive genomics visualizations.
//!
//! `genoviz_core` holds everything a chart needs that does not depend on a
//! particular chart kind or host surface: scales, spatial hit-indexes, the
//! collapsible hierarchy, agglomerative clustering, the retained scene with
//! keyed reconciliation, and the pointer interaction controller.
//!
//! # Architecture
//!
//! An engine turns data into a retained scene and answers pointer events
//! against an index built from the same geometry:
//!
//! ```text
//!   records ──► Scale::resolve() ──► geometry
//!                                       │
//!          ┌────────────────────────────┤
//!          ▼                            ▼
//!   Reconciler::reconcile()      IntervalIndex / GridIndex / PointIndex
//!          │                            │
//!          ▼                            ▼
//!   SceneStore::evaluate()       InteractionController::handle()
//!          │                            │
//!          ▼                            ▼
//!   Presenter::apply()           InteractionHandler callbacks
//! ```
//!
//! **[`scale`]**: Linear, log and symlog scales with nice rounding and tick
//! generation.
//!
//! **[`hit`]**: Interval, grid and point indexes for pointer hit-testing.
//!
//! **[`hierarchy`]**: Arena tree built from parent-pointer records, with
//! score-driven collapse into aggregate nodes and tidy/cluster layouts.
//!
//! **[`cluster`]**: Average-linkage agglomerative clustering producing a
//! [`Dendrogram`](cluster::Dendrogram).
//!
//! **[`scene`]**: Struct-of-arrays retained scene with generational
//! handles, multi-channel dirty tracking, and a keyed
//! [`Reconciler`](scene::Reconciler) that animates enter/update/exit.
//!
//! **[`interaction`]**: Hover, outline, drag and wheel handling with the
//! zoom transform applied in reverse before hit-testing.
//!
//! **[`backend`]**: The [`Presenter`](backend::Presenter) trait host
//! adapters implement.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) hooks with a
//! zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `serde` (disabled by default): `Serialize`/`Deserialize` for scale
//!   kinds, colors and tree records.
//! - `trace` (disabled by default): enables `Tracer` method bodies.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod backend;
pub mod cluster;
pub mod color;
pub mod dirty;
pub mod hierarchy;
pub mod hit;
pub mod interaction;
pub mod scale;
pub mod scene;
pub mod time;
pub mod trace;
pub mod transform;
