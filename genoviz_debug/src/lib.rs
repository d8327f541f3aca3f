// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, Chrome trace export and scene snapshots for
//! genoviz diagnostics.
//!
//! This crate provides [`TraceSink`](genoviz_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: one human-readable line per event.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: Chrome Trace Event Format JSON from recorded bytes.
//! - [`snapshot::scene_snapshot`]: the element tree of a scene as JSON.

pub mod chrome;
pub mod pretty;
pub mod recorder;
pub mod snapshot;
