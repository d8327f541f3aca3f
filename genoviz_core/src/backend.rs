// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract between chart engines and host surfaces.
//!
//! Engines own a [`SceneStore`] and expose the [`SceneChanges`] produced by
//! evaluating it. A host adapter implements [`Presenter`] to mirror those
//! changes onto its own tree (SVG DOM nodes in the browser, an in-memory
//! document for headless export).
//!
//! # Crate boundaries
//!
//! `genoviz_core` owns the scene model and this contract. Host crates
//! (`genoviz_backend_web`, `genoviz_render`) depend on it and provide the
//! glue. Embedders drive the loop:
//!
//! ```rust,ignore
//! fn on_animation_frame(now: HostTime) {
//!     chart.advance(now);
//!     let changes = chart.changes();
//!     presenter.apply(chart.scene(), &changes);
//! }
//! ```

use crate::scene::{SceneChanges, SceneStore};

/// Applies evaluated scene changes to a host presentation tree.
pub trait Presenter {
    /// Applies `changes`, reading current property values from `store`.
    fn apply(&mut self, store: &SceneStore, changes: &SceneChanges);
}
