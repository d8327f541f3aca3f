// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained scene storage and keyed reconciliation.
//!
//! Elements live in a [`SceneStore`] (struct-of-arrays, generational
//! [`ElementId`] handles). Mutations mark dirty channels from
//! [`crate::dirty`]; [`SceneStore::evaluate`] recomputes inherited state and
//! reports a [`SceneChanges`] set for presenters.
//!
//! Charts do not edit the store directly. They describe the elements they
//! want as [`ElementSpec`]s and hand them to a [`Reconciler`], which owns the
//! keyed children of one group and animates enter, update and exit.
//!
//! ```
//! use genoviz_core::scene::{ElementSpec, Reconciler, SceneStore, Shape, Style};
//! use genoviz_core::time::{Duration, HostTime};
//! use kurbo::Rect;
//!
//! let mut store = SceneStore::new();
//! let group = store.create_element();
//! let mut bars = Reconciler::new(group, Duration::from_millis(200));
//!
//! let spec = ElementSpec::new("bar-0", Shape::Rect(Rect::new(0.0, 0.0, 10.0, 40.0)), Style::default());
//! let delta = bars.reconcile(&mut store, vec![spec], HostTime::from_millis(0));
//! assert_eq!(delta.enter.len(), 1);
//!
//! let changes = store.evaluate();
//! assert_eq!(changes.added.len(), 2);
//! ```

mod evaluate;
mod id;
mod reconcile;
mod shape;
mod store;
mod transition;
mod traverse;

pub use evaluate::SceneChanges;
pub use id::{ElementId, ElementKey, INVALID};
pub use reconcile::{Delta, ElementSpec, Motion, Reconciler, diff};
pub use shape::{Shape, Style, TextAnchor};
pub use store::SceneStore;
pub use transition::{Transition, Visual, ease_cubic_in_out};
pub use traverse::Children;
