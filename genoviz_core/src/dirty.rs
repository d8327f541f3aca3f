// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for the retained scene.
//!
//! The scene uses multi-channel dirty tracking (via [`understory_dirty`]) so
//! that [`SceneStore::evaluate`](crate::scene::SceneStore::evaluate) only
//! recomputes and reports what changed since the previous call.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`TRANSFORM`] and [`OPACITY`] are marked with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent, because world transforms and effective
//!   opacities are inherited. Hidden-flag changes ride on [`TRANSFORM`] so a
//!   single drain pass recomputes both world transforms and effective
//!   hidden state.
//! - **Local-only**: [`SHAPE`] and [`STYLE`] only report the element that
//!   was marked.
//! - **Structural**: [`TOPOLOGY`] is marked on create/destroy and child-list
//!   edits. It triggers a traversal-order rebuild during evaluation.

use understory_dirty::Channel;

/// Transform or hidden flag changed.
pub const TRANSFORM: Channel = Channel::new(0);

/// Opacity changed.
pub const OPACITY: Channel = Channel::new(1);

/// Geometry changed.
pub const SHAPE: Channel = Channel::new(2);

/// Fill, stroke, font or class changed.
pub const STYLE: Channel = Channel::new(3);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(4);
