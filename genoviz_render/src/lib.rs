// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plans, damage tracking and export for genoviz scenes.
//!
//! This crate sits between [`genoviz_core`]'s scene evaluation and the
//! places a chart ends up:
//!
//! - [`RenderPlan`]: the visible elements of an evaluated scene in paint
//!   order.
//! - [`DamageTracker`] / [`DamageRegion`]: which parts of the surface a
//!   change set touched.
//! - [`SvgDocument`]: a headless [`Presenter`](genoviz_core::backend::Presenter)
//!   that serializes the scene as a standalone SVG.
//! - [`export_png`]: software rasterization to PNG via the `image` crate.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod damage;
mod plan;
mod png;
mod svg;

pub use damage::{DamageRegion, DamageTracker};
pub use plan::{RenderItem, RenderPlan};
pub use png::{ExportError, encode_png, export_png, rasterize};
pub use svg::{SvgDocument, element_markup, export_svg};
