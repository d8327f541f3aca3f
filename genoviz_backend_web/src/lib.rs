// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for genoviz charts.
//!
//! - [`SvgDomPresenter`]: mirrors a chart's scene into SVG DOM nodes.
//! - [`AnimationLoop`]: `requestAnimationFrame` driver that idles once
//!   transitions settle.
//! - [`now`]: the host clock, from `performance.now()`.
//!
//! A typical embedding evaluates after every pointer event and frame:
//!
//! ```rust,ignore
//! let response = chart.handle_pointer(event);
//! presenter.apply(chart.scene(), &chart.changes());
//! ```

#![no_std]

extern crate alloc;

mod presenter;
mod raf;

pub use genoviz_core::backend::Presenter;
pub use presenter::SvgDomPresenter;
pub use raf::AnimationLoop;

use genoviz_core::time::HostTime;

/// Returns the current host time from `performance.now()`.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(raf::performance_now())
}
