// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Symmetric log transform and its zero-anchored ticks.
//!
//! Linearly spaced ticks bunch up near the origin on a symlog axis, and plain
//! log ticks cannot show zero. Ticks here are `0` followed by log ticks over
//! `[1, max]`, cut after the first tick that reaches `max`.

use super::log;

pub(super) fn forward(value: f64) -> f64 {
    value.signum() * value.abs().ln_1p()
}

pub(super) fn backward(t: f64) -> f64 {
    t.signum() * t.abs().exp_m1()
}

pub(super) fn ticks(max: f64, count: usize) -> Vec<f64> {
    if !max.is_finite() {
        return vec![0.0];
    }
    let (lo, hi) = log::nice(1.0, max.max(1.0));
    let log_ticks = log::ticks(lo, hi, count);
    let cut = log_ticks
        .iter()
        .position(|&t| t >= max)
        .map_or(log_ticks.len(), |i| i + 1);
    let mut out = Vec::with_capacity(cut + 1);
    out.push(0.0);
    out.extend_from_slice(&log_ticks[..cut]);
    out
}
