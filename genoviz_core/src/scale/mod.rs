// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Continuous scales mapping a data domain onto a pixel range.
//!
//! A [`Scale`] is an immutable value: it owns its [`Domain`], its pixel range
//! and its [`ScaleKind`]. Operations that adjust the domain ([`Scale::nice`],
//! [`Scale::extend_to`]) consume the scale and return a new one.
//!
//! # Kinds
//!
//! - [`ScaleKind::Linear`]: affine mapping with 1/2/5 × 10ⁿ ticks.
//! - [`ScaleKind::Log`]: base-10 logarithm. The domain minimum is clamped to
//!   1, and non-positive inputs are clamped to the domain minimum so that
//!   mapping never produces `-inf`.
//! - [`ScaleKind::Symlog`]: `sign(x)·ln(1 + |x|)`, defined for all inputs.
//!   Its ticks are `0` followed by log ticks over `[1, max]`.
//!
//! # Example
//!
//! ```
//! use genoviz_core::scale::{Domain, Scale, ScaleKind};
//!
//! let x = Scale::new(ScaleKind::Linear, Domain::new(0.0, 1000.0), (0.0, 500.0));
//! assert_eq!(x.map(250.0), 125.0);
//! assert_eq!(x.invert(125.0), 250.0);
//! ```

mod linear;
mod log;
mod symlog;

/// The transform a [`Scale`] applies between domain and range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScaleKind {
    /// Affine mapping.
    #[default]
    Linear,
    /// Base-10 logarithmic mapping.
    Log,
    /// Symmetric logarithmic mapping with constant 1.
    #[cfg_attr(feature = "serde", serde(alias = "symLog", alias = "sym_log"))]
    Symlog,
}

/// The `[min, max]` extent of the values being visualized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Domain {
    /// The domain used when there is no data.
    pub const EMPTY: Self = Self { min: 0.0, max: 1.0 };

    /// Creates a domain from explicit bounds.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Computes the extent of the finite values in `values`.
    ///
    /// Returns `None` if there are no finite values.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Self>, v| {
                Some(acc.map_or(Self::new(v, v), |d| d.include(v)))
            })
    }

    /// Returns the domain widened to include `value` (non-finite values are
    /// ignored).
    #[must_use]
    pub fn include(self, value: f64) -> Self {
        if !value.is_finite() {
            return self;
        }
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    /// Returns `max - min`.
    #[must_use]
    pub fn span(self) -> f64 {
        self.max - self.min
    }

    /// Returns whether `value` lies within the (inclusive) bounds.
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value >= self.min.min(self.max) && value <= self.max.max(self.min)
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// A continuous scale from a data domain to a pixel range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    kind: ScaleKind,
    domain: Domain,
    range: (f64, f64),
}

/// Default number of ticks requested by axes.
pub const DEFAULT_TICK_COUNT: usize = 10;

impl Scale {
    /// Creates a scale. Log domains are clamped to a minimum of 1.
    #[must_use]
    pub fn new(kind: ScaleKind, domain: Domain, range: (f64, f64)) -> Self {
        let domain = match kind {
            ScaleKind::Log => log::clamp_domain(domain),
            ScaleKind::Linear | ScaleKind::Symlog => domain,
        };
        Self {
            kind,
            domain,
            range,
        }
    }

    /// Creates a linear scale.
    #[must_use]
    pub fn linear(domain: Domain, range: (f64, f64)) -> Self {
        Self::new(ScaleKind::Linear, domain, range)
    }

    /// Creates a scale and rounds its domain with [`nice`](Self::nice),
    /// unless explicit tick values are supplied or `skip_nice` is set.
    #[must_use]
    pub fn resolve(
        kind: ScaleKind,
        domain: Domain,
        range: (f64, f64),
        explicit_ticks: Option<&[f64]>,
        skip_nice: bool,
    ) -> Self {
        let scale = Self::new(kind, domain, range);
        if explicit_ticks.is_some() || skip_nice {
            scale
        } else {
            scale.nice(DEFAULT_TICK_COUNT)
        }
    }

    /// Returns the scale kind.
    #[must_use]
    pub fn kind(&self) -> ScaleKind {
        self.kind
    }

    /// Returns the (possibly clamped or rounded) domain.
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Returns the pixel range.
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Returns a copy of this scale with a different pixel range.
    #[must_use]
    pub fn with_range(self, range: (f64, f64)) -> Self {
        Self { range, ..self }
    }

    fn forward(&self, value: f64) -> f64 {
        match self.kind {
            ScaleKind::Linear => value,
            ScaleKind::Log => log::forward(value.max(self.domain.min.min(self.domain.max))),
            ScaleKind::Symlog => symlog::forward(value),
        }
    }

    fn backward(&self, t: f64) -> f64 {
        match self.kind {
            ScaleKind::Linear => t,
            ScaleKind::Log => log::backward(t),
            ScaleKind::Symlog => symlog::backward(t),
        }
    }

    /// Maps `value` into `[0, 1]` relative to the domain (unclamped).
    ///
    /// A degenerate domain maps everything to `0.5`.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        let d0 = self.forward(self.domain.min);
        let d1 = self.forward(self.domain.max);
        let denom = d1 - d0;
        if denom == 0.0 || !denom.is_finite() {
            return 0.5;
        }
        (self.forward(value) - d0) / denom
    }

    /// Maps a domain value to a pixel coordinate.
    #[must_use]
    pub fn map(&self, value: f64) -> f64 {
        let t = self.normalize(value);
        self.range.0 + t * (self.range.1 - self.range.0)
    }

    /// Maps a pixel coordinate back to a domain value.
    #[must_use]
    pub fn invert(&self, pixel: f64) -> f64 {
        let span = self.range.1 - self.range.0;
        let t = if span == 0.0 {
            0.5
        } else {
            (pixel - self.range.0) / span
        };
        let d0 = self.forward(self.domain.min);
        let d1 = self.forward(self.domain.max);
        self.backward(d0 + t * (d1 - d0))
    }

    /// Maps `value` to one of `levels` discrete buckets, clamped to
    /// `[0, levels - 1]`. Returns `0` when `levels` is zero.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "value is clamped to the bucket range before the cast"
    )]
    pub fn clamped_index(&self, value: f64, levels: usize) -> usize {
        if levels == 0 {
            return 0;
        }
        let top = (levels - 1) as f64;
        let t = self.normalize(value);
        if !t.is_finite() {
            return 0;
        }
        (t * top).round().clamp(0.0, top) as usize
    }

    /// Generates approximately `count` tick values within the domain.
    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match self.kind {
            ScaleKind::Linear => linear::ticks(self.domain.min, self.domain.max, count),
            ScaleKind::Log => log::ticks(self.domain.min, self.domain.max, count),
            ScaleKind::Symlog => symlog::ticks(self.domain.max, count),
        }
    }

    /// Returns whether `tick` should carry a label. Log scales only label
    /// powers of ten; other kinds label every tick.
    #[must_use]
    pub fn is_major_tick(&self, tick: f64) -> bool {
        match self.kind {
            ScaleKind::Linear => true,
            ScaleKind::Log => log::is_power_of_ten(tick),
            ScaleKind::Symlog => tick == 0.0 || log::is_power_of_ten(tick),
        }
    }

    /// Extends the domain outward to round values.
    #[must_use]
    pub fn nice(self, count: usize) -> Self {
        let (min, max) = match self.kind {
            ScaleKind::Linear | ScaleKind::Symlog => {
                linear::nice(self.domain.min, self.domain.max, count)
            }
            ScaleKind::Log => log::nice(self.domain.min, self.domain.max),
        };
        Self {
            domain: Domain::new(min, max),
            ..self
        }
    }

    /// Returns the scale with its domain maximum raised to at least `max`.
    #[must_use]
    pub fn extend_to(self, max: f64) -> Self {
        Self {
            domain: self.domain.include(max),
            ..self
        }
    }

    /// Computes ticks and, for symlog scales, widens the domain so that the
    /// last tick is inside it, then rounds it. Other kinds return unchanged.
    #[must_use]
    pub fn fit_ticks(self, count: usize) -> (Self, Vec<f64>) {
        let ticks = self.ticks(count);
        match (self.kind, ticks.last()) {
            (ScaleKind::Symlog, Some(&last)) => {
                let fitted = Self {
                    domain: Domain::new(0.0, last.max(self.domain.max)),
                    ..self
                }
                .nice(count);
                (fitted, ticks)
            }
            _ => (self, ticks),
        }
    }
}
