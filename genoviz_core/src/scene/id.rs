// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element identity types.

use core::fmt;

/// Sentinel value indicating "no element" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to an element in a [`SceneStore`](super::SceneStore).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after an element is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl ElementId {
    /// Returns the raw slot index (for diagnostics and presenters).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({}@gen{})", self.idx, self.generation)
    }
}

/// Stable data identity used to match elements across reconciles.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(pub String);

impl ElementKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementKey({:?})", self.0)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ElementKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}
