// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for chart engines.
//!
//! Engines report each stage of an update through a [`TraceSink`]. All
//! methods default to no-ops, so a sink only overrides what it cares about.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. Without the `trace`
//! feature every `Tracer` method compiles to nothing; with it, each method
//! costs one `Option` branch before dispatching.

use crate::time::HostTime;

/// Which stage of an engine update is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Domain, scale and geometry computation.
    Layout,
    /// Keyed reconciliation into the scene.
    Reconcile,
    /// Scene evaluation (dirty propagation, world transforms).
    Evaluate,
    /// Applying scene changes to a host surface.
    Present,
    /// SVG or PNG export.
    Export,
}

impl PhaseKind {
    /// Returns a short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Reconcile => "reconcile",
            Self::Evaluate => "evaluate",
            Self::Present => "present",
            Self::Export => "export",
        }
    }
}

/// Which kind of spatial index was rebuilt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// One-dimensional interval index (bars).
    Interval,
    /// Uniform grid (heatmap cells).
    Grid,
    /// Nearest-point index (tree nodes).
    Point,
}

/// Severity of a [`DiagnosticEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Input was normalized or partially dropped.
    Warning,
    /// Configuration prevents rendering.
    Error,
}

/// Marks the beginning of an engine phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Engine name, e.g. `"heatmap"`.
    pub chart: &'static str,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of an engine phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Engine name.
    pub chart: &'static str,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted after a reconcile.
#[derive(Clone, Copy, Debug)]
pub struct ReconcileEvent {
    /// Engine name.
    pub chart: &'static str,
    /// Number of entering keys.
    pub enter: usize,
    /// Number of updated keys.
    pub update: usize,
    /// Number of exiting keys.
    pub exit: usize,
    /// Host time of the reconcile.
    pub timestamp: HostTime,
}

/// Emitted when a hit-index is rebuilt.
#[derive(Clone, Copy, Debug)]
pub struct HitIndexEvent {
    /// Engine name.
    pub chart: &'static str,
    /// Index kind.
    pub kind: IndexKind,
    /// Number of indexed entries.
    pub entries: usize,
}

/// Emitted when an engine steps its transitions.
#[derive(Clone, Copy, Debug)]
pub struct TransitionEvent {
    /// Engine name.
    pub chart: &'static str,
    /// Whether any transition is still running.
    pub animating: bool,
    /// Host time of the step.
    pub timestamp: HostTime,
}

/// A normalization warning or configuration error.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticEvent<'a> {
    /// Engine name.
    pub chart: &'static str,
    /// Severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: &'a str,
}

/// Receives trace events from chart engines.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after a reconcile.
    fn on_reconcile(&mut self, e: &ReconcileEvent) {
        _ = e;
    }

    /// Called after a hit-index rebuild.
    fn on_hit_index(&mut self, e: &HitIndexEvent) {
        _ = e;
    }

    /// Called after transitions are stepped.
    fn on_transition(&mut self, e: &TransitionEvent) {
        _ = e;
    }

    /// Called for warnings and errors.
    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that dispatches to `sink` if present.
    ///
    /// Takes the shape `Option<Box<dyn TraceSink>>::as_deref_mut` yields.
    #[inline]
    #[must_use]
    pub fn optional(sink: Option<&'a mut (dyn TraceSink + 'static)>) -> Self {
        match sink {
            Some(sink) => Self::new(sink),
            None => Self::none(),
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ReconcileEvent`].
    #[inline]
    pub fn reconcile(&mut self, e: &ReconcileEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_reconcile(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`HitIndexEvent`].
    #[inline]
    pub fn hit_index(&mut self, e: &HitIndexEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_hit_index(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransitionEvent`].
    #[inline]
    pub fn transition(&mut self, e: &TransitionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transition(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DiagnosticEvent`].
    #[inline]
    pub fn diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_diagnostic(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_reconcile(&ReconcileEvent {
            chart: "histogram",
            enter: 3,
            update: 0,
            exit: 1,
            timestamp: HostTime(0),
        });
        sink.on_diagnostic(&DiagnosticEvent {
            chart: "tidy_tree",
            severity: Severity::Error,
            message: "option 'attribute' is not defined",
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.phase_begin(&PhaseBeginEvent {
            chart: "heatmap",
            phase: PhaseKind::Layout,
            timestamp: HostTime(10),
        });
        tracer.hit_index(&HitIndexEvent {
            chart: "heatmap",
            kind: IndexKind::Grid,
            entries: 12,
        });
    }

    #[test]
    fn phase_names() {
        assert_eq!(PhaseKind::Reconcile.name(), "reconcile");
        assert_eq!(PhaseKind::Export.name(), "export");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        struct RecordingSink {
            indexes: Vec<usize>,
        }
        impl TraceSink for RecordingSink {
            fn on_hit_index(&mut self, e: &HitIndexEvent) {
                self.indexes.push(e.entries);
            }
        }

        let mut sink = RecordingSink {
            indexes: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.hit_index(&HitIndexEvent {
            chart: "genome_track",
            kind: IndexKind::Interval,
            entries: 7,
        });
        drop(tracer);
        assert_eq!(sink.indexes, &[7]);
    }
}
