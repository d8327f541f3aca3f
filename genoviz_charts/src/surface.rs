// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The retained scene every engine draws into, and the [`Chart`] trait.
//!
//! A [`ChartSurface`] owns a [`SceneStore`] with two fixed groups: `root`,
//! which carries the pan/zoom transform, and `frame`, a child of `root`
//! translated by the chart margins. Engines create their layer groups under
//! `frame` and reconcile into them.
//!
//! Exports evaluate the store themselves. The change set they produce is
//! kept and merged into the next [`ChartSurface::changes`] so that a host
//! presenter never misses an update.

use core::fmt;
use core::mem;

use genoviz_core::color::Color;
use genoviz_core::interaction::{PointerEvent, Response};
use genoviz_core::scene::{Delta, ElementId, SceneChanges, SceneStore, Shape, Style};
use genoviz_core::time::HostTime;
use genoviz_core::trace::{
    DiagnosticEvent, HitIndexEvent, IndexKind, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    ReconcileEvent, Severity, TraceSink, TransitionEvent, Tracer,
};
use genoviz_core::transform::ZoomTransform;
use kurbo::{Affine, Point, Size, Vec2};
use serde_json::Value;

use crate::ChartError;

/// Scene, clock and trace sink shared by the chart engines.
pub struct ChartSurface {
    chart: &'static str,
    store: SceneStore,
    root: ElementId,
    frame: ElementId,
    size: Size,
    now: HostTime,
    sink: Option<Box<dyn TraceSink>>,
    pending: SceneChanges,
}

impl fmt::Debug for ChartSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartSurface")
            .field("chart", &self.chart)
            .field("elements", &self.store.element_count())
            .field("size", &self.size)
            .field("now", &self.now)
            .field("traced", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl ChartSurface {
    /// Creates a surface named `chart` whose frame sits at `offset`.
    #[must_use]
    pub fn new(chart: &'static str, size: Size, offset: Vec2) -> Self {
        let mut store = SceneStore::new();
        let root = store.create_element();
        let frame = store.create_child(root, Shape::Group, Style::default());
        store.set_transform(frame, Affine::translate(offset));
        Self {
            chart,
            store,
            root,
            frame,
            size,
            now: HostTime::default(),
            sink: None,
            pending: SceneChanges::default(),
        }
    }

    /// Returns the engine name used in trace events.
    #[must_use]
    pub fn chart(&self) -> &'static str {
        self.chart
    }

    /// Returns the scene.
    #[must_use]
    pub fn scene(&self) -> &SceneStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut SceneStore {
        &mut self.store
    }

    /// Returns the zoomed root group.
    #[must_use]
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Returns the margin-offset frame group.
    #[must_use]
    pub fn frame(&self) -> ElementId {
        self.frame
    }

    /// Returns the surface size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    pub(crate) fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Returns the host time of the last update or advance.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.now
    }

    pub(crate) fn set_now(&mut self, now: HostTime) {
        self.now = now;
    }

    pub(crate) fn set_zoom(&mut self, zoom: ZoomTransform) {
        self.store.set_transform(self.root, zoom.to_affine());
    }

    pub(crate) fn set_frame_offset(&mut self, offset: Vec2) {
        self.store.set_transform(self.frame, Affine::translate(offset));
    }

    /// Creates an empty layer group under the frame. Layers paint in
    /// creation order.
    pub(crate) fn group(&mut self) -> ElementId {
        self.store
            .create_child(self.frame, Shape::Group, Style::default())
    }

    /// Installs or removes the trace sink.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.sink = sink;
    }

    fn tracer(&mut self) -> Tracer<'_> {
        Tracer::optional(self.sink.as_deref_mut())
    }

    pub(crate) fn begin(&mut self, phase: PhaseKind) {
        let (chart, timestamp) = (self.chart, self.now);
        self.tracer().phase_begin(&PhaseBeginEvent {
            chart,
            phase,
            timestamp,
        });
    }

    pub(crate) fn end(&mut self, phase: PhaseKind) {
        let (chart, timestamp) = (self.chart, self.now);
        self.tracer().phase_end(&PhaseEndEvent {
            chart,
            phase,
            timestamp,
        });
    }

    pub(crate) fn reconciled(&mut self, delta: &Delta) {
        let (chart, timestamp) = (self.chart, self.now);
        self.tracer().reconcile(&ReconcileEvent {
            chart,
            enter: delta.enter.len(),
            update: delta.update.len(),
            exit: delta.exit.len(),
            timestamp,
        });
    }

    pub(crate) fn indexed(&mut self, kind: IndexKind, entries: usize) {
        tracing::debug!(chart = self.chart, ?kind, entries, "hit index rebuilt");
        let chart = self.chart;
        self.tracer().hit_index(&HitIndexEvent {
            chart,
            kind,
            entries,
        });
    }

    pub(crate) fn stepped(&mut self, animating: bool) {
        let (chart, timestamp) = (self.chart, self.now);
        self.tracer().transition(&TransitionEvent {
            chart,
            animating,
            timestamp,
        });
    }

    pub(crate) fn diagnostic(&mut self, severity: Severity, message: &str) {
        let chart = self.chart;
        self.tracer().diagnostic(&DiagnosticEvent {
            chart,
            severity,
            message,
        });
    }

    fn evaluate(&mut self) {
        self.begin(PhaseKind::Evaluate);
        let changes = self.store.evaluate();
        self.pending.absorb(&changes);
        self.end(PhaseKind::Evaluate);
    }

    /// Evaluates the scene and returns everything that changed since the
    /// previous call.
    pub fn changes(&mut self) -> SceneChanges {
        self.evaluate();
        mem::take(&mut self.pending)
    }

    /// Serializes the current scene as a standalone SVG document.
    pub fn export_svg(&mut self, caption: Option<&str>) -> String {
        self.evaluate();
        self.begin(PhaseKind::Export);
        let svg = genoviz_render::export_svg(&self.store, self.size, caption);
        self.end(PhaseKind::Export);
        svg
    }

    /// Rasterizes the current scene over `background` and encodes it as PNG.
    pub fn export_png(&mut self, background: Color) -> Result<Vec<u8>, ChartError> {
        self.evaluate();
        self.begin(PhaseKind::Export);
        let png = genoviz_render::export_png(&self.store, self.size, background);
        self.end(PhaseKind::Export);
        Ok(png?)
    }
}

/// The runtime surface shared by every chart engine.
///
/// Hosts drive an engine with pointer events and animation frames, then
/// present the scene changes:
///
/// ```rust,ignore
/// chart.handle_pointer(event);
/// chart.advance(now);
/// presenter.apply(chart.scene(), &chart.changes());
/// ```
pub trait Chart {
    /// Returns the engine's surface.
    fn surface(&self) -> &ChartSurface;

    /// Returns the engine's surface mutably.
    fn surface_mut(&mut self) -> &mut ChartSurface;

    /// Recomputes scales, geometry and hit-indexes and reconciles the scene.
    fn update(&mut self);

    /// Merges a JSON patch into the options and updates.
    ///
    /// On error the previous options stay in effect.
    fn set_options(&mut self, patch: &Value) -> Result<(), ChartError>;

    /// Dispatches one pointer event.
    fn handle_pointer(&mut self, event: PointerEvent) -> Response;

    /// Steps running transitions to `now`. Returns `true` while any remain.
    fn advance(&mut self, now: HostTime) -> bool;

    /// Returns the last pointer position in scene coordinates.
    fn cursor_location(&self) -> Option<Point>;

    /// Returns the scene.
    fn scene(&self) -> &SceneStore {
        self.surface().scene()
    }

    /// Evaluates the scene and returns the changes since the last call.
    fn changes(&mut self) -> SceneChanges {
        self.surface_mut().changes()
    }

    /// Returns the chart as an SVG document.
    fn download_svg(&mut self) -> String {
        self.surface_mut().export_svg(None)
    }

    /// Returns the chart as PNG bytes on a white background.
    fn download_png(&mut self) -> Result<Vec<u8>, ChartError> {
        self.surface_mut().export_png(Color::WHITE)
    }

    /// Installs or removes a trace sink.
    fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.surface_mut().set_trace_sink(sink);
    }
}
