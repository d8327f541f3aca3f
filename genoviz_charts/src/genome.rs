// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Genome coverage track: full-height bars over `[start, end]` ranges.
//!
//! Ranges may overlap. The pointer resolves to the smallest range under it,
//! falling back to the closest one within the hover buffer.

use genoviz_core::color::Color;
use genoviz_core::hit::{Hit, HitPolicy, Interval, IntervalIndex};
use genoviz_core::interaction::{
    InteractionConfig, InteractionController, InteractionHandler, PointerEvent, Response,
};
use genoviz_core::scale::{DEFAULT_TICK_COUNT, Domain, Scale};
use genoviz_core::scene::{ElementSpec, Reconciler, Shape, Style};
use genoviz_core::time::{Duration, HostTime};
use genoviz_core::trace::{IndexKind, PhaseKind};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::callbacks::GenomeCallbacks;
use crate::data::ranges_from_json;
use crate::histogram::BarProbe;
use crate::options::{Margins, merge_patch};
use crate::surface::{Chart, ChartSurface};
use crate::ChartError;

/// Default bar color.
pub const DEFAULT_BAR_COLOR: Color = Color::rgb(0x38, 0x67, 0xfa);

const OUTLINE_INSET: f64 = 1.0;

/// Genome track options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenomeOptions {
    /// Space around the track.
    pub margins: Margins,
    /// Surface width.
    pub width: f64,
    /// Surface height.
    pub height: f64,
    /// Bar color.
    pub color: Color,
    /// How far outside a bar, in pixels, the pointer still hits it.
    pub hover_buffer: f64,
    /// How much hovered bars are darkened.
    pub hover_darken_factor: f64,
    /// Explicit domain; defaults to the extent of the ranges.
    pub domain: Option<[f64; 2]>,
}

impl Default for GenomeOptions {
    fn default() -> Self {
        Self {
            margins: Margins::default(),
            width: 800.0,
            height: 400.0,
            color: DEFAULT_BAR_COLOR,
            hover_buffer: 5.0,
            hover_darken_factor: 0.25,
            domain: None,
        }
    }
}

impl GenomeOptions {
    fn plot(&self) -> Size {
        Size::new(
            (self.width - self.margins.horizontal()).max(0.0),
            (self.height - self.margins.vertical()).max(0.0),
        )
    }
}

struct Dispatch<'a> {
    callbacks: &'a mut GenomeCallbacks,
    clicked: Option<Option<Hit>>,
}

impl InteractionHandler<Hit> for Dispatch<'_> {
    fn on_enter(&mut self, target: Hit) {
        if let Some(f) = &mut self.callbacks.on_bar_enter {
            f(target.data_index);
        }
    }

    fn on_leave(&mut self, _target: Hit) {
        if let Some(f) = &mut self.callbacks.on_bar_exit {
            f();
        }
    }

    fn on_hover(&mut self, _target: Hit, client: Point) {
        if let Some(f) = &mut self.callbacks.on_bar_hover {
            f(client);
        }
    }

    fn on_click(&mut self, target: Option<Hit>) {
        self.clicked = Some(target);
        if let Some(f) = &mut self.callbacks.on_bar_click {
            f(target.map(|h| h.data_index));
        }
    }
}

/// A track of possibly overlapping ranges.
#[derive(Debug)]
pub struct GenomeTrack {
    surface: ChartSurface,
    ranges: Vec<(f64, f64)>,
    options: GenomeOptions,
    callbacks: GenomeCallbacks,
    controller: InteractionController<Hit>,
    bars: Reconciler,
    highlight: Reconciler,
    outline: Reconciler,
    rects: Vec<Option<Rect>>,
    index: IntervalIndex,
}

impl GenomeTrack {
    /// Creates a track and draws it.
    #[must_use]
    pub fn new(ranges: Vec<(f64, f64)>, options: GenomeOptions, callbacks: GenomeCallbacks) -> Self {
        let size = Size::new(options.width, options.height);
        let mut surface = ChartSurface::new("genome", size, options.margins.offset());
        let bars = Reconciler::new(surface.group(), Duration::ZERO);
        let highlight = Reconciler::new(surface.group(), Duration::ZERO);
        let outline = Reconciler::new(surface.group(), Duration::ZERO);
        let mut track = Self {
            surface,
            ranges,
            options,
            callbacks,
            controller: InteractionController::new(InteractionConfig::default()),
            bars,
            highlight,
            outline,
            rects: Vec::new(),
            index: IntervalIndex::default(),
        };
        track.update();
        track
    }

    /// Creates a track from JSON `[start, end]` pairs and options.
    pub fn from_json(
        data: &Value,
        options: &Value,
        callbacks: GenomeCallbacks,
    ) -> Result<Self, ChartError> {
        let options = GenomeOptions::deserialize(options)?;
        Ok(Self::new(ranges_from_json(data), options, callbacks))
    }

    /// Replaces the ranges and redraws.
    pub fn set_data(&mut self, ranges: Vec<(f64, f64)>) {
        self.ranges = ranges;
        self.update();
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &GenomeOptions {
        &self.options
    }

    /// Returns the data index of the hovered bar.
    #[must_use]
    pub fn hovered(&self) -> Option<usize> {
        self.controller.hovered().map(|h| h.data_index)
    }

    /// Returns the data index of the outlined bar.
    #[must_use]
    pub fn outlined(&self) -> Option<usize> {
        self.controller.outlined().map(|h| h.data_index)
    }

    fn domain(&self) -> Domain {
        if let Some([min, max]) = self.options.domain {
            return Domain::new(min, max);
        }
        Domain::from_values(self.ranges.iter().flat_map(|&(a, b)| [a, b])).unwrap_or(Domain::EMPTY)
    }

    fn rect(&self, data_index: usize) -> Option<Rect> {
        self.rects.get(data_index).copied().flatten()
    }

    fn draw_overlays(&mut self) {
        let color = self.options.color;
        let highlight = self
            .controller
            .hovered()
            .and_then(|h| self.rect(h.data_index))
            .map(|r| {
                ElementSpec::new(
                    "highlight",
                    Shape::Rect(r),
                    Style::fill(color.darker(self.options.hover_darken_factor))
                        .with_class("bar-highlight"),
                )
            });
        let outline = self
            .controller
            .outlined()
            .and_then(|h| self.rect(h.data_index))
            .map(|r| {
                ElementSpec::new(
                    "outline",
                    Shape::Rect(r.inset(-OUTLINE_INSET)),
                    Style {
                        stroke: Some(Color::BLACK),
                        stroke_width: 2.0,
                        ..Style::fill(color).with_class("bar-outline")
                    },
                )
            });
        let now = self.surface.now();
        let store = self.surface.store_mut();
        self.highlight
            .reconcile(store, highlight.into_iter().collect(), now);
        self.outline.reconcile(store, outline.into_iter().collect(), now);
    }
}

impl Chart for GenomeTrack {
    fn surface(&self) -> &ChartSurface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut ChartSurface {
        &mut self.surface
    }

    fn update(&mut self) {
        self.surface.begin(PhaseKind::Layout);
        let plot = self.options.plot();
        let x = Scale::linear(self.domain(), (0.0, plot.width)).nice(DEFAULT_TICK_COUNT);
        self.rects = self
            .ranges
            .iter()
            .map(|&(a, b)| {
                let (x0, x1) = (x.map(a), x.map(b));
                (x0.is_finite() && x1.is_finite())
                    .then(|| Rect::new(x0.min(x1), 0.0, x0.max(x1), plot.height))
            })
            .collect();
        self.surface.end(PhaseKind::Layout);

        self.surface.begin(PhaseKind::Reconcile);
        let style = Style::fill(self.options.color).with_class("bar");
        let specs = self
            .rects
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                r.map(|r| ElementSpec::new(format!("bar-{i}"), Shape::Rect(r), style.clone()))
            })
            .collect();
        let now = self.surface.now();
        let delta = self.bars.reconcile(self.surface.store_mut(), specs, now);
        self.surface.reconciled(&delta);
        self.controller.reset();
        self.draw_overlays();
        self.surface.end(PhaseKind::Reconcile);

        self.index = IntervalIndex::build(
            self.rects
                .iter()
                .enumerate()
                .filter_map(|(i, r)| r.map(|r| Interval::new(r.x0, r.x1, i))),
        );
        self.surface.indexed(IndexKind::Interval, self.index.len());
    }

    fn set_options(&mut self, patch: &Value) -> Result<(), ChartError> {
        let patched = merge_patch(&self.options, patch)?;
        if patched.changed.is_empty() {
            return Ok(());
        }
        self.options = patched.options;
        self.surface
            .set_size(Size::new(self.options.width, self.options.height));
        self.surface.set_frame_offset(self.options.margins.offset());
        self.update();
        Ok(())
    }

    fn handle_pointer(&mut self, event: PointerEvent) -> Response {
        let probe = BarProbe {
            bars: self
                .index
                .probe(self.options.hover_buffer, HitPolicy::SmallestContaining),
            plot: Rect::from_origin_size(self.options.margins.offset().to_point(), self.options.plot()),
        };
        let mut dispatch = Dispatch {
            callbacks: &mut self.callbacks,
            clicked: None,
        };
        let before = self.controller.outlined();
        let mut response = self.controller.handle(event, &probe, &mut dispatch);
        if let Some(hit) = dispatch.clicked {
            // A repeated click keeps the bar outlined.
            self.controller.set_outline(hit);
            response.outline_changed = before != hit;
        }
        if response.hover_changed || response.outline_changed {
            self.draw_overlays();
        }
        response
    }

    fn advance(&mut self, now: HostTime) -> bool {
        self.surface.set_now(now);
        let store = self.surface.store_mut();
        let mut animating = false;
        for layer in [&mut self.bars, &mut self.highlight, &mut self.outline] {
            animating |= layer.advance(store, now);
        }
        self.surface.stepped(animating);
        animating
    }

    fn cursor_location(&self) -> Option<Point> {
        self.controller.cursor_location()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;

    fn track(ranges: Vec<(f64, f64)>, callbacks: GenomeCallbacks) -> GenomeTrack {
        GenomeTrack::new(
            ranges,
            GenomeOptions {
                domain: Some([0.0, 100.0]),
                ..GenomeOptions::default()
            },
            callbacks,
        )
    }

    fn click(t: &mut GenomeTrack, x: f64) {
        t.handle_pointer(PointerEvent::down(Point::new(x, 10.0)));
        t.handle_pointer(PointerEvent::up(Point::new(x, 10.0)));
    }

    #[test]
    fn smallest_overlapping_bar_wins() {
        let mut t = track(vec![(0.0, 100.0), (40.0, 50.0)], GenomeCallbacks::default());
        t.handle_pointer(PointerEvent::moved(Point::new(360.0, 10.0)));
        assert_eq!(t.hovered(), Some(1));
        t.handle_pointer(PointerEvent::moved(Point::new(600.0, 10.0)));
        assert_eq!(t.hovered(), Some(0));
    }

    #[test]
    fn clicks_keep_or_clear_the_outline() {
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&clicks);
        let mut t = track(
            vec![(10.0, 20.0), (60.0, 70.0)],
            GenomeCallbacks::default().on_bar_click(move |i| seen.borrow_mut().push(i)),
        );
        click(&mut t, 120.0);
        assert_eq!(t.outlined(), Some(0));
        click(&mut t, 120.0);
        assert_eq!(t.outlined(), Some(0), "second click keeps the outline");

        let outline = &t.outline.live()[0];
        assert_eq!(outline.shape, Shape::Rect(Rect::new(81.0, 1.0, 159.0, 399.0)));
        assert_eq!(outline.style.stroke, Some(Color::BLACK));

        click(&mut t, 400.0);
        assert_eq!(t.outlined(), None);
        assert!(t.outline.live().is_empty());
        assert_eq!(*clicks.borrow(), [Some(0), Some(0), None]);
    }

    #[test]
    fn malformed_ranges_keep_their_neighbours_indices() {
        let mut t = GenomeTrack::from_json(
            &json!([[0, 10], "oops", [50, 60]]),
            &json!({ "domain": [0, 100] }),
            GenomeCallbacks::default(),
        )
        .unwrap();
        assert_eq!(t.bars.live().len(), 2);
        t.handle_pointer(PointerEvent::moved(Point::new(440.0, 10.0)));
        assert_eq!(t.hovered(), Some(2));
    }

    #[test]
    fn hover_darkens_with_the_configured_factor() {
        let mut t = track(vec![(10.0, 20.0)], GenomeCallbacks::default());
        t.set_options(&json!({ "hoverDarkenFactor": 1.0 })).unwrap();
        t.handle_pointer(PointerEvent::moved(Point::new(100.0, 5.0)));
        let highlight = &t.highlight.live()[0];
        assert_eq!(highlight.style.fill, Some(DEFAULT_BAR_COLOR.darker(1.0)));

        t.handle_pointer(PointerEvent::leave());
        assert!(t.highlight.live().is_empty());
    }
}
