// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binned bar chart over one or many numeric series.
//!
//! Values are binned at the ticks of the x scale. Each bin holds one bar per
//! series, side by side. Hovering resolves the pointer against an
//! [`IntervalIndex`] of the bars with a configurable buffer, so thin bars
//! stay easy to hit.

use genoviz_core::color::{CATEGORICAL, Color};
use genoviz_core::hit::{Hit, HitPolicy, HitTester, Interval, IntervalIndex, IntervalProbe};
use genoviz_core::interaction::{
    InteractionConfig, InteractionController, InteractionHandler, PointerEvent, Response,
};
use genoviz_core::scale::{DEFAULT_TICK_COUNT, Domain, Scale, ScaleKind};
use genoviz_core::scene::{ElementSpec, Reconciler, Shape, Style, TextAnchor};
use genoviz_core::time::{Duration, HostTime};
use genoviz_core::trace::{IndexKind, PhaseKind};
use kurbo::{Line, Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::axis::{Axis, Side};
use crate::callbacks::HistogramCallbacks;
use crate::data::series_from_json;
use crate::options::{Margins, merge_patch};
use crate::surface::{Chart, ChartSurface};
use crate::ChartError;

/// A reference value drawn as a labelled vertical line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefValue {
    /// Label.
    pub name: String,
    /// One position per series.
    pub values: Vec<f64>,
}

/// Histogram options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistogramOptions {
    /// Space around the plot.
    pub margins: Margins,
    /// Surface width.
    pub width: f64,
    /// Surface height.
    pub height: f64,
    /// Opacity of every bar.
    pub bar_opacity: f32,
    /// Series colors; defaults to the categorical palette.
    pub colors: Option<Vec<Color>>,
    /// Hover colors per series; defaults to the series color darkened.
    pub hover_colors: Option<Vec<Color>>,
    /// X axis title.
    pub label_x: String,
    /// Y axis title.
    pub label_y: String,
    /// Legend entries, one per series.
    pub series_names: Option<Vec<String>>,
    /// Draw the mean and a one-standard-deviation band per series.
    pub show_statistics: bool,
    /// Reference lines.
    pub ref_values: Vec<RefValue>,
    /// Keep the x domain as computed instead of rounding it.
    pub skip_nice_domains: bool,
    /// How far outside a bar, in pixels, the pointer still hits it.
    pub hover_buffer: f64,
    /// X scale kind.
    pub x_scale_type: ScaleKind,
    /// Y scale kind.
    pub y_scale_type: ScaleKind,
    /// Approximate number of bins.
    pub num_bins: Option<usize>,
    /// Explicit bin thresholds and x ticks. Disables domain rounding.
    pub tick_values: Option<Vec<f64>>,
    /// Explicit x domain.
    pub domain: Option<[f64; 2]>,
    /// Leave a one pixel gap between bars.
    pub spaced_bars: bool,
    /// Duration of bar transitions.
    pub transition_duration_ms: u64,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            margins: Margins::new(20.0, 40.0, 40.0, 40.0),
            width: 800.0,
            height: 400.0,
            bar_opacity: 0.8,
            colors: None,
            hover_colors: None,
            label_x: String::new(),
            label_y: String::new(),
            series_names: None,
            show_statistics: true,
            ref_values: Vec::new(),
            skip_nice_domains: false,
            hover_buffer: 5.0,
            x_scale_type: ScaleKind::Linear,
            y_scale_type: ScaleKind::Linear,
            num_bins: None,
            tick_values: None,
            domain: None,
            spaced_bars: false,
            transition_duration_ms: 0,
        }
    }
}

impl HistogramOptions {
    fn color(&self, series: usize) -> Color {
        palette(self.colors.as_deref(), series)
    }

    fn hover_color(&self, series: usize) -> Color {
        match self.hover_colors.as_deref() {
            Some(colors) if !colors.is_empty() => colors[series % colors.len()],
            _ => self.color(series).darker(0.25),
        }
    }

    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    fn plot(&self) -> Size {
        Size::new(
            (self.width - self.margins.horizontal()).max(0.0),
            (self.height - self.margins.vertical()).max(0.0),
        )
    }
}

fn palette(colors: Option<&[Color]>, series: usize) -> Color {
    match colors {
        Some(colors) if !colors.is_empty() => colors[series % colors.len()],
        _ => CATEGORICAL[series % CATEGORICAL.len()],
    }
}

/// One bin of one series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bin {
    /// Position among the series' bins.
    pub index: usize,
    /// Inclusive lower edge.
    pub x0: f64,
    /// Exclusive upper edge (inclusive for the last bin).
    pub x1: f64,
    /// Number of values in the bin.
    pub count: usize,
}

/// Splits `domain` at the `thresholds` strictly inside it and counts
/// `values` per bin. Values outside the domain are ignored.
fn bin(values: &[f64], domain: Domain, thresholds: &[f64]) -> Vec<Bin> {
    let (lo, hi) = (domain.min, domain.max);
    let mut edges: Vec<f64> = thresholds
        .iter()
        .copied()
        .filter(|&t| t > lo && t < hi)
        .collect();
    edges.sort_by(f64::total_cmp);
    edges.dedup();

    let starts = core::iter::once(lo).chain(edges.iter().copied());
    let ends = edges.iter().copied().chain(core::iter::once(hi));
    let mut bins: Vec<Bin> = starts
        .zip(ends)
        .enumerate()
        .map(|(index, (x0, x1))| Bin {
            index,
            x0,
            x1,
            count: 0,
        })
        .collect();
    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        bins[edges.partition_point(|&e| e <= v)].count += 1;
    }
    bins
}

/// Mean and sample standard deviation, when there are two or more values.
fn statistics(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, var.sqrt()))
}

/// Hit-tests bars on x, but only within the plot's vertical extent.
///
/// Bars are indexed in frame space; `plot` is the frame in surface space.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BarProbe<'a> {
    pub(crate) bars: IntervalProbe<'a>,
    pub(crate) plot: Rect,
}

impl HitTester for BarProbe<'_> {
    type Target = Hit;

    fn hit(&self, pos: Point) -> Option<Hit> {
        if pos.y < self.plot.y0 || pos.y > self.plot.y1 {
            return None;
        }
        self.bars.hit(Point::new(pos.x - self.plot.x0, pos.y))
    }
}

struct Dispatch<'a> {
    callbacks: &'a mut HistogramCallbacks,
    bins: &'a [Vec<Bin>],
}

impl Dispatch<'_> {
    fn bin(&self, hit: Hit) -> Option<&Bin> {
        self.bins.get(hit.series_index)?.get(hit.data_index)
    }
}

impl InteractionHandler<Hit> for Dispatch<'_> {
    fn on_enter(&mut self, target: Hit) {
        let Some(&bin) = self.bin(target) else {
            return;
        };
        if let Some(f) = &mut self.callbacks.on_bar_enter {
            f(target.series_index, &bin);
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
        match target {
            Some(hit) => {
                let Some(&bin) = self.bin(hit) else {
                    return;
                };
                if let Some(f) = &mut self.callbacks.on_bar_click {
                    f(hit.series_index, &bin);
                }
            }
            None => {
                if let Some(f) = &mut self.callbacks.on_empty_click {
                    f();
                }
            }
        }
    }
}

#[derive(Debug)]
struct Layers {
    bands: Reconciler,
    bars: Reconciler,
    marks: Reconciler,
    hover: Reconciler,
    axes: Reconciler,
    legend: Reconciler,
}

impl Layers {
    fn all(&mut self) -> [&mut Reconciler; 6] {
        [
            &mut self.bands,
            &mut self.bars,
            &mut self.marks,
            &mut self.hover,
            &mut self.axes,
            &mut self.legend,
        ]
    }
}

/// A binned histogram over one or more series.
#[derive(Debug)]
pub struct Histogram {
    surface: ChartSurface,
    series: Vec<Vec<f64>>,
    options: HistogramOptions,
    callbacks: HistogramCallbacks,
    controller: InteractionController<Hit>,
    layers: Layers,
    bins: Vec<Vec<Bin>>,
    bars: Vec<Vec<Rect>>,
    index: IntervalIndex,
}

impl Histogram {
    /// Creates a histogram and draws it.
    #[must_use]
    pub fn new(
        series: Vec<Vec<f64>>,
        options: HistogramOptions,
        callbacks: HistogramCallbacks,
    ) -> Self {
        let mut surface = ChartSurface::new("histogram", options.size(), options.margins.offset());
        let duration = Duration::from_millis(options.transition_duration_ms);
        let mut layer = |d| Reconciler::new(surface.group(), d);
        let layers = Layers {
            bands: layer(duration),
            bars: layer(duration),
            marks: layer(duration),
            hover: layer(Duration::ZERO),
            axes: layer(Duration::ZERO),
            legend: layer(Duration::ZERO),
        };
        let mut chart = Self {
            surface,
            series: crate::data::normalize_series(series),
            options,
            callbacks,
            controller: InteractionController::new(InteractionConfig::default()),
            layers,
            bins: Vec::new(),
            bars: Vec::new(),
            index: IntervalIndex::default(),
        };
        chart.update();
        chart
    }

    /// Creates a histogram from JSON data and options.
    pub fn from_json(
        data: &Value,
        options: &Value,
        callbacks: HistogramCallbacks,
    ) -> Result<Self, ChartError> {
        let options = HistogramOptions::deserialize(options)?;
        Ok(Self::new(series_from_json(data), options, callbacks))
    }

    /// Replaces the data and redraws.
    pub fn set_data(&mut self, series: Vec<Vec<f64>>) {
        self.series = crate::data::normalize_series(series);
        self.update();
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &HistogramOptions {
        &self.options
    }

    /// Returns the bins of every series from the last update.
    #[must_use]
    pub fn bins(&self) -> &[Vec<Bin>] {
        &self.bins
    }

    /// Returns the hovered bar as `(series, bin)`.
    #[must_use]
    pub fn hovered(&self) -> Option<(usize, usize)> {
        self.controller
            .hovered()
            .map(|h| (h.series_index, h.data_index))
    }

    fn x_domain(&self) -> Option<Domain> {
        if let Some([min, max]) = self.options.domain {
            return Some(Domain::new(min, max));
        }
        let mut domain: Option<Domain> = None;
        for (i, series) in self.series.iter().enumerate() {
            let refs = self
                .options
                .ref_values
                .iter()
                .filter_map(|r| r.values.get(i).copied());
            let Some(d) = Domain::from_values(series.iter().copied().chain(refs)) else {
                continue;
            };
            domain = Some(match domain {
                Some(acc) => acc.include(d.min).include(d.max),
                None => d,
            });
        }
        let domain = domain?;
        Some(match self.options.x_scale_type {
            ScaleKind::Linear => domain,
            ScaleKind::Log => Domain::new(1.0, domain.max),
            ScaleKind::Symlog => Domain::new(0.0, domain.max),
        })
    }

    fn layout(&mut self) -> Option<Frame> {
        let plot = self.options.plot();
        let domain = self.x_domain()?;
        let o = &self.options;
        let x = Scale::resolve(
            o.x_scale_type,
            domain,
            (0.0, plot.width),
            o.tick_values.as_deref(),
            o.skip_nice_domains,
        );
        let x_ticks = match &o.tick_values {
            Some(ticks) => ticks.clone(),
            None => x.ticks(o.num_bins.unwrap_or(DEFAULT_TICK_COUNT)),
        };
        self.bins = self
            .series
            .iter()
            .map(|s| bin(s, x.domain(), &x_ticks))
            .collect();

        let y_min = if o.y_scale_type == ScaleKind::Log { 1.0 } else { 0.0 };
        let max_count = self
            .bins
            .iter()
            .flatten()
            .map(|b| b.count)
            .max()
            .unwrap_or(0) as f64;
        let y = Scale::new(
            o.y_scale_type,
            Domain::new(y_min, max_count.max(y_min + 1.0)),
            (plot.height, 0.0),
        )
        .nice(DEFAULT_TICK_COUNT);
        let (y, y_ticks) = y.fit_ticks(DEFAULT_TICK_COUNT);

        let n = self.bins.len().max(1) as f64;
        let gap = if o.spaced_bars { 1.0 } else { 0.0 };
        let baseline = y.map(y_min);
        self.bars = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, bins)| {
                bins.iter()
                    .map(|b| {
                        let width = (x.map(b.x1) - x.map(b.x0)) / n;
                        let x0 = x.map(b.x0) + i as f64 * width + gap;
                        let top = y.map(if b.count == 0 { y_min } else { b.count as f64 });
                        Rect::new(x0, top, x0 + (width - gap).max(0.0), baseline)
                    })
                    .collect()
            })
            .collect();
        Some(Frame {
            x,
            y,
            x_ticks,
            y_ticks,
            plot,
        })
    }

    fn bar_specs(&self) -> Vec<ElementSpec> {
        let mut out = Vec::new();
        for (i, rects) in self.bars.iter().enumerate() {
            let style = Style::fill(self.options.color(i)).with_class("bar");
            for (j, rect) in rects.iter().enumerate() {
                out.push(
                    ElementSpec::new(format!("bar-{i}-{j}"), Shape::Rect(*rect), style.clone())
                        .with_opacity(self.options.bar_opacity)
                        .faded(),
                );
            }
        }
        out
    }

    fn statistic_specs(&self, frame: &Frame) -> (Vec<ElementSpec>, Vec<ElementSpec>) {
        let (mut bands, mut lines) = (Vec::new(), Vec::new());
        if !self.options.show_statistics {
            return (bands, lines);
        }
        let h = frame.plot.height;
        for (i, series) in self.series.iter().enumerate() {
            let Some((mean, sd)) = statistics(series) else {
                continue;
            };
            let color = self.options.color(i);
            let at = frame.x.map(mean);
            lines.push(ElementSpec::new(
                format!("mean-{i}"),
                Shape::Line(Line::new((at, 0.0), (at, h))),
                Style::stroke(color, 1.0).with_class("mean"),
            ));
            let x0 = frame.x.map(mean - sd).max(0.0);
            let x1 = frame.x.map(mean + sd).min(frame.plot.width);
            if x1 > x0 {
                bands.push(
                    ElementSpec::new(
                        format!("deviation-{i}"),
                        Shape::Rect(Rect::new(x0, 0.0, x1, h)),
                        Style::fill(color).with_class("deviation"),
                    )
                    .with_opacity(0.2),
                );
            }
        }
        (bands, lines)
    }

    fn reference_specs(&self, frame: &Frame) -> Vec<ElementSpec> {
        let mut out = Vec::new();
        for (i, _) in self.series.iter().enumerate() {
            let color = self.options.color(i);
            for (r, reference) in self.options.ref_values.iter().enumerate() {
                let Some(&value) = reference.values.get(i) else {
                    continue;
                };
                let at = frame.x.map(value);
                if !at.is_finite() {
                    continue;
                }
                out.push(ElementSpec::new(
                    format!("ref-{r}-{i}"),
                    Shape::Line(Line::new((at, 0.0), (at, frame.plot.height))),
                    Style::stroke(color, 1.0).with_class("ref-line"),
                ));
                out.push(ElementSpec::new(
                    format!("ref-label-{r}-{i}"),
                    Shape::Text {
                        origin: Point::new(at - 4.0, 0.0),
                        content: reference.name.clone(),
                    },
                    Style {
                        font_size: 10.0,
                        text_anchor: TextAnchor::End,
                        text_rotation: -90.0,
                        ..Style::fill(color).with_class("ref-label")
                    },
                ));
            }
        }
        out
    }

    fn legend_specs(&self) -> Vec<ElementSpec> {
        let Some(names) = &self.options.series_names else {
            return Vec::new();
        };
        let offset = self.options.margins.offset();
        let right = self.options.width - 25.0 - offset.x;
        let mut out = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let top = (i + 1) as f64 * 20.0 - offset.y;
            out.push(ElementSpec::new(
                format!("legend-swatch-{i}"),
                Shape::Rect(Rect::new(right, top, right + 14.0, top + 14.0)),
                Style::fill(self.options.color(i)).with_class("legend"),
            ));
            out.push(ElementSpec::new(
                format!("legend-label-{i}"),
                Shape::Text {
                    origin: Point::new(right - 5.0, top + 7.0),
                    content: name.clone(),
                },
                Style {
                    font_size: 10.0,
                    text_anchor: TextAnchor::End,
                    middle_baseline: true,
                    ..Style::fill(Color::BLACK).with_class("legend")
                },
            ));
        }
        out
    }

    fn axis_specs(&self, frame: &Frame) -> Vec<ElementSpec> {
        let mut out = Axis {
            side: Side::Bottom,
            scale: &frame.x,
            ticks: &frame.x_ticks,
            at: frame.plot.height,
            title: Some(&self.options.label_x),
        }
        .specs();
        out.extend(
            Axis {
                side: Side::Left,
                scale: &frame.y,
                ticks: &frame.y_ticks,
                at: 0.0,
                title: Some(&self.options.label_y),
            }
            .specs(),
        );
        out
    }

    fn draw_hover(&mut self) {
        let spec = self.controller.hovered().and_then(|hit| {
            let rect = *self.bars.get(hit.series_index)?.get(hit.data_index)?;
            Some(
                ElementSpec::new(
                    "hover",
                    Shape::Rect(rect),
                    Style::fill(self.options.hover_color(hit.series_index)).with_class("bar-hover"),
                )
                .with_opacity(self.options.bar_opacity),
            )
        });
        let now = self.surface.now();
        self.layers
            .hover
            .reconcile(self.surface.store_mut(), spec.into_iter().collect(), now);
    }

    fn probe_plot(&self) -> Rect {
        let offset = self.options.margins.offset();
        let plot = self.options.plot();
        Rect::from_origin_size(offset.to_point(), plot)
    }
}

/// Scales and ticks of one update.
#[derive(Debug)]
struct Frame {
    x: Scale,
    y: Scale,
    x_ticks: Vec<f64>,
    y_ticks: Vec<f64>,
    plot: Size,
}

impl Chart for Histogram {
    fn surface(&self) -> &ChartSurface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut ChartSurface {
        &mut self.surface
    }

    fn update(&mut self) {
        self.surface.begin(PhaseKind::Layout);
        let frame = self.layout();
        self.surface.end(PhaseKind::Layout);

        let (bands, bars, marks, axes) = match &frame {
            Some(frame) => {
                let (bands, mut marks) = self.statistic_specs(frame);
                marks.extend(self.reference_specs(frame));
                (bands, self.bar_specs(), marks, self.axis_specs(frame))
            }
            None => {
                tracing::warn!(chart = "histogram", "no data to draw");
                self.bins.clear();
                self.bars.clear();
                (Vec::new(), Vec::new(), Vec::new(), Vec::new())
            }
        };
        let legend = if frame.is_some() {
            self.legend_specs()
        } else {
            Vec::new()
        };

        self.surface.begin(PhaseKind::Reconcile);
        let now = self.surface.now();
        let store = self.surface.store_mut();
        self.layers.bands.reconcile(store, bands, now);
        let delta = self.layers.bars.reconcile(store, bars, now);
        self.layers.marks.reconcile(store, marks, now);
        self.layers.axes.reconcile(store, axes, now);
        self.layers.legend.reconcile(store, legend, now);
        self.surface.reconciled(&delta);
        self.controller.reset();
        self.draw_hover();
        self.surface.end(PhaseKind::Reconcile);

        self.index = IntervalIndex::build(self.bars.iter().enumerate().flat_map(|(i, rects)| {
            rects
                .iter()
                .enumerate()
                .map(move |(j, r)| Interval::new(r.x0, r.x1, j).in_series(i))
        }));
        self.surface.indexed(IndexKind::Interval, self.index.len());
    }

    fn set_options(&mut self, patch: &Value) -> Result<(), ChartError> {
        let patched = merge_patch(&self.options, patch)?;
        if patched.changed.is_empty() {
            return Ok(());
        }
        self.options = patched.options.clone();
        self.surface.set_size(self.options.size());
        self.surface.set_frame_offset(self.options.margins.offset());
        if patched.touched(&["transitionDurationMs"]) {
            let d = Duration::from_millis(self.options.transition_duration_ms);
            for layer in [&mut self.layers.bands, &mut self.layers.bars, &mut self.layers.marks] {
                layer.set_duration(d);
            }
        }
        self.update();
        Ok(())
    }

    fn handle_pointer(&mut self, event: PointerEvent) -> Response {
        let probe = BarProbe {
            bars: self.index.probe(self.options.hover_buffer, HitPolicy::Nearest),
            plot: self.probe_plot(),
        };
        let mut dispatch = Dispatch {
            callbacks: &mut self.callbacks,
            bins: &self.bins,
        };
        let response = self.controller.handle(event, &probe, &mut dispatch);
        if response.hover_changed {
            self.draw_hover();
        }
        response
    }

    fn advance(&mut self, now: HostTime) -> bool {
        self.surface.set_now(now);
        let store = self.surface.store_mut();
        let mut animating = false;
        for layer in self.layers.all() {
            animating |= layer.advance(store, now);
        }
        self.surface.stepped(animating);
        animating
    }

    fn cursor_location(&self) -> Option<Point> {
        self.controller.cursor_location()
    }
}
