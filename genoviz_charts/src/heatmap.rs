// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clustered heatmap of a sparse matrix.
//!
//! Rows and columns are optionally ordered by average-linkage clustering of
//! their scaled values, with the dendrograms drawn beside and below the
//! grid. Cells are colored by quantizing each value onto `color_levels`
//! buckets; missing values are drawn in `color_no_value`.
//!
//! The whole chart pans with the wheel or by dragging, clamped to the
//! viewport when one is set.

use genoviz_core::cluster::{Dendrogram, Linkage, hcluster};
use genoviz_core::color::{Color, YL_OR_RD, quantize};
use genoviz_core::hit::{GridCell, GridIndex};
use genoviz_core::interaction::{
    InteractionConfig, InteractionController, InteractionHandler, PointerEvent, Response,
    WheelMode,
};
use genoviz_core::scale::{Domain, Scale, ScaleKind};
use genoviz_core::scene::{ElementSpec, Reconciler, Shape, Style, TextAnchor};
use genoviz_core::time::{Duration, HostTime};
use genoviz_core::trace::{IndexKind, PhaseKind};
use genoviz_core::transform::ZoomTransform;
use kurbo::{BezPath, Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::callbacks::HeatmapCallbacks;
use crate::data::HeatmapData;
use crate::options::{Margins, merge_patch};
use crate::surface::{Chart, ChartSurface};
use crate::ChartError;

const HOVER_COLOR: Color = Color::rgb(0x3c, 0x9e, 0xff);
const LINK_COLOR: Color = Color::rgb(0x99, 0x99, 0x99);
const LABEL_COLOR: Color = Color::rgb(0x66, 0x66, 0x66);

/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH: f64 = 0.6;

/// One heatmap cell as reported to callbacks.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapCell {
    /// Input row index.
    pub row: usize,
    /// Input column index.
    pub column: usize,
    /// Row label.
    pub row_label: String,
    /// Column label.
    pub column_label: String,
    /// Cell value; `None` for a gap.
    pub value: Option<f64>,
}

/// Heatmap options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatmapOptions {
    /// Space around the chart.
    pub margins: Margins,
    /// Width the grid stretches to before cells hit their minimum.
    pub min_width: f64,
    /// Height the grid stretches to before cells hit their minimum.
    pub min_height: f64,
    /// Minimum cell width.
    pub min_cell_width: f64,
    /// Minimum cell height.
    pub min_cell_height: f64,
    /// Gap between labels, grid and dendrograms.
    pub spacing: f64,
    /// Dendrogram width per tree level.
    pub default_cluster_step: f64,
    /// Cap on the row dendrogram width.
    pub max_row_cluster_width: f64,
    /// Cap on the column dendrogram height.
    pub max_column_cluster_height: f64,
    /// Label font size.
    pub font_size: f64,
    /// Column label rotation in degrees.
    pub text_rotation: f64,
    /// Number of color buckets.
    pub color_levels: usize,
    /// Bucket colors; defaults to `color_levels` samples of yellow-orange-red.
    pub colors: Option<Vec<Color>>,
    /// Fill of cells without a value.
    pub color_no_value: Color,
    /// Color scale kind.
    pub scale: ScaleKind,
    /// Forces the low end of the color scale.
    pub scale_min: Option<f64>,
    /// Forces the high end of the color scale.
    pub scale_max: Option<f64>,
    /// Stand-in for missing values when computing limits and clustering.
    pub null_value: f64,
    /// Order rows by clustering instead of input order.
    pub cluster_rows: bool,
    /// Order columns by clustering instead of input order.
    pub cluster_columns: bool,
    /// Duration of cell transitions.
    pub transition_duration_ms: u64,
    /// Lines written under the chart in downloads.
    pub print_caption: Vec<String>,
    /// Caption line spacing.
    pub caption_line_height: f64,
    /// Visible `[width, height]` of the host; panning stays inside it.
    pub viewport: Option<[f64; 2]>,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            margins: Margins::new(30.0, 20.0, 20.0, 20.0),
            min_width: 1240.0,
            min_height: 500.0,
            min_cell_width: 26.0,
            min_cell_height: 26.0,
            spacing: 10.0,
            default_cluster_step: 6.0,
            max_row_cluster_width: 100.0,
            max_column_cluster_height: 100.0,
            font_size: 12.0,
            text_rotation: -65.0,
            color_levels: 10,
            colors: None,
            color_no_value: Color::rgb(0xea, 0xea, 0xea),
            scale: ScaleKind::Linear,
            scale_min: None,
            scale_max: None,
            null_value: 0.0,
            cluster_rows: true,
            cluster_columns: true,
            transition_duration_ms: 200,
            print_caption: Vec::new(),
            caption_line_height: 18.0,
            viewport: None,
        }
    }
}

impl HeatmapOptions {
    fn palette(&self) -> Vec<Color> {
        match &self.colors {
            Some(colors) if !colors.is_empty() => colors.clone(),
            _ => quantize(&YL_OR_RD, self.color_levels.max(1)),
        }
    }

    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.font_size * GLYPH_WIDTH
    }
}

/// Placement of the grid and its surroundings, in frame space.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Geometry {
    cell: Size,
    /// Top-left corner of the grid.
    grid: Point,
    rows: usize,
    cols: usize,
    row_labels_width: f64,
    row_cluster_width: f64,
    column_cluster_height: f64,
    /// Everything below the grid, dendrogram included.
    below_grid: f64,
    surface: Size,
}

impl Geometry {
    fn grid_size(&self) -> Size {
        Size::new(
            self.cell.width * self.cols as f64,
            self.cell.height * self.rows as f64,
        )
    }

    fn cell_rect(&self, row_pos: usize, col_pos: usize) -> Rect {
        Rect::from_origin_size(
            (
                self.grid.x + col_pos as f64 * self.cell.width,
                self.grid.y + row_pos as f64 * self.cell.height,
            ),
            self.cell,
        )
    }
}

struct Dispatch<'a> {
    callbacks: &'a mut HeatmapCallbacks,
    data: &'a HeatmapData,
    row_order: &'a [usize],
    column_order: &'a [usize],
}

impl InteractionHandler<GridCell> for Dispatch<'_> {
    fn on_enter(&mut self, target: GridCell) {
        let Some(cell) = cell_at(self.data, self.row_order, self.column_order, target) else {
            return;
        };
        if let Some(f) = &mut self.callbacks.on_node_hover {
            f(&cell);
        }
    }

    fn on_leave(&mut self, _target: GridCell) {
        if let Some(f) = &mut self.callbacks.on_node_hover_out {
            f();
        }
    }

    fn on_click(&mut self, target: Option<GridCell>) {
        let Some(cell) =
            target.and_then(|t| cell_at(self.data, self.row_order, self.column_order, t))
        else {
            return;
        };
        if let Some(f) = &mut self.callbacks.on_cell_click {
            f(&cell);
        }
    }
}

/// Resolves a grid position to the input cell displayed there.
fn cell_at(
    data: &HeatmapData,
    row_order: &[usize],
    column_order: &[usize],
    at: GridCell,
) -> Option<HeatmapCell> {
    let row = *row_order.get(at.row)?;
    let column = *column_order.get(at.col)?;
    Some(HeatmapCell {
        row,
        column,
        row_label: data.row_labels.get(row)?.label.clone(),
        column_label: data.column_labels.get(column)?.label.clone(),
        value: data.value(row, column),
    })
}

/// Inverts a display order: `positions(order)[index] == slot`.
fn positions(order: &[usize]) -> Vec<usize> {
    let mut pos = vec![0; order.len()];
    for (slot, &index) in order.iter().enumerate() {
        if let Some(p) = pos.get_mut(index) {
            *p = slot;
        }
    }
    pos
}

#[derive(Debug)]
struct Layers {
    empty: Reconciler,
    cells: Reconciler,
    dendrograms: Reconciler,
    labels: Reconciler,
    hover: Reconciler,
    caption: Reconciler,
}

impl Layers {
    fn all(&mut self) -> [&mut Reconciler; 6] {
        [
            &mut self.empty,
            &mut self.cells,
            &mut self.dendrograms,
            &mut self.labels,
            &mut self.hover,
            &mut self.caption,
        ]
    }
}

/// A heatmap with optional row and column clustering.
#[derive(Debug)]
pub struct Heatmap {
    surface: ChartSurface,
    data: HeatmapData,
    options: HeatmapOptions,
    callbacks: HeatmapCallbacks,
    controller: InteractionController<GridCell>,
    layers: Layers,
    row_tree: Option<Dendrogram>,
    column_tree: Option<Dendrogram>,
    row_order: Vec<usize>,
    column_order: Vec<usize>,
    geometry: Option<Geometry>,
    index: GridIndex,
    clusterings: usize,
}

impl Heatmap {
    /// Creates a heatmap, clusters it and draws it.
    #[must_use]
    pub fn new(data: HeatmapData, options: HeatmapOptions, callbacks: HeatmapCallbacks) -> Self {
        let mut surface = ChartSurface::new("heatmap", Size::ZERO, options.margins.offset());
        let cells = Duration::from_millis(options.transition_duration_ms);
        let mut layer = |d| Reconciler::new(surface.group(), d);
        let layers = Layers {
            empty: layer(Duration::ZERO),
            cells: layer(cells),
            dendrograms: layer(Duration::ZERO),
            labels: layer(Duration::ZERO),
            hover: layer(Duration::ZERO),
            caption: layer(Duration::ZERO),
        };
        let mut chart = Self {
            surface,
            data: data.normalized(),
            options,
            callbacks,
            controller: InteractionController::new(InteractionConfig {
                wheel: WheelMode::Pan,
                pan_on_drag: true,
                ..InteractionConfig::default()
            }),
            layers,
            row_tree: None,
            column_tree: None,
            row_order: Vec::new(),
            column_order: Vec::new(),
            geometry: None,
            index: GridIndex::new(Point::ZERO, Size::ZERO, 0, 0),
            clusterings: 0,
        };
        chart.cluster();
        chart.update();
        chart
    }

    /// Creates a heatmap from JSON data and options.
    pub fn from_json(
        data: &Value,
        options: &Value,
        callbacks: HeatmapCallbacks,
    ) -> Result<Self, ChartError> {
        let options = HeatmapOptions::deserialize(options)?;
        Ok(Self::new(HeatmapData::from_json(data), options, callbacks))
    }

    /// Replaces the data, re-clusters and redraws.
    pub fn set_data(&mut self, data: HeatmapData) {
        self.data = data.normalized();
        self.cluster();
        self.update();
    }

    /// Returns the current options.
    #[must_use]
    pub fn options(&self) -> &HeatmapOptions {
        &self.options
    }

    /// Returns the input row shown at each display position.
    #[must_use]
    pub fn row_order(&self) -> &[usize] {
        &self.row_order
    }

    /// Returns the input column shown at each display position.
    #[must_use]
    pub fn column_order(&self) -> &[usize] {
        &self.column_order
    }

    /// Returns the cell under the pointer.
    #[must_use]
    pub fn hovered_cell(&self) -> Option<HeatmapCell> {
        let at = self.controller.hovered()?;
        cell_at(&self.data, &self.row_order, &self.column_order, at)
    }

    /// Returns the current pan.
    #[must_use]
    pub fn zoom(&self) -> ZoomTransform {
        self.controller.zoom()
    }

    /// Value limits, always including the null value.
    fn limits(&self) -> Domain {
        let values = self.data.values.iter().flatten().flatten().copied();
        Domain::from_values(values)
            .unwrap_or(Domain::new(self.options.null_value, self.options.null_value))
            .include(self.options.null_value)
    }

    fn cluster(&mut self) {
        self.clusterings += 1;
        let (rows, cols) = self.data.shape();
        let unit = Scale::new(self.options.scale, self.limits(), (0.0, 1.0));
        let null = self.options.null_value;
        let scaled = |r: usize, c: usize| unit.map(self.data.value(r, c).unwrap_or(null));

        let tree = |matrix: Vec<Vec<f64>>| {
            hcluster(&matrix, Linkage::Average).map(|mut d| {
                d.sort_by_mean();
                d
            })
        };
        self.row_tree = if self.options.cluster_rows {
            tree((0..rows).map(|r| (0..cols).map(|c| scaled(r, c)).collect()).collect())
        } else {
            None
        };
        self.column_tree = if self.options.cluster_columns {
            tree((0..cols).map(|c| (0..rows).map(|r| scaled(r, c)).collect()).collect())
        } else {
            None
        };
        self.row_order = self
            .row_tree
            .as_ref()
            .map_or_else(|| (0..rows).collect(), Dendrogram::leaf_order);
        self.column_order = self
            .column_tree
            .as_ref()
            .map_or_else(|| (0..cols).collect(), Dendrogram::leaf_order);
        tracing::debug!(
            chart = "heatmap",
            rows,
            cols,
            clustered_rows = self.row_tree.is_some(),
            clustered_columns = self.column_tree.is_some(),
            "clustered"
        );
    }

    fn geometry(&self) -> Geometry {
        let o = &self.options;
        let (rows, cols) = self.data.shape();
        let widest = |labels: &[crate::data::AxisLabel]| {
            labels
                .iter()
                .map(|l| o.text_width(&l.label))
                .fold(0.0, f64::max)
        };
        let row_labels_width = widest(&self.data.row_labels) + 3.0 * o.spacing;
        let column_labels_height = widest(&self.data.column_labels)
            * (90.0 + o.text_rotation).to_radians().cos().abs()
            + o.spacing;

        let extent = |tree: Option<&Dendrogram>, cap: f64| {
            tree.map_or(0.0, |t| {
                (t.depth() as f64 * o.default_cluster_step + o.spacing).min(cap)
            })
        };
        let row_cluster_width = extent(self.row_tree.as_ref(), o.max_row_cluster_width);
        let column_cluster_height =
            extent(self.column_tree.as_ref(), o.max_column_cluster_height);

        let cell = Size::new(
            ((o.min_width - row_labels_width - row_cluster_width) / cols.max(1) as f64)
                .max(o.min_cell_width),
            ((o.min_height - column_labels_height - column_cluster_height) / rows.max(1) as f64)
                .max(o.min_cell_height),
        );
        let below_grid = if self.column_tree.is_some() {
            column_cluster_height + 2.0 * o.spacing
        } else {
            0.0
        };
        let surface = Size::new(
            o.margins.horizontal() + row_labels_width + cell.width * cols as f64 + row_cluster_width,
            o.margins.vertical()
                + column_labels_height
                + cell.height * rows as f64
                + below_grid
                + o.spacing,
        );
        Geometry {
            cell,
            grid: Point::new(row_labels_width, column_labels_height),
            rows,
            cols,
            row_labels_width,
            row_cluster_width,
            column_cluster_height,
            below_grid,
            surface,
        }
    }

    fn cell_specs(&self, g: &Geometry) -> (Vec<ElementSpec>, Vec<ElementSpec>) {
        let o = &self.options;
        let palette = self.palette_scale();
        let colors = o.palette();
        let (row_pos, col_pos) = (positions(&self.row_order), positions(&self.column_order));
        let mut empty = Vec::new();
        let mut cells = Vec::new();
        for (r, &rp) in row_pos.iter().enumerate() {
            for (c, &cp) in col_pos.iter().enumerate() {
                let rect = g.cell_rect(rp, cp).inset(-1.0);
                match self.data.value(r, c) {
                    Some(v) => {
                        let color = colors[palette.clamped_index(v, colors.len())];
                        cells.push(
                            ElementSpec::new(
                                format!("cell-{r}-{c}"),
                                Shape::Rect(rect),
                                Style::fill(color).with_class("cell"),
                            )
                            .faded(),
                        );
                    }
                    None => empty.push(ElementSpec::new(
                        format!("empty-{r}-{c}"),
                        Shape::Rect(rect),
                        Style::fill(o.color_no_value).with_class("cell-empty"),
                    )),
                }
            }
        }
        (empty, cells)
    }

    /// Maps values onto palette buckets.
    fn palette_scale(&self) -> Scale {
        let limits = self.limits();
        let domain = Domain::new(
            self.options.scale_min.unwrap_or(limits.min),
            self.options.scale_max.unwrap_or(limits.max),
        );
        Scale::new(self.options.scale, domain, (0.0, 1.0))
    }

    fn label_specs(&self, g: &Geometry) -> Vec<ElementSpec> {
        let o = &self.options;
        let hovered = self
            .controller
            .hovered()
            .and_then(|at| cell_at(&self.data, &self.row_order, &self.column_order, at));
        let style = |highlighted: bool, class: &str| {
            let (fill, class) = if highlighted {
                (Color::BLACK, format!("{class} highlighted"))
            } else {
                (LABEL_COLOR, class.to_owned())
            };
            Style {
                font_size: o.font_size,
                ..Style::fill(fill).with_class(class)
            }
        };

        let mut out = Vec::with_capacity(g.rows + g.cols);
        for (pos, &r) in self.row_order.iter().enumerate() {
            let Some(label) = self.data.row_labels.get(r) else {
                continue;
            };
            let y = g.grid.y + (pos as f64 + 0.5) * g.cell.height;
            out.push(ElementSpec::new(
                format!("row-label-{r}"),
                Shape::Text {
                    origin: Point::new(g.row_labels_width - o.spacing, y),
                    content: label.label.clone(),
                },
                Style {
                    text_anchor: TextAnchor::End,
                    middle_baseline: true,
                    ..style(hovered.as_ref().is_some_and(|h| h.row == r), "row-label")
                },
            ));
        }
        for (pos, &c) in self.column_order.iter().enumerate() {
            let Some(label) = self.data.column_labels.get(c) else {
                continue;
            };
            let x = g.grid.x + (pos as f64 + 0.5) * g.cell.width;
            out.push(ElementSpec::new(
                format!("column-label-{c}"),
                Shape::Text {
                    origin: Point::new(x, g.grid.y - 2.0 * o.spacing),
                    content: label.label.clone(),
                },
                Style {
                    text_rotation: o.text_rotation,
                    ..style(
                        hovered.as_ref().is_some_and(|h| h.column == c),
                        "column-label",
                    )
                },
            ));
        }
        out
    }

    fn dendrogram_specs(&self, g: &Geometry) -> Vec<ElementSpec> {
        let mut out = Vec::new();
        let grid = g.grid_size();
        if let Some(tree) = &self.row_tree {
            // Root at the far right, leaves next to the grid.
            let right = g.grid.x + grid.width + g.row_cluster_width;
            let extent = g.row_cluster_width - self.options.spacing;
            out.extend(elbows(tree, "row", grid.height, extent, |p| {
                Point::new(right - p.y, g.grid.y + p.x)
            }));
        }
        if let Some(tree) = &self.column_tree {
            // Root at the bottom, leaves under the grid.
            let bottom = g.grid.y + grid.height + g.column_cluster_height;
            let extent = g.column_cluster_height - self.options.spacing;
            out.extend(elbows(tree, "column", grid.width, extent, |p| {
                Point::new(g.grid.x + p.x, bottom - p.y)
            }));
        }
        out
    }

    fn draw_hover(&mut self) {
        let Some(g) = self.geometry else {
            return;
        };
        let outline = self.controller.hovered().map(|at| {
            ElementSpec::new(
                "cell-hover",
                Shape::Rect(g.cell_rect(at.row, at.col)),
                Style::stroke(HOVER_COLOR, 1.0).with_class("cell-hover"),
            )
        });
        let labels = self.label_specs(&g);
        let now = self.surface.now();
        let store = self.surface.store_mut();
        self.layers
            .hover
            .reconcile(store, outline.into_iter().collect(), now);
        self.layers.labels.reconcile(store, labels, now);
    }

    fn clear(&mut self) {
        tracing::warn!(chart = "heatmap", "no data to draw");
        let store = self.surface.store_mut();
        for layer in self.layers.all() {
            layer.clear(store);
        }
        self.geometry = None;
        self.index = GridIndex::new(Point::ZERO, Size::ZERO, 0, 0);
        self.surface.indexed(IndexKind::Grid, 0);
    }

    fn caption_specs(&self, g: &Geometry) -> Vec<ElementSpec> {
        let o = &self.options;
        let top = g.grid.y + g.grid_size().height + g.below_grid + o.spacing;
        o.print_caption
            .iter()
            .enumerate()
            .map(|(i, line)| {
                ElementSpec::new(
                    format!("caption-{i}"),
                    Shape::Text {
                        origin: Point::new(g.grid.x, top + i as f64 * o.caption_line_height + o.font_size),
                        content: line.clone(),
                    },
                    Style {
                        font_size: o.font_size,
                        ..Style::fill(Color::BLACK).with_class("caption")
                    },
                )
            })
            .collect()
    }

    /// Runs `export` with the print caption drawn under the chart.
    fn with_caption<R>(&mut self, export: impl FnOnce(&mut ChartSurface) -> R) -> R {
        let caption = self
            .geometry
            .map(|g| self.caption_specs(&g))
            .unwrap_or_default();
        if caption.is_empty() {
            return export(&mut self.surface);
        }
        let size = self.surface.size();
        let extra = caption.len() as f64 * self.options.caption_line_height;
        let now = self.surface.now();
        self.layers
            .caption
            .reconcile(self.surface.store_mut(), caption, now);
        self.surface
            .set_size(Size::new(size.width, size.height + extra));
        let out = export(&mut self.surface);
        self.layers.caption.clear(self.surface.store_mut());
        self.surface.set_size(size);
        out
    }

    fn apply_bounds(&mut self) {
        let bounds = match (self.options.viewport, self.geometry) {
            (Some([w, h]), Some(g)) => Some((g.surface, Size::new(w, h))),
            _ => None,
        };
        self.controller.set_bounds(bounds);
        self.surface.set_zoom(self.controller.zoom());
    }
}

/// Right-angle links of `tree`, laid out with leaves across `breadth` and
/// depth over `extent`, then placed by `to_frame`.
fn elbows(
    tree: &Dendrogram,
    prefix: &str,
    breadth: f64,
    extent: f64,
    to_frame: impl Fn(Point) -> Point,
) -> Vec<ElementSpec> {
    let layout = tree.layout(breadth, extent.max(0.0));
    tree.links()
        .into_iter()
        .map(|(parent, child)| {
            let (p, c) = (layout[parent], layout[child]);
            let mut path = BezPath::new();
            path.move_to(to_frame(p));
            path.line_to(to_frame(Point::new(c.x, p.y)));
            path.line_to(to_frame(c));
            ElementSpec::new(
                format!("{prefix}-link-{child}"),
                Shape::Path(path),
                Style::stroke(LINK_COLOR, 1.0).with_class("dendrogram"),
            )
        })
        .collect()
}

impl Chart for Heatmap {
    fn surface(&self) -> &ChartSurface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut ChartSurface {
        &mut self.surface
    }

    fn update(&mut self) {
        self.controller.reset();
        let (rows, cols) = self.data.shape();
        if rows == 0 || cols == 0 {
            self.clear();
            return;
        }
        if self.row_order.len() != rows || self.column_order.len() != cols {
            self.cluster();
        }

        self.surface.begin(PhaseKind::Layout);
        let g = self.geometry();
        self.geometry = Some(g);
        self.surface.set_size(g.surface);
        let (empty, cells) = self.cell_specs(&g);
        let dendrograms = self.dendrogram_specs(&g);
        self.surface.end(PhaseKind::Layout);

        self.surface.begin(PhaseKind::Reconcile);
        let now = self.surface.now();
        let store = self.surface.store_mut();
        self.layers.empty.reconcile(store, empty, now);
        let delta = self.layers.cells.reconcile(store, cells, now);
        self.layers.dendrograms.reconcile(store, dendrograms, now);
        self.surface.reconciled(&delta);
        self.draw_hover();
        self.surface.end(PhaseKind::Reconcile);

        self.apply_bounds();
        self.index = GridIndex::new(
            g.grid + self.options.margins.offset(),
            g.cell,
            g.rows,
            g.cols,
        );
        self.surface.indexed(IndexKind::Grid, rows * cols);
    }

    fn set_options(&mut self, patch: &Value) -> Result<(), ChartError> {
        let patched = merge_patch(&self.options, patch)?;
        if patched.changed.is_empty() {
            return Ok(());
        }
        self.options = patched.options.clone();
        self.surface.set_frame_offset(self.options.margins.offset());
        if patched.touched(&["transitionDurationMs"]) {
            self.layers
                .cells
                .set_duration(Duration::from_millis(self.options.transition_duration_ms));
        }
        if patched.touched(&["clusterRows", "clusterColumns", "scale", "nullValue"]) {
            self.cluster();
        }
        self.update();
        Ok(())
    }

    fn handle_pointer(&mut self, event: PointerEvent) -> Response {
        let mut dispatch = Dispatch {
            callbacks: &mut self.callbacks,
            data: &self.data,
            row_order: &self.row_order,
            column_order: &self.column_order,
        };
        let response = self.controller.handle(event, &self.index, &mut dispatch);
        if response.zoom_changed {
            self.surface.set_zoom(self.controller.zoom());
        }
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

    fn download_svg(&mut self) -> String {
        self.with_caption(|surface| surface.export_svg(None))
    }

    fn download_png(&mut self) -> Result<Vec<u8>, ChartError> {
        self.with_caption(|surface| surface.export_png(Color::WHITE))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use kurbo::Vec2;
    use serde_json::json;

    use super::*;
    use crate::data::AxisLabel;

    fn labels(names: &[&str]) -> Vec<AxisLabel> {
        names.iter().map(|&n| AxisLabel::from(n)).collect()
    }

    /// Rows 0 and 2 are low, rows 1 and 3 are high.
    fn data() -> HeatmapData {
        HeatmapData {
            row_labels: labels(&["low-a", "high-a", "low-b", "high-b"]),
            column_labels: labels(&["s1", "s2", "s3"]),
            values: vec![
                vec![Some(1.0), Some(1.0), Some(0.0)],
                vec![Some(9.0), Some(9.0), Some(8.0)],
                vec![Some(1.0), Some(2.0), None],
                vec![Some(8.0), Some(9.0), Some(9.0)],
            ],
        }
    }

    fn unclustered() -> HeatmapOptions {
        HeatmapOptions {
            cluster_rows: false,
            cluster_columns: false,
            ..HeatmapOptions::default()
        }
    }

    fn center(chart: &Heatmap, row: usize, col: usize) -> Point {
        chart.index.cell_rect(GridCell { row, col }).center()
    }

    #[test]
    fn clustering_groups_similar_rows_highest_first() {
        let chart = Heatmap::new(data(), HeatmapOptions::default(), HeatmapCallbacks::default());
        let order = chart.row_order();
        let mut top: Vec<usize> = order[..2].to_vec();
        top.sort_unstable();
        assert_eq!(top, [1, 3], "high rows lead: {order:?}");
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, [0, 1, 2, 3], "order is a permutation");

        let links = chart.layers.dendrograms.live();
        assert_eq!(
            links.iter().filter(|s| s.key.as_str().starts_with("row-link-")).count(),
            6,
            "four leaves have six edges"
        );
    }

    #[test]
    fn without_clustering_input_order_is_kept() {
        let chart = Heatmap::new(data(), unclustered(), HeatmapCallbacks::default());
        assert_eq!(chart.row_order(), [0, 1, 2, 3]);
        assert_eq!(chart.column_order(), [0, 1, 2]);
        assert!(chart.layers.dendrograms.live().is_empty());
    }

    #[test]
    fn gaps_and_extremes_get_their_colors() {
        let chart = Heatmap::new(data(), unclustered(), HeatmapCallbacks::default());
        let style = |key: &str| {
            chart
                .layers
                .all_live()
                .find(|s| s.key.as_str() == key)
                .map(|s| s.style.fill)
        };
        let palette = quantize(&YL_OR_RD, 10);
        assert_eq!(style("empty-2-2"), Some(Some(Color::rgb(0xea, 0xea, 0xea))));
        assert_eq!(style("cell-0-2"), Some(Some(palette[0])));
        assert_eq!(style("cell-1-0"), Some(Some(palette[9])));
        assert!(style("cell-2-2").is_none(), "gaps are not data cells");
    }

    #[test]
    fn forced_scale_limits_saturate() {
        let chart = Heatmap::new(
            data(),
            HeatmapOptions {
                scale_max: Some(2.0),
                ..unclustered()
            },
            HeatmapCallbacks::default(),
        );
        let fill = chart
            .layers
            .cells
            .live()
            .iter()
            .find(|s| s.key.as_str() == "cell-2-1")
            .and_then(|s| s.style.fill);
        assert_eq!(fill, quantize(&YL_OR_RD, 10).last().copied());
    }

    #[test]
    fn hover_outlines_cell_and_highlights_labels() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (hover, out, click) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
        let callbacks = HeatmapCallbacks::default()
            .on_node_hover(move |c| {
                hover
                    .borrow_mut()
                    .push(format!("hover {}/{} {:?}", c.row_label, c.column_label, c.value));
            })
            .on_node_hover_out(move || out.borrow_mut().push("out".into()))
            .on_cell_click(move |c| click.borrow_mut().push(format!("click {}/{}", c.row, c.column)));
        let mut chart = Heatmap::new(data(), unclustered(), callbacks);

        let at = center(&chart, 2, 2);
        chart.handle_pointer(PointerEvent::moved(at));
        assert_eq!(chart.layers.hover.live().len(), 1);
        let highlighted: Vec<&str> = chart
            .layers
            .labels
            .live()
            .iter()
            .filter(|s| s.style.class.as_deref().is_some_and(|c| c.ends_with("highlighted")))
            .map(|s| s.key.as_str())
            .collect();
        assert_eq!(highlighted, ["row-label-2", "column-label-2"]);

        chart.handle_pointer(PointerEvent::down(at));
        chart.handle_pointer(PointerEvent::up(at));
        chart.handle_pointer(PointerEvent::leave());
        assert!(chart.layers.hover.live().is_empty());
        assert_eq!(*log.borrow(), ["hover low-b/s3 None", "click 2/2", "out"]);
    }

    #[test]
    fn wheel_pans_and_hits_follow() {
        let mut chart = Heatmap::new(data(), unclustered(), HeatmapCallbacks::default());
        let at = center(&chart, 1, 0);
        let response = chart.handle_pointer(PointerEvent::wheel(at, Vec2::new(0.0, 40.0)));
        assert!(response.zoom_changed);
        assert_eq!(chart.zoom().translate, Vec2::new(0.0, -40.0));
        assert_eq!(
            chart.scene().local_transform(chart.surface().root()).translation(),
            Vec2::new(0.0, -40.0)
        );

        chart.handle_pointer(PointerEvent::moved(at - Vec2::new(0.0, 40.0)));
        assert_eq!(chart.hovered_cell().map(|c| (c.row, c.column)), Some((1, 0)));
    }

    #[test]
    fn viewport_clamps_panning() {
        let mut chart = Heatmap::new(
            data(),
            HeatmapOptions {
                viewport: Some([400.0, 300.0]),
                ..unclustered()
            },
            HeatmapCallbacks::default(),
        );
        let at = center(&chart, 0, 0);
        let response = chart.handle_pointer(PointerEvent::wheel(at, Vec2::new(0.0, -40.0)));
        assert!(!response.zoom_changed, "cannot pan past the top edge");
        assert_eq!(chart.zoom().translate, Vec2::ZERO);
    }

    #[test]
    fn only_ordering_keys_recluster() {
        let mut chart = Heatmap::new(data(), HeatmapOptions::default(), HeatmapCallbacks::default());
        assert_eq!(chart.clusterings, 1);
        chart.set_options(&json!({ "scaleMax": 5.0, "fontSize": 10.0 })).unwrap();
        assert_eq!(chart.clusterings, 1);
        chart.set_options(&json!({ "clusterRows": false })).unwrap();
        assert_eq!(chart.clusterings, 2);
        assert_eq!(chart.row_order(), [0, 1, 2, 3]);
    }

    #[test]
    fn download_includes_caption_without_leaving_it_behind() {
        let mut chart = Heatmap::new(
            data(),
            HeatmapOptions {
                print_caption: vec!["Samples: 3".into(), "Metric: rpm".into()],
                ..unclustered()
            },
            HeatmapCallbacks::default(),
        );
        let _ = chart.changes();
        let size = chart.surface().size();
        let svg = chart.download_svg();
        assert!(svg.contains("Samples: 3") && svg.contains("Metric: rpm"), "{svg}");
        assert!(chart.layers.caption.live().is_empty());
        assert_eq!(chart.surface().size(), size);
        let after = chart.surface_mut().export_svg(None);
        assert!(!after.contains("Samples: 3"), "{after}");
    }

    #[test]
    fn empty_data_draws_nothing() {
        let mut chart = Heatmap::from_json(&json!({ "rowLabels": 3 }), &json!({}), HeatmapCallbacks::default())
            .unwrap();
        assert!(chart.layers.all_live().next().is_none());
        assert!(chart.handle_pointer(PointerEvent::moved(Point::new(50.0, 50.0))) == Response::default());
    }

    impl Layers {
        fn all_live(&self) -> impl Iterator<Item = &ElementSpec> {
            [
                &self.empty,
                &self.cells,
                &self.dendrograms,
                &self.labels,
                &self.hover,
                &self.caption,
            ]
            .into_iter()
            .flat_map(Reconciler::live)
        }
    }
}
