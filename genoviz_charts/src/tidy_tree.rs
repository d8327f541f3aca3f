// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collapsible horizontal tree of scored taxa.
//!
//! Depth runs left to right and leaves spread vertically, one
//! `leaf_node_height` apart. Node size, link width and label size follow each
//! node's score normalized against the range of the leaves. Low-score
//! subtrees start collapsed; clicking a node expands or collapses it and the
//! changed subtree grows out of, or folds back into, that node.

use std::collections::{BTreeSet, HashMap};

use genoviz_core::color::Color;
use genoviz_core::hierarchy::{CollapseConfig, NodeId, NodeState, Tree, TreeRecord};
use genoviz_core::hit::PointIndex;
use genoviz_core::interaction::{
    InteractionConfig, InteractionController, InteractionHandler, PointerEvent, Response,
};
use genoviz_core::scale::{Domain, Scale};
use genoviz_core::scene::{ElementSpec, Motion, Reconciler, Shape, Style, TextAnchor};
use genoviz_core::time::{Duration, HostTime};
use genoviz_core::trace::{IndexKind, PhaseKind, Severity};
use kurbo::{Affine, BezPath, Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::callbacks::TreeCallbacks;
use crate::data::tree_records_from_json;
use crate::options::{Margins, merge_patch};
use crate::surface::{Chart, ChartSurface};
use crate::ChartError;

const NODE_RADIUS: (f64, f64) = (4.0, 20.0);
const LINK_WIDTH: (f64, f64) = (1.0, 20.0);
const MAX_CROSS: f64 = 8.0;

const NODE_COLOR: Color = Color::rgb(0x3c, 0x55, 0x9a);
const LINK_COLOR: Color = Color::rgb(0xd6, 0xdb, 0xe0);
const HIGHLIGHT_COLOR: Color = Color::rgb(0xf5, 0x7c, 0x3c);

/// Tidy tree options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TidyTreeOptions {
    /// Score attribute for ordering, sizing and collapsing. Nothing is drawn
    /// without one.
    pub attribute: Option<String>,
    /// Vertical space per visible leaf.
    pub leaf_node_height: f64,
    /// Depth extent of the tree.
    pub min_width: f64,
    /// Minimum breadth extent of the tree.
    pub min_height: f64,
    /// Duration of expand and collapse transitions.
    pub transition_duration_ms: u64,
    /// Normalized score below which a subtree starts collapsed.
    pub collapse_threshold: f64,
    /// Low-score children fold into an aggregate only above this count.
    pub min_non_collapsable_children: usize,
    /// Label size of the lowest score.
    pub smaller_font: f64,
    /// Label size of the highest score.
    pub larger_font: f64,
    /// Record ids that always start collapsed.
    pub collapsed: BTreeSet<String>,
    /// Label nodes by common name when they have one.
    pub use_common_name: bool,
    /// Space around the tree. The right margin holds the leaf labels.
    pub margins: Margins,
}

impl Default for TidyTreeOptions {
    fn default() -> Self {
        Self {
            attribute: Some("aggregatescore".into()),
            leaf_node_height: 35.0,
            min_width: 960.0,
            min_height: 300.0,
            transition_duration_ms: 500,
            collapse_threshold: 0.4,
            min_non_collapsable_children: 2,
            smaller_font: 8.0,
            larger_font: 12.0,
            collapsed: BTreeSet::new(),
            use_common_name: false,
            margins: Margins::new(20.0, 200.0, 20.0, 40.0),
        }
    }
}

impl TidyTreeOptions {
    fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref().filter(|a| !a.is_empty())
    }

    fn collapse_config(&self) -> CollapseConfig {
        CollapseConfig {
            attribute: self.attribute.clone(),
            collapse_threshold: self.collapse_threshold,
            min_non_collapsable_children: self.min_non_collapsable_children,
            collapsed: self.collapsed.clone(),
        }
    }
}

/// Score-driven sizes, all over the normalized score.
struct Sizes {
    node: Scale,
    link: Scale,
    font: Scale,
}

impl Sizes {
    fn new(options: &TidyTreeOptions) -> Self {
        let unit = Domain::new(0.0, 1.0);
        Self {
            node: Scale::linear(unit, NODE_RADIUS),
            link: Scale::linear(unit, LINK_WIDTH),
            font: Scale::linear(unit, (options.smaller_font, options.larger_font)),
        }
    }
}

/// Collects what a pointer event asks of the tree; the engine applies it once
/// the controller is done.
struct Dispatch<'a> {
    tree: &'a Tree,
    callbacks: &'a mut TreeCallbacks,
    clicked: Option<NodeId>,
    dragged: Vec<(NodeId, Vec2)>,
}

impl InteractionHandler<NodeId> for Dispatch<'_> {
    fn on_enter(&mut self, target: NodeId) {
        if let Some(f) = &mut self.callbacks.on_node_enter {
            f(self.tree, target);
        }
    }

    fn on_leave(&mut self, _target: NodeId) {
        if let Some(f) = &mut self.callbacks.on_node_leave {
            f();
        }
    }

    fn on_hover(&mut self, target: NodeId, client: Point) {
        if let Some(f) = &mut self.callbacks.on_node_hover {
            f(self.tree, target, client);
        }
    }

    fn on_click(&mut self, target: Option<NodeId>) {
        self.clicked = target;
    }

    fn on_drag(&mut self, target: Option<NodeId>, delta: Vec2) {
        if let Some(id) = target {
            self.dragged.push((id, delta));
        }
    }
}

/// A collapsible tidy tree.
#[derive(Debug)]
pub struct TidyTree {
    surface: ChartSurface,
    tree: Tree,
    options: TidyTreeOptions,
    callbacks: TreeCallbacks,
    controller: InteractionController<NodeId>,
    links: Reconciler,
    nodes: Reconciler,
    offsets: HashMap<String, Vec2>,
    index: PointIndex<NodeId>,
}

impl TidyTree {
    /// Builds the hierarchy from `records`, collapses it by score and draws
    /// it.
    pub fn new(
        records: Vec<TreeRecord>,
        options: TidyTreeOptions,
        callbacks: TreeCallbacks,
    ) -> Result<Self, ChartError> {
        let tree = Tree::stratify(records)?;
        let mut surface = ChartSurface::new("tidy_tree", Size::ZERO, options.margins.offset());
        let duration = Duration::from_millis(options.transition_duration_ms);
        let links = Reconciler::new(surface.group(), duration);
        let nodes = Reconciler::new(surface.group(), duration);
        let mut chart = Self {
            surface,
            tree,
            options,
            callbacks,
            controller: InteractionController::new(InteractionConfig {
                drag_targets: true,
                ..InteractionConfig::default()
            }),
            links,
            nodes,
            offsets: HashMap::new(),
            index: PointIndex::build([], 0.0),
        };
        chart.sort();
        chart.update();
        chart.created();
        Ok(chart)
    }

    /// Creates a tree from JSON records and options.
    pub fn from_json(
        data: &Value,
        options: &Value,
        callbacks: TreeCallbacks,
    ) -> Result<Self, ChartError> {
        let options = TidyTreeOptions::deserialize(options)?;
        Self::new(tree_records_from_json(data), options, callbacks)
    }

    /// Replaces the hierarchy. Collapse state and node drag offsets start
    /// over.
    pub fn set_tree(&mut self, records: Vec<TreeRecord>) -> Result<(), ChartError> {
        self.tree = Tree::stratify(records)?;
        self.offsets.clear();
        self.sort();
        self.update();
        self.created();
        Ok(())
    }

    /// Returns the hierarchy.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Returns the current options.
    #[must_use]
    pub fn options(&self) -> &TidyTreeOptions {
        &self.options
    }

    /// Returns how far a node was dragged from its layout position.
    #[must_use]
    pub fn drag_offset(&self, key: &str) -> Vec2 {
        self.offsets.get(key).copied().unwrap_or_default()
    }

    fn sort(&mut self) {
        if let Err(err) = self.tree.sort_and_scale(&self.options.collapse_config()) {
            tracing::debug!(chart = "tidy_tree", %err, "tree left unsorted");
        }
    }

    fn created(&mut self) {
        if let Some(f) = &mut self.callbacks.on_created_tree {
            f(&self.tree);
        }
    }

    /// Flips a node and animates the change out of it.
    fn toggle(&mut self, id: NodeId) {
        if !self.tree.is_alive(id) || !self.tree.state(id).is_toggleable() {
            return;
        }
        let source = self.tree.toggle_collapse(id);
        if let Some(f) = &mut self.callbacks.on_collapsed_state_change {
            f(&self.tree, source);
        }
        self.controller.reset();
        self.redraw(Some(source));
    }

    /// Lays out the visible tree and resizes the surface to fit it.
    fn relayout(&mut self) -> Size {
        let leaves = self.tree.visible_leaf_count() as f64;
        let size = Size::new(
            self.options.min_width,
            self.options.min_height.max(self.options.leaf_node_height * leaves),
        );
        self.tree.layout_tidy(size);
        let margins = self.options.margins;
        self.surface.set_size(Size::new(
            size.width + margins.horizontal(),
            size.height + margins.vertical(),
        ));
        size
    }

    /// Relays out and reconciles. New elements grow out of `source` at its
    /// previous position; removed ones fold into its new position.
    fn redraw(&mut self, source: Option<NodeId>) {
        let Some(attribute) = self.options.attribute().map(str::to_owned) else {
            self.clear();
            return;
        };
        self.surface.begin(PhaseKind::Layout);
        let size = self.relayout();
        let (from, to) = match source {
            Some(id) => {
                let drag = self.drag_offset(self.tree.key(id));
                (
                    self.tree.previous_position(id) + drag,
                    self.placed(id),
                )
            }
            None => (
                Point::new(0.0, size.height / 2.0),
                self.placed(self.tree.root()),
            ),
        };
        self.surface.end(PhaseKind::Layout);
        self.draw(&attribute, from, to);
        self.rebuild_index(&attribute);
    }

    fn clear(&mut self) {
        tracing::error!(chart = "tidy_tree", "TidyTree: option 'attribute' is not defined");
        self.surface
            .diagnostic(Severity::Error, "option 'attribute' is not defined");
        let store = self.surface.store_mut();
        self.links.clear(store);
        self.nodes.clear(store);
        self.index = PointIndex::build([], 0.0);
        self.surface.indexed(IndexKind::Point, 0);
    }

    fn draw(&mut self, attribute: &str, from: Point, to: Point) {
        let sizes = Sizes::new(&self.options);
        let links: Vec<ElementSpec> = self
            .tree
            .visible_links()
            .into_iter()
            .map(|(parent, child)| self.link_spec(parent, child, attribute, &sizes).anchored(from, to))
            .collect();
        let nodes: Vec<ElementSpec> = self
            .tree
            .visible()
            .into_iter()
            .flat_map(|id| self.node_specs(id, attribute, &sizes))
            .map(|spec| spec.anchored(from, to))
            .collect();

        self.surface.begin(PhaseKind::Reconcile);
        let now = self.surface.now();
        let store = self.surface.store_mut();
        self.links
            .reconcile_with(store, links, now, |_| Motion::Anchor(to));
        let delta = self
            .nodes
            .reconcile_with(store, nodes, now, |_| Motion::Anchor(to));
        self.surface.reconciled(&delta);
        self.surface.end(PhaseKind::Reconcile);
    }

    /// Redraws after a node drag, without animation.
    fn draw_immediate(&mut self) {
        let Some(attribute) = self.options.attribute().map(str::to_owned) else {
            return;
        };
        let duration = self.nodes.duration();
        self.links.set_duration(Duration::ZERO);
        self.nodes.set_duration(Duration::ZERO);
        let here = self.placed(self.tree.root());
        self.draw(&attribute, here, here);
        self.links.set_duration(duration);
        self.nodes.set_duration(duration);
        self.rebuild_index(&attribute);
    }

    fn rebuild_index(&mut self, attribute: &str) {
        let sizes = Sizes::new(&self.options);
        let origin = self.options.margins.offset();
        let visible = self.tree.visible();
        let radius = visible
            .iter()
            .map(|&id| sizes.node.map(self.tree.normalized_score(id, attribute)))
            .fold(NODE_RADIUS.0, f64::max);
        self.index = PointIndex::build(
            visible.iter().map(|&id| (self.placed(id) + origin, id)),
            radius,
        );
        self.surface.indexed(IndexKind::Point, self.index.len());
    }

    /// Layout position plus drag offset, in frame space.
    fn placed(&self, id: NodeId) -> Point {
        self.tree.position(id) + self.drag_offset(self.tree.key(id))
    }

    fn link_spec(&self, parent: NodeId, child: NodeId, attribute: &str, sizes: &Sizes) -> ElementSpec {
        let (s, t) = (self.placed(parent), self.placed(child));
        let mid = (s.x + t.x) / 2.0;
        let mut path = BezPath::new();
        path.move_to(s);
        path.curve_to(Point::new(mid, s.y), Point::new(mid, t.y), t);

        let highlighted = self.tree.is_highlighted(child);
        let (color, class) = if highlighted {
            (HIGHLIGHT_COLOR, "link highlighted")
        } else {
            (LINK_COLOR, "link")
        };
        let width = sizes.link.map(self.tree.normalized_score(child, attribute));
        ElementSpec::new(
            format!("link-{}", self.tree.key(child)),
            Shape::Path(path),
            Style::stroke(color, width).with_class(class),
        )
    }

    fn node_specs(&self, id: NodeId, attribute: &str, sizes: &Sizes) -> Vec<ElementSpec> {
        let tree = &self.tree;
        let key = tree.key(id);
        let at = Affine::translate(self.placed(id).to_vec2());
        let score = tree.normalized_score(id, attribute);
        let radius = sizes.node.map(score);
        let state = tree.state(id);
        let folded = matches!(state, NodeState::Collapsed | NodeState::AggregatedLeaf);
        let kind = if tree.has_children(id) {
            "node__internal"
        } else {
            "node__leaf"
        };
        let class = format!(
            "node node-{key} {kind}{}",
            if folded { "--collapsed" } else { "" }
        );

        let mut out = Vec::with_capacity(3);
        // Unnamed ranks get no marker unless something is folded behind them.
        let marked = tree.parent(id).is_none()
            || tree.name(id).is_some()
            || !tree.collapsed_children(id).is_empty();
        if marked {
            let fill = if folded { NODE_COLOR } else { Color::WHITE };
            out.push(
                ElementSpec::new(
                    format!("node-{key}"),
                    Shape::Circle {
                        center: Point::ORIGIN,
                        radius,
                    },
                    Style {
                        fill: Some(fill),
                        stroke: Some(NODE_COLOR),
                        stroke_width: 1.5,
                        class: Some(class),
                        ..Style::default()
                    },
                )
                .with_transform(at),
            );
        }

        if tree.has_children(id) || tree.is_aggregated(id) {
            let r = (radius * 0.9).min(MAX_CROSS);
            let mut cross = BezPath::new();
            cross.move_to((-r, 0.0));
            cross.line_to((r, 0.0));
            cross.move_to((0.0, -r));
            cross.line_to((0.0, r));
            let color = if folded { Color::WHITE } else { NODE_COLOR };
            out.push(
                ElementSpec::new(
                    format!("cross-{key}"),
                    Shape::Path(cross),
                    Style::stroke(color, 1.5).with_class("cross"),
                )
                .with_transform(at),
            );
        }

        let use_common = self.options.use_common_name;
        if let Some(text) = tree.label(id, use_common) {
            let expanded = !tree.children(id).is_empty();
            let (origin, anchor) = if expanded {
                (Point::new(0.0, -4.0 - 1.3 * radius), TextAnchor::Middle)
            } else {
                (Point::new(4.0 + 1.3 * radius, 0.0), TextAnchor::Start)
            };
            let missing = use_common && tree.common_name(id).is_none();
            let mut style = Style {
                font_size: sizes.font.map(score),
                text_anchor: anchor,
                middle_baseline: !expanded,
                ..Style::fill(Color::BLACK)
            };
            if missing {
                style = style.with_class("name-missing");
            }
            out.push(
                ElementSpec::new(
                    format!("label-{key}"),
                    Shape::Text {
                        origin,
                        content: text.to_owned(),
                    },
                    style,
                )
                .with_transform(at),
            );
        }
        out
    }
}

impl Chart for TidyTree {
    fn surface(&self) -> &ChartSurface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut ChartSurface {
        &mut self.surface
    }

    fn update(&mut self) {
        self.controller.reset();
        self.redraw(None);
    }

    fn set_options(&mut self, patch: &Value) -> Result<(), ChartError> {
        let patched = merge_patch(&self.options, patch)?;
        if patched.changed.is_empty() {
            return Ok(());
        }
        self.options = patched.options.clone();
        self.surface.set_frame_offset(self.options.margins.offset());
        if patched.touched(&["transitionDurationMs"]) {
            let d = Duration::from_millis(self.options.transition_duration_ms);
            self.links.set_duration(d);
            self.nodes.set_duration(d);
        }
        if patched.touched(&[
            "attribute",
            "collapseThreshold",
            "minNonCollapsableChildren",
            "collapsed",
        ]) {
            self.sort();
        }
        self.update();
        Ok(())
    }

    fn handle_pointer(&mut self, event: PointerEvent) -> Response {
        let mut dispatch = Dispatch {
            tree: &self.tree,
            callbacks: &mut self.callbacks,
            clicked: None,
            dragged: Vec::new(),
        };
        let response = self.controller.handle(event, &self.index, &mut dispatch);
        let Dispatch {
            clicked, dragged, ..
        } = dispatch;

        if !dragged.is_empty() {
            for (id, delta) in dragged {
                if self.tree.is_alive(id) {
                    *self.offsets.entry(self.tree.key(id).to_owned()).or_default() += delta;
                }
            }
            self.draw_immediate();
        }
        if let Some(id) = clicked {
            self.toggle(id);
        }
        response
    }

    fn advance(&mut self, now: HostTime) -> bool {
        self.surface.set_now(now);
        let store = self.surface.store_mut();
        let links = self.links.advance(store, now);
        let nodes = self.nodes.advance(store, now);
        self.surface.stepped(links || nodes);
        links || nodes
    }

    fn cursor_location(&self) -> Option<Point> {
        self.controller.cursor_location()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use genoviz_core::scene::ElementKey;
    use serde_json::json;

    use super::*;

    const ATTR: &str = "aggregatescore";

    fn rec(id: &str, parent: Option<&str>, score: f64) -> TreeRecord {
        TreeRecord::new(id, parent).with_value(ATTR, score)
    }

    /// Three leaves, all visible under the default collapse settings.
    fn records() -> Vec<TreeRecord> {
        vec![
            rec("root", None, 100.0),
            rec("a", Some("root"), 90.0),
            rec("b", Some("root"), 80.0),
            rec("a1", Some("a"), 90.0),
            rec("a2", Some("a"), 70.0),
            rec("b1", Some("b"), 80.0),
        ]
    }

    fn chart(callbacks: TreeCallbacks) -> TidyTree {
        TidyTree::new(records(), TidyTreeOptions::default(), callbacks).unwrap()
    }

    fn live_keys(layer: &Reconciler) -> Vec<String> {
        layer.live().iter().map(|s| s.key.as_str().to_owned()).collect()
    }

    /// Surface position of a node.
    fn screen(chart: &TidyTree, key: &str) -> Point {
        let id = chart.tree().find(key).unwrap();
        chart.placed(id) + chart.options().margins.offset()
    }

    fn click(chart: &mut TidyTree, at: Point) {
        chart.handle_pointer(PointerEvent::down(at));
        chart.handle_pointer(PointerEvent::up(at));
    }

    #[test]
    fn draws_every_visible_node_and_link() {
        let chart = chart(TreeCallbacks::default());
        assert_eq!(chart.links.live().len(), 5);
        let keys = live_keys(&chart.nodes);
        for key in ["root", "a", "b", "a1", "a2", "b1"] {
            assert!(keys.contains(&format!("node-{key}")), "{key} has a marker");
            assert!(keys.contains(&format!("label-{key}")), "{key} has a label");
        }
        assert!(keys.contains(&"cross-a".to_owned()));
        assert!(!keys.contains(&"cross-a1".to_owned()), "leaves have no cross");

        // 300 px minimum height beats 3 × 35 px of leaves.
        assert_eq!(
            chart.surface().size(),
            Size::new(960.0 + 240.0, 300.0 + 40.0)
        );
    }

    #[test]
    fn labels_sit_above_expanded_nodes_and_beside_leaves() {
        let chart = chart(TreeCallbacks::default());
        let label = |key: &str| {
            chart
                .nodes
                .live()
                .iter()
                .find(|s| s.key.as_str() == format!("label-{key}"))
                .map(|s| (s.style.text_anchor, s.style.middle_baseline))
        };
        assert_eq!(label("a"), Some((TextAnchor::Middle, false)));
        assert_eq!(label("a1"), Some((TextAnchor::Start, true)));
    }

    #[test]
    fn clicking_a_node_collapses_it_into_place() {
        let changed = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&changed);
        let mut chart = chart(
            TreeCallbacks::default()
                .on_collapsed_state_change(move |tree, id| seen.borrow_mut().push(tree.key(id).to_owned())),
        );
        let a = screen(&chart, "a");
        click(&mut chart, a);

        assert_eq!(*changed.borrow(), ["a"]);
        let id = chart.tree().find("a").unwrap();
        assert_eq!(chart.tree().state(id), NodeState::Collapsed);
        assert!(
            chart.nodes.is_exiting(&ElementKey::from("node-a1")),
            "children fold away over the transition"
        );

        chart.advance(HostTime::from_millis(600));
        assert!(chart.nodes.element(&ElementKey::from("node-a1")).is_none());
        assert!(!chart.advance(HostTime::from_millis(700)));

        let p = screen(&chart, "a");
        click(&mut chart, p);
        assert_eq!(chart.tree().state(id), NodeState::Expanded);
        assert_eq!(*changed.borrow(), ["a", "a"]);
    }

    #[test]
    fn entering_nodes_grow_out_of_the_toggled_node() {
        let mut chart = chart(TreeCallbacks::default());
        let p = screen(&chart, "b");
        click(&mut chart, p);
        chart.advance(HostTime::from_millis(1_000));

        let p = screen(&chart, "b");
        click(&mut chart, p);
        let b = chart.tree().find("b").unwrap();
        let from = chart.tree().previous_position(b);
        let spec = chart
            .nodes
            .live()
            .iter()
            .find(|s| s.key.as_str() == "node-b1")
            .cloned()
            .unwrap();
        assert_eq!(spec.enter, Motion::Anchor(from));
    }

    #[test]
    fn clicking_a_leaf_changes_nothing() {
        let count = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&count);
        let mut chart = chart(
            TreeCallbacks::default().on_collapsed_state_change(move |_, _| *seen.borrow_mut() += 1),
        );
        let p = screen(&chart, "b1");
        click(&mut chart, p);
        assert_eq!(*count.borrow(), 0);
        assert_eq!(chart.tree().visible().len(), 6);
    }

    #[test]
    fn hover_reports_the_node_under_the_pointer() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (enter, leave) = (log.clone(), log.clone());
        let mut chart = chart(
            TreeCallbacks::default()
                .on_node_enter(move |tree, id| enter.borrow_mut().push(tree.key(id).to_owned()))
                .on_node_leave(move || leave.borrow_mut().push("leave".to_owned())),
        );
        let b1 = screen(&chart, "b1");
        chart.handle_pointer(PointerEvent::moved(b1 + Vec2::new(2.0, 1.0)));
        chart.handle_pointer(PointerEvent::moved(Point::new(1.0, 1.0)));
        assert_eq!(*log.borrow(), ["b1", "leave"]);
    }

    #[test]
    fn dragging_a_node_offsets_it_without_toggling() {
        let mut chart = chart(TreeCallbacks::default());
        let start = screen(&chart, "a1");
        chart.handle_pointer(PointerEvent::down(start));
        chart.handle_pointer(PointerEvent::moved(start + Vec2::new(0.0, 20.0)));
        chart.handle_pointer(PointerEvent::up(start + Vec2::new(0.0, 20.0)));

        assert_eq!(chart.drag_offset("a1"), Vec2::new(0.0, 20.0));
        let id = chart.tree().find("a1").unwrap();
        let marker = chart
            .nodes
            .live()
            .iter()
            .find(|s| s.key.as_str() == "node-a1")
            .map(|s| s.transform.translation());
        assert_eq!(
            marker,
            Some(chart.tree().position(id).to_vec2() + Vec2::new(0.0, 20.0))
        );
        assert_eq!(chart.tree().visible().len(), 6, "a drag is not a click");

        chart.set_tree(records()).unwrap();
        assert_eq!(chart.drag_offset("a1"), Vec2::ZERO);
    }

    #[test]
    fn set_tree_resets_collapse_state() {
        let created = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&created);
        let mut chart = chart(TreeCallbacks::default().on_created_tree(move |_| *seen.borrow_mut() += 1));
        let p = screen(&chart, "root");
        click(&mut chart, p);
        assert_eq!(chart.tree().visible().len(), 1);

        chart.set_tree(records()).unwrap();
        assert_eq!(chart.tree().visible().len(), 6);
        assert_eq!(*created.borrow(), 2);
    }

    #[test]
    fn missing_attribute_draws_nothing() {
        let mut chart = TidyTree::new(
            records(),
            TidyTreeOptions {
                attribute: None,
                ..TidyTreeOptions::default()
            },
            TreeCallbacks::default(),
        )
        .unwrap();
        assert!(chart.nodes.live().is_empty());
        assert!(chart.links.live().is_empty());

        chart.set_options(&json!({ "attribute": ATTR })).unwrap();
        assert_eq!(chart.links.live().len(), 5);
    }

    #[test]
    fn invalid_records_are_rejected() {
        let result = TidyTree::new(
            vec![rec("a", Some("missing"), 1.0)],
            TidyTreeOptions::default(),
            TreeCallbacks::default(),
        );
        assert!(matches!(result, Err(ChartError::Stratify(_))));
    }
}
