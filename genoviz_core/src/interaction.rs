// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer interaction: hover, outline, drag and wheel.
//!
//! An [`InteractionController`] turns raw [`PointerEvent`]s into semantic
//! callbacks on an [`InteractionHandler`]. Pointer positions arrive in
//! surface coordinates; the controller maps them through the inverse of its
//! [`ZoomTransform`] before asking a [`HitTester`], so indexes are always
//! built from untransformed scene geometry.
//!
//! The controller never touches the scene. It reports what changed through a
//! [`Response`] and the engine decides what to redraw.

use kurbo::{Point, Size, Vec2};

use crate::hit::HitTester;
use crate::transform::ZoomTransform;

/// What the wheel does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WheelMode {
    /// Wheel events are ignored.
    #[default]
    None,
    /// Zoom about the pointer.
    Zoom,
    /// Pan by the wheel delta.
    Pan,
}

/// Kind of pointer event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEventKind {
    /// The pointer moved.
    Move,
    /// The primary button went down.
    Down,
    /// The primary button went up.
    Up,
    /// Wheel scroll with the given delta in pixels.
    Wheel(Vec2),
    /// The pointer left the surface.
    Leave,
}

/// A pointer event delivered to an engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// What happened.
    pub kind: PointerEventKind,
    /// Position relative to the chart surface.
    pub position: Point,
    /// Position in page (client) coordinates, passed through to hover
    /// callbacks for tooltip placement.
    pub client: Point,
}

impl PointerEvent {
    fn at(kind: PointerEventKind, position: Point) -> Self {
        Self {
            kind,
            position,
            client: position,
        }
    }

    /// A move to `position`.
    #[must_use]
    pub fn moved(position: Point) -> Self {
        Self::at(PointerEventKind::Move, position)
    }

    /// A button press at `position`.
    #[must_use]
    pub fn down(position: Point) -> Self {
        Self::at(PointerEventKind::Down, position)
    }

    /// A button release at `position`.
    #[must_use]
    pub fn up(position: Point) -> Self {
        Self::at(PointerEventKind::Up, position)
    }

    /// A wheel scroll at `position`.
    #[must_use]
    pub fn wheel(position: Point, delta: Vec2) -> Self {
        Self::at(PointerEventKind::Wheel(delta), position)
    }

    /// The pointer leaving the surface.
    #[must_use]
    pub fn leave() -> Self {
        Self::at(PointerEventKind::Leave, Point::ZERO)
    }

    /// Returns the event with its client position set.
    #[must_use]
    pub fn with_client(mut self, client: Point) -> Self {
        self.client = client;
        self
    }
}

/// Receives semantic interaction callbacks. Every method defaults to a
/// no-op.
pub trait InteractionHandler<T> {
    /// The pointer moved onto `target`.
    fn on_enter(&mut self, target: T) {
        _ = target;
    }

    /// The pointer moved off `target`.
    fn on_leave(&mut self, target: T) {
        _ = target;
    }

    /// The pointer moved while over `target`.
    fn on_hover(&mut self, target: T, client: Point) {
        _ = (target, client);
    }

    /// A click landed on `target`, or on empty space.
    fn on_click(&mut self, target: Option<T>) {
        _ = target;
    }

    /// A drag began at scene position `at`.
    fn on_drag_start(&mut self, target: Option<T>, at: Point) {
        _ = (target, at);
    }

    /// A target drag moved by `delta` scene units.
    fn on_drag(&mut self, target: Option<T>, delta: Vec2) {
        _ = (target, delta);
    }

    /// A drag ended.
    fn on_drag_end(&mut self, target: Option<T>) {
        _ = target;
    }

    /// The zoom transform changed.
    fn on_zoom(&mut self, transform: ZoomTransform) {
        _ = transform;
    }
}

/// An [`InteractionHandler`] that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHandler;

impl<T> InteractionHandler<T> for NoopHandler {}

/// Controller settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionConfig {
    /// Pointer travel in pixels before a press becomes a drag.
    pub drag_threshold: f64,
    /// Wheel behavior.
    pub wheel: WheelMode,
    /// Whether dragging empty space pans.
    pub pan_on_drag: bool,
    /// Whether dragging a target reports `on_drag` for it.
    pub drag_targets: bool,
    /// Allowed zoom scale range.
    pub scale_extent: (f64, f64),
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3.0,
            wheel: WheelMode::None,
            pan_on_drag: false,
            drag_targets: false,
            scale_extent: (0.1, 10.0),
        }
    }
}

/// What a single event changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Response {
    /// The hovered target changed.
    pub hover_changed: bool,
    /// The outlined target changed.
    pub outline_changed: bool,
    /// The zoom transform changed.
    pub zoom_changed: bool,
    /// A target was dragged.
    pub dragged: bool,
    /// A click was produced.
    pub clicked: bool,
}

impl Response {
    /// Returns `true` if anything visible may have changed.
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.hover_changed || self.outline_changed || self.zoom_changed || self.dragged
    }
}

#[derive(Clone, Copy, Debug)]
struct Drag<T> {
    start: Point,
    last: Point,
    target: Option<T>,
    active: bool,
}

/// Per-chart hover, outline, drag and zoom state.
#[derive(Clone, Debug)]
pub struct InteractionController<T> {
    config: InteractionConfig,
    hovered: Option<T>,
    outlined: Option<T>,
    drag: Option<Drag<T>>,
    zoom: ZoomTransform,
    bounds: Option<(Size, Size)>,
    cursor: Option<Point>,
}

impl<T: Copy + PartialEq + core::fmt::Debug> Default for InteractionController<T> {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

impl<T: Copy + PartialEq + core::fmt::Debug> InteractionController<T> {
    /// Creates a controller with the given settings.
    #[must_use]
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            hovered: None,
            outlined: None,
            drag: None,
            zoom: ZoomTransform::IDENTITY,
            bounds: None,
            cursor: None,
        }
    }

    /// Returns the settings.
    #[must_use]
    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Replaces the settings.
    pub fn set_config(&mut self, config: InteractionConfig) {
        self.config = config;
    }

    /// Returns the hovered target.
    #[must_use]
    pub fn hovered(&self) -> Option<T> {
        self.hovered
    }

    /// Returns the outlined target.
    #[must_use]
    pub fn outlined(&self) -> Option<T> {
        self.outlined
    }

    /// Outlines `target` without a click.
    pub fn set_outline(&mut self, target: Option<T>) {
        self.outlined = target;
    }

    /// Removes the outline.
    pub fn clear_outline(&mut self) {
        self.outlined = None;
    }

    /// Returns `true` while a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|d| d.active)
    }

    /// Returns the zoom transform.
    #[must_use]
    pub fn zoom(&self) -> ZoomTransform {
        self.zoom
    }

    /// Replaces the zoom transform, applying the pan bounds.
    pub fn set_zoom(&mut self, zoom: ZoomTransform) {
        self.zoom = self.constrain(zoom);
    }

    /// Limits panning so `content` (in scene units) stays inside
    /// `viewport`. `None` removes the limit.
    pub fn set_bounds(&mut self, bounds: Option<(Size, Size)>) {
        self.bounds = bounds;
        self.zoom = self.constrain(self.zoom);
    }

    /// Returns the last pointer position in scene coordinates.
    #[must_use]
    pub fn cursor_location(&self) -> Option<Point> {
        self.cursor
    }

    /// Clears hover, outline and drag state.
    ///
    /// No callbacks fire; engines call this when the data they index is
    /// replaced.
    pub fn reset(&mut self) {
        self.hovered = None;
        self.outlined = None;
        self.drag = None;
    }

    /// Dispatches one pointer event.
    pub fn handle<H, I>(&mut self, event: PointerEvent, index: &H, handler: &mut I) -> Response
    where
        H: HitTester<Target = T>,
        I: InteractionHandler<T> + ?Sized,
    {
        let mut response = Response::default();
        let scene = self.zoom.invert(event.position);
        match event.kind {
            PointerEventKind::Move => {
                self.cursor = Some(scene);
                if self.drag.is_some() {
                    self.drag_to(event.position, handler, &mut response);
                } else {
                    self.hover(index.hit(scene), event.client, handler, &mut response);
                }
            }
            PointerEventKind::Down => {
                self.drag = Some(Drag {
                    start: event.position,
                    last: event.position,
                    target: index.hit(scene),
                    active: false,
                });
            }
            PointerEventKind::Up => {
                let Some(drag) = self.drag.take() else {
                    return response;
                };
                if drag.active {
                    tracing::debug!(hit = ?drag.target, "drag end");
                    handler.on_drag_end(drag.target);
                    return response;
                }
                let hit = index.hit(scene);
                let outline = if hit.is_some() && hit == self.outlined {
                    None
                } else {
                    hit
                };
                response.outline_changed = outline != self.outlined;
                self.outlined = outline;
                response.clicked = true;
                tracing::debug!(hit = ?hit, "click");
                handler.on_click(hit);
            }
            PointerEventKind::Wheel(delta) => {
                let before = self.zoom;
                let next = match self.config.wheel {
                    WheelMode::None => before,
                    WheelMode::Zoom => {
                        let (min, max) = self.config.scale_extent;
                        before.scaled_about(event.position, (-delta.y * 0.002).exp(), min, max)
                    }
                    WheelMode::Pan => before.translated(-delta),
                };
                self.zoom = self.constrain(next);
                if self.zoom != before {
                    response.zoom_changed = true;
                    handler.on_zoom(self.zoom);
                }
            }
            PointerEventKind::Leave => {
                self.cursor = None;
                if let Some(drag) = self.drag.take()
                    && drag.active
                {
                    handler.on_drag_end(drag.target);
                }
                if let Some(prev) = self.hovered.take() {
                    response.hover_changed = true;
                    handler.on_leave(prev);
                }
            }
        }
        response
    }

    fn hover<I>(&mut self, hit: Option<T>, client: Point, handler: &mut I, response: &mut Response)
    where
        I: InteractionHandler<T> + ?Sized,
    {
        if hit != self.hovered {
            tracing::debug!(from = ?self.hovered, to = ?hit, "hover");
            if let Some(prev) = self.hovered {
                handler.on_leave(prev);
            }
            if let Some(next) = hit {
                handler.on_enter(next);
            }
            self.hovered = hit;
            response.hover_changed = true;
        }
        if let Some(target) = hit {
            handler.on_hover(target, client);
        }
    }

    fn drag_to<I>(&mut self, position: Point, handler: &mut I, response: &mut Response)
    where
        I: InteractionHandler<T> + ?Sized,
    {
        let Some(mut drag) = self.drag else {
            return;
        };
        if !drag.active {
            if (position - drag.start).hypot() <= self.config.drag_threshold {
                return;
            }
            drag.active = true;
            tracing::debug!(hit = ?drag.target, "drag start");
            handler.on_drag_start(drag.target, self.zoom.invert(drag.start));
        }
        let delta = position - drag.last;
        drag.last = position;
        match drag.target {
            Some(_) if self.config.drag_targets => {
                handler.on_drag(drag.target, delta / self.zoom.scale);
                response.dragged = true;
            }
            None if self.config.pan_on_drag => {
                let before = self.zoom;
                self.zoom = self.constrain(before.translated(delta));
                if self.zoom != before {
                    response.zoom_changed = true;
                    handler.on_zoom(self.zoom);
                }
            }
            _ => handler.on_drag(drag.target, delta / self.zoom.scale),
        }
        self.drag = Some(drag);
    }

    fn constrain(&self, zoom: ZoomTransform) -> ZoomTransform {
        match self.bounds {
            Some((content, viewport)) => zoom.constrained(content, viewport),
            None => zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::{Hit, HitPolicy, Interval, IntervalIndex};

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl InteractionHandler<Hit> for Recorder {
        fn on_enter(&mut self, target: Hit) {
            self.log.push(format!("enter {}", target.data_index));
        }
        fn on_leave(&mut self, target: Hit) {
            self.log.push(format!("leave {}", target.data_index));
        }
        fn on_hover(&mut self, target: Hit, _client: Point) {
            self.log.push(format!("hover {}", target.data_index));
        }
        fn on_click(&mut self, target: Option<Hit>) {
            self.log
                .push(format!("click {:?}", target.map(|t| t.data_index)));
        }
        fn on_drag_start(&mut self, _target: Option<Hit>, _at: Point) {
            self.log.push("drag start".into());
        }
        fn on_drag_end(&mut self, _target: Option<Hit>) {
            self.log.push("drag end".into());
        }
    }

    fn bars() -> IntervalIndex {
        IntervalIndex::build([Interval::new(0.0, 100.0, 0), Interval::new(100.0, 250.0, 1)])
    }

    fn p(x: f64) -> Point {
        Point::new(x, 10.0)
    }

    #[test]
    fn hover_fires_leave_before_enter() {
        let index = bars();
        let probe = index.probe(5.0, HitPolicy::Nearest);
        let mut ctl = InteractionController::default();
        let mut rec = Recorder::default();

        let _ = ctl.handle(PointerEvent::moved(p(50.0)), &probe, &mut rec);
        let _ = ctl.handle(PointerEvent::moved(p(60.0)), &probe, &mut rec);
        let r = ctl.handle(PointerEvent::moved(p(150.0)), &probe, &mut rec);
        assert!(r.hover_changed);
        assert_eq!(
            rec.log,
            ["enter 0", "hover 0", "hover 0", "leave 0", "enter 1", "hover 1"]
        );

        let _ = ctl.handle(PointerEvent::leave(), &probe, &mut rec);
        assert_eq!(rec.log.last().map(String::as_str), Some("leave 1"));
        assert_eq!(ctl.hovered(), None);
    }

    #[test]
    fn click_toggles_outline() {
        let index = bars();
        let probe = index.probe(5.0, HitPolicy::Nearest);
        let mut ctl = InteractionController::default();
        let mut rec = Recorder::default();

        let click = |ctl: &mut InteractionController<Hit>, rec: &mut Recorder, x: f64| {
            let _ = ctl.handle(PointerEvent::down(p(x)), &probe, rec);
            ctl.handle(PointerEvent::up(p(x)), &probe, rec)
        };

        let r = click(&mut ctl, &mut rec, 20.0);
        assert!(r.clicked && r.outline_changed);
        assert_eq!(ctl.outlined().map(|h| h.data_index), Some(0));

        let _ = click(&mut ctl, &mut rec, 20.0);
        assert_eq!(ctl.outlined(), None, "second click on the same bar clears");

        let _ = click(&mut ctl, &mut rec, 20.0);
        let _ = click(&mut ctl, &mut rec, 400.0);
        assert_eq!(ctl.outlined(), None, "dead space clears");
        assert_eq!(rec.log.last().map(String::as_str), Some("click None"));
    }

    #[test]
    fn drag_beyond_threshold_produces_no_click() {
        let index = bars();
        let probe = index.probe(5.0, HitPolicy::Nearest);
        let mut ctl = InteractionController::default();
        let mut rec = Recorder::default();

        let _ = ctl.handle(PointerEvent::down(p(20.0)), &probe, &mut rec);
        let _ = ctl.handle(PointerEvent::moved(p(22.0)), &probe, &mut rec);
        assert!(!ctl.is_dragging(), "within threshold");
        let _ = ctl.handle(PointerEvent::moved(p(30.0)), &probe, &mut rec);
        assert!(ctl.is_dragging());
        let r = ctl.handle(PointerEvent::up(p(30.0)), &probe, &mut rec);
        assert!(!r.clicked);
        assert_eq!(rec.log, ["drag start", "drag end"]);
        assert_eq!(ctl.outlined(), None);
    }

    #[test]
    fn small_wobble_still_clicks() {
        let index = bars();
        let probe = index.probe(5.0, HitPolicy::Nearest);
        let mut ctl = InteractionController::default();
        let mut rec = Recorder::default();
        let _ = ctl.handle(PointerEvent::down(p(20.0)), &probe, &mut rec);
        let _ = ctl.handle(PointerEvent::moved(p(23.0)), &probe, &mut rec);
        let r = ctl.handle(PointerEvent::up(p(23.0)), &probe, &mut rec);
        assert!(r.clicked, "3 px is not beyond the threshold");
    }

    #[test]
    fn pointer_is_inverse_transformed_before_hit_testing() {
        let index = bars();
        let probe = index.probe(0.0, HitPolicy::Nearest);
        let mut ctl = InteractionController::default();
        ctl.set_zoom(ZoomTransform::new(Vec2::new(100.0, 0.0), 2.0));
        let mut rec = Recorder::default();

        // Screen x 400 is scene x 150, inside bar 1.
        let _ = ctl.handle(PointerEvent::moved(p(400.0)), &probe, &mut rec);
        assert_eq!(ctl.hovered().map(|h| h.data_index), Some(1));
        assert_eq!(ctl.cursor_location(), Some(Point::new(150.0, 5.0)));
    }

    #[test]
    fn wheel_zooms_about_pointer() {
        let index = bars();
        let probe = index.probe(0.0, HitPolicy::Nearest);
        let mut ctl = InteractionController::new(InteractionConfig {
            wheel: WheelMode::Zoom,
            ..InteractionConfig::default()
        });
        let mut rec = NoopHandler;
        let anchor = Point::new(50.0, 50.0);
        let r = ctl.handle(
            PointerEvent::wheel(anchor, Vec2::new(0.0, -500.0)),
            &probe,
            &mut rec,
        );
        assert!(r.zoom_changed);
        let z = ctl.zoom();
        assert!((z.scale - 1.0_f64.exp()).abs() < 1e-9);
        let fixed = z.apply(anchor);
        assert!((fixed - anchor).hypot() < 1e-9, "anchor stays put");
    }

    #[test]
    fn wheel_pans_and_respects_bounds() {
        let index = bars();
        let probe = index.probe(0.0, HitPolicy::Nearest);
        let mut ctl = InteractionController::new(InteractionConfig {
            wheel: WheelMode::Pan,
            ..InteractionConfig::default()
        });
        ctl.set_bounds(Some((Size::new(300.0, 100.0), Size::new(100.0, 100.0))));
        let mut rec = NoopHandler;
        let _ = ctl.handle(
            PointerEvent::wheel(Point::ZERO, Vec2::new(50.0, 20.0)),
            &probe,
            &mut rec,
        );
        assert_eq!(ctl.zoom().translate, Vec2::new(-50.0, 0.0));
        let _ = ctl.handle(
            PointerEvent::wheel(Point::ZERO, Vec2::new(500.0, 0.0)),
            &probe,
            &mut rec,
        );
        assert_eq!(ctl.zoom().translate.x, -200.0, "clamped to content edge");
    }

    #[test]
    fn reset_clears_interaction_state() {
        let index = bars();
        let probe = index.probe(5.0, HitPolicy::Nearest);
        let mut ctl = InteractionController::default();
        let mut rec = Recorder::default();
        let _ = ctl.handle(PointerEvent::moved(p(50.0)), &probe, &mut rec);
        let _ = ctl.handle(PointerEvent::down(p(50.0)), &probe, &mut rec);
        let _ = ctl.handle(PointerEvent::up(p(50.0)), &probe, &mut rec);
        assert!(ctl.hovered().is_some() && ctl.outlined().is_some());
        let _ = ctl.handle(PointerEvent::down(p(50.0)), &probe, &mut rec);

        ctl.reset();
        assert_eq!(ctl.hovered(), None);
        assert_eq!(ctl.outlined(), None);
        assert!(!ctl.is_dragging());
        let r = ctl.handle(PointerEvent::up(p(50.0)), &probe, &mut rec);
        assert!(!r.clicked, "press from before the reset is forgotten");
    }
}
