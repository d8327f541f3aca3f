// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed reconciliation of desired elements against a retained group.
//!
//! A [`Reconciler`] owns the keyed children of one group element. Each call
//! to [`Reconciler::reconcile`] partitions the desired set into enter,
//! update and exit by [`ElementKey`], then creates, retargets or retires
//! elements so the group converges on the desired state over the configured
//! duration.
//!
//! Every keyed element has at most one running [`Transition`]. Starting a
//! new one replaces the old from the current interpolated state, so
//! superseded animations never linger.

use std::collections::{BTreeMap, HashSet};

use kurbo::{Affine, Point};

use super::id::{ElementId, ElementKey};
use super::shape::{Shape, Style};
use super::store::SceneStore;
use super::transition::{Transition, Visual};
use crate::time::{Duration, HostTime};

/// How an element appears or disappears.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Motion {
    /// No animation.
    #[default]
    Immediate,
    /// Opacity animates from or to zero in place.
    Fade,
    /// Geometry collapses onto (or grows out of) a point while fading.
    ///
    /// Shapes should be built around the local origin and positioned with
    /// the transform's translation so the motion is a straight line.
    Anchor(Point),
}

/// One desired element.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSpec {
    /// Stable identity across reconciles.
    pub key: ElementKey,
    /// Geometry.
    pub shape: Shape,
    /// Paint.
    pub style: Style,
    /// Local transform.
    pub transform: Affine,
    /// Local opacity.
    pub opacity: f32,
    /// How the element appears when its key is new.
    pub enter: Motion,
    /// How the element disappears when its key goes away.
    pub exit: Motion,
}

impl ElementSpec {
    /// Creates an opaque, untransformed spec with immediate enter and exit.
    pub fn new(key: impl Into<ElementKey>, shape: Shape, style: Style) -> Self {
        Self {
            key: key.into(),
            shape,
            style,
            transform: Affine::IDENTITY,
            opacity: 1.0,
            enter: Motion::Immediate,
            exit: Motion::Immediate,
        }
    }

    /// Sets the local transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the local opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Fades in on enter and out on exit.
    #[must_use]
    pub fn faded(mut self) -> Self {
        self.enter = Motion::Fade;
        self.exit = Motion::Fade;
        self
    }

    /// Grows out of `enter` and collapses onto `exit`.
    #[must_use]
    pub fn anchored(mut self, enter: Point, exit: Point) -> Self {
        self.enter = Motion::Anchor(enter);
        self.exit = Motion::Anchor(exit);
        self
    }

    /// Returns the final visual state.
    #[must_use]
    pub fn visual(&self) -> Visual {
        Visual {
            transform: self.transform,
            opacity: self.opacity,
            shape: self.shape.clone(),
            style: self.style.clone(),
        }
    }

    fn same_visual(&self, other: &Self) -> bool {
        self.shape == other.shape
            && self.style == other.style
            && self.transform == other.transform
            && self.opacity == other.opacity
    }
}

/// Returns `visual` moved into its enter or exit pose for `motion`.
fn posed(visual: &Visual, motion: Motion) -> Visual {
    match motion {
        Motion::Immediate => visual.clone(),
        Motion::Fade => Visual {
            opacity: 0.0,
            ..visual.clone()
        },
        Motion::Anchor(p) => Visual {
            transform: visual.transform.with_translation(p.to_vec2()),
            opacity: 0.0,
            shape: visual.shape.collapsed_at(Point::ORIGIN),
            style: visual.style.clone(),
        },
    }
}

/// Keys partitioned by what a reconcile does to them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    /// Keys present only in the new set, in new-set order.
    pub enter: Vec<ElementKey>,
    /// Keys in both sets whose visual state changed, in new-set order.
    pub update: Vec<ElementKey>,
    /// Keys present only in the old set, in old-set order.
    pub exit: Vec<ElementKey>,
}

impl Delta {
    /// Returns `true` if the reconcile changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enter.is_empty() && self.update.is_empty() && self.exit.is_empty()
    }
}

/// Partitions `next` against `prev` by key.
///
/// Duplicate keys in either set count once (the first occurrence).
#[must_use]
pub fn diff(prev: &[ElementSpec], next: &[ElementSpec]) -> Delta {
    let mut old: BTreeMap<&ElementKey, &ElementSpec> = BTreeMap::new();
    for spec in prev {
        old.entry(&spec.key).or_insert(spec);
    }
    let mut seen = HashSet::new();
    let mut delta = Delta::default();
    for spec in next {
        if !seen.insert(&spec.key) {
            continue;
        }
        match old.get(&spec.key) {
            None => delta.enter.push(spec.key.clone()),
            Some(before) if !before.same_visual(spec) => delta.update.push(spec.key.clone()),
            Some(_) => {}
        }
    }
    let mut gone = HashSet::new();
    for spec in prev {
        if !seen.contains(&spec.key) && gone.insert(&spec.key) {
            delta.exit.push(spec.key.clone());
        }
    }
    delta
}

#[derive(Debug)]
struct Entry {
    id: ElementId,
    exiting: bool,
    transition: Option<Transition>,
}

/// Maintains the keyed children of one group element.
#[derive(Debug)]
pub struct Reconciler {
    group: ElementId,
    duration: Duration,
    live: Vec<ElementSpec>,
    entries: BTreeMap<ElementKey, Entry>,
}

impl Reconciler {
    /// Creates a reconciler for the children of `group`.
    #[must_use]
    pub fn new(group: ElementId, duration: Duration) -> Self {
        Self {
            group,
            duration,
            live: Vec::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Returns the managed group.
    #[must_use]
    pub fn group(&self) -> ElementId {
        self.group
    }

    /// Returns the transition duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Sets the transition duration for subsequent reconciles.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Returns the desired set from the last reconcile.
    #[must_use]
    pub fn live(&self) -> &[ElementSpec] {
        &self.live
    }

    /// Returns the element for `key`, including elements still exiting.
    #[must_use]
    pub fn element(&self, key: &ElementKey) -> Option<ElementId> {
        self.entries.get(key).map(|e| e.id)
    }

    /// Returns whether `key` is animating out.
    #[must_use]
    pub fn is_exiting(&self, key: &ElementKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.exiting)
    }

    /// Returns the number of managed elements, including exiting ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no elements are managed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` while any transition is running.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.entries.values().any(|e| e.transition.is_some())
    }

    /// Converges the group on `next`, using each element's own exit motion.
    pub fn reconcile(
        &mut self,
        store: &mut SceneStore,
        next: Vec<ElementSpec>,
        now: HostTime,
    ) -> Delta {
        self.reconcile_with(store, next, now, |spec| spec.exit)
    }

    /// Like [`reconcile`](Self::reconcile), but `exit_motion` picks the exit
    /// motion of each departing element from its last desired spec.
    pub fn reconcile_with(
        &mut self,
        store: &mut SceneStore,
        next: Vec<ElementSpec>,
        now: HostTime,
        exit_motion: impl Fn(&ElementSpec) -> Motion,
    ) -> Delta {
        // Bring running transitions up to `now` so retargets start from the
        // on-screen state.
        self.advance(store, now);

        let mut seen = HashSet::new();
        let next: Vec<ElementSpec> = next
            .into_iter()
            .filter(|spec| {
                let fresh = seen.insert(spec.key.clone());
                if !fresh {
                    tracing::debug!(key = %spec.key, "duplicate element key ignored");
                }
                fresh
            })
            .collect();

        let delta = diff(&self.live, &next);
        let prev = core::mem::take(&mut self.live);
        let animate = self.duration != Duration::ZERO;

        for spec in &next {
            let target = spec.visual();
            match self.entries.get_mut(&spec.key) {
                Some(entry) => {
                    let revived = entry.exiting;
                    entry.exiting = false;
                    let current = current_visual(store, entry.id);
                    if current == target {
                        entry.transition = None;
                    } else if animate {
                        entry.transition =
                            Some(Transition::new(current, target, now, self.duration));
                    } else {
                        entry.transition = None;
                        apply(store, entry.id, &target);
                    }
                    if revived {
                        tracing::trace!(key = %spec.key, "revived exiting element");
                    }
                }
                None => {
                    let id = store.create_child(self.group, spec.shape.clone(), spec.style.clone());
                    let transition = if animate && spec.enter != Motion::Immediate {
                        let start = posed(&target, spec.enter);
                        apply(store, id, &start);
                        Some(Transition::new(start, target, now, self.duration))
                    } else {
                        apply(store, id, &target);
                        None
                    };
                    self.entries.insert(
                        spec.key.clone(),
                        Entry {
                            id,
                            exiting: false,
                            transition,
                        },
                    );
                }
            }
        }

        for spec in prev.iter().filter(|s| delta.exit.contains(&s.key)) {
            let Some(entry) = self.entries.get_mut(&spec.key) else {
                continue;
            };
            let motion = exit_motion(spec);
            if !animate || motion == Motion::Immediate {
                let id = entry.id;
                self.entries.remove(&spec.key);
                retire(store, id);
                continue;
            }
            let current = current_visual(store, entry.id);
            let end = posed(&current, motion);
            entry.exiting = true;
            entry.transition = Some(Transition::new(current, end, now, self.duration));
        }

        self.reorder(store, &next);
        self.live = next;

        tracing::debug!(
            enter = delta.enter.len(),
            update = delta.update.len(),
            exit = delta.exit.len(),
            "reconciled"
        );
        delta
    }

    /// Steps running transitions to `now`, destroying elements whose exit
    /// has finished. Returns `true` while any transition remains.
    pub fn advance(&mut self, store: &mut SceneStore, now: HostTime) -> bool {
        self.step(store, Some(now))
    }

    /// Jumps every running transition to its end state.
    pub fn finish(&mut self, store: &mut SceneStore) {
        self.step(store, None);
    }

    /// Destroys every managed element without animation.
    pub fn clear(&mut self, store: &mut SceneStore) {
        for entry in core::mem::take(&mut self.entries).into_values() {
            retire(store, entry.id);
        }
        self.live.clear();
    }

    fn step(&mut self, store: &mut SceneStore, now: Option<HostTime>) -> bool {
        let mut finished_exits = Vec::new();
        for (key, entry) in &mut self.entries {
            let Some(transition) = &entry.transition else {
                continue;
            };
            let (visual, done) = match now {
                Some(now) => transition.sample(now),
                None => (transition.to.clone(), true),
            };
            apply(store, entry.id, &visual);
            if done {
                entry.transition = None;
                if entry.exiting {
                    finished_exits.push(key.clone());
                }
            }
        }
        for key in finished_exits {
            if let Some(entry) = self.entries.remove(&key) {
                retire(store, entry.id);
            }
        }
        self.is_animating()
    }

    fn reorder(&self, store: &mut SceneStore, next: &[ElementSpec]) {
        let desired: Vec<ElementId> = next
            .iter()
            .filter_map(|spec| self.entries.get(&spec.key).map(|e| e.id))
            .collect();
        let exiting: HashSet<ElementId> = self
            .entries
            .values()
            .filter(|e| e.exiting)
            .map(|e| e.id)
            .collect();
        let current: Vec<ElementId> = store
            .children(self.group)
            .filter(|id| !exiting.contains(id))
            .collect();
        if current == desired {
            return;
        }
        for id in desired {
            store.move_to_back(id);
        }
    }
}

fn current_visual(store: &SceneStore, id: ElementId) -> Visual {
    Visual {
        transform: store.local_transform(id),
        opacity: store.local_opacity(id),
        shape: store.shape(id).clone(),
        style: store.style(id).clone(),
    }
}

fn apply(store: &mut SceneStore, id: ElementId, visual: &Visual) {
    store.set_transform(id, visual.transform);
    store.set_opacity(id, visual.opacity);
    store.set_shape(id, visual.shape.clone());
    store.set_style(id, visual.style.clone());
}

fn retire(store: &mut SceneStore, id: ElementId) {
    store.clear_children(id);
    store.remove_from_parent(id);
    store.destroy_element(id);
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Vec2};

    use super::*;
    use crate::color::Color;

    fn bar(key: &str, x: f64) -> ElementSpec {
        ElementSpec::new(
            key,
            Shape::Rect(Rect::new(x, 0.0, x + 10.0, 50.0)),
            Style::fill(Color::rgb(0x38, 0x67, 0xfa)),
        )
        .faded()
    }

    fn setup(ms: u64) -> (SceneStore, Reconciler) {
        let mut store = SceneStore::new();
        let group = store.create_element();
        let rec = Reconciler::new(group, Duration::from_millis(ms));
        (store, rec)
    }

    fn t(ms: u64) -> HostTime {
        HostTime::from_millis(ms)
    }

    #[test]
    fn diff_partitions_by_key() {
        let prev = vec![bar("a", 0.0), bar("b", 10.0), bar("c", 20.0)];
        let next = vec![bar("b", 10.0), bar("c", 25.0), bar("d", 30.0)];
        let delta = diff(&prev, &next);
        assert_eq!(delta.enter, vec![ElementKey::from("d")]);
        assert_eq!(delta.update, vec![ElementKey::from("c")], "b is unchanged");
        assert_eq!(delta.exit, vec![ElementKey::from("a")]);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let (mut store, mut rec) = setup(200);
        let specs = vec![bar("a", 0.0), bar("b", 10.0)];
        let first = rec.reconcile(&mut store, specs.clone(), t(0));
        assert_eq!(first.enter.len(), 2);
        let second = rec.reconcile(&mut store, specs, t(10));
        assert!(second.is_empty(), "identical input yields no delta");
        assert_eq!(rec.len(), 2);
    }

    #[test]
    fn fade_enter_runs_to_full_opacity() {
        let (mut store, mut rec) = setup(200);
        let _ = rec.reconcile(&mut store, vec![bar("a", 0.0)], t(0));
        let id = rec.element(&"a".into()).unwrap();
        assert_eq!(store.local_opacity(id), 0.0, "starts transparent");
        assert_eq!(store.shape(id), &bar("a", 0.0).shape, "at final geometry");

        assert!(rec.advance(&mut store, t(100)));
        assert!((store.local_opacity(id) - 0.5).abs() < 1e-6);
        assert!(!rec.advance(&mut store, t(200)), "done");
        assert_eq!(store.local_opacity(id), 1.0);
    }

    #[test]
    fn exit_elements_are_destroyed_when_their_transition_ends() {
        let (mut store, mut rec) = setup(200);
        let _ = rec.reconcile(&mut store, vec![bar("a", 0.0), bar("b", 10.0)], t(0));
        rec.finish(&mut store);
        let b = rec.element(&"b".into()).unwrap();

        let delta = rec.reconcile(&mut store, vec![bar("a", 0.0)], t(1000));
        assert_eq!(delta.exit, vec![ElementKey::from("b")]);
        assert!(rec.is_exiting(&"b".into()));
        assert!(store.is_alive(b), "still fading out");

        let _ = rec.advance(&mut store, t(1100));
        assert!(store.is_alive(b));
        let _ = rec.advance(&mut store, t(1200));
        assert!(!store.is_alive(b), "destroyed at the end of its exit");
        assert!(rec.element(&"b".into()).is_none());
    }

    #[test]
    fn reentering_mid_exit_revives_the_element() {
        let (mut store, mut rec) = setup(200);
        let _ = rec.reconcile(&mut store, vec![bar("a", 0.0)], t(0));
        rec.finish(&mut store);
        let a = rec.element(&"a".into()).unwrap();

        let _ = rec.reconcile(&mut store, vec![], t(1000));
        let _ = rec.advance(&mut store, t(1100));
        let halfway = store.local_opacity(a);
        assert!(halfway > 0.0 && halfway < 1.0);

        let delta = rec.reconcile(&mut store, vec![bar("a", 0.0)], t(1100));
        assert_eq!(delta.enter, vec![ElementKey::from("a")]);
        assert_eq!(rec.element(&"a".into()), Some(a), "same element, not a new one");
        assert!(!rec.is_exiting(&"a".into()));
        assert!(
            (store.local_opacity(a) - halfway).abs() < 1e-6,
            "retargets from the interpolated state"
        );

        let _ = rec.advance(&mut store, t(1300));
        assert!(store.is_alive(a));
        assert_eq!(store.local_opacity(a), 1.0);
    }

    #[test]
    fn zero_duration_applies_immediately() {
        let (mut store, mut rec) = setup(0);
        let _ = rec.reconcile(&mut store, vec![bar("a", 0.0)], t(0));
        let a = rec.element(&"a".into()).unwrap();
        assert_eq!(store.local_opacity(a), 1.0);
        assert!(!rec.is_animating());

        let _ = rec.reconcile(&mut store, vec![], t(1));
        assert!(!store.is_alive(a), "removed without a transition");
        assert!(rec.is_empty());
    }

    #[test]
    fn anchor_motion_moves_from_the_anchor() {
        let (mut store, mut rec) = setup(100);
        let node = ElementSpec::new(
            "n",
            Shape::Circle {
                center: Point::ORIGIN,
                radius: 6.0,
            },
            Style::default(),
        )
        .with_transform(Affine::translate((100.0, 40.0)))
        .anchored(Point::new(0.0, 40.0), Point::new(0.0, 40.0));

        let _ = rec.reconcile(&mut store, vec![node], t(0));
        let id = rec.element(&"n".into()).unwrap();
        assert_eq!(store.local_transform(id).translation(), Vec2::new(0.0, 40.0));
        assert_eq!(
            store.shape(id),
            &Shape::Circle {
                center: Point::ORIGIN,
                radius: 0.0
            }
        );
        let _ = rec.advance(&mut store, t(50));
        assert_eq!(store.local_transform(id).translation(), Vec2::new(50.0, 40.0));
    }

    #[test]
    fn children_follow_the_desired_order() {
        let (mut store, mut rec) = setup(0);
        let group = rec.group();
        let _ = rec.reconcile(&mut store, vec![bar("a", 0.0), bar("b", 10.0)], t(0));
        let _ = rec.reconcile(&mut store, vec![bar("b", 10.0), bar("a", 0.0)], t(1));
        let order: Vec<_> = store.children(group).collect();
        assert_eq!(
            order,
            vec![
                rec.element(&"b".into()).unwrap(),
                rec.element(&"a".into()).unwrap()
            ]
        );
    }

    #[test]
    fn duplicate_keys_count_once() {
        let (mut store, mut rec) = setup(0);
        let delta = rec.reconcile(&mut store, vec![bar("a", 0.0), bar("a", 50.0)], t(0));
        assert_eq!(delta.enter.len(), 1);
        assert_eq!(store.children(rec.group()).count(), 1);
    }
}
