use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use checkmill_core::{DisposableStore, Dispose, Emitter, Tier};
use serde::{Deserialize, Serialize};

use super::{Axis, GestureEvent, GestureKind, GestureState};
use crate::host::{
    EventFlow, InputChannel, InputEvent, InputHandler, InputSource, PointerEvent, PointerId,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Distance from the press point after which the trailing click is swallowed.
    pub threshold: f64,
    /// Samples older than this (relative to the newest event) do not count toward velocity.
    pub history_max_age_ms: f64,
    /// Multiplier turning px/ms into the velocity units motion uses.
    pub unit_conversion: f64,
    /// Release speeds at or below this (px/ms) count as a stop.
    pub min_speed: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            threshold: 5.0,
            history_max_age_ms: 150.0,
            unit_conversion: 10.0,
            min_speed: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Sample {
    time: f64,
    coord: f64,
}

/// Host-free bookkeeping of one drag: deltas, click suppression and release velocity.
#[derive(Clone, Debug)]
pub struct DragTracker {
    config: DragConfig,
    start: f64,
    last: f64,
    history: VecDeque<Sample>,
    moved: bool,
}

impl DragTracker {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            start: 0.0,
            last: 0.0,
            history: VecDeque::new(),
            moved: false,
        }
    }

    pub fn begin(&mut self, coord: f64) {
        self.start = coord;
        self.last = coord;
        self.moved = false;
        self.history.clear();
    }

    /// Records a move and returns the displacement since the previous event.
    pub fn update(&mut self, coord: f64, time: f64) -> f64 {
        let diff = coord - self.last;
        self.history.push_back(Sample { time, coord });

        let horizon = time - self.config.history_max_age_ms;
        while self.history.front().is_some_and(|s| s.time < horizon) {
            self.history.pop_front();
        }

        if (coord - self.start).abs() > self.config.threshold {
            self.moved = true;
        }
        self.last = coord;
        diff
    }

    /// Ends the drag at `time`, returning the release velocity.
    pub fn finish(&mut self, time: f64) -> f64 {
        let velocity = self.release_velocity(time);
        self.history.clear();
        velocity
    }

    pub fn release_velocity(&self, time: f64) -> f64 {
        let horizon = time - self.config.history_max_age_ms;
        let mut valid = self.history.iter().filter(|s| s.time > horizon);

        let Some(first) = valid.next() else {
            return 0.0;
        };
        let Some(last) = valid.last() else {
            return 0.0;
        };

        let dt = last.time - first.time;
        if dt <= 0.0 {
            return 0.0;
        }

        let velocity = (last.coord - first.coord) / dt;
        if velocity.abs() > self.config.min_speed {
            velocity * self.config.unit_conversion
        } else {
            0.0
        }
    }

    /// Whether the pointer travelled past the click threshold since `begin`.
    pub fn moved(&self) -> bool {
        self.moved
    }

    pub fn clear_moved(&mut self) {
        self.moved = false;
    }

    pub fn sample_count(&self) -> usize {
        self.history.len()
    }
}

struct DragInner {
    input: Rc<dyn InputSource>,
    axis: Axis,
    tracker: RefCell<DragTracker>,
    active: Cell<Option<PointerId>>,
    dragged: Emitter<GestureEvent>,
    disposables: DisposableStore,
}

impl DragInner {
    fn emit(&self, state: GestureState, delta: f64) {
        self.dragged
            .emit(&GestureEvent::new(GestureKind::Drag, state, delta));
    }
}

/// Pointer drag recognizer.
///
/// Press listeners live for the whole gesture's lifetime ([`Tier::Static`]);
/// move/up/cancel/leave listeners only while a pointer is down
/// ([`Tier::Temporal`]).
#[derive(Clone)]
pub struct DragGesture {
    inner: Rc<DragInner>,
}

impl DragGesture {
    pub fn new(input: Rc<dyn InputSource>, axis: Axis, config: DragConfig) -> Self {
        Self {
            inner: Rc::new(DragInner {
                input,
                axis,
                tracker: RefCell::new(DragTracker::new(config)),
                active: Cell::new(None),
                dragged: Emitter::new(),
                disposables: DisposableStore::new(),
            }),
        }
    }

    pub fn register(&self, f: impl Fn(&GestureEvent) + 'static) -> Dispose {
        self.inner.dragged.register(f)
    }

    pub fn is_dragging(&self) -> bool {
        self.inner.active.get().is_some()
    }

    pub fn init(&self) -> Dispose {
        let inner = &self.inner;
        let weak = Rc::downgrade(inner);

        let dragged = inner.dragged.clone();
        inner.disposables.push_all(
            Tier::Static,
            [
                Dispose::new(move || dragged.clear()),
                inner
                    .input
                    .listen(InputChannel::PointerDown, pointer_handler(&weak, on_pointer_down)),
                inner
                    .input
                    .listen(InputChannel::ClickCapture, click_capture_handler(&weak)),
            ],
        );

        let inner = inner.clone();
        Dispose::new(move || {
            inner.active.set(None);
            inner.disposables.flush_all();
        })
    }
}

type PointerFn = fn(&Rc<DragInner>, &PointerEvent) -> EventFlow;

fn pointer_handler(weak: &Weak<DragInner>, f: PointerFn) -> InputHandler {
    let weak = weak.clone();
    Rc::new(move |event: &InputEvent| match (weak.upgrade(), event) {
        (Some(inner), InputEvent::Pointer(p)) => f(&inner, p),
        _ => EventFlow::empty(),
    })
}

fn click_capture_handler(weak: &Weak<DragInner>) -> InputHandler {
    let weak = weak.clone();
    Rc::new(move |_: &InputEvent| {
        let Some(inner) = weak.upgrade() else {
            return EventFlow::empty();
        };
        let mut tracker = inner.tracker.borrow_mut();
        if tracker.moved() {
            tracker.clear_moved();
            EventFlow::PREVENT_DEFAULT | EventFlow::STOP_PROPAGATION
        } else {
            EventFlow::empty()
        }
    })
}

fn on_pointer_down(inner: &Rc<DragInner>, event: &PointerEvent) -> EventFlow {
    // One pointer at a time.
    if inner.active.get().is_some() {
        return EventFlow::empty();
    }

    inner.active.set(Some(event.id));
    inner
        .tracker
        .borrow_mut()
        .begin(inner.axis.read(event.position));
    inner.emit(GestureState::Initialize, 0.0);

    let weak = Rc::downgrade(inner);
    let temporal: [(InputChannel, PointerFn); 4] = [
        (InputChannel::PointerMove, on_pointer_move),
        (InputChannel::PointerUp, on_pointer_up),
        (InputChannel::PointerCancel, on_pointer_up),
        (InputChannel::PointerLeave, on_pointer_up),
    ];
    inner.disposables.push_all(
        Tier::Temporal,
        temporal.map(|(channel, f)| inner.input.listen(channel, pointer_handler(&weak, f))),
    );

    EventFlow::PREVENT_DEFAULT
}

fn on_pointer_move(inner: &Rc<DragInner>, event: &PointerEvent) -> EventFlow {
    if inner.active.get() != Some(event.id) {
        return EventFlow::empty();
    }

    let diff = inner
        .tracker
        .borrow_mut()
        .update(inner.axis.read(event.position), event.timestamp);
    inner.emit(GestureState::Update, inner.axis.direction(diff));

    EventFlow::PREVENT_DEFAULT
}

fn on_pointer_up(inner: &Rc<DragInner>, event: &PointerEvent) -> EventFlow {
    if inner.active.get() != Some(event.id) {
        return EventFlow::empty();
    }

    let velocity = inner.tracker.borrow_mut().finish(event.timestamp);
    inner.active.set(None);
    inner.emit(GestureState::Finalize, inner.axis.direction(velocity));
    inner.disposables.flush(Tier::Temporal);

    EventFlow::empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> DragTracker {
        DragTracker::new(DragConfig::default())
    }

    #[test]
    fn two_samples_give_scaled_slope() {
        let mut t = tracker();
        t.begin(300.0);
        t.update(280.0, 1000.0);
        t.update(240.0, 1020.0);
        // (240 - 280) / 20 * 10
        assert_eq!(t.finish(1030.0), -20.0);
        assert_eq!(t.sample_count(), 0);
    }

    #[test]
    fn single_sample_is_a_stop() {
        let mut t = tracker();
        t.begin(0.0);
        t.update(50.0, 10.0);
        assert_eq!(t.finish(20.0), 0.0);
    }

    #[test]
    fn stale_history_is_a_stop() {
        let mut t = tracker();
        t.begin(0.0);
        t.update(20.0, 0.0);
        t.update(40.0, 10.0);
        // Held still for a while before releasing.
        assert_eq!(t.finish(500.0), 0.0);
    }

    #[test]
    fn old_samples_are_evicted_on_move() {
        let mut t = tracker();
        t.begin(0.0);
        t.update(10.0, 0.0);
        t.update(20.0, 100.0);
        t.update(30.0, 200.0);
        assert_eq!(t.sample_count(), 2);
    }

    #[test]
    fn zero_duration_is_neutral() {
        let mut t = tracker();
        t.begin(0.0);
        t.update(10.0, 5.0);
        t.update(30.0, 5.0);
        assert_eq!(t.finish(6.0), 0.0);
    }

    #[test]
    fn slow_release_snaps_to_zero() {
        let mut t = tracker();
        t.begin(0.0);
        t.update(1.0, 0.0);
        t.update(2.0, 100.0);
        assert_eq!(t.finish(100.0), 0.0);
    }

    #[test]
    fn threshold_marks_moved() {
        let mut t = tracker();
        t.begin(100.0);
        t.update(104.0, 1.0);
        assert!(!t.moved());
        t.update(106.0, 2.0);
        assert!(t.moved());
        t.begin(0.0);
        assert!(!t.moved());
    }
}
