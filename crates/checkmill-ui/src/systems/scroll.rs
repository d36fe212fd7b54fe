use std::cell::RefCell;
use std::rc::Rc;

use checkmill_core::{DisposableStore, Dispose, Phase, Tier};

use super::{AppPipeline, SystemContext, SystemInstance};
use crate::app::{AppFlags, AppRef};
use crate::gestures::{DragGesture, GestureEvent, GestureState, WheelGesture};

type GestureQueue = Rc<RefCell<Vec<GestureEvent>>>;

/// Feeds drag and wheel gestures into the motion model.
pub fn scroll_system(ctx: &SystemContext<'_>) -> SystemInstance {
    let config = ctx.config;
    let input = ctx.host.input.clone();

    let drag = DragGesture::new(input.clone(), config.axis, config.drag);
    let wheel = WheelGesture::new(input, config.axis, config.wheel);
    wheel.set_page_extent(ctx.app.layout.config.viewport_size.height);

    let drag_queue: GestureQueue = Rc::default();
    let wheel_queue: GestureQueue = Rc::default();

    let disposables = DisposableStore::new();
    disposables.push_all(
        Tier::Static,
        [
            drag.register(enqueue(&drag_queue)),
            wheel.register(enqueue(&wheel_queue)),
            drag.init(),
            wheel.init(),
            {
                let (drag_queue, wheel_queue) = (drag_queue.clone(), wheel_queue.clone());
                Dispose::new(move || {
                    drag_queue.borrow_mut().clear();
                    wheel_queue.borrow_mut().clear();
                })
            },
        ],
    );

    let force = config.wheel_force_multiplier;
    let max_velocity = config.max_wheel_velocity;

    SystemInstance {
        name: "scroll",
        teardown: disposables.into_dispose(),
        logic: AppPipeline::new()
            .with(Phase::Io, move |app, _| process_drag(&drag_queue, app))
            .with(Phase::Io, move |app, _| {
                process_wheel(&wheel_queue, app, force, max_velocity)
            }),
    }
}

fn enqueue(queue: &GestureQueue) -> impl Fn(&GestureEvent) + 'static {
    let queue = queue.clone();
    move |event: &GestureEvent| queue.borrow_mut().push(*event)
}

fn process_drag(queue: &GestureQueue, app: &mut AppRef) {
    let events = std::mem::take(&mut *queue.borrow_mut());
    let motion = &mut app.motion;

    for event in events {
        match event.state {
            GestureState::Initialize => {
                motion.velocity = 0.0;
                motion.previous = motion.current;
                app.flags.insert(AppFlags::GESTURE_RUNNING);
            }
            GestureState::Update => {
                motion.previous = motion.current;
                motion.current += event.delta;
            }
            GestureState::Finalize => {
                motion.velocity = event.delta;
                app.flags.remove(AppFlags::GESTURE_RUNNING);
            }
        }
    }
}

/// Sums a frame's wheel deltas into a velocity kick.
pub fn apply_wheel(velocity: f64, deltas: impl IntoIterator<Item = f64>, force: f64, max: f64) -> f64 {
    let accumulated: f64 = deltas.into_iter().sum();
    (velocity + accumulated * force).clamp(-max, max)
}

fn process_wheel(queue: &GestureQueue, app: &mut AppRef, force: f64, max_velocity: f64) {
    let events = std::mem::take(&mut *queue.borrow_mut());
    if events.is_empty() {
        return;
    }
    app.motion.velocity = apply_wheel(
        app.motion.velocity,
        events.iter().map(|e| e.delta),
        force,
        max_velocity,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_kick_is_scaled_and_clamped() {
        assert!((apply_wheel(0.0, [-48.0, -48.0], 0.05, 32.0) + 4.8).abs() < 1e-9);
        assert_eq!(apply_wheel(30.0, [800.0], 0.05, 32.0), 32.0);
        assert_eq!(apply_wheel(-30.0, [-800.0], 0.05, 32.0), -32.0);
    }
}
