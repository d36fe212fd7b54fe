use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use checkmill_core::pipeline::{chain, throttle};
use checkmill_core::{ContainerId, DisposableStore, Dispose, FrameParams, Phase, Processor, Tier};

use super::{AppPipeline, SystemContext, SystemInstance};
use crate::app::{AppFlags, AppRef};
use crate::renderer::SlideRenderer;
use crate::visibility::{VisibilityChange, VisibilityRecord, VisibilityTracker};

/// Visibility records applied per sync; faster motion drains more.
pub fn hydration_batch(velocity: f64, base: usize) -> usize {
    (velocity.abs() / 5.0).ceil() as usize + base
}

struct RenderState {
    renderer: SlideRenderer,
    tracker: Rc<RefCell<VisibilityTracker>>,
    queue: VecDeque<VisibilityRecord>,
    base_batch: usize,
}

/// Presentation: interpolation, positioning, visibility-driven hydration.
pub fn render_system(ctx: &SystemContext<'_>) -> SystemInstance {
    let app = ctx.app;
    let surface = ctx.host.surface.clone();

    let renderer = SlideRenderer::new(surface.clone(), &app.layout, app.axis);
    renderer.mount(&app.slides);
    surface.write_layout(&app.layout);

    let tracker = Rc::new(RefCell::new(VisibilityTracker::new(app.slides.len())));
    let containers: Vec<ContainerId> = app.slides.iter().map(|s| s.container).collect();
    let observer = surface.observe_visibility(&containers, {
        let tracker = tracker.clone();
        Rc::new(move |index: usize, visible: bool| tracker.borrow_mut().set(index, visible))
    });

    let disposables = DisposableStore::new();
    disposables.push(Tier::Static, observer);

    let state = Rc::new(RefCell::new(RenderState {
        renderer,
        tracker,
        queue: VecDeque::new(),
        base_batch: ctx.config.hydration_batch,
    }));

    let with_state = |f: fn(&mut RenderState, &mut AppRef, &FrameParams)| -> Processor<AppRef> {
        let state = state.clone();
        Box::new(move |app: &mut AppRef, params: &FrameParams| {
            f(&mut state.borrow_mut(), app, params)
        })
    };

    let lerp: Processor<AppRef> = Box::new(lerp);
    let frame = chain(vec![
        lerp,
        with_state(sync_position),
        throttle(ctx.config.visibility_sync_ms, with_state(sync_visibility)),
        with_state(process_styles),
        with_state(refresh_state),
    ]);

    let mut logic = AppPipeline::new();
    logic.push(Phase::Render, frame);

    SystemInstance {
        name: "render",
        teardown: disposables.into_dispose(),
        logic,
    }
}

fn lerp(app: &mut AppRef, params: &FrameParams) {
    app.motion.offset = app.motion.lerp(params.alpha);
}

fn sync_position(state: &mut RenderState, app: &mut AppRef, _params: &FrameParams) {
    state.renderer.sync_position(&app.slides, app.motion.offset);
}

fn sync_visibility(state: &mut RenderState, app: &mut AppRef, _params: &FrameParams) {
    let records = state.tracker.borrow_mut().take_records();
    state.queue.extend(records);

    let limit = hydration_batch(app.motion.velocity, state.base_batch).min(state.queue.len());
    for record in state.queue.drain(..limit) {
        let Some(slide) = app.slides.get(record.index) else {
            continue;
        };
        match record.change {
            VisibilityChange::Entered => state.renderer.hydrate(slide, &app.board),
            VisibilityChange::Exited => state.renderer.dehydrate(slide),
        }
    }
}

fn process_styles(state: &mut RenderState, app: &mut AppRef, _params: &FrameParams) {
    state
        .renderer
        .set_scrolling(app.flags.contains(AppFlags::GESTURE_RUNNING));
}

fn refresh_state(state: &mut RenderState, app: &mut AppRef, _params: &FrameParams) {
    if app.flags.contains(AppFlags::INTERACTED) {
        state.renderer.update_state(&app.slides, &app.board);
    } else {
        state.renderer.sync_pages(&app.slides, &app.board);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_grows_with_speed() {
        assert_eq!(hydration_batch(0.0, 2), 2);
        assert_eq!(hydration_batch(-0.1, 2), 3);
        assert_eq!(hydration_batch(25.0, 2), 7);
        assert_eq!(hydration_batch(-26.0, 2), 8);
    }
}
