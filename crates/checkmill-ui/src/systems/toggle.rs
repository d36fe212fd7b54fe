use std::cell::RefCell;
use std::rc::Rc;

use checkmill_core::{DisposableStore, Dispose, FrameParams, Phase, Tier};

use super::{AppPipeline, SystemContext, SystemInstance};
use crate::app::{AppFlags, AppRef};
use crate::host::{CellAddress, EventFlow, InputChannel, InputEvent};

type ToggleQueue = Rc<RefCell<Vec<CellAddress>>>;

/// Routes clicks on toggles into board flips.
pub fn toggle_system(ctx: &SystemContext<'_>) -> SystemInstance {
    let queue: ToggleQueue = Rc::default();

    let disposables = DisposableStore::new();
    let listener = ctx.host.input.listen(InputChannel::Click, {
        let queue = queue.clone();
        Rc::new(move |event: &InputEvent| {
            if let InputEvent::Click(click) = event
                && let Some(target) = click.target
            {
                queue.borrow_mut().push(target);
            }
            EventFlow::empty()
        })
    });
    let clear = {
        let queue = queue.clone();
        Dispose::new(move || queue.borrow_mut().clear())
    };
    disposables.push_all(Tier::Static, [listener, clear]);

    SystemInstance {
        name: "toggle",
        teardown: disposables.into_dispose(),
        logic: AppPipeline::new()
            .with(Phase::Io, move |app, _| process_toggles(&queue, app))
            .with(Phase::Cleanup, clear_interaction),
    }
}

fn process_toggles(queue: &ToggleQueue, app: &mut AppRef) {
    let toggles = std::mem::take(&mut *queue.borrow_mut());
    if toggles.is_empty() {
        return;
    }

    let items_per_slide = app.items_per_slide();
    for CellAddress { page, cell } in toggles {
        if cell >= items_per_slide {
            log::warn!("toggle: cell {cell} outside a {items_per_slide}-cell page");
            continue;
        }
        let Some(index) = page
            .checked_mul(items_per_slide)
            .and_then(|base| base.checked_add(cell))
        else {
            log::warn!("toggle: page {page} outside the addressable range");
            continue;
        };
        match app.board.flip(index) {
            Some(_) => app.flags.insert(AppFlags::INTERACTED),
            None => log::warn!("toggle: index {index} outside the board"),
        }
    }
}

fn clear_interaction(app: &mut AppRef, _params: &FrameParams) {
    app.flags.remove(AppFlags::INTERACTED);
}
