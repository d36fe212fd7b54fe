//! In-memory host. Frames only advance when the caller pumps them, input is
//! dispatched synchronously, and visibility is computed from the container
//! rects the engine positioned.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use checkmill_core::{
    ContainerId, Dispose, Emitter, FrameRequest, FrameScheduler, Layout, Rect, Size, TickReport,
    Vec2,
};
use checkmill_ui::{
    CellAddress, CheckMill, ClickEvent, DeltaMode, EventFlow, Host, InputChannel, InputEvent,
    InputHandler, InputSource, NetworkLink, PageLifecycle, Placement, PointerEvent,
    PointerEventKind, PointerId, RenderSurface, VisibilityCallback, WheelEvent,
};

/// Pending/cancelled frame requests.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next: u64,
    pending: Vec<FrameRequest>,
    cancelled: u64,
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        self.pending.push(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let before = self.pending.len();
        self.pending.retain(|r| *r != request);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}

impl FrameQueue {
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }

    fn take_next(&mut self) -> Option<FrameRequest> {
        (!self.pending.is_empty()).then(|| self.pending.remove(0))
    }
}

/// What the host knows about one container.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContainerState {
    pub mounted: bool,
    pub top: f64,
    pub left: f64,
    pub translation: Vec2,
    /// Page shown, `None` while dehydrated.
    pub page: Option<u64>,
    pub checked: Vec<bool>,
}

struct Observer {
    id: u64,
    containers: Vec<ContainerId>,
    last: Vec<bool>,
    callback: VisibilityCallback,
}

type Handlers = Rc<RefCell<Vec<(u64, InputChannel, InputHandler)>>>;

#[derive(Default)]
struct Connection {
    connected: Cell<bool>,
    connects: Cell<u32>,
}

impl NetworkLink for Connection {
    fn connect(&self) {
        self.connected.set(true);
        self.connects.set(self.connects.get() + 1);
    }

    fn disconnect(&self) {
        self.connected.set(false);
    }
}

struct HostState {
    viewport: Cell<Option<Size>>,
    containers: RefCell<BTreeMap<ContainerId, ContainerState>>,
    next_container: Cell<u64>,
    slide_size: Cell<Size>,
    observers: Rc<RefCell<Vec<Observer>>>,
    handlers: Handlers,
    next_id: Cell<u64>,
    scrolling: Cell<bool>,
    layout_writes: Cell<u32>,
    resized: Emitter<()>,
    visibility: Emitter<bool>,
}

impl HostState {
    fn fire(&self, channel: InputChannel, event: &InputEvent) -> EventFlow {
        let snapshot: Vec<InputHandler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, c, _)| *c == channel)
            .map(|(_, _, h)| h.clone())
            .collect();
        let mut flow = EventFlow::empty();
        for handler in snapshot {
            flow |= handler(event);
            if flow.contains(EventFlow::STOP_PROPAGATION) {
                break;
            }
        }
        flow
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl RenderSurface for HostState {
    fn measure(&self) -> Option<Rect> {
        self.viewport.get().map(|size| Rect {
            x: 0.0,
            y: 0.0,
            w: size.width,
            h: size.height,
        })
    }

    fn create_containers(&self, count: usize) -> Vec<ContainerId> {
        let mut containers = self.containers.borrow_mut();
        (0..count)
            .map(|_| {
                let id = ContainerId(self.next_container.get());
                self.next_container.set(id.0 + 1);
                containers.insert(id, ContainerState::default());
                id
            })
            .collect()
    }

    fn mount(&self, placements: &[Placement]) {
        let mut containers = self.containers.borrow_mut();
        // Replaces previous children.
        containers.retain(|id, _| placements.iter().any(|p| p.container == *id));
        for p in placements {
            let state = containers.entry(p.container).or_default();
            state.mounted = true;
            state.top = p.top;
            state.left = p.left;
        }
    }

    fn set_translation(&self, container: ContainerId, offset: Vec2) {
        if let Some(state) = self.containers.borrow_mut().get_mut(&container) {
            state.translation = offset;
        }
    }

    fn hydrate(&self, container: ContainerId, page: u64, checked: &[bool]) {
        if let Some(state) = self.containers.borrow_mut().get_mut(&container) {
            state.page = Some(page);
            state.checked = checked.to_vec();
        }
    }

    fn dehydrate(&self, container: ContainerId) {
        if let Some(state) = self.containers.borrow_mut().get_mut(&container) {
            state.page = None;
            state.checked.clear();
        }
    }

    fn observe_visibility(&self, containers: &[ContainerId], callback: VisibilityCallback) -> Dispose {
        let id = self.next_id();
        self.observers.borrow_mut().push(Observer {
            id,
            containers: containers.to_vec(),
            last: vec![false; containers.len()],
            callback,
        });
        let observers = Rc::downgrade(&self.observers);
        Dispose::new(move || {
            if let Some(observers) = observers.upgrade() {
                observers.borrow_mut().retain(|o| o.id != id);
            }
        })
    }

    fn set_scrolling(&self, scrolling: bool) {
        self.scrolling.set(scrolling);
    }

    fn write_layout(&self, layout: &Layout) {
        self.slide_size.set(layout.computed.slide);
        self.layout_writes.set(self.layout_writes.get() + 1);
    }
}

impl InputSource for HostState {
    fn listen(&self, channel: InputChannel, handler: InputHandler) -> Dispose {
        let id = self.next_id();
        self.handlers.borrow_mut().push((id, channel, handler));
        let handlers = Rc::downgrade(&self.handlers);
        Dispose::new(move || {
            if let Some(handlers) = handlers.upgrade() {
                handlers.borrow_mut().retain(|(i, _, _)| *i != id);
            }
        })
    }
}

impl PageLifecycle for HostState {
    fn on_resize(&self, callback: Rc<dyn Fn()>) -> Dispose {
        self.resized.register(move |_: &()| callback())
    }

    fn on_visibility_change(&self, callback: Rc<dyn Fn(bool)>) -> Dispose {
        self.visibility.register(move |visible: &bool| callback(*visible))
    }
}

/// Deterministic host for tests and the demo.
#[derive(Clone)]
pub struct HeadlessHost {
    state: Rc<HostState>,
    frames: Rc<RefCell<FrameQueue>>,
    network: Rc<Connection>,
}

impl HeadlessHost {
    pub fn new(viewport: Size) -> Self {
        Self {
            state: Rc::new(HostState {
                viewport: Cell::new(Some(viewport)),
                containers: RefCell::new(BTreeMap::new()),
                next_container: Cell::new(0),
                slide_size: Cell::new(Size::default()),
                observers: Rc::default(),
                handlers: Rc::default(),
                next_id: Cell::new(0),
                scrolling: Cell::new(false),
                layout_writes: Cell::new(0),
                resized: Emitter::new(),
                visibility: Emitter::new(),
            }),
            frames: Rc::new(RefCell::new(FrameQueue::default())),
            network: Rc::new(Connection::default()),
        }
    }

    /// Handles for [`CheckMill::new`].
    pub fn host(&self) -> Host {
        Host {
            surface: self.state.clone(),
            input: self.state.clone(),
            lifecycle: self.state.clone(),
            frames: self.frames.clone(),
            network: Some(self.network.clone()),
        }
    }

    /// Runs the oldest pending frame at `timestamp`, then delivers visibility changes.
    pub fn pump(&self, mill: &CheckMill, timestamp: f64) -> Option<TickReport> {
        self.frames.borrow_mut().take_next()?;
        let report = mill.on_frame(timestamp);
        self.sync_visibility();
        report
    }

    /// Reports intersection changes of every observed container against the viewport.
    pub fn sync_visibility(&self) {
        let Some(viewport) = self.state.measure() else {
            return;
        };
        let size = self.state.slide_size.get();

        let mut changes: Vec<(VisibilityCallback, usize, bool)> = Vec::new();
        {
            let containers = self.state.containers.borrow();
            let mut observers = self.state.observers.borrow_mut();
            for observer in observers.iter_mut() {
                for (index, id) in observer.containers.iter().enumerate() {
                    let visible = containers.get(id).is_some_and(|c| {
                        c.mounted
                            && Rect {
                                x: c.left + c.translation.x,
                                y: c.top + c.translation.y,
                                w: size.width,
                                h: size.height,
                            }
                            .intersects(&viewport)
                    });
                    if observer.last[index] != visible {
                        observer.last[index] = visible;
                        changes.push((observer.callback.clone(), index, visible));
                    }
                }
            }
        }
        for (callback, index, visible) in changes {
            callback(index, visible);
        }
    }

    pub fn dispatch(&self, event: InputEvent) -> EventFlow {
        if matches!(event, InputEvent::Click(_)) {
            let flow = self.state.fire(InputChannel::ClickCapture, &event);
            if flow.contains(EventFlow::STOP_PROPAGATION) {
                return flow;
            }
            return flow | self.state.fire(InputChannel::Click, &event);
        }
        self.state.fire(InputChannel::of(&event), &event)
    }

    pub fn pointer(&self, event: PointerEventKind, position: Vec2, timestamp: f64) -> EventFlow {
        self.dispatch(InputEvent::Pointer(PointerEvent {
            id: PointerId(0),
            event,
            position,
            timestamp,
        }))
    }

    pub fn wheel(&self, delta_y: f64, mode: DeltaMode, timestamp: f64) -> EventFlow {
        self.dispatch(InputEvent::Wheel(WheelEvent {
            delta: Vec2::new(0.0, delta_y),
            mode,
            timestamp,
        }))
    }

    /// Clicks toggle `cell` of whatever page `container` currently shows.
    pub fn click(&self, container: ContainerId, cell: u64, timestamp: f64) -> EventFlow {
        let target = self
            .container(container)
            .and_then(|c| c.page.filter(|_| (cell as usize) < c.checked.len()))
            .map(|page| CellAddress { page, cell });
        self.dispatch(InputEvent::Click(ClickEvent { target, timestamp }))
    }

    pub fn resize(&self, viewport: Size) {
        self.state.viewport.set(Some(viewport));
        self.state.resized.emit(&());
    }

    /// Drops the mount point; measuring fails until the next resize.
    pub fn detach(&self) {
        self.state.viewport.set(None);
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.state.visibility.emit(&!hidden);
    }

    pub fn container(&self, id: ContainerId) -> Option<ContainerState> {
        self.state.containers.borrow().get(&id).cloned()
    }

    pub fn containers(&self) -> Vec<(ContainerId, ContainerState)> {
        self.state
            .containers
            .borrow()
            .iter()
            .map(|(id, c)| (*id, c.clone()))
            .collect()
    }

    /// Containers that currently show a page.
    pub fn hydrated(&self) -> Vec<(ContainerId, u64)> {
        self.state
            .containers
            .borrow()
            .iter()
            .filter_map(|(id, c)| c.page.map(|page| (*id, page)))
            .collect()
    }

    pub fn viewport_center(&self) -> Vec2 {
        self.state
            .measure()
            .map(|r| Vec2::new(r.x + r.w / 2.0, r.y + r.h / 2.0))
            .unwrap_or_default()
    }

    pub fn is_scrolling(&self) -> bool {
        self.state.scrolling.get()
    }

    pub fn layout_writes(&self) -> u32 {
        self.state.layout_writes.get()
    }

    pub fn listener_count(&self) -> usize {
        self.state.handlers.borrow().len()
    }

    pub fn observer_count(&self) -> usize {
        self.state.observers.borrow().len()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().pending()
    }

    pub fn cancelled_frames(&self) -> u64 {
        self.frames.borrow().cancelled()
    }

    pub fn is_connected(&self) -> bool {
        self.network.connected.get()
    }

    pub fn connects(&self) -> u32 {
        self.network.connects.get()
    }
}
