//! Seams a host (browser, window system, test double) plugs into.
//!
//! Every trait here takes `&self`: hosts are shared through `Rc` and keep
//! their own interior mutability. Input is push-based; handlers only enqueue.

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;
use checkmill_core::{ContainerId, Dispose, FrameScheduler, Layout, Rect, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub event: PointerEventKind,
    pub position: Vec2,
    /// Host timestamp in ms.
    pub timestamp: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelEvent {
    pub delta: Vec2,
    pub mode: DeltaMode,
    pub timestamp: f64,
}

/// A toggle inside a hydrated slide: the page the slide shows and the cell within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub page: u64,
    pub cell: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickEvent {
    /// `None` when the click did not land on a toggle.
    pub target: Option<CellAddress>,
    pub timestamp: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Wheel(WheelEvent),
    Click(ClickEvent),
}

/// What a handler subscribes to.
///
/// `ClickCapture` handlers see a click before any `Click` handler and may
/// stop it from propagating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputChannel {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
    PointerLeave,
    Wheel,
    ClickCapture,
    Click,
}

impl InputChannel {
    pub fn of(event: &InputEvent) -> Self {
        match event {
            InputEvent::Pointer(p) => match p.event {
                PointerEventKind::Down => InputChannel::PointerDown,
                PointerEventKind::Move => InputChannel::PointerMove,
                PointerEventKind::Up => InputChannel::PointerUp,
                PointerEventKind::Cancel => InputChannel::PointerCancel,
                PointerEventKind::Leave => InputChannel::PointerLeave,
            },
            InputEvent::Wheel(_) => InputChannel::Wheel,
            InputEvent::Click(_) => InputChannel::Click,
        }
    }
}

bitflags! {
    /// Returned by handlers to steer the host's default handling.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct EventFlow: u8 {
        const PREVENT_DEFAULT  = 0b01;
        const STOP_PROPAGATION = 0b10;
    }
}

pub type InputHandler = Rc<dyn Fn(&InputEvent) -> EventFlow>;

pub trait InputSource {
    fn listen(&self, channel: InputChannel, handler: InputHandler) -> Dispose;
}

/// A slide container's resting place inside the mount point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub container: ContainerId,
    pub top: f64,
    pub left: f64,
}

pub type VisibilityCallback = Rc<dyn Fn(usize, bool)>;

pub trait RenderSurface {
    /// Bounding rect of the mount point; `None` when there is nothing to measure against.
    fn measure(&self) -> Option<Rect>;
    fn create_containers(&self, count: usize) -> Vec<ContainerId>;
    /// Replaces whatever was mounted before.
    fn mount(&self, placements: &[Placement]);
    fn set_translation(&self, container: ContainerId, offset: Vec2);
    /// Shows `page` in the container with the given checked states.
    fn hydrate(&self, container: ContainerId, page: u64, checked: &[bool]);
    fn dehydrate(&self, container: ContainerId);
    /// Starts reporting `(index into containers, intersecting)` changes.
    fn observe_visibility(&self, containers: &[ContainerId], callback: VisibilityCallback) -> Dispose;
    /// Toggles the "is-scrolling" presentation hook.
    fn set_scrolling(&self, scrolling: bool);
    /// Publishes layout variables (cell size, grid, slide size) for styling.
    fn write_layout(&self, layout: &Layout);
}

pub trait PageLifecycle {
    /// Fires when the mount point changes size. Hosts debounce this themselves.
    fn on_resize(&self, callback: Rc<dyn Fn()>) -> Dispose;
    /// Fires with `true` when the page becomes visible, `false` when hidden.
    fn on_visibility_change(&self, callback: Rc<dyn Fn(bool)>) -> Dispose;
}

/// Connect-on-init / disconnect-on-teardown hook. Carries no payload.
pub trait NetworkLink {
    fn connect(&self);
    fn disconnect(&self);
}

/// Everything the controller needs from its host.
#[derive(Clone)]
pub struct Host {
    pub surface: Rc<dyn RenderSurface>,
    pub input: Rc<dyn InputSource>,
    pub lifecycle: Rc<dyn PageLifecycle>,
    pub frames: Rc<RefCell<dyn FrameScheduler>>,
    pub network: Option<Rc<dyn NetworkLink>>,
}
