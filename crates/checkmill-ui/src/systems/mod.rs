//! Independent subsystems. Each one registers its listeners when built and
//! contributes processors to the phases it cares about; the controller
//! concatenates contributions in the order systems are listed.

mod network;
mod render;
mod scroll;
mod toggle;
mod update;

pub use network::network_system;
pub use render::render_system;
pub use scroll::scroll_system;
pub use toggle::toggle_system;
pub use update::{integrate_inertia, update_system};

use checkmill_core::{Dispose, PhasePipeline};

use crate::app::{AppRef, EngineConfig};
use crate::host::Host;

pub type AppPipeline = PhasePipeline<AppRef>;

/// What a system sees while it is being built.
pub struct SystemContext<'a> {
    pub host: &'a Host,
    pub config: &'a EngineConfig,
    pub app: &'a AppRef,
}

/// A built system: its teardown and its per-phase logic.
pub struct SystemInstance {
    pub name: &'static str,
    pub teardown: Dispose,
    pub logic: AppPipeline,
}

pub type SystemInitializer = fn(&SystemContext<'_>) -> SystemInstance;

/// Systems rebuilt on every reconfigure, in pipeline order.
pub const RECONFIGURABLE_SYSTEMS: [SystemInitializer; 4] =
    [toggle_system, scroll_system, update_system, render_system];
