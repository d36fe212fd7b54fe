//! # Checkmill UI
//!
//! Everything between a host and the core engine:
//!
//! - [`host`]: the traits a host implements (render surface, input source,
//!   page lifecycle, network link) plus the input event types.
//! - [`gestures`]: drag and wheel recognizers that turn raw input into
//!   deltas and release velocities.
//! - [`systems`]: Toggle, Scroll, Update, Render and Network. Each
//!   contributes processors to the phase pipeline.
//! - [`controller`]: [`CheckMill`], which wires systems to the
//!   fixed-timestep loop and rebuilds them on resize.
//!
//! Input handlers never touch engine state directly. They push into
//! per-system queues that the `Io` phase drains once per frame.

pub mod app;
pub mod controller;
pub mod gestures;
pub mod host;
pub mod renderer;
pub mod systems;
pub mod visibility;

pub use app::{AppFlags, AppRef, EngineConfig};
pub use controller::{CheckMill, FrameStats};
pub use gestures::{Axis, DragConfig, GestureEvent, GestureKind, GestureState, WheelConfig};
pub use host::*;
