//! Platform runners (headless for now)
//!
//! [`HeadlessHost`] implements every host seam in memory: frames advance
//! only when pumped, input is dispatched synchronously and slide visibility
//! is derived from the translations the engine wrote. [`run_headless`] plays
//! a scripted session on it.

pub mod headless;
pub mod runner;
mod tests;

pub use headless::{ContainerState, FrameQueue, HeadlessHost};
pub use runner::{Fling, RunOptions, RunSummary, run_headless};
