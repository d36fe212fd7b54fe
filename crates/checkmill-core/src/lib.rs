//! # Checkmill engine
//!
//! Checkmill renders a very large grid of toggles as an endless, physically
//! scrolled strip using a small pool of recycled "slides". This crate holds
//! the host-independent parts of the engine:
//!
//! - [`layout`]: picks the grid and slide geometry for a viewport.
//! - [`motion`]: one-axis kinematic state.
//! - [`looper`]: bounded position + virtual index remapping (the infinite
//!   scroll illusion).
//! - [`board`]: bit set with the checked state of every toggle.
//! - [`pipeline`]: ordered per-frame phases that systems contribute to.
//! - [`render_loop`]: fixed-timestep scheduler driven by host frames.
//! - [`dispose`] / [`event`]: release handles and typed emitters used for
//!   every listener registration.
//!
//! Nothing here touches a clock, a DOM or a window. Hosts plug in through
//! small traits (`FrameScheduler` here, the render surface and input source
//! in `checkmill-ui`), which keeps every tick deterministic and testable.
//!
//! ## A frame
//!
//! ```text
//! input ──► gesture queues ──► Io ──► Update × n ──► Render ──► Cleanup
//!                                    (fixed step)   (alpha)
//! ```
//!
//! ```rust
//! use checkmill_core::*;
//!
//! let layout = Layout::new(LayoutConfig {
//!     viewport_size: Size::new(800.0, 600.0),
//!     ..LayoutConfig::default()
//! })
//! .unwrap();
//!
//! let geometry = LoopGeometry::from_layout(&layout);
//! let total = layout.computed.slide_count.total;
//! let mut slides = create_slides((0..total as u64).map(ContainerId));
//! let mut motion = Motion::new();
//! let mut state = LoopState::new();
//!
//! motion.step(-geometry.range() - 10.0);
//! let outcome = state.tick(&mut motion, &geometry, &mut slides);
//! assert!(outcome.wrapped);
//! assert_eq!(state.iteration, 1);
//! ```

pub mod board;
pub mod dispose;
pub mod error;
pub mod event;
pub mod geometry;
pub mod layout;
pub mod looper;
pub mod motion;
pub mod pipeline;
pub mod render_loop;
pub mod slides;

pub use board::ToggleBoard;
pub use dispose::{DisposableStore, Dispose, Tier};
pub use error::ConfigError;
pub use event::Emitter;
pub use geometry::*;
pub use layout::{ComputedLayout, Grid, GridSolver, Layout, LayoutConfig};
pub use looper::{LoopGeometry, LoopOutcome, LoopPhase, LoopState};
pub use motion::Motion;
pub use pipeline::{FrameParams, Phase, PhasePipeline, Processor};
pub use render_loop::{FrameRequest, FrameScheduler, LoopConfig, RenderLoop, Simulation, TickReport};
pub use slides::{ContainerId, Slide, ViewportOffset, create_slides};
