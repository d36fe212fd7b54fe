//! # Controller
//!
//! [`CheckMill`] owns the whole engine: the current [`AppRef`], the phase
//! pipeline built from the systems, the fixed-timestep loop and every
//! listener registration, partitioned by lifetime tier.
//!
//! - `Static`: resize and page-visibility listeners, the network link.
//!   Live until [`CheckMill::destroy`].
//! - `Reconfigurable`: everything a system registered. Flushed and rebuilt
//!   whenever the mount point is resized.
//!
//! Resize notifications only mark a reconfigure as pending. It is applied at
//! the start of the next frame, at most once per `reconfigure_throttle_ms`
//! of frame time, so rebuilds never overlap a running pipeline.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use checkmill_core::error::Result;
use checkmill_core::{
    ConfigError, DisposableStore, FrameParams, GridSolver, Layout, Phase, RenderLoop, Simulation,
    TickReport, Tier, ToggleBoard,
};
use web_time::Instant;

use crate::app::{AppRef, EngineConfig};
use crate::host::Host;
use crate::systems::{
    AppPipeline, RECONFIGURABLE_SYSTEMS, SystemContext, SystemInstance, network_system,
};

/// Wall-clock cost of the pipeline, per display frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    pub updates: u64,
    pub last_frame_ms: f64,
    pub smoothed_frame_ms: f64,
}

impl FrameStats {
    fn record(&mut self, report: &TickReport, elapsed_ms: f64) {
        self.frames += 1;
        self.updates += u64::from(report.updates);
        self.last_frame_ms = elapsed_ms;
        // simple EMA
        let a = 0.2;
        self.smoothed_frame_ms = if self.frames == 1 {
            elapsed_ms
        } else {
            (1.0 - a) * self.smoothed_frame_ms + a * elapsed_ms
        };
    }
}

/// Runs the pipeline halves the loop asks for against one app.
struct Executor<'a> {
    pipeline: &'a mut AppPipeline,
    app: &'a mut AppRef,
}

impl Simulation for Executor<'_> {
    fn input(&mut self, params: &FrameParams) {
        self.pipeline.run(Phase::Io, self.app, params);
    }

    fn update(&mut self, params: &FrameParams) {
        self.pipeline.run(Phase::Update, self.app, params);
    }

    fn render(&mut self, params: &FrameParams) {
        self.pipeline
            .run_phases(&[Phase::Render, Phase::Cleanup], self.app, params);
    }
}

struct Engine {
    host: Host,
    config: EngineConfig,
    app: Option<AppRef>,
    pipeline: AppPipeline,
    render_loop: RenderLoop,
    solver: GridSolver,
    disposables: DisposableStore,
    resize_pending: Rc<Cell<bool>>,
    visibility_pending: Rc<Cell<Option<bool>>>,
    last_reconfigure: Option<f64>,
    stats: FrameStats,
}

impl Engine {
    fn measure_layout(&mut self) -> Result<Layout> {
        let rect = self
            .host
            .surface
            .measure()
            .ok_or(ConfigError::MissingRenderContext)?;
        let config = self.config.layout.with_viewport(rect.size());
        Layout::with_solver(config, &mut self.solver)
    }

    /// Rebuilds the app and every system for the current mount size.
    /// On error the previous configuration stays in place.
    fn reconfigure(&mut self) -> Result<()> {
        let layout = self.measure_layout()?;
        let total_items = layout.computed.pagination.total_items;

        let board = match self.app.take() {
            Some(old) if old.board.len() == total_items => old.board,
            _ => ToggleBoard::new(total_items)?,
        };

        self.disposables.flush(Tier::Reconfigurable);

        let app = AppRef::new(self.host.surface.clone(), layout, board, self.config.axis);
        let ctx = SystemContext {
            host: &self.host,
            config: &self.config,
            app: &app,
        };
        let systems: Vec<SystemInstance> =
            RECONFIGURABLE_SYSTEMS.iter().map(|init| init(&ctx)).collect();

        let mut names = Vec::with_capacity(systems.len());
        let mut logic = Vec::with_capacity(systems.len());
        for system in systems {
            names.push(system.name);
            self.disposables.push(Tier::Reconfigurable, system.teardown);
            logic.push(system.logic);
        }
        self.pipeline = AppPipeline::collect(logic);

        log::debug!(
            "reconfigured: {} slides, {} pages, systems {:?}",
            app.geometry.total,
            app.geometry.total_pages,
            names
        );
        self.app = Some(app);
        Ok(())
    }

    fn set_page_visible(&mut self, visible: bool) {
        let mut frames = self.host.frames.borrow_mut();
        if visible {
            self.render_loop.start(&mut *frames);
        } else {
            self.render_loop.stop(&mut *frames);
        }
        log::debug!("page {}", if visible { "shown" } else { "hidden" });
    }

    fn apply_pending_reconfigure(&mut self, timestamp: f64) {
        if !self.resize_pending.get() {
            return;
        }
        let throttle = self.config.reconfigure_throttle_ms;
        if self
            .last_reconfigure
            .is_some_and(|last| timestamp - last < throttle)
        {
            return;
        }

        self.resize_pending.set(false);
        self.last_reconfigure = Some(timestamp);
        if let Err(err) = self.reconfigure() {
            log::error!("reconfigure failed, keeping previous layout: {err}");
        }
    }

    fn on_frame(&mut self, timestamp: f64) -> Option<TickReport> {
        if let Some(visible) = self.visibility_pending.take() {
            self.set_page_visible(visible);
        }
        if !self.render_loop.is_active() {
            return None;
        }
        self.apply_pending_reconfigure(timestamp);

        let started = Instant::now();
        let app = self.app.as_mut()?;
        let mut frames = self.host.frames.borrow_mut();
        let mut executor = Executor {
            pipeline: &mut self.pipeline,
            app,
        };
        let report = self
            .render_loop
            .tick(timestamp, &mut *frames, &mut executor)?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.stats.record(&report, elapsed_ms);
        log::trace!(
            "frame {}: {} updates, alpha {:.3}, {:.3} ms",
            self.stats.frames,
            report.updates,
            report.alpha,
            elapsed_ms
        );
        Some(report)
    }

    fn destroy(&mut self) {
        {
            let mut frames = self.host.frames.borrow_mut();
            self.render_loop.stop(&mut *frames);
        }
        self.disposables.flush_all();
        self.pipeline = AppPipeline::new();
        self.app = None;
    }
}

/// The running engine. Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct CheckMill {
    engine: Rc<RefCell<Engine>>,
}

impl CheckMill {
    /// Measures the mount point, builds every system and starts the loop.
    pub fn new(host: Host, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let render_loop = RenderLoop::new(config.loop_config())?;

        let mut engine = Engine {
            host,
            config,
            app: None,
            pipeline: AppPipeline::new(),
            render_loop,
            solver: GridSolver::new(),
            disposables: DisposableStore::new(),
            resize_pending: Rc::new(Cell::new(false)),
            visibility_pending: Rc::new(Cell::new(None)),
            last_reconfigure: None,
            stats: FrameStats::default(),
        };
        engine.reconfigure()?;

        let engine = Rc::new(RefCell::new(engine));
        Self::setup_static_listeners(&engine);
        engine.borrow_mut().set_page_visible(true);

        Ok(Self { engine })
    }

    fn setup_static_listeners(engine: &Rc<RefCell<Engine>>) {
        let e = engine.borrow();
        let lifecycle = e.host.lifecycle.clone();

        let on_resize = {
            let pending = e.resize_pending.clone();
            lifecycle.on_resize(Rc::new(move || pending.set(true)))
        };

        let on_visibility = {
            let weak = Rc::downgrade(engine);
            let pending = e.visibility_pending.clone();
            lifecycle.on_visibility_change(Rc::new(move |visible: bool| {
                let Some(engine) = weak.upgrade() else {
                    return;
                };
                // Mid-frame changes are applied at the start of the next frame.
                match engine.try_borrow_mut() {
                    Ok(mut engine) => engine.set_page_visible(visible),
                    Err(_) => pending.set(Some(visible)),
                };
            }))
        };

        e.disposables
            .push_all(Tier::Static, [on_resize, on_visibility]);

        if let Some(app) = e.app.as_ref() {
            let network = network_system(&SystemContext {
                host: &e.host,
                config: &e.config,
                app,
            });
            e.disposables.push(Tier::Static, network.teardown);
        }
    }

    /// Display callback for a frame the engine requested.
    pub fn on_frame(&self, timestamp: f64) -> Option<TickReport> {
        self.engine.borrow_mut().on_frame(timestamp)
    }

    pub fn is_running(&self) -> bool {
        self.engine.borrow().render_loop.is_active()
    }

    pub fn stats(&self) -> FrameStats {
        self.engine.borrow().stats
    }

    /// Read access to the current app, `None` after [`destroy`](Self::destroy).
    pub fn with_app<R>(&self, f: impl FnOnce(&AppRef) -> R) -> Option<R> {
        self.engine.borrow().app.as_ref().map(f)
    }

    /// Stops the loop and releases every listener.
    pub fn destroy(&self) {
        self.engine.borrow_mut().destroy();
        log::debug!("destroyed");
    }
}
