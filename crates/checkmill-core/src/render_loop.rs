//! # Fixed-timestep loop
//!
//! Decouples the simulation rate from the display rate ("fix your timestep").
//! Every display callback drains input once, adds the elapsed time to an
//! accumulator, runs as
//! many fixed `update` steps as the accumulator holds (capped, so a slow
//! frame cannot spiral), and then renders once with `alpha`, the fraction of
//! a step left over, for interpolation.
//!
//! The loop never reads a clock itself: the host hands in frame timestamps
//! and provides the request/cancel primitive through [`FrameScheduler`].

use crate::error::{ConfigError, Result};
use crate::pipeline::FrameParams;

/// Identifier of a pending display-frame request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Host "request next frame / cancel pending frame" primitive.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequest;
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// What the loop drives each frame.
pub trait Simulation {
    /// Runs once per display frame, before any update step.
    fn input(&mut self, _params: &FrameParams) {}
    fn update(&mut self, params: &FrameParams);
    fn render(&mut self, params: &FrameParams);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopConfig {
    pub rate_hz: f64,
    pub max_updates_per_frame: u32,
    /// Longest frame the loop will simulate, in ms.
    pub max_frame_time: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            rate_hz: 60.0,
            max_updates_per_frame: 5,
            max_frame_time: 1000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    pub frame_time: f64,
    pub updates: u32,
    pub alpha: f64,
    /// Whether leftover time was dropped because the update cap was hit.
    pub discarded: bool,
}

pub struct RenderLoop {
    fixed_step: f64,
    max_updates: u32,
    max_frame_time: f64,

    accumulator: f64,
    simulation_time: f64,
    last_timestamp: Option<f64>,
    pending: Option<FrameRequest>,
}

impl RenderLoop {
    pub fn new(config: LoopConfig) -> Result<Self> {
        if !(config.rate_hz.is_finite() && config.rate_hz > 0.0) {
            return Err(ConfigError::InvalidSimulationRate(config.rate_hz));
        }
        Ok(Self {
            fixed_step: 1000.0 / config.rate_hz,
            max_updates: config.max_updates_per_frame.max(1),
            max_frame_time: config.max_frame_time.max(0.0),
            accumulator: 0.0,
            simulation_time: 0.0,
            last_timestamp: None,
            pending: None,
        })
    }

    pub fn fixed_step(&self) -> f64 {
        self.fixed_step
    }

    pub fn simulation_time(&self) -> f64 {
        self.simulation_time
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    /// Requests the first frame. Elapsed time before the start is not replayed.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.pending.is_some() {
            return;
        }
        self.last_timestamp = None;
        self.accumulator = 0.0;
        self.pending = Some(scheduler.request_frame());
    }

    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(request) = self.pending.take() {
            scheduler.cancel_frame(request);
        }
    }

    /// Display callback. Ignored (returns `None`) while the loop is stopped.
    pub fn tick(
        &mut self,
        timestamp: f64,
        scheduler: &mut dyn FrameScheduler,
        sim: &mut dyn Simulation,
    ) -> Option<TickReport> {
        self.pending.take()?;
        let report = self.advance(timestamp, sim);
        self.pending = Some(scheduler.request_frame());
        Some(report)
    }

    /// Runs the update/render steps for one display frame at `timestamp`.
    pub fn advance(&mut self, timestamp: f64, sim: &mut dyn Simulation) -> TickReport {
        let last = *self.last_timestamp.get_or_insert(timestamp);
        self.last_timestamp = Some(timestamp);

        let frame_time = (timestamp - last).clamp(0.0, self.max_frame_time);
        self.accumulator += frame_time;

        let mut params = FrameParams {
            t: self.simulation_time,
            dt: self.fixed_step,
            alpha: 0.0,
            now: timestamp,
        };

        sim.input(&params);

        let mut updates = 0;
        let mut discarded = false;
        while self.accumulator >= self.fixed_step {
            if updates >= self.max_updates {
                self.accumulator = 0.0;
                discarded = true;
                break;
            }

            params.t = self.simulation_time;
            sim.update(&params);

            self.simulation_time += self.fixed_step;
            self.accumulator -= self.fixed_step;
            updates += 1;
        }

        let alpha = (self.accumulator / self.fixed_step).clamp(0.0, 1.0);
        params.t = self.simulation_time;
        params.alpha = if alpha >= 1.0 { 0.0 } else { alpha };
        sim.render(&params);

        TickReport {
            frame_time,
            updates,
            alpha: params.alpha,
            discarded,
        }
    }
}
