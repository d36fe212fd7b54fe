use anyhow::{Context, bail};
use checkmill_core::{Size, Vec2};
use checkmill_ui::{CheckMill, DeltaMode, EngineConfig, PointerEventKind};
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::headless::HeadlessHost;

/// A single drag from rest, released while still moving.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fling {
    /// Signed pointer travel along the scroll axis, in px.
    pub distance: f64,
    pub duration_ms: f64,
    pub steps: u32,
}

impl Default for Fling {
    fn default() -> Self {
        Self {
            distance: -400.0,
            duration_ms: 80.0,
            steps: 8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub viewport: Size,
    pub frames: u32,
    pub frame_interval_ms: f64,
    pub fling: Option<Fling>,
    /// Raw line-mode wheel deltas, one per frame from the first.
    pub wheel: Vec<f64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            viewport: Size::new(800.0, 600.0),
            frames: 240,
            frame_interval_ms: 1000.0 / 60.0,
            fling: Some(Fling::default()),
            wheel: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub updates: u64,
    pub position: f64,
    pub velocity: f64,
    pub iteration: i64,
    pub hydrated_pages: Vec<u64>,
    pub smoothed_frame_ms: f64,
    pub elapsed_ms: f64,
}

/// Drives an engine on a [`HeadlessHost`] through a scripted session.
pub fn run_headless(config: EngineConfig, options: &RunOptions) -> anyhow::Result<RunSummary> {
    if !(options.frame_interval_ms.is_finite() && options.frame_interval_ms > 0.0) {
        bail!("frame interval must be positive, got {}", options.frame_interval_ms);
    }

    let started = Instant::now();
    let host = HeadlessHost::new(options.viewport);
    let mill = CheckMill::new(host.host(), config).context("failed to start the engine")?;

    let mut now = 0.0;
    host.pump(&mill, now);

    if let Some(fling) = options.fling {
        drag(&host, fling, now);
        now += fling.duration_ms;
    }

    for frame in 0..options.frames {
        if let Some(raw) = options.wheel.get(frame as usize) {
            host.wheel(*raw, DeltaMode::Line, now);
        }
        now += options.frame_interval_ms;
        if host.pump(&mill, now).is_none() {
            log::warn!("frame {frame}: engine requested no frame");
        }
    }

    let (position, velocity, iteration) = mill
        .with_app(|app| (app.motion.current, app.motion.velocity, app.loop_state.iteration))
        .context("engine has no app")?;
    let stats = mill.stats();
    let summary = RunSummary {
        frames: stats.frames,
        updates: stats.updates,
        position,
        velocity,
        iteration,
        hydrated_pages: host.hydrated().into_iter().map(|(_, page)| page).collect(),
        smoothed_frame_ms: stats.smoothed_frame_ms,
        elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
    };
    mill.destroy();

    log::info!(
        "headless run: {} frames, {} updates, position {:.1}, iteration {}",
        summary.frames,
        summary.updates,
        summary.position,
        summary.iteration
    );
    Ok(summary)
}

fn drag(host: &HeadlessHost, fling: Fling, start: f64) {
    let steps = fling.steps.max(1);
    let origin = host.viewport_center();
    let at = |i: u32| {
        let t = f64::from(i) / f64::from(steps);
        (
            Vec2::new(origin.x, origin.y + fling.distance * t),
            start + fling.duration_ms * t,
        )
    };

    let (position, time) = at(0);
    host.pointer(PointerEventKind::Down, position, time);
    for i in 1..=steps {
        let (position, time) = at(i);
        host.pointer(PointerEventKind::Move, position, time);
    }
    let (position, time) = at(steps);
    host.pointer(PointerEventKind::Up, position, time);
}
