//! # Phase pipeline
//!
//! Each frame runs four phases in a fixed order:
//!
//! - `Io` drains input queues into motion/board state.
//! - `Update` runs once per fixed simulation step.
//! - `Render` runs once per display frame with the interpolation factor.
//! - `Cleanup` clears one-shot flags after rendering.
//!
//! Systems contribute processors per phase; [`PhasePipeline::collect`]
//! concatenates contributions in registration order. There is no priority
//! reordering inside a phase.
//!
//! ```rust
//! use checkmill_core::pipeline::{FrameParams, Phase, PhasePipeline};
//!
//! let counter = PhasePipeline::<u32>::new()
//!     .with(Phase::Update, |n, _| *n += 1)
//!     .with(Phase::Render, |n, _| *n *= 10);
//! let doubler = PhasePipeline::<u32>::new().with(Phase::Update, |n, _| *n *= 2);
//!
//! let mut pipeline = PhasePipeline::collect([counter, doubler]);
//! let mut n = 1;
//! pipeline.run_phases(&[Phase::Update, Phase::Render], &mut n, &FrameParams::default());
//! assert_eq!(n, 40);
//! ```

use smallvec::SmallVec;

/// Timing handed to every processor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameParams {
    /// Simulated time in ms.
    pub t: f64,
    /// Fixed simulation step in ms.
    pub dt: f64,
    /// Progress between the previous and current simulated state.
    pub alpha: f64,
    /// Host timestamp of the display frame in ms.
    pub now: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Io,
    Update,
    Render,
    Cleanup,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Io, Phase::Update, Phase::Render, Phase::Cleanup];

    fn slot(self) -> usize {
        match self {
            Phase::Io => 0,
            Phase::Update => 1,
            Phase::Render => 2,
            Phase::Cleanup => 3,
        }
    }
}

pub type Processor<T> = Box<dyn FnMut(&mut T, &FrameParams)>;

type PhaseList<T> = SmallVec<[Processor<T>; 4]>;

/// Ordered processors per [`Phase`].
pub struct PhasePipeline<T> {
    phases: [PhaseList<T>; 4],
}

impl<T> Default for PhasePipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PhasePipeline<T> {
    pub fn new() -> Self {
        Self {
            phases: [
                SmallVec::new(),
                SmallVec::new(),
                SmallVec::new(),
                SmallVec::new(),
            ],
        }
    }

    pub fn with(mut self, phase: Phase, f: impl FnMut(&mut T, &FrameParams) + 'static) -> Self
    where
        T: 'static,
    {
        self.push(phase, Box::new(f));
        self
    }

    pub fn push(&mut self, phase: Phase, f: Processor<T>) {
        self.phases[phase.slot()].push(f);
    }

    /// Appends every phase of `other` after this pipeline's processors.
    pub fn extend(&mut self, other: PhasePipeline<T>) {
        for (mine, theirs) in self.phases.iter_mut().zip(other.phases) {
            mine.extend(theirs);
        }
    }

    /// Concatenates per-system contributions in registration order.
    pub fn collect(parts: impl IntoIterator<Item = PhasePipeline<T>>) -> Self {
        let mut merged = Self::new();
        for part in parts {
            merged.extend(part);
        }
        merged
    }

    pub fn len(&self, phase: Phase) -> usize {
        self.phases[phase.slot()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.iter().all(|p| p.is_empty())
    }

    pub fn run(&mut self, phase: Phase, data: &mut T, params: &FrameParams) {
        for f in self.phases[phase.slot()].iter_mut() {
            f(data, params);
        }
    }

    /// Runs `phases` sorted into pipeline order.
    pub fn run_phases(&mut self, phases: &[Phase], data: &mut T, params: &FrameParams) {
        let mut ordered: SmallVec<[Phase; 4]> = phases.iter().copied().collect();
        ordered.sort();
        for phase in ordered {
            self.run(phase, data, params);
        }
    }
}

/// Skips `f` unless at least `interval_ms` passed since it last ran.
pub fn throttle<T: 'static>(
    interval_ms: f64,
    mut f: impl FnMut(&mut T, &FrameParams) + 'static,
) -> Processor<T> {
    let mut last_run: Option<f64> = None;
    Box::new(move |data, params| {
        if let Some(last) = last_run
            && params.now - last < interval_ms
        {
            return;
        }
        last_run = Some(params.now);
        f(data, params);
    })
}

pub fn run_if<T: 'static>(
    predicate: impl Fn(&T, &FrameParams) -> bool + 'static,
    mut f: impl FnMut(&mut T, &FrameParams) + 'static,
) -> Processor<T> {
    Box::new(move |data, params| {
        if predicate(data, params) {
            f(data, params);
        }
    })
}

pub fn chain<T: 'static>(mut funcs: Vec<Processor<T>>) -> Processor<T> {
    Box::new(move |data, params| {
        for f in funcs.iter_mut() {
            f(data, params);
        }
    })
}
