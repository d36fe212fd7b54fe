//! # Infinite loop windowing
//!
//! A fixed pool of `total` slides stands in for an unbounded strip. The
//! physical scroll position is kept inside `[-(content - spacing), 0]`; every
//! time it leaves that range it is wrapped back and `iteration` counts the
//! wrap. Slides then get a virtual index (`real + iteration * total`) and the
//! ones that sit on the wrong side of the wrap point are pushed one loop range
//! ahead or behind, so the viewport never sees the seam.
//!
//! Page indices are virtual indices wrapped into `[0, total_pages)`, which is
//! what lets a handful of slides page through a million toggles.

use crate::layout::Layout;
use crate::motion::Motion;
use crate::slides::{Slide, ViewportOffset};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopPhase {
    #[default]
    Neutral,
    ShiftedUp,
    ShiftedDown,
}

/// The numbers the loop needs out of a [`Layout`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopGeometry {
    pub content_height: f64,
    pub slide_spacing: f64,
    pub visible: usize,
    pub total: usize,
    pub total_pages: u64,
}

impl LoopGeometry {
    pub fn from_layout(layout: &Layout) -> Self {
        Self {
            content_height: layout.computed.content_area.height,
            slide_spacing: layout.config.slide_spacing,
            visible: layout.computed.slide_count.visible,
            total: layout.computed.slide_count.total,
            total_pages: layout.computed.pagination.total_pages,
        }
    }

    pub fn range(&self) -> f64 {
        self.content_height - self.slide_spacing
    }

    /// `(top, bottom)` bounds of the physical position.
    pub fn bounds(&self) -> (f64, f64) {
        (0.0, -self.range())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopOutcome {
    pub wrapped: bool,
    pub remapped: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopState {
    /// Net number of full wraps; grows while scrolling down.
    pub iteration: i64,
    pub phase: LoopPhase,
}

impl LoopState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds check, then phase check; remaps slides only when one of them changed.
    pub fn tick(
        &mut self,
        motion: &mut Motion,
        geometry: &LoopGeometry,
        slides: &mut [Slide],
    ) -> LoopOutcome {
        let wrapped = self.maintain_bounds(motion, geometry);
        let phase = select_phase(motion.current, geometry.content_height);

        if phase == self.phase && !wrapped {
            return LoopOutcome {
                wrapped,
                remapped: false,
            };
        }

        self.phase = phase;
        remap_slides(slides, phase, self.iteration, geometry);

        LoopOutcome {
            wrapped,
            remapped: true,
        }
    }

    /// Wraps `motion.current` back into the loop bounds. Returns whether it did.
    pub fn maintain_bounds(&mut self, motion: &mut Motion, geometry: &LoopGeometry) -> bool {
        let (top, bottom) = geometry.bounds();
        let current = motion.current;

        if (bottom..=top).contains(&current) {
            return false;
        }

        let range = geometry.range();
        if range <= 0.0 {
            return false;
        }

        let wrapped = wrap(current, bottom, top);
        let cycles = ((current - wrapped) / range).round() as i64;
        self.iteration -= cycles;

        motion.move_to(wrapped);
        true
    }
}

/// Which half of the content the position sits in.
pub fn select_phase(current: f64, content_height: f64) -> LoopPhase {
    if current.abs() > content_height / 2.0 {
        LoopPhase::ShiftedDown
    } else {
        LoopPhase::ShiftedUp
    }
}

pub fn remap_slides(slides: &mut [Slide], phase: LoopPhase, iteration: i64, geometry: &LoopGeometry) {
    let total = geometry.total as i64;
    let visible = geometry.visible;
    let pages = geometry.total_pages.max(1) as i64;

    for slide in slides.iter_mut() {
        let real = slide.real_index();
        slide.virtual_index = real as i64 + iteration * total;
        slide.viewport_offset = ViewportOffset::Current;

        match phase {
            LoopPhase::ShiftedDown if real < visible => {
                slide.virtual_index += total;
                slide.viewport_offset = ViewportOffset::Ahead;
            }
            LoopPhase::ShiftedUp if real >= geometry.total.saturating_sub(visible) => {
                slide.virtual_index -= total;
                slide.viewport_offset = ViewportOffset::Behind;
            }
            _ => {}
        }

        slide.page_index = slide.virtual_index.rem_euclid(pages) as u64;
    }
}

/// Wraps `x` into `[min, max)`; `x - wrap(x)` is a multiple of `max - min`.
pub fn wrap(x: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range <= 0.0 {
        return min;
    }
    let mut r = (x - min).rem_euclid(range);
    if r >= range {
        r = 0.0;
    }
    min + r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::{ContainerId, create_slides};

    fn geometry() -> LoopGeometry {
        LoopGeometry {
            content_height: 1008.0,
            slide_spacing: 8.0,
            visible: 2,
            total: 8,
            total_pages: 5,
        }
    }

    fn pool(n: usize) -> Vec<Slide> {
        create_slides((0..n as u64).map(ContainerId))
    }

    #[test]
    fn wrap_stays_in_range_and_keeps_congruence() {
        let cases = [
            (-1.0, 0.0, 10.0),
            (25.0, 0.0, 10.0),
            (-1234.5, -1000.0, 0.0),
            (0.5, -1000.0, 0.0),
            (7.0, 3.0, 4.5),
            (-0.0, -3.0, 0.0),
        ];
        for (x, min, max) in cases {
            let w = wrap(x, min, max);
            assert!(w >= min && w < max, "wrap({x}, {min}, {max}) = {w}");
            let k = (x - w) / (max - min);
            assert!((k - k.round()).abs() < 1e-9, "not congruent: {x} -> {w}");
        }
    }

    #[test]
    fn no_wrap_inside_bounds() {
        let mut state = LoopState::new();
        let mut motion = Motion::new();
        motion.current = -500.0;
        assert!(!state.maintain_bounds(&mut motion, &geometry()));
        assert_eq!(motion.current, -500.0);
        assert_eq!(state.iteration, 0);
    }

    #[test]
    fn wrap_below_bottom_increments_iteration() {
        let g = geometry();
        let mut state = LoopState::new();
        let mut motion = Motion::new();
        motion.current = -1010.0;
        motion.previous = -990.0;
        assert!(state.maintain_bounds(&mut motion, &g));
        assert_eq!(state.iteration, 1);
        assert!((motion.current - -10.0).abs() < 1e-9);
        assert_eq!(motion.previous, motion.current);
    }

    #[test]
    fn wrap_above_top_decrements_iteration() {
        let g = geometry();
        let mut state = LoopState::new();
        let mut motion = Motion::new();
        motion.current = 30.0;
        assert!(state.maintain_bounds(&mut motion, &g));
        assert_eq!(state.iteration, -1);
        assert!((motion.current - (30.0 - 1000.0)).abs() < 1e-9);
    }

    #[test]
    fn second_tick_without_change_is_a_no_op() {
        let g = geometry();
        let mut state = LoopState::new();
        let mut motion = Motion::new();
        let mut slides = pool(g.total);
        motion.current = -100.0;

        let first = state.tick(&mut motion, &g, &mut slides);
        assert!(first.remapped);

        let snapshot = slides.clone();
        for slide in slides.iter_mut() {
            slide.page_index = 999;
        }
        let second = state.tick(&mut motion, &g, &mut slides);
        assert_eq!(second, LoopOutcome::default());
        assert!(slides.iter().all(|s| s.page_index == 999));
        assert_ne!(snapshot, slides);
    }

    #[test]
    fn shifted_down_moves_leading_slides_ahead() {
        let g = geometry();
        let mut state = LoopState::new();
        let mut motion = Motion::new();
        let mut slides = pool(g.total);
        motion.current = -600.0;

        state.tick(&mut motion, &g, &mut slides);
        assert_eq!(state.phase, LoopPhase::ShiftedDown);
        assert_eq!(slides[0].viewport_offset, ViewportOffset::Ahead);
        assert_eq!(slides[0].virtual_index, 8);
        assert_eq!(slides[1].virtual_index, 9);
        assert_eq!(slides[2].viewport_offset, ViewportOffset::Current);
        assert_eq!(slides[2].virtual_index, 2);
    }

    #[test]
    fn shifted_up_moves_trailing_slides_behind() {
        let g = geometry();
        let mut state = LoopState::new();
        let mut motion = Motion::new();
        let mut slides = pool(g.total);

        state.tick(&mut motion, &g, &mut slides);
        assert_eq!(state.phase, LoopPhase::ShiftedUp);
        assert_eq!(slides[7].viewport_offset, ViewportOffset::Behind);
        assert_eq!(slides[7].virtual_index, -1);
        assert_eq!(slides[7].page_index, 4);
        assert_eq!(slides[5].viewport_offset, ViewportOffset::Current);
    }

    #[test]
    fn virtual_indices_are_continuous_across_a_wrap() {
        let g = geometry();
        let mut state = LoopState::new();
        let mut motion = Motion::new();
        let mut slides = pool(g.total);

        motion.current = -990.0;
        state.tick(&mut motion, &g, &mut slides);
        let before: Vec<i64> = slides.iter().map(|s| s.virtual_index).collect();

        motion.step(-20.0);
        let outcome = state.tick(&mut motion, &g, &mut slides);
        assert!(outcome.wrapped && outcome.remapped);
        assert_eq!(state.iteration, 1);

        // Slides that stayed on screen across the seam keep their identity.
        assert_eq!(slides[0].virtual_index, before[0]);
        assert_eq!(slides[1].virtual_index, before[1]);
    }

    #[test]
    fn page_indices_stay_in_range_over_many_ticks() {
        let g = geometry();
        let mut state = LoopState::new();
        let mut motion = Motion::new();
        let mut slides = pool(g.total);

        for i in 0..2_000 {
            let delta = if i < 1_200 { -37.0 } else { 53.0 };
            motion.step(delta);
            state.tick(&mut motion, &g, &mut slides);
            let (top, bottom) = g.bounds();
            assert!(motion.current <= top && motion.current >= bottom);
            assert!(slides.iter().all(|s| s.page_index < g.total_pages));
        }
    }
}
