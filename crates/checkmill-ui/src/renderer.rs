use std::rc::Rc;

use checkmill_core::{Layout, Slide, ToggleBoard};

use crate::gestures::Axis;
use crate::host::{Placement, RenderSurface};

/// Rounds to 1/100 px so sub-pixel noise does not churn the host.
pub fn round_translation(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Drives the render surface for one slide pool.
pub struct SlideRenderer {
    surface: Rc<dyn RenderSurface>,
    axis: Axis,
    range: f64,
    stride: f64,
    slide_spacing: f64,
    center: f64,
    items_per_slide: u64,
    /// Page each slide currently shows, by real index.
    hydrated: Vec<Option<u64>>,
    scrolling: bool,
}

impl SlideRenderer {
    pub fn new(surface: Rc<dyn RenderSurface>, layout: &Layout, axis: Axis) -> Self {
        let viewport = layout.config.viewport_size;
        Self {
            surface,
            axis,
            range: layout.loop_range(),
            stride: layout.stride(),
            slide_spacing: layout.config.slide_spacing,
            center: (viewport.width - layout.computed.slide.width) / 2.0,
            items_per_slide: layout.computed.pagination.items_per_slide,
            hydrated: vec![None; layout.computed.slide_count.total],
            scrolling: false,
        }
    }

    pub fn placements(&self, slides: &[Slide]) -> Vec<Placement> {
        slides
            .iter()
            .map(|slide| Placement {
                container: slide.container,
                top: slide.real_index() as f64 * self.stride + self.slide_spacing,
                left: self.center,
            })
            .collect()
    }

    pub fn mount(&self, slides: &[Slide]) {
        self.surface.mount(&self.placements(slides));
    }

    pub fn hydrate(&mut self, slide: &Slide, board: &ToggleBoard) {
        let page = slide.page_index;
        let checked: Vec<bool> = board
            .chunk(page * self.items_per_slide, self.items_per_slide)
            .collect();
        self.surface.hydrate(slide.container, page, &checked);
        if let Some(slot) = self.hydrated.get_mut(slide.real_index()) {
            *slot = Some(page);
        }
    }

    pub fn dehydrate(&mut self, slide: &Slide) {
        self.surface.dehydrate(slide.container);
        if let Some(slot) = self.hydrated.get_mut(slide.real_index()) {
            *slot = None;
        }
    }

    pub fn is_hydrated(&self, slide: &Slide) -> bool {
        matches!(self.hydrated.get(slide.real_index()), Some(Some(_)))
    }

    /// Re-sends checked state for every hydrated slide.
    pub fn update_state(&mut self, slides: &[Slide], board: &ToggleBoard) {
        for slide in slides {
            if self.is_hydrated(slide) {
                self.hydrate(slide, board);
            }
        }
    }

    /// Rehydrates hydrated slides whose page moved under them.
    pub fn sync_pages(&mut self, slides: &[Slide], board: &ToggleBoard) {
        for slide in slides {
            if let Some(Some(page)) = self.hydrated.get(slide.real_index())
                && *page != slide.page_index
            {
                self.hydrate(slide, board);
            }
        }
    }

    pub fn sync_position(&self, slides: &[Slide], offset: f64) {
        for slide in slides {
            let target = slide.viewport_offset.factor() * self.range + offset;
            self.surface
                .set_translation(slide.container, self.axis.vector(round_translation(target)));
        }
    }

    pub fn set_scrolling(&mut self, scrolling: bool) {
        if self.scrolling != scrolling {
            self.scrolling = scrolling;
            self.surface.set_scrolling(scrolling);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_hundredths() {
        assert_eq!(round_translation(-12.3456), -12.35);
        assert_eq!(round_translation(0.004), 0.0);
    }
}
