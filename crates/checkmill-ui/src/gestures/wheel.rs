use std::cell::Cell;
use std::rc::Rc;

use checkmill_core::{DisposableStore, Dispose, Emitter, Tier};
use serde::{Deserialize, Serialize};

use super::{Axis, GestureEvent, GestureKind, GestureState};
use crate::host::{DeltaMode, EventFlow, InputChannel, InputEvent, InputSource};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub line_height: f64,
    /// Used for page-mode deltas when no content extent is known.
    pub page_fallback: f64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            line_height: 16.0,
            page_fallback: 800.0,
        }
    }
}

/// Converts a raw wheel delta into content pixels. The sign is inverted:
/// content moves against the wheel.
pub fn normalize_wheel_delta(raw: f64, mode: DeltaMode, line_height: f64, page: f64) -> f64 {
    let px = match mode {
        DeltaMode::Pixel => raw,
        DeltaMode::Line => raw * line_height,
        DeltaMode::Page => raw * page,
    };
    -px
}

/// Wheel recognizer: one `Update` per wheel event, native scrolling always suppressed.
#[derive(Clone)]
pub struct WheelGesture {
    input: Rc<dyn InputSource>,
    axis: Axis,
    config: WheelConfig,
    page_extent: Rc<Cell<Option<f64>>>,
    wheeled: Emitter<GestureEvent>,
}

impl WheelGesture {
    pub fn new(input: Rc<dyn InputSource>, axis: Axis, config: WheelConfig) -> Self {
        Self {
            input,
            axis,
            config,
            page_extent: Rc::new(Cell::new(None)),
            wheeled: Emitter::new(),
        }
    }

    /// Sets the extent page-mode deltas scroll by.
    pub fn set_page_extent(&self, extent: f64) {
        let extent = (extent.is_finite() && extent > 0.0).then_some(extent);
        self.page_extent.set(extent);
    }

    pub fn register(&self, f: impl Fn(&GestureEvent) + 'static) -> Dispose {
        self.wheeled.register(f)
    }

    pub fn init(&self) -> Dispose {
        let disposables = DisposableStore::new();

        let axis = self.axis;
        let config = self.config;
        let page_extent = self.page_extent.clone();
        let wheeled = self.wheeled.clone();
        let listener = self.input.listen(
            InputChannel::Wheel,
            Rc::new(move |event: &InputEvent| {
                if let InputEvent::Wheel(wheel) = event {
                    let page = page_extent.get().unwrap_or(config.page_fallback);
                    let delta = normalize_wheel_delta(
                        axis.read(wheel.delta),
                        wheel.mode,
                        config.line_height,
                        page,
                    );
                    wheeled.emit(&GestureEvent::new(
                        GestureKind::Wheel,
                        GestureState::Update,
                        delta,
                    ));
                }
                EventFlow::PREVENT_DEFAULT
            }),
        );

        let wheeled = self.wheeled.clone();
        disposables.push_all(Tier::Static, [Dispose::new(move || wheeled.clear()), listener]);
        disposables.into_dispose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_mode_scales_and_inverts() {
        assert_eq!(normalize_wheel_delta(3.0, DeltaMode::Line, 16.0, 800.0), -48.0);
    }

    #[test]
    fn pixel_and_page_modes() {
        assert_eq!(normalize_wheel_delta(-12.5, DeltaMode::Pixel, 16.0, 800.0), 12.5);
        assert_eq!(normalize_wheel_delta(1.0, DeltaMode::Page, 16.0, 600.0), -600.0);
    }
}
