use std::rc::Rc;

use bitflags::bitflags;
use checkmill_core::error::{ConfigError, Result};
use checkmill_core::layout::LayoutConfig;
use checkmill_core::looper::remap_slides;
use checkmill_core::{
    Layout, LoopConfig, LoopGeometry, LoopPhase, LoopState, Motion, Slide, ToggleBoard,
    create_slides,
};
use serde::{Deserialize, Serialize};

use crate::gestures::{Axis, DragConfig, WheelConfig};
use crate::host::RenderSurface;

bitflags! {
    /// One-frame and gesture-scoped state shared between systems.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AppFlags: u8 {
        /// A pointer drag is in progress.
        const GESTURE_RUNNING = 0b01;
        /// The board changed this frame; hydrated slides need fresh state.
        const INTERACTED      = 0b10;
    }
}

/// Everything accepted at construction. Missing fields take production defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `viewport_size` is overwritten by the measured mount point.
    pub layout: LayoutConfig,
    pub simulation_rate: f64,
    pub max_updates_per_frame: u32,
    pub max_frame_time: f64,
    pub axis: Axis,
    pub drag: DragConfig,
    pub wheel: WheelConfig,
    pub wheel_force_multiplier: f64,
    pub max_wheel_velocity: f64,
    /// Fraction of velocity lost per second of simulated time.
    pub friction: f64,
    /// Speeds below this snap to rest.
    pub velocity_epsilon: f64,
    pub visibility_sync_ms: f64,
    /// Hydration records applied per sync on top of the speed-scaled share.
    pub hydration_batch: usize,
    pub reconfigure_throttle_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            simulation_rate: 60.0,
            max_updates_per_frame: 5,
            max_frame_time: 1000.0,
            axis: Axis::Y,
            drag: DragConfig::default(),
            wheel: WheelConfig::default(),
            wheel_force_multiplier: 0.05,
            max_wheel_velocity: 32.0,
            friction: 0.92,
            velocity_epsilon: 0.05,
            visibility_sync_ms: 32.0,
            hydration_batch: 2,
            reconfigure_throttle_ms: 300.0,
        }
    }
}

impl EngineConfig {
    /// Rejects motion settings that would turn velocity into NaN or let it grow.
    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &'static str, value: f64| -> Result<()> {
            Err(ConfigError::InvalidEngineSetting { name, value })
        };
        if !(0.0..=1.0).contains(&self.friction) {
            return invalid("friction", self.friction);
        }
        if self.max_wheel_velocity.is_nan() || self.max_wheel_velocity < 0.0 {
            return invalid("max_wheel_velocity", self.max_wheel_velocity);
        }
        if !self.velocity_epsilon.is_finite() {
            return invalid("velocity_epsilon", self.velocity_epsilon);
        }
        Ok(())
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            rate_hz: self.simulation_rate,
            max_updates_per_frame: self.max_updates_per_frame,
            max_frame_time: self.max_frame_time,
        }
    }
}

/// The state one configuration of the engine works on.
///
/// Built from scratch on every reconfigure; only the board is carried over.
pub struct AppRef {
    pub surface: Rc<dyn RenderSurface>,
    pub axis: Axis,
    pub layout: Layout,
    pub geometry: LoopGeometry,
    pub board: ToggleBoard,
    pub flags: AppFlags,
    pub motion: Motion,
    pub slides: Vec<Slide>,
    pub loop_state: LoopState,
}

impl AppRef {
    pub fn new(
        surface: Rc<dyn RenderSurface>,
        layout: Layout,
        board: ToggleBoard,
        axis: Axis,
    ) -> Self {
        let geometry = LoopGeometry::from_layout(&layout);
        let containers = surface.create_containers(geometry.total);
        let mut slides = create_slides(containers);
        if slides.len() != geometry.total {
            log::warn!(
                "render surface created {} containers, {} requested",
                slides.len(),
                geometry.total
            );
        }
        // Pages before the first update tick picks a phase.
        remap_slides(&mut slides, LoopPhase::Neutral, 0, &geometry);

        Self {
            surface,
            axis,
            layout,
            geometry,
            board,
            flags: AppFlags::empty(),
            motion: Motion::new(),
            slides,
            loop_state: LoopState::new(),
        }
    }

    pub fn items_per_slide(&self) -> u64 {
        self.layout.computed.pagination.items_per_slide
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_documents_keep_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "friction": 0.5, "axis": "x", "drag": { "history_max_age_ms": 80 } }"#,
        )
        .unwrap();
        assert_eq!(config.friction, 0.5);
        assert_eq!(config.axis, Axis::X);
        assert_eq!(config.drag.history_max_age_ms, 80.0);
        assert_eq!(config.drag.unit_conversion, 10.0);
        assert_eq!(config.simulation_rate, 60.0);
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn motion_settings_are_validated() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));

        let config = EngineConfig {
            friction: 1.5,
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidEngineSetting {
                name: "friction",
                value: 1.5
            })
        );

        for config in [
            EngineConfig {
                friction: f64::NAN,
                ..EngineConfig::default()
            },
            EngineConfig {
                max_wheel_velocity: -1.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                max_wheel_velocity: f64::NAN,
                ..EngineConfig::default()
            },
            EngineConfig {
                velocity_epsilon: f64::INFINITY,
                ..EngineConfig::default()
            },
        ] {
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidEngineSetting { .. })
            ));
        }

        let boundary = EngineConfig {
            friction: 1.0,
            max_wheel_velocity: 0.0,
            ..EngineConfig::default()
        };
        assert!(boundary.validate().is_ok());
    }

    #[test]
    fn flags_toggle_independently() {
        let mut flags = AppFlags::empty();
        flags.insert(AppFlags::GESTURE_RUNNING | AppFlags::INTERACTED);
        flags.remove(AppFlags::INTERACTED);
        assert_eq!(flags, AppFlags::GESTURE_RUNNING);
    }
}
