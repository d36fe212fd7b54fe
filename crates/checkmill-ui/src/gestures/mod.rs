//! Input normalizers. Both recognizers turn raw host events into one stream
//! of [`GestureEvent`]s along the scroll [`Axis`].

mod drag;
mod wheel;

pub use drag::{DragConfig, DragGesture, DragTracker};
pub use wheel::{WheelConfig, WheelGesture, normalize_wheel_delta};

use checkmill_core::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    #[default]
    Y,
}

impl Axis {
    pub fn is_vertical(self) -> bool {
        matches!(self, Axis::Y)
    }

    pub fn sign(self) -> f64 {
        if self.is_vertical() { 1.0 } else { -1.0 }
    }

    pub fn direction(self, n: f64) -> f64 {
        n * self.sign()
    }

    /// Component of `v` along this axis.
    pub fn read(self, v: Vec2) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// A vector that moves `n` along this axis only.
    pub fn vector(self, n: f64) -> Vec2 {
        match self {
            Axis::X => Vec2::new(n, 0.0),
            Axis::Y => Vec2::new(0.0, n),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    Wheel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureState {
    Initialize,
    Update,
    Finalize,
}

/// `delta` is a pixel displacement for `Update`, a release velocity for `Finalize`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub state: GestureState,
    pub delta: f64,
}

impl GestureEvent {
    pub const fn new(kind: GestureKind, state: GestureState, delta: f64) -> Self {
        Self { kind, state, delta }
    }
}
