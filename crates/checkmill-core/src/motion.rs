/// One scroll axis worth of kinematic state.
///
/// `current`/`previous` are the last two simulated positions, `offset` is the
/// interpolated position that gets rendered, `target` follows the position on
/// bulk shifts, and `direction` is the sign of the last displacement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    pub current: f64,
    pub previous: f64,
    pub offset: f64,
    pub target: f64,
    pub velocity: f64,
    pub direction: f64,
}

impl Default for Motion {
    fn default() -> Self {
        Self::new()
    }
}

impl Motion {
    pub const fn new() -> Self {
        Self {
            current: 0.0,
            previous: 0.0,
            offset: 0.0,
            target: 0.0,
            velocity: 0.0,
            direction: 1.0,
        }
    }

    /// Shifts every position by `delta`, keeping their relative spacing.
    pub fn move_by(&mut self, delta: f64) {
        self.current += delta;
        self.previous += delta;
        self.offset += delta;
        self.target += delta;
    }

    /// Snaps every position to `position`. Velocity and direction are kept.
    pub fn move_to(&mut self, position: f64) {
        self.current = position;
        self.previous = position;
        self.offset = position;
        self.target = position;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advances `current` by `displacement`, remembering where it was.
    pub fn step(&mut self, displacement: f64) {
        self.previous = self.current;
        self.current += displacement;
        if displacement != 0.0 {
            self.direction = displacement.signum();
        }
    }

    /// Position between the last two simulated states, `alpha` in `[0, 1)`.
    pub fn lerp(&self, alpha: f64) -> f64 {
        self.current * alpha + self.previous * (1.0 - alpha)
    }
}

/// Fraction of velocity lost over `dt_ms` for a per-second `friction`.
pub fn friction_decay(friction: f64, dt_ms: f64) -> f64 {
    1.0 - (1.0 - friction).powf(dt_ms / 1000.0)
}
