use checkmill_core::motion::friction_decay;
use checkmill_core::{Dispose, Motion, Phase};

use super::{AppPipeline, SystemContext, SystemInstance};

/// Fixed-step physics: friction integration followed by loop maintenance.
pub fn update_system(ctx: &SystemContext<'_>) -> SystemInstance {
    let friction = ctx.config.friction;
    let epsilon = ctx.config.velocity_epsilon;

    SystemInstance {
        name: "update",
        teardown: Dispose::noop(),
        logic: AppPipeline::new()
            .with(Phase::Update, move |app, params| {
                integrate_inertia(&mut app.motion, friction, epsilon, params.dt)
            })
            .with(Phase::Update, |app, _| {
                app.loop_state
                    .tick(&mut app.motion, &app.geometry, &mut app.slides);
            }),
    }
}

/// Applies friction over `dt_ms` and moves by the remaining velocity.
pub fn integrate_inertia(motion: &mut Motion, friction: f64, epsilon: f64, dt_ms: f64) {
    let decay = friction_decay(friction, dt_ms);
    motion.velocity *= 1.0 - decay;
    if motion.velocity.abs() < epsilon {
        motion.velocity = 0.0;
    }
    motion.step(motion.velocity);
}
