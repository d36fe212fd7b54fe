use checkmill_core::Dispose;

use super::{AppPipeline, SystemContext, SystemInstance};

/// Connects the host's network link, if any, and disconnects on teardown.
/// Contributes no processors.
pub fn network_system(ctx: &SystemContext<'_>) -> SystemInstance {
    let teardown = match ctx.host.network.clone() {
        Some(link) => {
            link.connect();
            Dispose::new(move || link.disconnect())
        }
        None => Dispose::noop(),
    };

    SystemInstance {
        name: "network",
        teardown,
        logic: AppPipeline::new(),
    }
}
