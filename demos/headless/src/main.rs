//! Plays a scripted fling on the in-memory host and prints the outcome.
//!
//! `headless [config.json]` where the optional file holds
//! `{ "engine": { ... }, "run": { ... } }`; missing fields keep defaults.

use anyhow::Context;
use checkmill_platform::{RunOptions, run_headless};
use checkmill_ui::EngineConfig;
use serde::Deserialize;

#[derive(Default, Deserialize)]
#[serde(default)]
struct DemoConfig {
    engine: EngineConfig,
    run: RunOptions,
}

fn load(path: Option<String>) -> anyhow::Result<DemoConfig> {
    let Some(path) = path else {
        return Ok(DemoConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = load(std::env::args().nth(1))?;
    log::info!(
        "viewport {}x{}, {} frames",
        config.run.viewport.width,
        config.run.viewport.height,
        config.run.frames
    );

    let summary = run_headless(config.engine, &config.run)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
