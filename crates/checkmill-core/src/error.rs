use thiserror::Error;

/// Construction-time configuration failures.
///
/// Everything downstream of layout assumes positive divisors and a valid
/// measurement context, so these are reported before any state is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cell size + grid spacing must be greater than 0 (cell_size={cell_size}, spacing={spacing})")]
    NonPositiveFootprint { cell_size: f64, spacing: f64 },

    #[error("no render context could be resolved from the mount point")]
    MissingRenderContext,

    #[error("viewport must be finite and non-negative (got {width}x{height})")]
    InvalidViewport { width: f64, height: f64 },

    #[error("simulation rate must be a positive, finite number of Hz (got {0})")]
    InvalidSimulationRate(f64),

    #[error("target divisor must be at least 1")]
    EmptyBoard,

    #[error("grid dimensions need 1 <= min <= max (min={min}, max={max})")]
    InvalidGridBounds { min: u32, max: u32 },

    #[error("invalid engine setting `{name}`: {value}")]
    InvalidEngineSetting { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
