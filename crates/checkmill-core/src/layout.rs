//! # Layout solver
//!
//! Turns viewport constraints into the geometry the rest of the engine runs
//! on: how many toggle cells fit in a slide, how big a slide is, how many
//! slides the recycled pool needs, and how many logical pages the board is
//! split into.
//!
//! The grid is chosen so that `rows * columns` evenly divides the total
//! toggle count, which makes every page hold exactly the same number of
//! toggles and `total_pages` an exact integer.
//!
//! ```rust
//! use checkmill_core::layout::{LayoutConfig, compute_layout};
//! use checkmill_core::Size;
//!
//! let config = LayoutConfig {
//!     viewport_size: Size::new(800.0, 600.0),
//!     ..LayoutConfig::default()
//! };
//! let layout = compute_layout(&config).unwrap();
//! let cells = layout.pagination.items_per_slide;
//! assert_eq!(config.target_divisor % cells, 0);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::geometry::{Padding, Size};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub cell_size: f64,
    pub grid_spacing: f64,
    pub slide_spacing: f64,

    pub viewport_size: Size,
    pub container_padding: Padding,
    pub slide_padding: Padding,

    pub slide_max_width: f64,
    pub slide_min_height: f64,
    /// Fraction of the viewport height a slide may take (0.0..=1.0).
    pub slide_max_height_ratio: f64,

    /// Total number of logical toggles.
    pub target_divisor: u64,
    pub min_grid_dimension: u32,
    pub max_grid_dimension: u32,

    pub loop_buffer_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cell_size: 32.0,
            grid_spacing: 8.0,
            slide_spacing: 8.0,
            viewport_size: Size::default(),
            container_padding: Padding::uniform(12.0),
            slide_padding: Padding::uniform(12.0),
            slide_max_width: 1024.0,
            slide_min_height: 100.0,
            slide_max_height_ratio: 0.25,
            target_divisor: 65_535 * 16,
            min_grid_dimension: 2,
            max_grid_dimension: 128,
            loop_buffer_ratio: 3.0,
        }
    }
}

impl LayoutConfig {
    pub fn with_viewport(&self, viewport_size: Size) -> Self {
        Self {
            viewport_size,
            ..self.clone()
        }
    }

    pub fn item_footprint(&self) -> f64 {
        self.cell_size + self.grid_spacing
    }

    pub fn validate(&self) -> Result<()> {
        if self.item_footprint() <= 0.0 {
            return Err(ConfigError::NonPositiveFootprint {
                cell_size: self.cell_size,
                spacing: self.grid_spacing,
            });
        }
        let Size { width, height } = self.viewport_size;
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(ConfigError::InvalidViewport { width, height });
        }
        if self.target_divisor == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        let (min, max) = (self.min_grid_dimension, self.max_grid_dimension);
        if min == 0 || min > max {
            return Err(ConfigError::InvalidGridBounds { min, max });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    pub rows: u32,
    pub columns: u32,
}

impl Grid {
    pub fn cells(&self) -> u64 {
        self.rows as u64 * self.columns as u64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideCount {
    pub visible: usize,
    pub buffer: usize,
    pub total: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub items_per_slide: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputedLayout {
    pub slide: Size,
    pub grid: Grid,
    pub slide_count: SlideCount,
    pub content_area: Size,
    pub pagination: Pagination,
}

/// Input constraints plus the geometry derived from them.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub config: LayoutConfig,
    pub computed: ComputedLayout,
}

impl Layout {
    pub fn new(config: LayoutConfig) -> Result<Self> {
        let computed = compute_layout(&config)?;
        Ok(Self { config, computed })
    }

    pub fn with_solver(config: LayoutConfig, solver: &mut GridSolver) -> Result<Self> {
        let computed = solver.compute(&config)?;
        Ok(Self { config, computed })
    }

    /// Distance between the tops of two consecutive slides.
    pub fn stride(&self) -> f64 {
        self.computed.slide.height + self.config.slide_spacing
    }

    /// Physical range the scroll position wraps within.
    pub fn loop_range(&self) -> f64 {
        self.computed.content_area.height - self.config.slide_spacing
    }
}

/// Bounds fed to the grid search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridLimits {
    pub max_rows: u32,
    pub max_cols: u32,
    pub min_dim: u32,
    pub max_dim: u32,
    pub target_divisor: u64,
}

/// Grid search with results memoized per [`GridLimits`].
#[derive(Default)]
pub struct GridSolver {
    memo: HashMap<GridLimits, Grid>,
}

impl GridSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn solve(&mut self, limits: GridLimits) -> Grid {
        *self
            .memo
            .entry(limits)
            .or_insert_with(|| find_optimal_grid(&limits))
    }

    pub fn compute(&mut self, config: &LayoutConfig) -> Result<ComputedLayout> {
        compute_with(config, |limits| self.solve(limits))
    }
}

pub fn compute_layout(config: &LayoutConfig) -> Result<ComputedLayout> {
    compute_with(config, |limits| find_optimal_grid(&limits))
}

fn compute_with(
    config: &LayoutConfig,
    mut solve: impl FnMut(GridLimits) -> Grid,
) -> Result<ComputedLayout> {
    config.validate()?;

    let viewport = config.viewport_size;

    let max_allowed_height = viewport.height * config.slide_max_height_ratio;
    let slide_height = config.slide_min_height.max(max_allowed_height);
    let vertical_padding = config.slide_padding.vertical * 2.0;
    let available_grid_height = (slide_height - vertical_padding).max(0.0);

    let container_width = viewport.width - config.container_padding.horizontal;
    let slide_width = config.slide_max_width.min(container_width);
    let horizontal_padding = config.slide_padding.horizontal * 2.0;
    let available_grid_width = (slide_width - horizontal_padding).max(0.0);

    let footprint = config.item_footprint();
    let physical_max_rows = ((available_grid_height + config.grid_spacing) / footprint).floor();
    let physical_max_cols = ((available_grid_width + config.grid_spacing) / footprint).floor();

    let grid = solve(GridLimits {
        max_rows: physical_max_rows.max(0.0) as u32,
        max_cols: physical_max_cols.max(0.0) as u32,
        min_dim: config.min_grid_dimension,
        max_dim: config.max_grid_dimension,
        target_divisor: config.target_divisor,
    });

    let final_slide_height =
        length_with_gaps(grid.rows as usize, config.cell_size, config.grid_spacing)
            + vertical_padding;
    let final_slide_width =
        length_with_gaps(grid.columns as usize, config.cell_size, config.grid_spacing)
            + horizontal_padding;

    let safe_slide_height = final_slide_height.max(1.0);
    let visible = ((viewport.height / safe_slide_height).ceil() as usize).max(1);
    let buffer = (visible as f64 * config.loop_buffer_ratio).ceil().max(0.0) as usize;
    let total = visible + buffer;

    let content_height = length_with_gaps(total, final_slide_height, config.slide_spacing)
        + config.container_padding.vertical * 2.0;

    let items_per_slide = grid.cells();
    if config.target_divisor % items_per_slide != 0 {
        log::warn!(
            "layout: {}x{} grid does not divide {} toggles; last page is partial",
            grid.rows,
            grid.columns,
            config.target_divisor
        );
    }
    let total_pages = (config.target_divisor / items_per_slide).max(1);

    let computed = ComputedLayout {
        slide: Size::new(final_slide_width, final_slide_height),
        grid,
        slide_count: SlideCount {
            visible,
            buffer,
            total,
        },
        content_area: Size::new(final_slide_width, content_height),
        pagination: Pagination {
            items_per_slide,
            total_items: config.target_divisor,
            total_pages,
        },
    };

    log::debug!(
        "layout: viewport {}x{} -> grid {}x{}, slides {}+{}, {} pages",
        viewport.width,
        viewport.height,
        grid.rows,
        grid.columns,
        visible,
        buffer,
        total_pages
    );

    Ok(computed)
}

/// Total length of `count` items of `item_size` with `gap_size` between them.
pub fn length_with_gaps(count: usize, item_size: f64, gap_size: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    count as f64 * item_size + (count - 1) as f64 * gap_size
}

/// Largest `rows x columns` grid within the limits whose cell count divides
/// `target_divisor`.
///
/// Candidates are scanned column-major from an even-aligned minimum. On equal
/// products the pair found later wins. When nothing divides the target the
/// result is `min_dim x min_dim`.
pub fn find_optimal_grid(limits: &GridLimits) -> Grid {
    let min_dim = limits.min_dim.max(1);
    let limit_cols = limits.max_dim.min(min_dim.max(limits.max_cols));
    let limit_rows = limits.max_dim.min(min_dim.max(limits.max_rows));

    let start = if min_dim % 2 == 0 { min_dim } else { min_dim + 1 };

    let mut best: Option<Grid> = None;
    let mut best_cells = 0u64;

    for columns in start..=limit_cols {
        for rows in start..=limit_rows {
            let cells = rows as u64 * columns as u64;
            if limits.target_divisor % cells == 0 && cells >= best_cells {
                best_cells = cells;
                best = Some(Grid { rows, columns });
            }
        }
    }

    best.unwrap_or_else(|| {
        log::warn!(
            "layout: no grid within {min_dim}..={} divides {}; falling back to {min_dim}x{min_dim}",
            limits.max_dim,
            limits.target_divisor
        );
        Grid {
            rows: min_dim,
            columns: min_dim,
        }
    })
}
