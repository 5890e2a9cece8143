//! Pyramid layout planning command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use tileforge_core::error::AppError;
use tileforge_pyramid::{PyramidLayout, TileGrid};

/// Arguments for the plan command
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Source image width in pixels
    #[arg(long)]
    pub width: u32,

    /// Source image height in pixels
    #[arg(long)]
    pub height: u32,

    /// Tile edge in pixels (defaults to the configured tile size)
    #[arg(long)]
    pub tile_size: Option<u32>,
}

/// Zoom level display row
#[derive(Debug, Serialize, Tabled)]
struct LevelRow {
    /// Zoom
    zoom: u32,
    /// Scale divisor
    scale: u64,
    /// Width
    width: u32,
    /// Height
    height: u32,
    /// Columns
    cols: u32,
    /// Rows
    rows: u32,
    /// Tiles
    tiles: u64,
}

impl From<&TileGrid> for LevelRow {
    fn from(grid: &TileGrid) -> Self {
        Self {
            zoom: grid.zoom,
            scale: grid.scale,
            width: grid.width,
            height: grid.height,
            cols: grid.cols,
            rows: grid.rows,
            tiles: grid.tile_count(),
        }
    }
}

/// Execute the plan command
pub fn execute(
    args: &PlanArgs,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let tile_size = match args.tile_size {
        Some(size) => size,
        None => super::load_config(config_path)?.tiling.tile_size,
    };

    let layout = PyramidLayout::new(args.width, args.height, tile_size)?;
    let rows: Vec<LevelRow> = layout.levels().iter().map(LevelRow::from).collect();
    output::print_list(&rows, format);

    if format == OutputFormat::Table {
        output::print_kv("Max zoom", &layout.max_zoom().to_string());
        output::print_kv("Total tiles", &layout.tile_count().to_string());
    }
    Ok(())
}
