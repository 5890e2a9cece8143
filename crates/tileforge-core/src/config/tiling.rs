//! Tile pyramid geometry configuration.

use serde::{Deserialize, Serialize};

/// Resampling filter used when downscaling a zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    /// Lanczos with window 3.
    #[default]
    Lanczos3,
    /// Catmull-Rom cubic.
    CatmullRom,
    /// Linear (triangle).
    Triangle,
    /// Nearest neighbour.
    Nearest,
}

/// Tile pyramid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilingConfig {
    /// Edge length of every tile in pixels.
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    /// Downscaling filter.
    #[serde(default)]
    pub filter: ResampleFilter,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            tile_size: default_tile_size(),
            filter: ResampleFilter::default(),
        }
    }
}

fn default_tile_size() -> u32 {
    256
}
