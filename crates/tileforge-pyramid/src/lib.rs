//! # tileforge-pyramid
//!
//! Turns one decoded raster into a slippy-map style tile pyramid.
//!
//! - [`Raster`] is the owned RGBA buffer with the resize/crop/paste
//!   operations the builder needs
//! - [`PyramidLayout`] is the pure geometry: zoom range, per-level resized
//!   dimensions and tile grids, bottom-left-origin tile windows
//! - [`PyramidBuilder`] yields the tiles lazily, one zoom level at a time
//!
//! Rows are addressed TMS-style: row 0 is the bottom strip of the image at
//! every zoom level.

pub mod builder;
pub mod error;
pub mod layout;
pub mod raster;
pub mod source;

pub use builder::{PyramidBuilder, PyramidTiles, Tile, TileCoord};
pub use error::PyramidError;
pub use layout::{PixelWindow, PyramidLayout, TileGrid};
pub use raster::Raster;
pub use source::SourceImage;

/// Nominal tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;
