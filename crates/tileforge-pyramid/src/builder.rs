//! Lazy tile generation.

use std::borrow::Cow;
use std::fmt;
use std::iter::FusedIterator;
use std::path::PathBuf;

use tileforge_core::config::{ResampleFilter, TilingConfig};
use tracing::debug;

use crate::error::PyramidError;
use crate::layout::{PyramidLayout, TileGrid};
use crate::raster::Raster;
use crate::source::SourceImage;

/// Address of a tile. `row` counts from the bottom of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub zoom: u32,
    pub col: u32,
    pub row: u32,
}

impl TileCoord {
    pub fn new(zoom: u32, col: u32, row: u32) -> Self {
        Self { zoom, col, row }
    }

    /// Path of the tile file relative to the pyramid root: `{zoom}/{col}/{row}.png`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.zoom.to_string())
            .join(self.col.to_string())
            .join(format!("{}.png", self.row))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.col, self.row)
    }
}

/// One generated tile. The raster is always `tile_size × tile_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub coord: TileCoord,
    pub raster: Raster,
}

/// Produces the pyramid of one source image.
#[derive(Debug)]
pub struct PyramidBuilder {
    source: SourceImage,
    layout: PyramidLayout,
    filter: ResampleFilter,
}

impl PyramidBuilder {
    pub fn new(
        source: SourceImage,
        tile_size: u32,
        filter: ResampleFilter,
    ) -> Result<Self, PyramidError> {
        let layout = PyramidLayout::new(source.width(), source.height(), tile_size)?;
        Ok(Self {
            source,
            layout,
            filter,
        })
    }

    pub fn from_config(source: SourceImage, tiling: &TilingConfig) -> Result<Self, PyramidError> {
        Self::new(source, tiling.tile_size, tiling.filter)
    }

    pub fn layout(&self) -> &PyramidLayout {
        &self.layout
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// Iterate over every tile, zoom 0 first, then by column, then by row.
    ///
    /// Each call starts from scratch; a level is resampled only when the
    /// iterator reaches it and dropped when it moves on.
    pub fn tiles(&self) -> PyramidTiles<'_> {
        PyramidTiles {
            builder: self,
            level: 0,
            current: None,
            col: 0,
            row: 0,
            remaining: self.layout.tile_count(),
        }
    }
}

/// Iterator returned by [`PyramidBuilder::tiles`].
#[derive(Debug)]
pub struct PyramidTiles<'a> {
    builder: &'a PyramidBuilder,
    level: usize,
    current: Option<Cow<'a, Raster>>,
    col: u32,
    row: u32,
    remaining: u64,
}

impl<'a> PyramidTiles<'a> {
    fn render_level(&self, grid: &TileGrid) -> Cow<'a, Raster> {
        let source = self.builder.source.raster();
        if grid.scale == 1 {
            return Cow::Borrowed(source);
        }
        debug!(
            zoom = grid.zoom,
            width = grid.width,
            height = grid.height,
            cols = grid.cols,
            rows = grid.rows,
            "Resampling zoom level"
        );
        Cow::Owned(source.resized(grid.width, grid.height, self.builder.filter))
    }

    fn cut(level: &Raster, grid: &TileGrid, col: u32, row: u32) -> Raster {
        let window = grid
            .pixel_window(col, row)
            .unwrap_or_else(|| unreachable!("tile ({col}, {row}) outside {grid:?}"));
        let crop = level.crop(window.x, window.y, window.width, window.height);
        if window.width == grid.tile_size && window.height == grid.tile_size {
            return crop;
        }
        let (x, y) = grid.placement(&window);
        let mut canvas = Raster::new_transparent(grid.tile_size, grid.tile_size);
        canvas.paste(&crop, x, y);
        canvas
    }
}

impl Iterator for PyramidTiles<'_> {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        loop {
            let grid = *self.builder.layout.levels().get(self.level)?;

            if self.col >= grid.cols {
                self.level += 1;
                self.current = None;
                self.col = 0;
                self.row = 0;
                continue;
            }

            if self.current.is_none() {
                self.current = Some(self.render_level(&grid));
            }
            let level = self.current.as_deref()?;

            let coord = TileCoord::new(grid.zoom, self.col, self.row);
            let raster = Self::cut(level, &grid, self.col, self.row);

            self.row += 1;
            if self.row >= grid.rows {
                self.row = 0;
                self.col += 1;
            }
            self.remaining -= 1;

            return Some(Tile { coord, raster });
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl FusedIterator for PyramidTiles<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

    fn gradient(width: u32, height: u32) -> SourceImage {
        SourceImage::from_raster(Raster::from_fn(width, height, |x, y| {
            [(x % 251) as u8, (y % 241) as u8, ((x / 251) * 16 + y / 241) as u8, 255]
        }))
        .unwrap()
    }

    fn build(width: u32, height: u32) -> PyramidBuilder {
        PyramidBuilder::new(gradient(width, height), 256, ResampleFilter::Lanczos3).unwrap()
    }

    fn find(tiles: &[Tile], zoom: u32, col: u32, row: u32) -> &Tile {
        tiles
            .iter()
            .find(|t| t.coord == TileCoord::new(zoom, col, row))
            .unwrap()
    }

    #[test]
    fn test_small_image_yields_single_padded_tile() {
        let builder = build(100, 100);
        assert_eq!(builder.layout().max_zoom(), 0);

        let tiles: Vec<_> = builder.tiles().collect();
        assert_eq!(tiles.len(), 1);
        let tile = &tiles[0];
        assert_eq!(tile.coord, TileCoord::new(0, 0, 0));
        assert_eq!((tile.raster.width(), tile.raster.height()), (256, 256));

        let src = builder.source().raster();
        assert_eq!(tile.raster.pixel(0, 156), src.pixel(0, 0));
        assert_eq!(tile.raster.pixel(99, 255), src.pixel(99, 99));
        assert_eq!(tile.raster.pixel(0, 0), TRANSPARENT);
        assert_eq!(tile.raster.pixel(0, 155), TRANSPARENT);
        assert_eq!(tile.raster.pixel(100, 200), TRANSPARENT);
    }

    #[test]
    fn test_square_512_deepest_level_is_two_by_two() {
        let builder = build(512, 512);
        let coords: Vec<_> = builder.tiles().map(|t| t.coord).collect();
        assert_eq!(
            coords,
            vec![
                TileCoord::new(0, 0, 0),
                TileCoord::new(1, 0, 0),
                TileCoord::new(1, 0, 1),
                TileCoord::new(1, 1, 0),
                TileCoord::new(1, 1, 1),
            ]
        );
    }

    #[test]
    fn test_tile_counts_follow_layout() {
        let builder = build(1024, 512);
        let tiles: Vec<_> = builder.tiles().collect();
        for grid in builder.layout().levels() {
            let count = tiles.iter().filter(|t| t.coord.zoom == grid.zoom).count() as u64;
            assert_eq!(count, grid.tile_count(), "zoom {}", grid.zoom);
        }
        assert_eq!(tiles.len(), 8 + 2 + 1);
        assert!(
            tiles
                .iter()
                .all(|t| t.raster.width() == 256 && t.raster.height() == 256)
        );
    }

    #[test]
    fn test_rows_count_from_bottom() {
        let builder = build(256, 512);
        let tiles: Vec<_> = builder.tiles().collect();
        let src = builder.source().raster();

        let bottom = find(&tiles, 1, 0, 0);
        let top = find(&tiles, 1, 0, 1);
        assert_eq!(bottom.raster, src.crop(0, 256, 256, 256));
        assert_eq!(top.raster, src.crop(0, 0, 256, 256));
    }

    #[test]
    fn test_top_row_is_bottom_aligned() {
        let builder = build(256, 300);
        let tiles: Vec<_> = builder.tiles().collect();
        let src = builder.source().raster();

        let top = find(&tiles, 1, 0, 1);
        assert_eq!(top.raster.pixel(0, 211), TRANSPARENT);
        assert_eq!(top.raster.pixel(0, 212), src.pixel(0, 0));
        assert_eq!(top.raster.pixel(255, 255), src.pixel(255, 43));

        let bottom = find(&tiles, 1, 0, 0);
        assert_eq!(bottom.raster, src.crop(0, 44, 256, 256));
    }

    #[test]
    fn test_edge_padding_is_transparent_and_exact() {
        let builder = build(300, 200);
        let tiles: Vec<_> = builder.tiles().collect();
        let src = builder.source().raster();

        let edge = find(&tiles, 1, 1, 0);
        assert_eq!((edge.raster.width(), edge.raster.height()), (256, 256));
        for y in 0..256 {
            for x in 0..256 {
                let px = edge.raster.pixel(x, y);
                if x < 44 && y >= 56 {
                    assert_eq!(px, src.pixel(256 + x, y - 56), "({x}, {y})");
                } else {
                    assert_eq!(px, TRANSPARENT, "({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_native_level_is_not_resampled() {
        let builder = build(600, 280);
        let max_zoom = builder.layout().max_zoom();
        let src = builder.source().raster();
        let tiles: Vec<_> = builder.tiles().filter(|t| t.coord.zoom == max_zoom).collect();
        let first = find(&tiles, max_zoom, 0, 0);
        assert_eq!(first.raster, src.crop(0, 24, 256, 256));
    }

    #[test]
    fn test_iteration_is_repeatable_and_sized() {
        let builder = build(700, 300);
        let mut tiles = builder.tiles();
        assert_eq!(tiles.size_hint(), (6 + 2 + 1, Some(9)));
        tiles.next();
        assert_eq!(tiles.size_hint().0, 8);

        let first: Vec<_> = builder.tiles().collect();
        let second: Vec<_> = builder.tiles().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            TileCoord::new(3, 4, 5).relative_path(),
            PathBuf::from("3").join("4").join("5.png")
        );
    }
}
