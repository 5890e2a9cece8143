//! Pyramid geometry.
//!
//! Everything here is integer arithmetic on image and tile dimensions; no
//! pixels are touched. Tile rows count from the bottom of the image upward,
//! so a partial strip (when the height is not a multiple of the tile size)
//! is always the topmost row, and a partial column is always the rightmost.

use crate::error::PyramidError;

/// Smallest zoom such that `tile_size * 2^zoom` covers the longer image side.
///
/// Equivalent to `ceil(log2(max(1, max(width, height) / tile_size)))`
/// without floating point rounding at exact powers of two.
pub fn max_zoom_for(width: u32, height: u32, tile_size: u32) -> u32 {
    let longest = u64::from(width.max(height));
    let tile = u64::from(tile_size.max(1));
    let mut zoom = 0;
    while tile << zoom < longest {
        zoom += 1;
    }
    zoom
}

/// A crop rectangle in raster coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Tile grid of one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    /// Zoom level; 0 is the coarsest.
    pub zoom: u32,
    /// Downscale divisor applied to the source, `2^(max_zoom - zoom)`.
    pub scale: u64,
    /// Resized image width at this level.
    pub width: u32,
    /// Resized image height at this level.
    pub height: u32,
    /// Number of tile columns.
    pub cols: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Tile edge length.
    pub tile_size: u32,
}

impl TileGrid {
    fn new(zoom: u32, max_zoom: u32, width: u32, height: u32, tile_size: u32) -> Self {
        let scale = 1u64 << (max_zoom - zoom);
        // Fractional pixels round up so the last source column/row survives.
        let width = u64::from(width).div_ceil(scale) as u32;
        let height = u64::from(height).div_ceil(scale) as u32;
        Self {
            zoom,
            scale,
            width,
            height,
            cols: width.div_ceil(tile_size),
            rows: height.div_ceil(tile_size),
            tile_size,
        }
    }

    /// Number of tiles at this level.
    pub fn tile_count(&self) -> u64 {
        u64::from(self.cols) * u64::from(self.rows)
    }

    /// Raster window covered by the tile at `(col, row)`, rows counted from
    /// the bottom. `None` when the address lies outside the grid.
    pub fn pixel_window(&self, col: u32, row: u32) -> Option<PixelWindow> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        let x = col * self.tile_size;
        let bottom = self.height - row * self.tile_size;
        let top = bottom.saturating_sub(self.tile_size);
        Some(PixelWindow {
            x,
            y: top,
            width: (self.width - x).min(self.tile_size),
            height: bottom - top,
        })
    }

    /// Where a window's content sits inside its tile canvas.
    ///
    /// Content is flush with the bottom-left corner, so padding lands on the
    /// right of the last column and above the content of the top row.
    pub fn placement(&self, window: &PixelWindow) -> (u32, u32) {
        (0, self.tile_size - window.height)
    }

    /// Convert between bottom-up (TMS) and top-down (XYZ) row numbering.
    /// `None` when `row` lies outside the grid.
    pub fn flip_row(&self, row: u32) -> Option<u32> {
        (row < self.rows).then(|| self.rows - 1 - row)
    }
}

/// Zoom range and per-level grids for one source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidLayout {
    width: u32,
    height: u32,
    tile_size: u32,
    max_zoom: u32,
    levels: Vec<TileGrid>,
}

impl PyramidLayout {
    /// Compute the layout for a `width × height` source.
    pub fn new(width: u32, height: u32, tile_size: u32) -> Result<Self, PyramidError> {
        if tile_size == 0 {
            return Err(PyramidError::ZeroTileSize);
        }
        if width == 0 || height == 0 {
            return Err(PyramidError::EmptyImage { width, height });
        }
        let max_zoom = max_zoom_for(width, height, tile_size);
        let levels = (0..=max_zoom)
            .map(|zoom| TileGrid::new(zoom, max_zoom, width, height, tile_size))
            .collect();
        Ok(Self {
            width,
            height,
            tile_size,
            max_zoom,
            levels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn max_zoom(&self) -> u32 {
        self.max_zoom
    }

    /// Grids ordered from zoom 0 to `max_zoom`.
    pub fn levels(&self) -> &[TileGrid] {
        &self.levels
    }

    pub fn grid(&self, zoom: u32) -> Option<&TileGrid> {
        self.levels.get(zoom as usize)
    }

    /// Total number of tiles across all levels.
    pub fn tile_count(&self) -> u64 {
        self.levels.iter().map(TileGrid::tile_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_zoom_small_images_stay_at_zero() {
        assert_eq!(max_zoom_for(1, 1, 256), 0);
        assert_eq!(max_zoom_for(100, 100, 256), 0);
        assert_eq!(max_zoom_for(256, 40, 256), 0);
    }

    #[test]
    fn test_max_zoom_boundaries() {
        assert_eq!(max_zoom_for(257, 10, 256), 1);
        assert_eq!(max_zoom_for(512, 512, 256), 1);
        assert_eq!(max_zoom_for(513, 512, 256), 2);
        assert_eq!(max_zoom_for(1024, 512, 256), 2);
        assert_eq!(max_zoom_for(300, 4097, 256), 5);
    }

    #[test]
    fn test_max_zoom_matches_log_formula() {
        for longest in [1u32, 255, 256, 257, 511, 512, 700, 1023, 1024, 1025, 9000] {
            let expected = (f64::from(longest) / 256.0).max(1.0).log2().ceil() as u32;
            assert_eq!(max_zoom_for(longest, 1, 256), expected, "longest={longest}");
        }
    }

    #[test]
    fn test_square_power_of_two_levels() {
        let layout = PyramidLayout::new(512, 512, 256).unwrap();
        assert_eq!(layout.max_zoom(), 1);

        let deepest = layout.grid(1).unwrap();
        assert_eq!(deepest.scale, 1);
        assert_eq!((deepest.width, deepest.height), (512, 512));
        assert_eq!((deepest.cols, deepest.rows), (2, 2));

        let top = layout.grid(0).unwrap();
        assert_eq!((top.width, top.height), (256, 256));
        assert_eq!((top.cols, top.rows), (1, 1));
        assert_eq!(layout.tile_count(), 5);
    }

    #[test]
    fn test_resized_dimensions_round_up() {
        let layout = PyramidLayout::new(1001, 301, 256).unwrap();
        assert_eq!(layout.max_zoom(), 2);
        let dims: Vec<_> = layout.levels().iter().map(|g| (g.width, g.height)).collect();
        assert_eq!(dims, vec![(251, 76), (501, 151), (1001, 301)]);
    }

    #[test]
    fn test_tile_count_per_level_is_ceil_product() {
        let layout = PyramidLayout::new(1000, 700, 256).unwrap();
        for grid in layout.levels() {
            let expected =
                u64::from(grid.width.div_ceil(256)) * u64::from(grid.height.div_ceil(256));
            assert_eq!(grid.tile_count(), expected);
        }
    }

    #[test]
    fn test_row_zero_is_bottom_strip() {
        let layout = PyramidLayout::new(256, 300, 256).unwrap();
        let grid = layout.grid(layout.max_zoom()).unwrap();
        assert_eq!(grid.rows, 2);

        let bottom = grid.pixel_window(0, 0).unwrap();
        assert_eq!(bottom, PixelWindow { x: 0, y: 44, width: 256, height: 256 });

        let top = grid.pixel_window(0, 1).unwrap();
        assert_eq!(top, PixelWindow { x: 0, y: 0, width: 256, height: 44 });
        assert_eq!(grid.placement(&top), (0, 212));
    }

    #[test]
    fn test_last_column_window_is_partial() {
        let layout = PyramidLayout::new(300, 200, 256).unwrap();
        let grid = layout.grid(1).unwrap();
        let window = grid.pixel_window(1, 0).unwrap();
        assert_eq!(window, PixelWindow { x: 256, y: 0, width: 44, height: 200 });
        assert_eq!(grid.placement(&window), (0, 56));
        assert!(grid.pixel_window(2, 0).is_none());
        assert!(grid.pixel_window(0, 1).is_none());
    }

    #[test]
    fn test_flip_row_is_involution() {
        let layout = PyramidLayout::new(256, 1024, 256).unwrap();
        let grid = layout.grid(2).unwrap();
        assert_eq!(grid.rows, 4);
        assert_eq!(grid.flip_row(0), Some(3));
        assert_eq!(grid.flip_row(3), Some(0));
        for row in 0..grid.rows {
            assert_eq!(grid.flip_row(row).and_then(|r| grid.flip_row(r)), Some(row));
        }
    }

    #[test]
    fn test_flip_row_outside_grid() {
        let layout = PyramidLayout::new(256, 1024, 256).unwrap();
        let grid = layout.grid(2).unwrap();
        assert_eq!(grid.flip_row(4), None);
        assert_eq!(grid.flip_row(u32::MAX), None);
    }

    #[test]
    fn test_degenerate_inputs_rejected() {
        assert!(matches!(
            PyramidLayout::new(0, 10, 256),
            Err(PyramidError::EmptyImage { width: 0, height: 10 })
        ));
        assert!(matches!(
            PyramidLayout::new(10, 10, 0),
            Err(PyramidError::ZeroTileSize)
        ));
    }
}
