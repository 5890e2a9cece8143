//! Owned RGBA8 pixel buffer.

use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use tileforge_core::config::ResampleFilter;

/// An owned, always-RGBA raster.
///
/// Every pixel format the decoder produces is normalized to RGBA8 on the
/// way in, so tiles can carry transparent padding regardless of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pixels: RgbaImage,
}

impl Raster {
    /// A fully transparent raster.
    pub fn new_transparent(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])),
        }
    }

    /// Wrap an existing RGBA buffer.
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Build a raster by evaluating `f` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        Self {
            pixels: RgbaImage::from_fn(width, height, |x, y| Rgba(f(x, y))),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// RGBA value at `(x, y)`, top-left origin.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// A resampled copy of exactly `width × height`.
    ///
    /// Requesting the current size returns an untouched copy.
    pub fn resized(&self, width: u32, height: u32, filter: ResampleFilter) -> Self {
        if width == self.width() && height == self.height() {
            return self.clone();
        }
        Self {
            pixels: imageops::resize(&self.pixels, width, height, filter_type(filter)),
        }
    }

    /// Copy of the `width × height` region whose top-left corner is `(x, y)`.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            pixels: imageops::crop_imm(&self.pixels, x, y, width, height).to_image(),
        }
    }

    /// Overwrite pixels starting at `(x, y)` with `other`, clipping at the edges.
    pub fn paste(&mut self, other: &Raster, x: u32, y: u32) {
        imageops::replace(&mut self.pixels, &other.pixels, i64::from(x), i64::from(y));
    }

    /// Encode as an RGBA PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf).write_image(
            self.pixels.as_raw(),
            self.width(),
            self.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(buf)
    }
}

/// Map the configured filter onto the resampler's filter type.
pub fn filter_type(filter: ResampleFilter) -> FilterType {
    match filter {
        ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        ResampleFilter::CatmullRom => FilterType::CatmullRom,
        ResampleFilter::Triangle => FilterType::Triangle,
        ResampleFilter::Nearest => FilterType::Nearest,
    }
}
