//! Errors raised while decoding a source or laying out its pyramid.

use std::path::PathBuf;

use thiserror::Error;
use tileforge_core::error::{AppError, ErrorKind};

/// Pyramid builder failure.
#[derive(Debug, Error)]
pub enum PyramidError {
    /// The source file could not be read.
    #[error("Failed to read source image {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not an image the decoder understands.
    #[error("Source is not a decodable image: {0}")]
    Decode(#[source] image::ImageError),

    /// The image decoded to a raster without pixels.
    #[error("Source image has a zero dimension ({width}x{height})")]
    EmptyImage {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },

    /// A tile edge of zero pixels was requested.
    #[error("Tile size must be positive")]
    ZeroTileSize,
}

impl From<PyramidError> for AppError {
    fn from(err: PyramidError) -> Self {
        let kind = match &err {
            PyramidError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::SourceMissing
            }
            PyramidError::ZeroTileSize => ErrorKind::Configuration,
            _ => ErrorKind::InvalidImage,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
