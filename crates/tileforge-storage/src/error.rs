//! Publication errors.

use std::path::PathBuf;

use thiserror::Error;
use tileforge_core::error::{AppError, ErrorKind};
use tileforge_pyramid::TileCoord;

/// Failure while staging or swapping a tile tree.
///
/// Whatever the variant, the previously published tree is left as it was.
#[derive(Debug, Error)]
pub enum PublishError {
    /// A filesystem operation failed.
    #[error("Failed to {op} {path}: {source}")]
    Io {
        /// What was being done, e.g. "write tile".
        op: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tile could not be PNG-encoded.
    #[error("Failed to encode tile {coord}: {source}")]
    Encode {
        coord: TileCoord,
        #[source]
        source: image::ImageError,
    },

    /// A tile did not have the configured edge length.
    #[error("Tile {coord} is {width}x{height}, expected {expected}x{expected}")]
    TileSize {
        coord: TileCoord,
        width: u32,
        height: u32,
        expected: u32,
    },
}

impl PublishError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        AppError::with_source(ErrorKind::PublishFailure, err.to_string(), err)
    }
}
