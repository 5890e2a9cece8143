//! Decoded source image.

use std::path::Path;

use crate::error::PyramidError;
use crate::raster::Raster;

/// A decoded, non-empty source raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    raster: Raster,
}

impl SourceImage {
    /// Decode an in-memory image. The format is sniffed from the bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, PyramidError> {
        let image = image::load_from_memory(bytes).map_err(PyramidError::Decode)?;
        Self::from_raster(Raster::from_rgba(image.into_rgba8()))
    }

    /// Read and decode an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PyramidError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| PyramidError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    /// Use an already decoded raster as the source.
    pub fn from_raster(raster: Raster) -> Result<Self, PyramidError> {
        if raster.width() == 0 || raster.height() == 0 {
            return Err(PyramidError::EmptyImage {
                width: raster.width(),
                height: raster.height(),
            });
        }
        Ok(Self { raster })
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileforge_core::error::{AppError, ErrorKind};

    #[test]
    fn test_decode_png() {
        let raster = Raster::from_fn(30, 20, |x, y| [x as u8, y as u8, 0, 255]);
        let source = SourceImage::decode(&raster.encode_png().unwrap()).unwrap();
        assert_eq!((source.width(), source.height()), (30, 20));
        assert_eq!(source.raster(), &raster);
    }

    #[test]
    fn test_text_file_is_invalid_image() {
        let err = SourceImage::decode(b"this is not an image").unwrap_err();
        assert!(matches!(err, PyramidError::Decode(_)));
        assert_eq!(AppError::from(err).kind, ErrorKind::InvalidImage);
    }

    #[test]
    fn test_empty_raster_is_invalid_image() {
        let err = SourceImage::from_raster(Raster::new_transparent(0, 12)).unwrap_err();
        assert!(matches!(err, PyramidError::EmptyImage { width: 0, height: 12 }));
        assert_eq!(AppError::from(err).kind, ErrorKind::InvalidImage);
    }

    #[test]
    fn test_open_missing_file_is_source_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceImage::open(dir.path().join("source.png")).unwrap_err();
        assert_eq!(AppError::from(err).kind, ErrorKind::SourceMissing);
    }
}
