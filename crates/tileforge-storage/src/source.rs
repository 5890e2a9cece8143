//! Source image resolution.

use std::path::PathBuf;

use tileforge_core::config::StorageConfig;
use tileforge_core::error::{AppError, ErrorKind};
use tileforge_core::result::AppResult;
use tileforge_core::types::id::MapId;

/// Derives the source image path of a map: `{root}/{map_id}/{file_name}`.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    root: PathBuf,
    file_name: String,
}

impl SourceLocator {
    pub fn new(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_name: file_name.into(),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(&storage.source_root, &storage.source_file_name)
    }

    /// Where the source of `map_id` is expected, whether or not it exists.
    pub fn path_for(&self, map_id: &MapId) -> PathBuf {
        self.root.join(map_id.as_str()).join(&self.file_name)
    }

    /// The source path of `map_id`, provided a regular file exists there.
    pub fn resolve(&self, map_id: &MapId) -> AppResult<PathBuf> {
        let path = self.path_for(map_id);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(AppError::source_missing(format!(
                "{} is not a regular file",
                path.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::source_missing(
                format!("{} does not exist", path.display()),
            )),
            Err(e) => Err(AppError::with_source(
                ErrorKind::SourceMissing,
                format!("Failed to stat {}", path.display()),
                e,
            )),
        }
    }
}
