//! Source and output filesystem configuration.

use serde::{Deserialize, Serialize};

/// Shared-storage locations for source images and published tiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per map with the uploaded source.
    #[serde(default = "default_source_root")]
    pub source_root: String,
    /// File name of the source image inside a map's upload directory.
    #[serde(default = "default_source_file_name")]
    pub source_file_name: String,
    /// Directory under which tile pyramids are published.
    #[serde(default = "default_output_root")]
    pub output_root: String,
    /// URL path prefix the published tiles are served under.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Age in seconds after which abandoned staging artifacts are swept.
    #[serde(default = "default_stale_after")]
    pub stale_after_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            source_file_name: default_source_file_name(),
            output_root: default_output_root(),
            public_prefix: default_public_prefix(),
            stale_after_seconds: default_stale_after(),
        }
    }
}

fn default_source_root() -> String {
    "/shared_uploads".to_string()
}

fn default_source_file_name() -> String {
    "source.png".to_string()
}

fn default_output_root() -> String {
    "/tiles".to_string()
}

fn default_public_prefix() -> String {
    "/tiles".to_string()
}

fn default_stale_after() -> u64 {
    3600
}
