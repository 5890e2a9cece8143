//! Result metadata of a successful generation job.

use serde::{Deserialize, Serialize};

/// Describes a published pyramid. Becomes the completion callback payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PyramidMetadata {
    /// Source image width in pixels.
    pub width: u32,
    /// Source image height in pixels.
    pub height: u32,
    /// Finest zoom level; level `max_zoom` is native resolution.
    pub max_zoom: u32,
    /// Public URL path of the pyramid root, with a trailing slash.
    pub tiles_path: String,
}

impl PyramidMetadata {
    /// Build the public tiles path for a map, e.g. `/tiles/3/`.
    pub fn tiles_path_for(public_prefix: &str, map_id: &str) -> String {
        format!("{}/{}/", public_prefix.trim_end_matches('/'), map_id)
    }
}
