//! Shared domain types.

pub mod id;
pub mod job;
pub mod metadata;

pub use id::{JobId, MapId};
pub use job::GenerationJob;
pub use metadata::PyramidMetadata;
