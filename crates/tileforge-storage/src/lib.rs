//! # tileforge-storage
//!
//! Filesystem side of the pipeline: where a map's source image lives, and
//! how a freshly generated tile tree replaces the published one without
//! readers ever seeing a half-written pyramid.

pub mod error;
pub mod publisher;
pub mod source;

pub use error::PublishError;
pub use publisher::{AtomicPublisher, PublishedPyramid, StagedPyramid};
pub use source::SourceLocator;
