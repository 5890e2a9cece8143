//! Completion notification trait.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::MapId;
use crate::types::metadata::PyramidMetadata;

/// Reports a published pyramid to the service that owns the map metadata.
#[async_trait]
pub trait CompletionNotifier: Send + Sync + std::fmt::Debug + 'static {
    /// Deliver the metadata for `map_id`. Anything short of an
    /// acknowledgement must be returned as a `CallbackFailure`.
    async fn notify(&self, map_id: &MapId, metadata: &PyramidMetadata) -> AppResult<()>;
}
