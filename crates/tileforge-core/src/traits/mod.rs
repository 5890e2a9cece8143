//! Trait definitions for the collaborators the pipeline is built against.

pub mod notifier;
pub mod queue;

pub use notifier::CompletionNotifier;
pub use queue::{Delivery, JobQueue};
