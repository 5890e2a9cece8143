//! Generation job processing for Tileforge.
//!
//! This crate provides:
//! - Job queue implementations (Redis reliable queue, in-memory)
//! - An HTTP completion notifier for the map-metadata service
//! - The job orchestrator that resolves, builds, publishes and reports
//! - A worker runner that drives the orchestrator from a queue

pub mod error;
pub mod notifier;
pub mod orchestrator;
pub mod queue;
pub mod runner;

pub use notifier::{HttpNotifier, LoggingNotifier};
pub use orchestrator::{JobOrchestrator, JobReport, JobStage};
pub use queue::{MemoryJobQueue, RedisJobQueue};
pub use runner::WorkerRunner;
