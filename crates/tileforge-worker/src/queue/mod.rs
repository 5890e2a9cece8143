//! Job queue implementations.
//!
//! Both queues store jobs in their JSON wire form and decode on delivery.
//! A payload that does not decode is acked on the spot and logged, so a
//! single poison message cannot wedge the consumers.

pub mod memory;
pub mod redis;

pub use self::memory::MemoryJobQueue;
pub use self::redis::RedisJobQueue;

use tileforge_core::error::AppError;
use tileforge_core::traits::queue::Delivery;
use tileforge_core::types::job::GenerationJob;
use tracing::error;

/// Decode a claimed payload, logging it when it is not a valid job.
pub(crate) fn decode_claimed(payload: &str, receipt: String) -> Option<Delivery> {
    match GenerationJob::from_payload(payload) {
        Ok(job) => Some(Delivery { job, receipt }),
        Err(AppError { kind, message, .. }) => {
            error!(kind = %kind, error = %message, payload, "Dropping undecodable job");
            None
        }
    }
}
