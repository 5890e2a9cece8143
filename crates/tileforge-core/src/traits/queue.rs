//! Job queue trait for the durable work queue feeding the workers.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::job::GenerationJob;

/// A job handed to a consumer, together with the receipt needed to ack it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// The decoded job.
    pub job: GenerationJob,
    /// Transport-specific handle identifying this delivery.
    pub receipt: String,
}

/// Durable queue with at-least-once delivery.
///
/// A dequeued job stays owned by the consumer until it is acked. A consumer
/// that dies before acking gets the job redelivered through [`recover`],
/// so every consumer must tolerate seeing the same job twice.
///
/// [`recover`]: JobQueue::recover
#[async_trait]
pub trait JobQueue: Send + Sync + std::fmt::Debug + 'static {
    /// Append a job to the queue.
    async fn enqueue(&self, job: &GenerationJob) -> AppResult<()>;

    /// Claim the next job without waiting. `Ok(None)` means the queue is empty.
    async fn try_dequeue(&self) -> AppResult<Option<Delivery>>;

    /// Acknowledge a delivery, removing it from the queue for good.
    async fn ack(&self, delivery: &Delivery) -> AppResult<()>;

    /// Return unacknowledged deliveries of this consumer to the queue.
    ///
    /// Returns the number of jobs made available again.
    async fn recover(&self) -> AppResult<usize> {
        Ok(0)
    }

    /// Wait until a job is available and claim it.
    async fn dequeue(&self, poll_interval: Duration) -> AppResult<Delivery> {
        loop {
            if let Some(delivery) = self.try_dequeue().await? {
                return Ok(delivery);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
