//! In-process job queue.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use tileforge_core::error::AppError;
use tileforge_core::result::AppResult;
use tileforge_core::traits::queue::{Delivery, JobQueue};
use tileforge_core::types::job::GenerationJob;

use super::decode_claimed;

#[derive(Debug, Default)]
struct State {
    pending: VecDeque<String>,
    in_flight: BTreeMap<u64, String>,
    next_receipt: u64,
}

/// Queue held in memory, with the same claim/ack contract as the Redis one.
///
/// Consumers waiting in [`dequeue`](JobQueue::dequeue) are woken as soon as
/// a job is enqueued instead of polling.
#[derive(Debug, Default)]
pub struct MemoryJobQueue {
    state: Mutex<State>,
    notify: Notify,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a raw payload, bypassing serialization.
    pub fn push_raw(&self, payload: impl Into<String>) -> AppResult<()> {
        self.lock()?.pending.push_back(payload.into());
        self.notify.notify_one();
        Ok(())
    }

    /// Number of jobs waiting to be claimed.
    pub fn pending_len(&self) -> AppResult<usize> {
        Ok(self.lock()?.pending.len())
    }

    /// Number of claimed, unacknowledged jobs.
    pub fn in_flight_len(&self) -> AppResult<usize> {
        Ok(self.lock()?.in_flight.len())
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::queue("In-memory queue lock poisoned"))
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: &GenerationJob) -> AppResult<()> {
        self.push_raw(job.to_payload()?)
    }

    async fn try_dequeue(&self) -> AppResult<Option<Delivery>> {
        let mut state = self.lock()?;
        while let Some(payload) = state.pending.pop_front() {
            let receipt = state.next_receipt;
            state.next_receipt += 1;
            match decode_claimed(&payload, receipt.to_string()) {
                Some(delivery) => {
                    state.in_flight.insert(receipt, payload);
                    return Ok(Some(delivery));
                }
                None => continue,
            }
        }
        Ok(None)
    }

    async fn ack(&self, delivery: &Delivery) -> AppResult<()> {
        let receipt: u64 = delivery
            .receipt
            .parse()
            .map_err(|_| AppError::queue(format!("Unknown receipt '{}'", delivery.receipt)))?;
        self.lock()?.in_flight.remove(&receipt);
        Ok(())
    }

    async fn recover(&self) -> AppResult<usize> {
        let mut state = self.lock()?;
        let in_flight = std::mem::take(&mut state.in_flight);
        let count = in_flight.len();
        for payload in in_flight.into_values().rev() {
            state.pending.push_front(payload);
        }
        drop(state);
        if count > 0 {
            self.notify.notify_waiters();
        }
        Ok(count)
    }

    async fn dequeue(&self, _poll_interval: Duration) -> AppResult<Delivery> {
        loop {
            let notified = self.notify.notified();
            if let Some(delivery) = self.try_dequeue().await? {
                return Ok(delivery);
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tileforge_core::types::id::MapId;

    use super::*;

    fn job(id: &str) -> GenerationJob {
        GenerationJob::new(MapId::new(id).unwrap())
    }

    #[tokio::test]
    async fn test_fifo_claim_and_ack() {
        let queue = MemoryJobQueue::new();
        queue.enqueue(&job("1")).await.unwrap();
        queue.enqueue(&job("2")).await.unwrap();

        let first = queue.try_dequeue().await.unwrap().unwrap();
        assert_eq!(first.job.map_id.as_str(), "1");
        assert_eq!(queue.pending_len().unwrap(), 1);
        assert_eq!(queue.in_flight_len().unwrap(), 1);

        queue.ack(&first).await.unwrap();
        assert_eq!(queue.in_flight_len().unwrap(), 0);

        let second = queue.try_dequeue().await.unwrap().unwrap();
        assert_eq!(second.job.map_id.as_str(), "2");
        assert!(queue.try_dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recover_redelivers_unacked_jobs() {
        let queue = MemoryJobQueue::new();
        queue.enqueue(&job("1")).await.unwrap();
        queue.enqueue(&job("2")).await.unwrap();
        queue.enqueue(&job("3")).await.unwrap();

        let a = queue.try_dequeue().await.unwrap().unwrap();
        let b = queue.try_dequeue().await.unwrap().unwrap();
        assert_eq!(queue.recover().await.unwrap(), 2);
        assert_eq!(queue.in_flight_len().unwrap(), 0);

        let again = queue.try_dequeue().await.unwrap().unwrap();
        assert_eq!(again.job, a.job);
        let again = queue.try_dequeue().await.unwrap().unwrap();
        assert_eq!(again.job, b.job);
    }

    #[tokio::test]
    async fn test_poison_payload_is_skipped() {
        let queue = MemoryJobQueue::new();
        queue.push_raw("{not json").unwrap();
        queue.push_raw(r#"{"map_id":"a__b"}"#).unwrap();
        queue.enqueue(&job("ok")).await.unwrap();

        let delivery = queue.try_dequeue().await.unwrap().unwrap();
        assert_eq!(delivery.job.map_id.as_str(), "ok");
        assert_eq!(queue.pending_len().unwrap(), 0);
        assert_eq!(queue.in_flight_len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dequeue_wakes_on_enqueue() {
        let queue = Arc::new(MemoryJobQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue(Duration::from_secs(3600)).await })
        };
        tokio::task::yield_now().await;

        queue.enqueue(&job("late")).await.unwrap();
        let delivery = tokio::time::timeout(Duration::from_secs(5), consumer)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(delivery.job.map_id.as_str(), "late");
    }
}
