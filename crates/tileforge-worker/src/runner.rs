//! Worker runner: the main loop that pulls jobs and runs them to completion.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use tileforge_core::config::WorkerConfig;
use tileforge_core::result::AppResult;
use tileforge_core::traits::queue::{Delivery, JobQueue};

use crate::orchestrator::{JobOrchestrator, JobReport};

/// Main worker runner: one job at a time, until shutdown is signalled.
#[derive(Debug)]
pub struct WorkerRunner {
    queue: Arc<dyn JobQueue>,
    orchestrator: Arc<JobOrchestrator>,
    config: WorkerConfig,
}

impl WorkerRunner {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        orchestrator: Arc<JobOrchestrator>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            orchestrator,
            config,
        }
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }

    /// Start the worker runner. Runs until the cancel signal is received.
    ///
    /// Shutdown is only observed between jobs; a job that has been dequeued
    /// always reaches a terminal state first.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            worker_id = %self.config.id,
            poll_interval_ms = self.config.poll_interval_ms,
            max_attempts = self.config.max_attempts,
            "Worker started"
        );

        let poll_interval = self.poll_interval();
        loop {
            if *cancel.borrow() {
                break;
            }

            let dequeued = tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                    continue;
                }
                dequeued = self.queue.dequeue(poll_interval) => dequeued,
            };

            match dequeued {
                Ok(delivery) => {
                    self.process(delivery).await;
                }
                Err(e) => {
                    error!(worker_id = %self.config.id, error = %e, "Failed to dequeue job");
                    tokio::select! {
                        _ = cancel.changed() => {}
                        _ = tokio::time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        info!(worker_id = %self.config.id, "Worker shut down");
    }

    /// Claim and process a single job if one is waiting.
    pub async fn run_once(&self) -> AppResult<Option<JobReport>> {
        match self.queue.try_dequeue().await? {
            Some(delivery) => Ok(Some(self.process(delivery).await)),
            None => Ok(None),
        }
    }

    /// Run a claimed job, requeue it if it may be retried, then ack it.
    ///
    /// The retry is enqueued before the ack, so a crash in between leads to
    /// a duplicate delivery rather than a lost job.
    pub async fn process(&self, delivery: Delivery) -> JobReport {
        let job = &delivery.job;
        let report = self.orchestrator.run(job).await;
        let elapsed_ms = report.elapsed.as_millis() as u64;

        match &report.outcome {
            Ok(metadata) => {
                info!(
                    job_id = %job.id,
                    map_id = %job.map_id,
                    attempt = job.attempt,
                    max_zoom = metadata.max_zoom,
                    tiles_path = %metadata.tiles_path,
                    elapsed_ms,
                    "Job completed"
                );
            }
            Err(e) if e.is_retryable() && job.attempt + 1 < self.config.max_attempts => {
                warn!(
                    job_id = %job.id,
                    map_id = %job.map_id,
                    attempt = job.attempt,
                    stage = %report.stage,
                    kind = %e.kind,
                    error = %e.message,
                    elapsed_ms,
                    "Job failed, retrying"
                );
                if let Err(requeue) = self.queue.enqueue(&job.next_attempt()).await {
                    error!(
                        job_id = %job.id,
                        error = %requeue,
                        "Failed to requeue job, leaving it unacknowledged"
                    );
                    return report;
                }
            }
            Err(e) => {
                error!(
                    job_id = %job.id,
                    map_id = %job.map_id,
                    attempt = job.attempt,
                    stage = %report.stage,
                    kind = %e.kind,
                    error = %e.message,
                    elapsed_ms,
                    "Job failed"
                );
            }
        }

        if let Err(e) = self.queue.ack(&delivery).await {
            error!(job_id = %job.id, error = %e, "Failed to ack job");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tileforge_core::config::TilingConfig;
    use tileforge_core::error::{AppError, ErrorKind};
    use tileforge_core::traits::notifier::CompletionNotifier;
    use tileforge_core::types::id::MapId;
    use tileforge_core::types::job::GenerationJob;
    use tileforge_core::types::metadata::PyramidMetadata;
    use tileforge_storage::{AtomicPublisher, SourceLocator};

    use super::*;
    use crate::orchestrator::JobStage;
    use crate::queue::MemoryJobQueue;

    #[derive(Debug, Default)]
    struct FlakyNotifier {
        failures_left: Mutex<u32>,
    }

    #[async_trait]
    impl CompletionNotifier for FlakyNotifier {
        async fn notify(&self, _map_id: &MapId, _metadata: &PyramidMetadata) -> AppResult<()> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(AppError::callback_failure("connection reset"));
            }
            Ok(())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        queue: Arc<MemoryJobQueue>,
        runner: WorkerRunner,
    }

    fn fixture(callback_failures: u32, max_attempts: u32) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("uploads/1/source.png");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        image::RgbaImage::from_pixel(40, 30, image::Rgba([9, 9, 9, 255]))
            .save(&source)
            .unwrap();

        let orchestrator = JobOrchestrator::new(
            SourceLocator::new(dir.path().join("uploads"), "source.png"),
            AtomicPublisher::new(dir.path().join("tiles"), 256),
            TilingConfig::default(),
            "/tiles",
            Arc::new(FlakyNotifier {
                failures_left: Mutex::new(callback_failures),
            }),
        );
        let queue = Arc::new(MemoryJobQueue::new());
        let config = WorkerConfig {
            max_attempts,
            poll_interval_ms: 10,
            ..WorkerConfig::default()
        };
        let runner = WorkerRunner::new(queue.clone(), Arc::new(orchestrator), config);
        Fixture {
            dir,
            queue,
            runner,
        }
    }

    fn job(map_id: &str) -> GenerationJob {
        GenerationJob::new(MapId::new(map_id).unwrap())
    }

    #[tokio::test]
    async fn test_success_is_acked() {
        let fx = fixture(0, 3);
        fx.queue.enqueue(&job("1")).await.unwrap();

        let report = fx.runner.run_once().await.unwrap().unwrap();
        assert!(report.is_success());
        assert_eq!(fx.queue.pending_len().unwrap(), 0);
        assert_eq!(fx.queue.in_flight_len().unwrap(), 0);
        assert!(fx.runner.run_once().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let fx = fixture(0, 3);
        fx.queue.enqueue(&job("missing")).await.unwrap();

        let report = fx.runner.run_once().await.unwrap().unwrap();
        assert_eq!(report.outcome.unwrap_err().kind, ErrorKind::SourceMissing);
        assert_eq!(fx.queue.pending_len().unwrap(), 0);
        assert_eq!(fx.queue.in_flight_len().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_callback_failure_is_retried_with_next_attempt() {
        let fx = fixture(1, 3);
        let original = job("1");
        fx.queue.enqueue(&original).await.unwrap();

        let first = fx.runner.run_once().await.unwrap().unwrap();
        assert_eq!(first.stage, JobStage::Published);
        assert_eq!(fx.queue.pending_len().unwrap(), 1);

        let second = fx.runner.run_once().await.unwrap().unwrap();
        assert!(second.is_success());
        assert_eq!(second.job_id, original.id);
        assert_eq!(second.attempt, 1);
        assert_eq!(fx.queue.pending_len().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_retries_stop_at_max_attempts() {
        let fx = fixture(10, 2);
        fx.queue.enqueue(&job("1")).await.unwrap();

        assert!(!fx.runner.run_once().await.unwrap().unwrap().is_success());
        let last = fx.runner.run_once().await.unwrap().unwrap();
        assert_eq!(last.attempt, 1);
        assert!(!last.is_success());
        assert!(fx.runner.run_once().await.unwrap().is_none());
        assert_eq!(fx.queue.in_flight_len().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_loop_survives_failures_and_stops_on_signal() {
        let fx = fixture(0, 1);
        fx.queue.enqueue(&job("missing")).await.unwrap();
        fx.queue.push_raw("garbage").unwrap();
        fx.queue.enqueue(&job("1")).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let runner = Arc::new(fx.runner);
        let handle = {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move { runner.run(rx).await })
        };

        let published = fx.dir.path().join("tiles/1/0/0/0.png");
        tokio::time::timeout(Duration::from_secs(10), async {
            while !published.exists() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fx.queue.pending_len().unwrap(), 0);
    }
}
