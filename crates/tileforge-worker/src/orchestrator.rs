//! Per-job state machine: resolve the source, build and stage the pyramid,
//! publish it, report it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use tileforge_core::config::{AppConfig, TilingConfig};
use tileforge_core::error::AppError;
use tileforge_core::result::AppResult;
use tileforge_core::traits::notifier::CompletionNotifier;
use tileforge_core::types::id::{JobId, MapId};
use tileforge_core::types::job::GenerationJob;
use tileforge_core::types::metadata::PyramidMetadata;
use tileforge_pyramid::{PyramidBuilder, SourceImage};
use tileforge_storage::{AtomicPublisher, SourceLocator, StagedPyramid};

/// Progress of a job through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStage {
    Received,
    SourceResolved,
    Built,
    Published,
    Reported,
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::SourceResolved => "source_resolved",
            Self::Built => "built",
            Self::Published => "published",
            Self::Reported => "reported",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Terminal outcome of one job run.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_id: JobId,
    pub map_id: MapId,
    pub attempt: u32,
    /// Last stage the job completed. On failure this is where it stopped.
    pub stage: JobStage,
    pub outcome: Result<PyramidMetadata, AppError>,
    pub elapsed: Duration,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// `Reported` on success, `Failed` otherwise.
    pub fn terminal_stage(&self) -> JobStage {
        if self.is_success() {
            JobStage::Reported
        } else {
            JobStage::Failed
        }
    }
}

/// Runs generation jobs end to end.
#[derive(Debug)]
pub struct JobOrchestrator {
    locator: SourceLocator,
    publisher: AtomicPublisher,
    tiling: TilingConfig,
    public_prefix: String,
    notifier: Arc<dyn CompletionNotifier>,
}

impl JobOrchestrator {
    pub fn new(
        locator: SourceLocator,
        publisher: AtomicPublisher,
        tiling: TilingConfig,
        public_prefix: impl Into<String>,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Self {
        Self {
            locator,
            publisher,
            tiling,
            public_prefix: public_prefix.into(),
            notifier,
        }
    }

    pub fn from_config(config: &AppConfig, notifier: Arc<dyn CompletionNotifier>) -> Self {
        Self::new(
            SourceLocator::from_config(&config.storage),
            AtomicPublisher::from_config(&config.storage, &config.tiling),
            config.tiling.clone(),
            config.storage.public_prefix.clone(),
            notifier,
        )
    }

    pub fn publisher(&self) -> &AtomicPublisher {
        &self.publisher
    }

    /// Drive one job to a terminal state. Never panics on job failure; every
    /// error ends up in the report.
    pub async fn run(&self, job: &GenerationJob) -> JobReport {
        let started = Instant::now();
        let mut stage = JobStage::Received;
        debug!(job_id = %job.id, map_id = %job.map_id, attempt = job.attempt, stage = %stage, "Job received");

        let outcome = self.execute(job, &mut stage).await;

        JobReport {
            job_id: job.id,
            map_id: job.map_id.clone(),
            attempt: job.attempt,
            stage,
            outcome,
            elapsed: started.elapsed(),
        }
    }

    async fn execute(
        &self,
        job: &GenerationJob,
        stage: &mut JobStage,
    ) -> AppResult<PyramidMetadata> {
        let map_id = &job.map_id;

        let source_path = self.locator.resolve(map_id)?;
        self.advance(job, stage, JobStage::SourceResolved);

        let (staged, mut metadata) = self.build(map_id.clone(), source_path).await?;
        self.advance(job, stage, JobStage::Built);

        let published = tokio::task::spawn_blocking(move || staged.commit()).await??;
        metadata.tiles_path = PyramidMetadata::tiles_path_for(&self.public_prefix, map_id.as_str());
        debug!(
            job_id = %job.id,
            map_id = %map_id,
            tiles = published.tile_count,
            generation = %published.generation,
            "Pyramid committed"
        );
        self.advance(job, stage, JobStage::Published);

        self.notifier.notify(map_id, &metadata).await?;
        self.advance(job, stage, JobStage::Reported);

        Ok(metadata)
    }

    /// Decode the source and stream its tiles into staging on the blocking
    /// pool. Dimensions and zoom range are filled in; `tiles_path` is not.
    async fn build(
        &self,
        map_id: MapId,
        source_path: PathBuf,
    ) -> AppResult<(StagedPyramid, PyramidMetadata)> {
        let publisher = self.publisher.clone();
        let tiling = self.tiling.clone();

        tokio::task::spawn_blocking(move || -> AppResult<_> {
            let source = SourceImage::open(&source_path)?;
            let builder = PyramidBuilder::from_config(source, &tiling)?;
            let layout = builder.layout();
            debug!(
                map_id = %map_id,
                width = layout.width(),
                height = layout.height(),
                max_zoom = layout.max_zoom(),
                tiles = layout.tile_count(),
                "Generating pyramid"
            );

            let metadata = PyramidMetadata {
                width: layout.width(),
                height: layout.height(),
                max_zoom: layout.max_zoom(),
                tiles_path: String::new(),
            };
            let staged = publisher.stage(&map_id, builder.tiles())?;
            Ok((staged, metadata))
        })
        .await?
    }

    fn advance(&self, job: &GenerationJob, stage: &mut JobStage, next: JobStage) {
        *stage = next;
        debug!(job_id = %job.id, map_id = %job.map_id, stage = %next, "Job advanced");
    }
}
