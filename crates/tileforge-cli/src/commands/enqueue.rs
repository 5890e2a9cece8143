//! Job enqueue command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use tileforge_core::error::AppError;
use tileforge_core::traits::queue::JobQueue;
use tileforge_core::types::id::MapId;
use tileforge_core::types::job::GenerationJob;
use tileforge_worker::RedisJobQueue;

/// Arguments for the enqueue command
#[derive(Debug, Args)]
pub struct EnqueueArgs {
    /// Map identifiers to (re)generate
    #[arg(required = true)]
    pub map_ids: Vec<String>,
}

/// Enqueued job display row
#[derive(Debug, Serialize, Tabled)]
struct EnqueuedRow {
    /// Job ID
    job_id: String,
    /// Map ID
    map_id: String,
}

/// Execute the enqueue command
pub async fn execute(
    args: &EnqueueArgs,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let map_ids = args
        .map_ids
        .iter()
        .map(|raw| MapId::new(raw.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let config = super::load_config(config_path)?;
    let queue = RedisJobQueue::connect(&config.queue, &config.worker.id).await?;

    let mut rows = Vec::with_capacity(map_ids.len());
    for map_id in map_ids {
        let job = GenerationJob::new(map_id);
        queue.enqueue(&job).await?;
        rows.push(EnqueuedRow {
            job_id: job.id.to_string(),
            map_id: job.map_id.to_string(),
        });
    }

    output::print_list(&rows, format);
    if format == OutputFormat::Table {
        output::print_kv("Pending", &queue.pending_len().await?.to_string());
    }
    Ok(())
}
