//! One-shot in-process generation command.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use tileforge_core::error::AppError;
use tileforge_core::traits::notifier::CompletionNotifier;
use tileforge_core::types::id::MapId;
use tileforge_core::types::job::GenerationJob;
use tileforge_worker::{HttpNotifier, JobOrchestrator, JobReport, LoggingNotifier};

/// Arguments for the generate command
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Map identifier
    pub map_id: String,

    /// Post the completion callback to the map service
    #[arg(long)]
    pub notify: bool,
}

/// Job report display row
#[derive(Debug, Serialize, Tabled)]
struct ReportRow {
    /// Map ID
    map_id: String,
    /// Final stage
    stage: String,
    /// Width
    width: String,
    /// Height
    height: String,
    /// Max zoom
    max_zoom: String,
    /// Tiles path
    tiles_path: String,
    /// Elapsed (ms)
    elapsed_ms: u64,
}

impl From<&JobReport> for ReportRow {
    fn from(report: &JobReport) -> Self {
        let field = |f: fn(&tileforge_core::types::PyramidMetadata) -> String| {
            report.outcome.as_ref().map(f).unwrap_or_else(|_| "-".to_string())
        };
        Self {
            map_id: report.map_id.to_string(),
            stage: report.terminal_stage().to_string(),
            width: field(|m| m.width.to_string()),
            height: field(|m| m.height.to_string()),
            max_zoom: field(|m| m.max_zoom.to_string()),
            tiles_path: field(|m| m.tiles_path.clone()),
            elapsed_ms: report.elapsed.as_millis() as u64,
        }
    }
}

/// Execute the generate command
pub async fn execute(
    args: &GenerateArgs,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let map_id = MapId::new(args.map_id.as_str())?;
    let config = super::load_config(config_path)?;

    let notifier: Arc<dyn CompletionNotifier> = if args.notify {
        Arc::new(HttpNotifier::new(&config.callback)?)
    } else {
        Arc::new(LoggingNotifier)
    };
    let orchestrator = JobOrchestrator::from_config(&config, notifier);

    let report = orchestrator.run(&GenerationJob::new(map_id)).await;
    output::print_list(&[ReportRow::from(&report)], format);

    match report.outcome {
        Ok(_) => {
            if format == OutputFormat::Table {
                output::print_success(&format!("Published {}", report.map_id));
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
