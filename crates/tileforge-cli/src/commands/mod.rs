//! CLI command definitions and dispatch.

pub mod config;
pub mod enqueue;
pub mod generate;
pub mod plan;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use tileforge_core::config::AppConfig;
use tileforge_core::error::AppError;

/// Tileforge: tile pyramid generation
#[derive(Debug, Parser)]
#[command(name = "tileforge", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file layered over config/default.toml
    #[arg(short, long, env = "TILEFORGE_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Queue pyramid generation for one or more maps
    Enqueue(enqueue::EnqueueArgs),
    /// Generate a map's pyramid in this process
    Generate(generate::GenerateArgs),
    /// Show the pyramid layout for given image dimensions
    Plan(plan::PlanArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config_path = self.config.as_deref();
        match &self.command {
            Commands::Enqueue(args) => enqueue::execute(args, config_path, self.format).await,
            Commands::Generate(args) => generate::execute(args, config_path, self.format).await,
            Commands::Plan(args) => plan::execute(args, config_path, self.format),
            Commands::Config(args) => config::execute(args, config_path, self.format),
        }
    }
}

/// Helper: load configuration from file and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_with_notify() {
        let cli = Cli::try_parse_from(["tileforge", "--format", "json", "generate", "7", "--notify"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.map_id, "7");
                assert!(args.notify);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_enqueue_requires_a_map_id() {
        assert!(Cli::try_parse_from(["tileforge", "enqueue"]).is_err());
    }
}
