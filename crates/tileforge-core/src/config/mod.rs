//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate, with `TILEFORGE__SECTION__KEY` environment overrides.
//! The loaded [`AppConfig`] is passed explicitly into every constructor;
//! nothing below the binaries reads the environment.

pub mod callback;
pub mod logging;
pub mod queue;
pub mod storage;
pub mod tiling;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::callback::CallbackConfig;
pub use self::logging::LoggingConfig;
pub use self::queue::QueueConfig;
pub use self::storage::StorageConfig;
pub use self::tiling::{ResampleFilter, TilingConfig};
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Job queue transport settings.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Source and output locations.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Pyramid geometry settings.
    #[serde(default)]
    pub tiling: TilingConfig,
    /// Completion callback settings.
    #[serde(default)]
    pub callback: CallbackConfig,
    /// Worker loop settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default.toml` (optional), the given file (required when
    /// provided) and environment variables prefixed with `TILEFORGE__`.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("TILEFORGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        Self::finish(config)
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        Self::finish(config)
    }

    fn finish(config: config::Config) -> Result<Self, AppError> {
        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        app.validate()?;
        Ok(app)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.tiling.tile_size == 0 {
            return Err(AppError::configuration("tiling.tile_size must be positive"));
        }
        if self.worker.max_attempts == 0 {
            return Err(AppError::configuration(
                "worker.max_attempts must be at least 1",
            ));
        }
        if self.worker.id.trim().is_empty() {
            return Err(AppError::configuration("worker.id must not be empty"));
        }
        Ok(())
    }
}
