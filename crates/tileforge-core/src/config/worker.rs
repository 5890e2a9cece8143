//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Worker id used when none is configured.
pub const DEFAULT_WORKER_ID: &str = "tileforge-worker";

/// Worker loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Stable identifier of this worker process.
    ///
    /// Names the worker's in-flight list on the queue, so it must be unique
    /// per process and survive restarts for crash recovery to work.
    #[serde(default = "default_id")]
    pub id: String,
    /// Interval in milliseconds between polls of an empty queue.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Maximum number of attempts for a retryable job.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Whether to sweep abandoned staging artifacts on startup.
    #[serde(default = "default_true")]
    pub sweep_on_start: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            poll_interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
            sweep_on_start: default_true(),
        }
    }
}

impl WorkerConfig {
    /// Whether `id` was left at [`DEFAULT_WORKER_ID`].
    pub fn uses_default_id(&self) -> bool {
        self.id == DEFAULT_WORKER_ID
    }

    /// Replace the default id with one derived from `hostname`.
    ///
    /// Hostnames are stable across container restarts and distinct between
    /// replicas. An explicitly configured id is never touched. Returns
    /// whether the id changed.
    pub fn derive_id_from_host(&mut self, hostname: Option<&str>) -> bool {
        let host = hostname.map(str::trim).unwrap_or_default();
        if !self.uses_default_id() || host.is_empty() {
            return false;
        }
        self.id = format!("{DEFAULT_WORKER_ID}-{host}");
        true
    }
}

fn default_id() -> String {
    DEFAULT_WORKER_ID.to_string()
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_true() -> bool {
    true
}
