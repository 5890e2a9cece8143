//! Completion callback configuration.

use serde::{Deserialize, Serialize};

/// Where and how the map-metadata service is notified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Base URL of the map-metadata service.
    #[serde(default = "default_map_service_url")]
    pub map_service_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            map_service_url: default_map_service_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_map_service_url() -> String {
    "http://map_service:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}
