//! Job queue transport configuration.

use serde::{Deserialize, Serialize};

/// Redis-backed job queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Prefix applied to every queue key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Logical queue name.
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            name: default_name(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://redis:6379/0".to_string()
}

fn default_key_prefix() -> String {
    "tileforge:".to_string()
}

fn default_name() -> String {
    "default".to_string()
}
