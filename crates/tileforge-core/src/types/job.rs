//! The unit of work carried by the job queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{JobId, MapId};
use crate::error::AppError;

/// A request to (re)generate the tile pyramid of one map.
///
/// The source path is not carried on the wire: the worker derives it from
/// the map id, so producers and workers only have to agree on the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Identifier shared by every delivery attempt of this job.
    pub id: JobId,
    /// Map whose pyramid is generated.
    pub map_id: MapId,
    /// Zero-based delivery attempt.
    #[serde(default)]
    pub attempt: u32,
    /// When this attempt was enqueued.
    pub enqueued_at: DateTime<Utc>,
}

impl GenerationJob {
    /// Create the first attempt of a new job.
    pub fn new(map_id: MapId) -> Self {
        Self {
            id: JobId::new(),
            map_id,
            attempt: 0,
            enqueued_at: Utc::now(),
        }
    }

    /// The redelivery of this job after a retryable failure.
    pub fn next_attempt(&self) -> Self {
        Self {
            id: self.id,
            map_id: self.map_id.clone(),
            attempt: self.attempt + 1,
            enqueued_at: Utc::now(),
        }
    }

    /// Serialize to the queue wire format.
    pub fn to_payload(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the queue wire format.
    pub fn from_payload(payload: &str) -> Result<Self, AppError> {
        serde_json::from_str(payload)
            .map_err(|e| AppError::validation(format!("Malformed job payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_next_attempt_keeps_identity() {
        let job = GenerationJob::new(MapId::new("9").unwrap());
        let retry = job.next_attempt();
        assert_eq!(retry.id, job.id);
        assert_eq!(retry.map_id, job.map_id);
        assert_eq!(retry.attempt, 1);
        assert!(retry.enqueued_at >= job.enqueued_at);
    }

    #[test]
    fn test_payload_roundtrip() {
        let job = GenerationJob::new(MapId::new("9").unwrap());
        let parsed = GenerationJob::from_payload(&job.to_payload().unwrap()).unwrap();
        assert_eq!(parsed, job);
    }

    #[test]
    fn test_payload_without_attempt_defaults_to_zero() {
        let payload = r#"{"id":"550e8400-e29b-41d4-a716-446655440000","map_id":"4","enqueued_at":"2026-01-01T00:00:00Z"}"#;
        let job = GenerationJob::from_payload(payload).unwrap();
        assert_eq!(job.attempt, 0);
        assert_eq!(job.map_id.as_str(), "4");
    }

    #[test]
    fn test_malformed_payload_is_validation_error() {
        let err = GenerationJob::from_payload("process_task(4)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = GenerationJob::from_payload(
            r#"{"id":"550e8400-e29b-41d4-a716-446655440000","map_id":"../4","enqueued_at":"2026-01-01T00:00:00Z"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
