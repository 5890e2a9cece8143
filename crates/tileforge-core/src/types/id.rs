//! Typed identifiers for maps and generation jobs.
//!
//! A [`MapId`] is opaque to the pipeline but ends up as a directory name
//! under both the source and output roots, so it is validated once at the
//! boundary and trusted everywhere after that.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Separator reserved for staging and generation directory names.
pub const RESERVED_SEPARATOR: &str = "__";

/// Maximum length of a map identifier.
pub const MAX_MAP_ID_LEN: usize = 128;

/// Identifier of a map, as issued by the map-metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MapId(String);

impl MapId {
    /// Validate and wrap a map identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, AppError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(AppError::validation("map id must not be empty"));
        }
        if raw.len() > MAX_MAP_ID_LEN {
            return Err(AppError::validation(format!(
                "map id exceeds {MAX_MAP_ID_LEN} characters"
            )));
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(AppError::validation(format!(
                "map id '{raw}' contains invalid character {c:?}"
            )));
        }
        if raw.contains(RESERVED_SEPARATOR) {
            return Err(AppError::validation(format!(
                "map id '{raw}' contains reserved sequence '{RESERVED_SEPARATOR}'"
            )));
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MapId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for MapId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MapId> for String {
    fn from(id: MapId) -> String {
        id.0
    }
}

impl AsRef<str> for MapId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_map_id_accepts_service_ids() {
        for raw in ["3", "42", "berlin-1914", "a_b", "550e8400-e29b-41d4-a716-446655440000"] {
            assert_eq!(MapId::new(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn test_map_id_rejects_path_tricks() {
        for raw in ["", "..", "a/b", "a\\b", "maps/../etc", "x y", "ß"] {
            let err = MapId::new(raw).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{raw:?}");
        }
    }

    #[test]
    fn test_map_id_rejects_reserved_separator() {
        assert!(MapId::new("7__tmp-abc").is_err());
        assert!(MapId::new("7_tmp").is_ok());
    }

    #[test]
    fn test_map_id_length_limit() {
        assert!(MapId::new("a".repeat(MAX_MAP_ID_LEN)).is_ok());
        assert!(MapId::new("a".repeat(MAX_MAP_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_map_id_serde_validates() {
        let id: MapId = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(id.as_str(), "12");
        assert!(serde_json::from_str::<MapId>("\"../12\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"12\"");
    }

    #[test]
    fn test_job_id_roundtrip() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
