//! Unified application error types for Tileforge.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] of an error is what
//! the worker loop uses to classify a failed job.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The source image was not present at dequeue time.
    SourceMissing,
    /// The source could not be decoded, or decoded to an empty raster.
    InvalidImage,
    /// Staging or swapping the tile tree failed. Nothing public changed.
    PublishFailure,
    /// Tiles were published but the completion callback failed.
    CallbackFailure,
    /// Input validation failed (map id, job payload).
    Validation,
    /// The job queue transport failed.
    Queue,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether a job that failed with this kind may be run again.
    ///
    /// Publication is idempotent, so both publish and callback failures
    /// are safe to retry. Everything else would fail the same way again.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::PublishFailure | Self::CallbackFailure)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceMissing => write!(f, "SOURCE_MISSING"),
            Self::InvalidImage => write!(f, "INVALID_IMAGE"),
            Self::PublishFailure => write!(f, "PUBLISH_FAILURE"),
            Self::CallbackFailure => write!(f, "CALLBACK_FAILURE"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Queue => write!(f, "QUEUE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Tileforge.
///
/// Crate-specific errors (`PyramidError`, `PublishError`, `CallbackError`)
/// are mapped into `AppError` using `From` impls, which is where the
/// classification into an [`ErrorKind`] happens.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a source-missing error.
    pub fn source_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SourceMissing, message)
    }

    /// Create a callback-failure error.
    pub fn callback_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CallbackFailure, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a queue transport error.
    pub fn queue(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Queue, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Shorthand for `self.kind.is_retryable()`.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::with_source(
            ErrorKind::Internal,
            format!("Blocking task failed: {err}"),
            err,
        )
    }
}
