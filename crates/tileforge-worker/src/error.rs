//! Completion callback errors.

use thiserror::Error;
use tileforge_core::error::{AppError, ErrorKind};

/// Failure to deliver a completion callback.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The request never got a response (connect error, timeout).
    #[error("Callback to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("Callback to {url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}

impl From<CallbackError> for AppError {
    fn from(err: CallbackError) -> Self {
        AppError::with_source(ErrorKind::CallbackFailure, err.to_string(), err)
    }
}
