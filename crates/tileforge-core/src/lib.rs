//! # tileforge-core
//!
//! Core crate for Tileforge. Contains the error taxonomy, configuration
//! schemas, typed identifiers, the generation job and pyramid metadata
//! types, and the queue/notifier traits the worker is built against.
//!
//! This crate has **no** internal dependencies on other Tileforge crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
