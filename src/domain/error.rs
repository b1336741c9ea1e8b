//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors represent business rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("project name must not be empty")]
    EmptyName,

    #[error("configuration already exists: {0}")]
    ConfigAlreadyExists(PathBuf),

    #[error("invalid configuration in {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("timeout must be between 1 and {max} seconds, got {value}")]
    TimeoutOutOfRange { value: u32, max: u32 },
}
