//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Validation(#[from] DomainError),

    #[error("no configuration found: {0} (run 'lambdeploy init' first)")]
    MissingConfig(PathBuf),

    #[error("{artifact} not found: {path} (run '{hint}' first)")]
    MissingArtifact {
        artifact: String,
        path: PathBuf,
        hint: String,
    },

    #[error("build failed: {message}")]
    Build { message: String },

    #[error("package failed: {message}")]
    Package { message: String },

    #[error("deploy failed: {message}")]
    Deploy { message: String },

    #[error("stack not deployed: {0}")]
    NotDeployed(String),

    #[error("template is invalid: {message}")]
    InvalidTemplate { message: String },

    #[error("{operation} failed: {message}")]
    Provider { operation: String, message: String },

    #[error("unsupported shell: {0} (expected one of: bash, elvish, fish, powershell, zsh)")]
    UnsupportedShell(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
