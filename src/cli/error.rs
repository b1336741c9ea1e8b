//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Application(app) => application_exit_code(app),
            },
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::Validation(DomainError::InvalidConfig { .. }) => exitcode::CONFIG,
        ApplicationError::Validation(_) | ApplicationError::UnsupportedShell(_) => exitcode::USAGE,
        ApplicationError::MissingConfig(_) | ApplicationError::Config { .. } => exitcode::CONFIG,
        ApplicationError::MissingArtifact { .. } => exitcode::NOINPUT,
        ApplicationError::NotDeployed(_) => exitcode::NOT_DEPLOYED,
        ApplicationError::InvalidTemplate { .. } => exitcode::DATAERR,
        ApplicationError::Build { .. }
        | ApplicationError::Package { .. }
        | ApplicationError::Deploy { .. }
        | ApplicationError::Provider { .. } => exitcode::SOFTWARE,
        ApplicationError::OperationFailed { .. } => exitcode::IOERR,
    }
}
