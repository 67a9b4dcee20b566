//! CLI error type.

use portcullis_application::StorageError;
use portcullis_domain::AuthError;
use portcullis_infrastructure::{ApiError, ConfigError};
use thiserror::Error;

/// Anything a command can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Session storage is unusable.
    #[error("session storage: {0}")]
    Storage(#[from] StorageError),

    /// Authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// An API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Writing output failed.
    #[error("output: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CLI commands.
pub type AppResult<T> = Result<T, AppError>;
