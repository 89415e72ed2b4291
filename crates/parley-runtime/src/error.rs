//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use parley_framework::DefinitionError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The bot definition was rejected.
    #[error("Invalid bot definition: {0}")]
    Definition(#[from] DefinitionError),

    /// A dispatch task was cancelled before it finished.
    #[error("Dispatch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
