//! Error types for the Parley framework.

use thiserror::Error;

/// Returned by a parameter parser when the user's input is not acceptable.
///
/// Never shown to the user: the conversation recovers by asking the same
/// question again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ParseError {
    reason: String,
}

impl ParseError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Errors detected while assembling a [`BotDefinition`](crate::BotDefinition).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// A command was registered with an empty name.
    #[error("command name must not be empty")]
    EmptyCommandName,

    /// Two commands share a name.
    #[error("command '{0}' is registered twice")]
    DuplicateCommand(String),

    /// A command declares two parameters with the same name.
    #[error("command '{command}' declares parameter '{parameter}' twice")]
    DuplicateParameter {
        command: String,
        parameter: String,
    },

    /// A menu or menu entry has an empty label.
    #[error("menu '{menu}' contains an empty label")]
    EmptyMenuLabel { menu: String },

    /// A menu entry points at a command that was never registered.
    #[error("menu '{menu}' references unknown command '{command}'")]
    UnknownMenuCommand { menu: String, command: String },
}

/// Result type for definition building.
pub type DefinitionResult<T> = Result<T, DefinitionError>;
