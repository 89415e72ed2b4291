//! Commands: named actions with ordered parameters.
//!
//! A [`Command`] is registered once at startup and shared read-only by all
//! conversations. Its parameters are filled either positionally from the
//! invoking message (`/weather Paris tomorrow`) or one by one across several
//! turns; once every value is known the completion callback runs exactly once
//! with an immutable [`CommandArgs`] snapshot.
//!
//! ```rust,ignore
//! use parley_framework::{Command, Parameter};
//!
//! let weather = Command::new("/weather", |args, reply| {
//!     reply.send_reply(&format!("Sunny in {}", args.value("city").unwrap_or("?")))
//! })
//! .display_name("Weather")
//! .parameter(Parameter::new("city", "Which city?"));
//! ```

use std::fmt;
use std::sync::Arc;

use parley_core::{ReplyChannel, ReplyResult};

use crate::parameter::Parameter;

pub mod args;
pub mod split;

pub use args::CommandArgs;
pub use split::{arguments, assign_fields};

/// Completion callback of a command.
///
/// Receives the collected values and the reply handle of the conversation.
/// A returned error is logged; it does not affect conversation state.
pub type CommandFn = Arc<dyn Fn(&CommandArgs, &dyn ReplyChannel) -> ReplyResult<()> + Send + Sync>;

/// A named action users can invoke.
#[derive(Clone)]
pub struct Command {
    name: String,
    display_name: Option<String>,
    parameters: Vec<Parameter>,
    on_complete: CommandFn,
}

impl Command {
    /// Creates a command without parameters.
    ///
    /// `name` is the token users type to invoke it (for example `/weather`).
    pub fn new<F>(name: impl Into<String>, on_complete: F) -> Self
    where
        F: Fn(&CommandArgs, &dyn ReplyChannel) -> ReplyResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            display_name: None,
            parameters: Vec::new(),
            on_complete: Arc::new(on_complete),
        }
    }

    /// Sets the free-text alias that also triggers the command when no other
    /// command is in progress.
    pub fn display_name(mut self, alias: impl Into<String>) -> Self {
        self.display_name = Some(alias.into());
        self
    }

    /// Appends a parameter. Declaration order is both the positional parsing
    /// order and the order in which missing values are asked for.
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Invokes the completion callback.
    pub fn complete(&self, args: &CommandArgs, reply: &dyn ReplyChannel) -> ReplyResult<()> {
        (self.on_complete)(args, reply)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::MemoryChannel;

    #[test]
    fn test_command_builder() {
        let command = Command::new("/weather", |_, _| Ok(()))
            .display_name("Weather")
            .parameter(Parameter::new("city", "Which city?"))
            .parameter(Parameter::new("day", "Which day?"));

        assert_eq!(command.name(), "/weather");
        assert_eq!(command.alias(), Some("Weather"));
        let names: Vec<&str> = command.parameters().iter().map(Parameter::name).collect();
        assert_eq!(names, ["city", "day"]);
    }

    #[test]
    fn test_complete_invokes_callback() {
        let command = Command::new("/hello", |args, reply| {
            reply.send_reply(&format!("Hello, {}", args.value("who").unwrap_or("stranger")))
        });
        let channel = MemoryChannel::new("Ann");
        let args = CommandArgs::from_iter([("who".to_string(), "Ann".to_string())]);

        command.complete(&args, &channel).unwrap();
        assert_eq!(channel.last().unwrap().text(), "Hello, Ann");
    }
}
