//! Bot definition: the registered commands, the menu tree and fixed texts.
//!
//! A [`BotDefinition`] is assembled once at startup through
//! [`BotDefinitionBuilder`], validated, and then shared read-only by every
//! conversation.
//!
//! ```rust,ignore
//! let definition = BotDefinition::builder()
//!     .command(weather)
//!     .command(units)
//!     .menu(Menu::new("Main").command("Weather", "/weather"))
//!     .build()?;
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use parley_core::ChatId;
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::{DefinitionError, DefinitionResult};
use crate::menu::{Menu, MenuTarget, MenuTree};
use crate::processor::{ChatProcessor, ProcessorFactory};

/// Fixed texts the conversation engine sends on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    /// Reply sent when an event matches nothing.
    #[serde(default = "default_not_understood")]
    pub not_understood: String,

    /// Text sent together with a menu keyboard.
    #[serde(default = "default_menu_prompt")]
    pub menu_prompt: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            not_understood: default_not_understood(),
            menu_prompt: default_menu_prompt(),
        }
    }
}

fn default_not_understood() -> String {
    "I do not understand you".to_string()
}

fn default_menu_prompt() -> String {
    "Anything else?".to_string()
}

/// Returns `true` when `text` starts with a non-empty `token`.
pub(crate) fn prefix_matches(text: &str, token: &str) -> bool {
    !token.is_empty() && text.starts_with(token)
}

/// Immutable set of commands and menus shared by all conversations.
pub struct BotDefinition {
    commands: Vec<Command>,
    index: HashMap<String, usize>,
    menu: Option<MenuTree>,
    messages: Messages,
    processor_factory: Option<ProcessorFactory>,
}

impl BotDefinition {
    pub fn builder() -> BotDefinitionBuilder {
        BotDefinitionBuilder::new()
    }

    /// Looks a command up by its primary name.
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.index.get(name).map(|&i| &self.commands[i])
    }

    /// Commands in registration order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Finds the command whose primary name prefixes `text`.
    ///
    /// When several names match, the longest one wins so that `/settings`
    /// is not swallowed by `/set`; equal lengths keep registration order.
    pub fn match_command(&self, text: &str) -> Option<&Command> {
        longest_match(&self.commands, text, |c| Some(c.name()))
    }

    /// Finds the command whose display name prefixes `text`.
    pub fn match_display_name(&self, text: &str) -> Option<&Command> {
        longest_match(&self.commands, text, Command::alias)
    }

    pub fn menu(&self) -> Option<&MenuTree> {
        self.menu.as_ref()
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Creates the chat processor of a new conversation, if one is configured.
    pub fn new_processor(&self, chat_id: ChatId) -> Option<Box<dyn ChatProcessor>> {
        self.processor_factory.as_ref().map(|factory| factory(chat_id))
    }
}

fn longest_match<'a>(
    commands: &'a [Command],
    text: &str,
    token: impl Fn(&'a Command) -> Option<&'a str>,
) -> Option<&'a Command> {
    let mut best: Option<(&Command, usize)> = None;
    for command in commands {
        let Some(token) = token(command) else {
            continue;
        };
        if prefix_matches(text, token) && best.is_none_or(|(_, len)| token.len() > len) {
            best = Some((command, token.len()));
        }
    }
    best.map(|(command, _)| command)
}

impl fmt::Debug for BotDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotDefinition")
            .field("commands", &self.commands)
            .field("menu", &self.menu)
            .field("messages", &self.messages)
            .field("processor", &self.processor_factory.is_some())
            .finish()
    }
}

/// Builder for [`BotDefinition`].
#[derive(Default)]
pub struct BotDefinitionBuilder {
    commands: Vec<Command>,
    menu: Option<Menu>,
    messages: Messages,
    processor_factory: Option<ProcessorFactory>,
}

impl BotDefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Sets the root menu.
    pub fn menu(mut self, menu: Menu) -> Self {
        self.menu = Some(menu);
        self
    }

    /// Overrides the fixed texts.
    pub fn messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Installs a chat processor factory.
    pub fn processor<F>(mut self, factory: F) -> Self
    where
        F: Fn(ChatId) -> Box<dyn ChatProcessor> + Send + Sync + 'static,
    {
        self.processor_factory = Some(std::sync::Arc::new(factory));
        self
    }

    /// Validates and freezes the definition.
    ///
    /// # Errors
    ///
    /// Fails on empty or duplicate command names, duplicate parameter names
    /// within a command, empty menu labels, and menu entries referencing
    /// commands that were not registered.
    pub fn build(self) -> DefinitionResult<BotDefinition> {
        let mut index = HashMap::with_capacity(self.commands.len());
        for (i, command) in self.commands.iter().enumerate() {
            if command.name().is_empty() {
                return Err(DefinitionError::EmptyCommandName);
            }
            if index.insert(command.name().to_string(), i).is_some() {
                return Err(DefinitionError::DuplicateCommand(command.name().to_string()));
            }

            let mut seen = HashSet::new();
            for parameter in command.parameters() {
                if !seen.insert(parameter.name()) {
                    return Err(DefinitionError::DuplicateParameter {
                        command: command.name().to_string(),
                        parameter: parameter.name().to_string(),
                    });
                }
            }
        }

        let menu = self.menu.map(MenuTree::build).transpose()?;
        if let Some(tree) = &menu {
            for node in tree.nodes() {
                for entry in node.entries() {
                    if let MenuTarget::Command(command) = &entry.target
                        && !index.contains_key(command)
                    {
                        return Err(DefinitionError::UnknownMenuCommand {
                            menu: node.name().to_string(),
                            command: command.clone(),
                        });
                    }
                }
            }
        }

        Ok(BotDefinition {
            commands: self.commands,
            index,
            menu,
            messages: self.messages,
            processor_factory: self.processor_factory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::Parameter;

    fn noop(name: &str) -> Command {
        Command::new(name, |_, _| Ok(()))
    }

    #[test]
    fn test_lookup_and_order() {
        let definition = BotDefinition::builder()
            .command(noop("/b"))
            .command(noop("/a"))
            .build()
            .unwrap();

        assert!(definition.command("/a").is_some());
        assert!(definition.command("/c").is_none());
        let names: Vec<&str> = definition.commands().iter().map(Command::name).collect();
        assert_eq!(names, ["/b", "/a"]);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let definition = BotDefinition::builder()
            .command(noop("/set"))
            .command(noop("/settings"))
            .build()
            .unwrap();

        assert_eq!(definition.match_command("/settings now").unwrap().name(), "/settings");
        assert_eq!(definition.match_command("/set x").unwrap().name(), "/set");
        assert!(definition.match_command("set").is_none());
    }

    #[test]
    fn test_display_name_match() {
        let definition = BotDefinition::builder()
            .command(noop("/weather").display_name("Weather"))
            .command(noop("/help"))
            .build()
            .unwrap();

        assert_eq!(
            definition.match_display_name("Weather please").unwrap().name(),
            "/weather"
        );
        assert!(definition.match_display_name("Help").is_none());
    }

    #[test]
    fn test_empty_display_name_never_matches() {
        let definition = BotDefinition::builder()
            .command(noop("/weather").display_name(""))
            .build()
            .unwrap();
        assert!(definition.match_display_name("anything").is_none());
    }

    #[test]
    fn test_duplicate_command_rejected() {
        let err = BotDefinition::builder()
            .command(noop("/a"))
            .command(noop("/a"))
            .build()
            .unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateCommand("/a".into()));
    }

    #[test]
    fn test_empty_command_name_rejected() {
        let err = BotDefinition::builder().command(noop("")).build().unwrap_err();
        assert_eq!(err, DefinitionError::EmptyCommandName);
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let err = BotDefinition::builder()
            .command(
                noop("/a")
                    .parameter(Parameter::new("x", "?"))
                    .parameter(Parameter::new("x", "?")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateParameter { .. }));
    }

    #[test]
    fn test_unknown_menu_command_rejected() {
        let err = BotDefinition::builder()
            .command(noop("/a"))
            .menu(Menu::new("Main").submenu(Menu::new("Sub").command("B", "/b")))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::UnknownMenuCommand {
                menu: "Sub".into(),
                command: "/b".into()
            }
        );
    }

    #[test]
    fn test_default_messages_from_partial_config() {
        let messages: Messages = serde_json::from_str(r#"{"menu_prompt": "More?"}"#).unwrap();
        assert_eq!(messages.menu_prompt, "More?");
        assert_eq!(messages.not_understood, Messages::default().not_understood);
    }
}
