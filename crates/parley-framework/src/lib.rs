//! # Parley Framework
//!
//! Commands, menus and the conversation state machine.
//!
//! This layer provides:
//! - [`Parameter`] and [`Command`] definitions with pluggable parsers
//! - [`Menu`] trees for button-driven navigation
//! - [`BotDefinition`], the validated set of commands and menus shared by
//!   every conversation
//! - [`ChatSession`], the per-conversation state machine routing each event
//!   to a command, a menu, a pending parameter or the chat processor
//!
//! The framework is synchronous and transport-agnostic. Concurrency, session
//! lookup, configuration and logging setup live in the runtime layer.

pub mod chat;
pub mod command;
pub mod context;
pub mod definition;
pub mod error;
pub mod menu;
pub mod parameter;
pub mod processor;
pub mod route;

pub use chat::{ChatSession, ChatState, Effect, Transition};
pub use command::{Command, CommandArgs, CommandFn};
pub use context::ConversationContext;
pub use definition::{BotDefinition, BotDefinitionBuilder, Messages};
pub use error::{DefinitionError, DefinitionResult, ParseError};
pub use menu::{Menu, MenuEntry, MenuId, MenuNode, MenuTarget, MenuTree};
pub use parameter::{InlineHandler, LocationParser, Parameter, TextParser, parsers};
pub use processor::{ChatProcessor, ProcessorFactory, ProcessorInput};
pub use route::Route;
