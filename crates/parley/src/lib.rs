//! # Parley
//!
//! Command, menu and parameter-collection core for conversational chat bots.
//!
//! ## Overview
//!
//! A bot is described once as a set of commands with typed parameters and an
//! optional tree of menus. Every chat then gets its own conversation state
//! machine that turns each incoming message into one of:
//!
//! - starting a command, with parameters pre-filled from the message,
//! - navigating the menu tree,
//! - answering the parameter the bot asked for,
//! - handing the message to a free-form chat processor,
//! - a "not understood" reply followed by the root menu.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐ InboundEvent ┌───────────────┐      ┌─────────────────────┐
//! │ Transport │─────────────▶│ ParleyRuntime │─────▶│ ChatSession (chat 1)│──▶ ReplyChannel
//! │           │              │  (registry)   │─────▶│ ChatSession (chat 2)│──▶ ReplyChannel
//! └───────────┘              └───────────────┘      └─────────────────────┘
//! ```
//!
//! - **parley-core**: events, reply channels and their errors
//! - **parley-framework**: parameters, commands, menus and the state machine
//! - **parley-runtime**: session registry, dispatch loop, configuration, logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parley::prelude::*;
//!
//! let weather = Command::new("/weather", |args, reply| {
//!     reply.send_reply(&format!("Sunny in {}", args.value("city").unwrap_or("?")))
//! })
//! .display_name("Weather")
//! .parameter(Parameter::new("city", "Which city?").sticky(true));
//!
//! let definition = BotDefinition::builder()
//!     .command(weather)
//!     .menu(Menu::new("Main").command("Weather", "/weather"));
//!
//! let runtime = ParleyRuntime::builder().build(definition, channels)?;
//! let (events, receiver) = runtime.channel();
//! runtime.run(receiver, CancellationToken::new()).await?;
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use parley_core as core;
pub use parley_framework as framework;
pub use parley_runtime as runtime;

/// Commonly used types for building a bot.
///
/// ```rust,ignore
/// use parley::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use parley_runtime::{
        CancellationToken, ConfigLoader, DispatchMode, ParleyConfig, ParleyRuntime,
        RuntimeError, RuntimeResult,
    };

    // Bot definition
    pub use parley_framework::{
        BotDefinition, BotDefinitionBuilder, ChatProcessor, Command, CommandArgs, InlineHandler,
        Menu, Messages, ParseError, Parameter, ProcessorInput, Route, parsers,
    };

    // Transport contracts
    pub use parley_core::{
        BoxedReplyChannel, ChatId, InboundEvent, InlineButton, Location, ReplyChannel,
        ReplyChannelProvider, ReplyError, ReplyResult,
    };

    pub use parley_runtime::prelude::*;
}
