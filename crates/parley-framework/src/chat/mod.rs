//! The per-conversation state machine.
//!
//! A [`ChatSession`] owns everything one conversation remembers:
//!
//! - the [`ConversationContext`] of the command being filled in,
//! - the last value accepted for every parameter name, reused across commands,
//! - the current position in the menu tree,
//! - the conversation's chat processor, if the bot has one.
//!
//! # Routing
//!
//! Every text or location message is routed by the first rule that applies:
//!
//! 1. the text starts with a command's primary name: start that command,
//!    abandoning whatever was in progress;
//! 2. a menu is displayed and the text starts with the root menu's name, the
//!    current menu's parent name, or one of its entry labels: navigate, or
//!    start the entry's command;
//! 3. a command is in progress: the message answers the pending parameter;
//! 4. the text starts with a command's display name: start that command;
//! 5. the chat processor takes the message, or the "not understood" reply is
//!    sent and the root menu redisplayed.
//!
//! Callback events answer a pending parameter that has inline buttons, or go
//! to the chat processor; otherwise they are ignored.
//!
//! ```text
//!            start command                 all values known
//!   Idle ─────────────────────▶ Awaiting ─────────────────────▶ Idle + root menu
//!    ▲                          Parameter ◀──┐
//!    │                             │  └──────┘ answer / re-ask
//!    └─────────────────────────────┘ other command interrupts
//! ```

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parley_core::{ChatId, EventPayload, InboundEvent, Location, ReplyChannel, ReplyResult};
use tracing::{Level, debug, error, info, span, warn};

use crate::command::{Command, CommandArgs, split};
use crate::context::ConversationContext;
use crate::definition::{BotDefinition, prefix_matches};
use crate::error::ParseError;
use crate::menu::{MenuId, MenuTarget, MenuTree};
use crate::processor::{ChatProcessor, ProcessorInput};
use crate::route::Route;

pub mod effect;

pub use effect::{Effect, Transition};


/// Coarse command-collection state of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatState {
    /// No command in progress.
    Idle,
    /// Waiting for the user to supply parameter `index` of `command`.
    AwaitingParameter { command: String, index: usize },
}

/// State machine of a single conversation.
pub struct ChatSession {
    chat_id: ChatId,
    definition: Arc<BotDefinition>,
    last_values: HashMap<String, String>,
    context: ConversationContext,
    current_menu: Option<MenuId>,
    processor: Option<Box<dyn ChatProcessor>>,
}

impl ChatSession {
    /// Creates an idle conversation positioned at the root menu.
    pub fn new(chat_id: ChatId, definition: Arc<BotDefinition>) -> Self {
        let current_menu = definition.menu().map(MenuTree::root);
        let processor = definition.new_processor(chat_id);
        Self {
            chat_id,
            definition,
            last_values: HashMap::new(),
            context: ConversationContext::idle(),
            current_menu,
            processor,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Last accepted value per parameter name.
    pub fn last_values(&self) -> &HashMap<String, String> {
        &self.last_values
    }

    /// Name of the menu currently displayed, if any.
    pub fn current_menu(&self) -> Option<&str> {
        let tree = self.definition.menu()?;
        self.current_menu.map(|id| tree.node(id).name())
    }

    pub fn state(&self) -> ChatState {
        match (self.context.command(), self.context.pending()) {
            (Some(command), Some(index)) => ChatState::AwaitingParameter {
                command: command.to_string(),
                index,
            },
            _ => ChatState::Idle,
        }
    }

    /// Routes one event and delivers the resulting replies.
    ///
    /// Never fails: reply delivery errors are logged and leave the
    /// conversation state as the transition left it.
    pub fn handle(&mut self, event: &InboundEvent, reply: &dyn ReplyChannel) -> Route {
        let span = span!(Level::DEBUG, "chat", chat = %self.chat_id);
        let _enter = span.enter();

        info!(
            kind = event.kind(),
            text = event.text_content().unwrap_or_default(),
            location = ?event.location_content(),
            context = self.context.command().unwrap_or_default(),
            "Processing event"
        );

        let Transition { mut route, effects } = self.step(event);
        for effect in effects {
            self.deliver(effect, reply, &mut route);
        }

        debug!(?route, handled = route.is_handled(), "Event routed");
        route
    }

    /// Applies one event to the state machine without any I/O.
    ///
    /// The returned effects must be delivered in order for the conversation
    /// to behave as [`handle`](Self::handle) does.
    pub fn step(&mut self, event: &InboundEvent) -> Transition {
        let mut effects = Vec::new();
        let route = match &event.payload {
            EventPayload::Text { text } => {
                self.route_message(event.message_id, text, None, &mut effects)
            }
            EventPayload::Location { text, location } => {
                self.route_message(event.message_id, text, Some(*location), &mut effects)
            }
            EventPayload::Callback { data } => {
                self.route_callback(event.message_id, data, &mut effects)
            }
        };
        Transition { route, effects }
    }

    fn route_message(
        &mut self,
        message_id: Option<i64>,
        raw: &str,
        location: Option<Location>,
        out: &mut Vec<Effect>,
    ) -> Route {
        let text = raw.trim();
        if text.is_empty() && location.is_none() {
            debug!("Empty message ignored");
            return Route::Ignored;
        }

        let definition = Arc::clone(&self.definition);

        if let Some(command) = definition.match_command(text) {
            return self.start_command(command, text, out);
        }

        if let Some(route) = self.navigate(text, out) {
            return route;
        }

        if self.context.is_active() {
            return self.answer_parameter(text, location, out);
        }

        if let Some(command) = definition.match_display_name(text) {
            return self.start_command(command, command.name(), out);
        }

        if self.processor.is_some() {
            let input = match location {
                Some(location) => ProcessorInput::Location(location),
                None => ProcessorInput::Text(text.to_string()),
            };
            out.push(Effect::Process { message_id, input });
            return Route::Processed { intent: None };
        }

        self.not_understood(out)
    }

    fn route_callback(&mut self, message_id: Option<i64>, data: &str, out: &mut Vec<Effect>) -> Route {
        let definition = Arc::clone(&self.definition);
        let pending = self
            .context
            .command()
            .and_then(|name| definition.command(name))
            .zip(self.context.pending());

        if let Some((command, index)) = pending
            && let Some(parameter) = command.parameters().get(index)
            && parameter.inline_handler().is_some()
        {
            let parsed = parameter.parse_callback(data);
            return self.accept_answer(command, index, parsed, out);
        }

        if self.processor.is_some() {
            out.push(Effect::Process {
                message_id,
                input: ProcessorInput::Callback(data.to_string()),
            });
            return Route::Processed { intent: None };
        }

        debug!(data, "Callback not handled");
        Route::Ignored
    }

    /// Menu navigation; `None` when the text is no navigation token of the
    /// displayed menu.
    fn navigate(&mut self, text: &str, out: &mut Vec<Effect>) -> Option<Route> {
        let definition = Arc::clone(&self.definition);
        let tree = definition.menu()?;
        let current = self.current_menu?;

        let root = tree.root();
        if prefix_matches(text, tree.node(root).name()) {
            return Some(self.show_menu(tree, root, out));
        }

        if let Some(parent) = tree.node(current).parent()
            && prefix_matches(text, tree.node(parent).name())
        {
            return Some(self.show_menu(tree, parent, out));
        }

        let entry = tree
            .node(current)
            .entries()
            .iter()
            .find(|entry| prefix_matches(text, &entry.label))?;

        match &entry.target {
            MenuTarget::Command(name) => {
                let command = definition.command(name)?;
                Some(self.start_command(command, command.name(), out))
            }
            MenuTarget::Submenu(id) => Some(self.show_menu(tree, *id, out)),
        }
    }

    /// Starts `command`, pre-filling parameters from the words after the
    /// command token in `text`.
    fn start_command(&mut self, command: &Command, text: &str, out: &mut Vec<Effect>) -> Route {
        info!(command = command.name(), "Starting command");

        self.current_menu = None;
        self.context = ConversationContext::start(command.name());

        let parameters = command.parameters();
        let fields = split::arguments(text);
        let assigned = split::assign_fields(&fields, parameters.len());
        let mut attempted = assigned.len();

        for (index, (parameter, raw)) in parameters.iter().zip(&assigned).enumerate() {
            match parameter.parse_text(raw) {
                Ok(value) => self.context.insert(parameter.name(), value),
                Err(err) => {
                    debug!(
                        parameter = parameter.name(),
                        error = %err,
                        "Positional argument rejected"
                    );
                    attempted = index + 1;
                    break;
                }
            }
        }

        for parameter in parameters.iter().skip(attempted) {
            if parameter.is_sticky()
                && let Some(value) = self.last_values.get(parameter.name())
            {
                self.context.insert(parameter.name(), value.clone());
            }
        }

        let completed = self.advance(command, out);
        Route::CommandStarted {
            command: command.name().to_string(),
            completed,
        }
    }

    fn answer_parameter(
        &mut self,
        text: &str,
        location: Option<Location>,
        out: &mut Vec<Effect>,
    ) -> Route {
        let definition = Arc::clone(&self.definition);
        let Some(command) = self
            .context
            .command()
            .and_then(|name| definition.command(name))
        else {
            warn!(
                command = self.context.command().unwrap_or_default(),
                "Active command is not registered, resetting context"
            );
            self.context = ConversationContext::idle();
            return self.not_understood(out);
        };

        let index = self.context.pending().unwrap_or(0);
        let Some(parameter) = command.parameters().get(index) else {
            let completed = self.advance(command, out);
            return Route::CommandStarted {
                command: command.name().to_string(),
                completed,
            };
        };

        info!(
            command = command.name(),
            parameter = parameter.name(),
            "Extracting parameter"
        );
        let parsed = parameter.parse_answer(text, location);
        self.accept_answer(command, index, parsed, out)
    }

    fn accept_answer(
        &mut self,
        command: &Command,
        index: usize,
        parsed: Result<String, ParseError>,
        out: &mut Vec<Effect>,
    ) -> Route {
        let parameter = &command.parameters()[index];
        let accepted = match parsed {
            Ok(value) => {
                self.context.insert(parameter.name(), value);
                true
            }
            Err(err) => {
                debug!(parameter = parameter.name(), error = %err, "Answer rejected");
                self.ask(command, index, out);
                false
            }
        };

        let completed = accepted && self.advance(command, out);
        Route::ParameterAnswered {
            command: command.name().to_string(),
            parameter: parameter.name().to_string(),
            accepted,
            completed,
        }
    }

    /// Runs the command when every parameter has a value, otherwise asks for
    /// the first missing one. Returns `true` when the command ran.
    fn advance(&mut self, command: &Command, out: &mut Vec<Effect>) -> bool {
        match self.context.first_missing(command.parameters()) {
            None => {
                self.complete(command, out);
                true
            }
            Some(index) => {
                self.context.set_pending(index);
                self.ask(command, index, out);
                false
            }
        }
    }

    fn ask(&self, command: &Command, index: usize, out: &mut Vec<Effect>) {
        let parameter = &command.parameters()[index];
        info!(
            command = command.name(),
            parameter = parameter.name(),
            "Asking for parameter"
        );

        let text = parameter.prompt().to_string();
        if let Some(last) = self.last_values.get(parameter.name()) {
            out.push(Effect::Ask {
                text,
                options: vec![last.clone()],
                force_answer: false,
            });
        } else if let Some(handler) = parameter.inline_handler() {
            out.push(Effect::Inline {
                text,
                buttons: handler.buttons(),
            });
        } else {
            out.push(Effect::Reply(text));
        }
    }

    fn complete(&mut self, command: &Command, out: &mut Vec<Effect>) {
        info!(command = command.name(), "Executing command");

        let mut values = std::mem::take(&mut self.context).into_values();
        for (name, value) in &self.last_values {
            values
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }

        out.push(Effect::Complete {
            command: command.name().to_string(),
            args: CommandArgs::from(values.clone()),
        });
        self.last_values = values;
        self.show_root_menu(out);
    }

    fn not_understood(&mut self, out: &mut Vec<Effect>) -> Route {
        info!("Message not understood");
        out.push(Effect::Reply(
            self.definition.messages().not_understood.clone(),
        ));
        self.show_root_menu(out);
        Route::NotUnderstood
    }

    fn show_root_menu(&mut self, out: &mut Vec<Effect>) {
        let definition = Arc::clone(&self.definition);
        match definition.menu() {
            Some(tree) => {
                self.show_menu(tree, tree.root(), out);
            }
            None => self.current_menu = None,
        }
    }

    fn show_menu(&mut self, tree: &MenuTree, id: MenuId, out: &mut Vec<Effect>) -> Route {
        let name = tree.node(id).name();
        debug!(menu = name, "Sending menu");

        self.current_menu = Some(id);
        out.push(Effect::Ask {
            text: self.definition.messages().menu_prompt.clone(),
            options: tree.keyboard(id),
            force_answer: true,
        });
        Route::MenuShown {
            menu: name.to_string(),
        }
    }

    fn deliver(&mut self, effect: Effect, reply: &dyn ReplyChannel, route: &mut Route) {
        let result = match effect {
            Effect::Reply(text) => reply.send_reply(&text),
            Effect::Ask {
                text,
                options,
                force_answer,
            } => reply.ask_options(&text, &options, force_answer),
            Effect::Inline { text, buttons } => reply.send_inline(&text, &buttons),
            Effect::Complete { command, args } => self.run_callback(&command, &args, reply),
            Effect::Process { message_id, input } => {
                *route = Route::Processed {
                    intent: self.run_processor(message_id, &input, reply),
                };
                Ok(())
            }
        };

        if let Err(err) = result {
            warn!(error = %err, "Failed to deliver reply");
        }
    }

    fn run_processor(
        &mut self,
        message_id: Option<i64>,
        input: &ProcessorInput,
        reply: &dyn ReplyChannel,
    ) -> Option<String> {
        let processor = self.processor.as_mut()?;
        match panic::catch_unwind(AssertUnwindSafe(|| processor.process(message_id, input, reply))) {
            Ok(intent) => intent,
            Err(_) => {
                error!("Chat processor panicked");
                None
            }
        }
    }

    fn run_callback(&self, name: &str, args: &CommandArgs, reply: &dyn ReplyChannel) -> ReplyResult<()> {
        let Some(command) = self.definition.command(name) else {
            return Ok(());
        };

        match panic::catch_unwind(AssertUnwindSafe(|| command.complete(args, reply))) {
            Ok(result) => result,
            Err(_) => {
                error!(command = name, "Command callback panicked");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("chat_id", &self.chat_id)
            .field("context", &self.context)
            .field("last_values", &self.last_values)
            .field("current_menu", &self.current_menu())
            .field("processor", &self.processor.is_some())
            .finish()
    }
}
