//! Side effects produced by a state transition.
//!
//! Transitions never talk to the transport directly. They push [`Effect`]s,
//! which [`ChatSession::handle`](super::ChatSession::handle) then delivers in
//! order through the conversation's reply channel.

use parley_core::InlineButton;

use crate::command::CommandArgs;
use crate::processor::ProcessorInput;
use crate::route::Route;

/// One outbound action requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a plain reply.
    Reply(String),
    /// Send a question with one-click options.
    Ask {
        text: String,
        options: Vec<String>,
        force_answer: bool,
    },
    /// Send a message with inline buttons.
    Inline {
        text: String,
        buttons: Vec<InlineButton>,
    },
    /// Run a command's completion callback.
    Complete { command: String, args: CommandArgs },
    /// Hand the input to the conversation's chat processor.
    Process {
        message_id: Option<i64>,
        input: ProcessorInput,
    },
}

/// Result of feeding one event to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub route: Route,
    pub effects: Vec<Effect>,
}
