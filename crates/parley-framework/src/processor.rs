//! Free-form conversation processors.
//!
//! A [`ChatProcessor`] receives whatever the command and menu machinery
//! could not route: unmatched text or locations, and callback data that no
//! pending parameter claimed. One processor instance lives in each
//! conversation and may keep its own state between messages.

use std::sync::Arc;

use parley_core::{ChatId, Location, ReplyChannel};

/// Input handed to a [`ChatProcessor`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorInput {
    /// Unmatched message text.
    Text(String),
    /// A location with no pending parameter to receive it.
    Location(Location),
    /// Callback data of a pressed inline button.
    Callback(String),
}

/// Handles input the command router did not claim.
pub trait ChatProcessor: Send {
    /// Processes one input and returns the analytics intent it recognised.
    fn process(
        &mut self,
        message_id: Option<i64>,
        input: &ProcessorInput,
        reply: &dyn ReplyChannel,
    ) -> Option<String>;
}

/// Creates the processor of a new conversation.
pub type ProcessorFactory = Arc<dyn Fn(ChatId) -> Box<dyn ChatProcessor> + Send + Sync>;
