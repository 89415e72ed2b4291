//! The reply side of a conversation.
//!
//! A [`ReplyChannel`] is the narrow capability the conversation engine uses to
//! answer one chat. Replies are fire-and-forget: implementations should hand
//! the message to the transport (for example by pushing it into a queue) and
//! return without waiting for delivery confirmation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{ReplyError, ReplyResult};
use crate::event::ChatId;

/// An inline button attached to a message.
///
/// Pressing it produces an [`EventPayload::Callback`](crate::EventPayload::Callback)
/// carrying `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub label: String,
    pub data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Capability to answer a single conversation.
///
/// # API Design
///
/// - `send_reply`: a plain message, removing any option keyboard
/// - `ask_options`: a question with one-click options; free text is still
///   accepted unless the transport enforces `force_answer`
/// - `send_inline`: a message with inline buttons (defaults to a plain reply
///   for transports without inline keyboards)
/// - `identity_display_name`: how the user on the other side is called
pub trait ReplyChannel: Send + Sync {
    /// Sends a plain text reply.
    fn send_reply(&self, text: &str) -> ReplyResult<()>;

    /// Sends `text` together with a list of options the user can pick.
    fn ask_options(&self, text: &str, options: &[String], force_answer: bool) -> ReplyResult<()>;

    /// Sends `text` with inline buttons.
    fn send_inline(&self, text: &str, buttons: &[InlineButton]) -> ReplyResult<()> {
        let _ = buttons;
        self.send_reply(text)
    }

    /// Display name of the user this channel talks to.
    fn identity_display_name(&self) -> String;
}

/// A shared reply channel trait object.
pub type BoxedReplyChannel = Arc<dyn ReplyChannel>;

/// Opens reply channels for conversations.
///
/// Implemented by the transport. Closures `Fn(ChatId) -> BoxedReplyChannel`
/// implement it as well.
pub trait ReplyChannelProvider: Send + Sync + 'static {
    /// Returns the reply channel of `chat_id`.
    fn open(&self, chat_id: ChatId) -> BoxedReplyChannel;
}

impl<F> ReplyChannelProvider for F
where
    F: Fn(ChatId) -> BoxedReplyChannel + Send + Sync + 'static,
{
    fn open(&self, chat_id: ChatId) -> BoxedReplyChannel {
        self(chat_id)
    }
}

// =============================================================================
// MemoryChannel
// =============================================================================

/// A reply recorded by [`MemoryChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundReply {
    /// Produced by [`ReplyChannel::send_reply`].
    Text(String),
    /// Produced by [`ReplyChannel::ask_options`].
    Options {
        text: String,
        options: Vec<String>,
        force_answer: bool,
    },
    /// Produced by [`ReplyChannel::send_inline`].
    Inline {
        text: String,
        buttons: Vec<InlineButton>,
    },
}

impl OutboundReply {
    /// The message text regardless of reply kind.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Options { text, .. } | Self::Inline { text, .. } => text,
        }
    }

    /// The offered options, empty for other reply kinds.
    pub fn options(&self) -> &[String] {
        match self {
            Self::Options { options, .. } => options,
            _ => &[],
        }
    }
}

/// An in-memory [`ReplyChannel`] that records every reply.
///
/// Useful for tests and for transports that collect replies before
/// flushing them in bulk. After [`close`](Self::close) every send fails with
/// [`ReplyError::Closed`] and nothing more is recorded.
#[derive(Debug)]
pub struct MemoryChannel {
    display_name: String,
    replies: Mutex<Vec<OutboundReply>>,
    closed: AtomicBool,
}

impl MemoryChannel {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            replies: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns a copy of all recorded replies.
    pub fn replies(&self) -> Vec<OutboundReply> {
        self.replies.lock().clone()
    }

    /// Removes and returns all recorded replies.
    pub fn take(&self) -> Vec<OutboundReply> {
        std::mem::take(&mut *self.replies.lock())
    }

    /// Returns the most recent reply.
    pub fn last(&self) -> Option<OutboundReply> {
        self.replies.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.replies.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.lock().is_empty()
    }

    /// Makes every further send fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn record(&self, reply: OutboundReply) -> ReplyResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ReplyError::Closed);
        }
        self.replies.lock().push(reply);
        Ok(())
    }
}

impl ReplyChannel for MemoryChannel {
    fn send_reply(&self, text: &str) -> ReplyResult<()> {
        self.record(OutboundReply::Text(text.to_string()))
    }

    fn ask_options(&self, text: &str, options: &[String], force_answer: bool) -> ReplyResult<()> {
        self.record(OutboundReply::Options {
            text: text.to_string(),
            options: options.to_vec(),
            force_answer,
        })
    }

    fn send_inline(&self, text: &str, buttons: &[InlineButton]) -> ReplyResult<()> {
        self.record(OutboundReply::Inline {
            text: text.to_string(),
            buttons: buttons.to_vec(),
        })
    }

    fn identity_display_name(&self) -> String {
        self.display_name.clone()
    }
}
