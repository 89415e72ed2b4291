//! Error types shared with transport implementations.

use thiserror::Error;

/// Errors a [`ReplyChannel`](crate::ReplyChannel) reports when a reply
/// cannot be handed to the transport.
///
/// The conversation engine logs these and carries on; conversation state is
/// never rolled back because a reply was lost.
#[derive(Debug, Clone, Error)]
pub enum ReplyError {
    /// The transport rejected or failed to deliver the message.
    #[error("failed to send reply: {0}")]
    SendFailed(String),

    /// The channel has been closed and accepts no more replies.
    #[error("reply channel closed")]
    Closed,

    /// The transport cannot express the requested reply kind.
    #[error("reply kind '{kind}' not supported by transport")]
    Unsupported {
        /// The reply kind that was requested.
        kind: &'static str,
    },
}

/// Result type for reply operations.
pub type ReplyResult<T> = Result<T, ReplyError>;
