//! # Parley Core
//!
//! Transport-facing contracts of the Parley conversational bot core.
//!
//! The conversation engine never talks to a messaging platform directly.
//! Everything it needs from the outside world is expressed here:
//!
//! - **Inbound events**: what the transport delivers ([`InboundEvent`])
//! - **Reply channel**: how the engine answers a conversation ([`ReplyChannel`])
//! - **Channel provider**: how the runtime obtains a reply channel for a chat
//!   ([`ReplyChannelProvider`])
//!
//! ```text
//! ┌─────────────┐  InboundEvent  ┌──────────────┐  ReplyChannel  ┌─────────────┐
//! │  Transport  │───────────────▶│ Parley core  │───────────────▶│  Transport  │
//! │  (polling)  │                │ (per chat)   │                │  (sending)  │
//! └─────────────┘                └──────────────┘                └─────────────┘
//! ```
//!
//! The engine only expresses intent ("plain reply", "offer these options");
//! keyboard markup and wire encoding belong to the transport.

pub mod channel;
pub mod error;
pub mod event;

pub use channel::{
    BoxedReplyChannel, InlineButton, MemoryChannel, OutboundReply, ReplyChannel,
    ReplyChannelProvider,
};
pub use error::{ReplyError, ReplyResult};
pub use event::{ChatId, EventPayload, InboundEvent, Location};
