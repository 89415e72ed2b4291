//! # Parley Runtime
//!
//! Orchestration layer of the Parley conversational bot core.
//!
//! This crate provides:
//! - Lazily populated per-chat sessions ([`SessionRegistry`])
//! - Sequential or concurrent event dispatch ([`ParleyRuntime`])
//! - Layered configuration with figment ([`config`])
//! - Logging setup with tracing-subscriber ([`logging`])
//!
//! The runtime does not talk to any messaging platform. A transport feeds
//! [`InboundEvent`](parley_core::InboundEvent)s into the channel returned by
//! [`ParleyRuntime::channel`] and supplies a
//! [`ReplyChannelProvider`](parley_core::ReplyChannelProvider) for answers.
//!
//! ```ignore
//! use parley_runtime::ParleyRuntime;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ParleyRuntime::builder().build(definition, channels)?;
//!     let (events, receiver) = runtime.channel();
//!
//!     tokio::spawn(transport.poll(events));
//!     runtime.run(receiver, CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, DispatchMode, ParleyConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use registry::{RegistryStats, SessionRegistry, SharedSession};
pub use runtime::{ParleyRuntime, RuntimeBuilder};

pub use tokio_util::sync::CancellationToken;
pub use tracing;

/// Logging macros for application code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
