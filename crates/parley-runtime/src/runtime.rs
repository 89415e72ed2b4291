//! Event dispatch over the session registry.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use parley_runtime::ParleyRuntime;
//!
//! let runtime = ParleyRuntime::builder()
//!     .config_file("parley.toml")
//!     .build(definition, channels)?;
//!
//! let (events, receiver) = runtime.channel();
//! let shutdown = CancellationToken::new();
//! tokio::spawn(poll_transport(events));
//! runtime.run(receiver, shutdown).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parley_core::{ChatId, InboundEvent, ReplyChannelProvider};
use parley_framework::{BotDefinition, BotDefinitionBuilder, Route};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, debug, error, info, span, trace, warn};

use crate::config::{ConfigLoader, DispatchMode, ParleyConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;
use crate::registry::{RegistryStats, SessionRegistry};

struct RuntimeInner {
    config: ParleyConfig,
    registry: SessionRegistry,
    channels: Box<dyn ReplyChannelProvider>,
}

/// Routes inbound events to per-chat conversation state machines.
///
/// Cloning is cheap; clones share the same sessions.
#[derive(Clone)]
pub struct ParleyRuntime {
    inner: Arc<RuntimeInner>,
}

impl ParleyRuntime {
    /// Creates a runtime builder that loads configuration from the
    /// default locations.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from a loaded configuration without touching the
    /// global logger.
    ///
    /// The fixed texts of `config.messages` replace those of `definition`.
    pub fn new<P>(
        config: ParleyConfig,
        definition: BotDefinitionBuilder,
        channels: P,
    ) -> RuntimeResult<Self>
    where
        P: ReplyChannelProvider,
    {
        validate_config(&config)?;
        let definition = definition.messages(config.messages.clone()).build()?;
        Ok(Self::with_definition(config, Arc::new(definition), channels))
    }

    /// Creates a runtime around an already built definition.
    pub fn with_definition<P>(
        config: ParleyConfig,
        definition: Arc<BotDefinition>,
        channels: P,
    ) -> Self
    where
        P: ReplyChannelProvider,
    {
        Self {
            inner: Arc::new(RuntimeInner {
                config,
                registry: SessionRegistry::new(definition),
                channels: Box::new(channels),
            }),
        }
    }

    /// Initializes logging from `config`, then creates the runtime.
    pub fn from_config<P>(
        config: ParleyConfig,
        definition: BotDefinitionBuilder,
        channels: P,
    ) -> RuntimeResult<Self>
    where
        P: ReplyChannelProvider,
    {
        logging::init_from_config(&config.logging);

        let runtime = Self::new(config, definition, channels)?;
        let config = runtime.config();
        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            dispatch_mode = ?config.dispatch.mode,
            commands = runtime.definition().commands().len(),
            "Runtime initialized from configuration"
        );
        Ok(runtime)
    }

    pub fn config(&self) -> &ParleyConfig {
        &self.inner.config
    }

    pub fn definition(&self) -> &Arc<BotDefinition> {
        self.inner.registry.definition()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn stats(&self) -> RegistryStats {
        self.inner.registry.stats()
    }

    /// Creates an inbound event channel sized by `dispatch.queue_capacity`.
    pub fn channel(&self) -> (mpsc::Sender<InboundEvent>, mpsc::Receiver<InboundEvent>) {
        mpsc::channel(self.inner.config.dispatch.queue_capacity)
    }

    /// Handles one event to completion and returns how it was routed.
    ///
    /// Waits while another event of the same chat is being handled.
    pub async fn dispatch(&self, event: InboundEvent) -> Route {
        let span = span!(Level::DEBUG, "dispatch", kind = event.kind());
        async move {
            let chat_id = event.chat_id;
            let session = self.inner.registry.get_or_create(chat_id);
            let channel = self.inner.channels.open(chat_id);

            let mut session = session.lock().await;
            session.handle(&event, channel.as_ref())
        }
        .instrument(span)
        .await
    }

    /// Consumes `events` until the sender side closes or `shutdown` fires.
    ///
    /// In concurrent mode every chat gets its own queue and worker task:
    /// different chats are handled in parallel while the events of one chat
    /// are handled one at a time, in arrival order. A full chat queue holds
    /// back intake. Events already queued when intake stops are still
    /// handled before this returns.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<InboundEvent>,
        shutdown: CancellationToken,
    ) -> RuntimeResult<()> {
        let mode = self.inner.config.dispatch.mode;
        info!(?mode, "Parley runtime is now running");

        let mut queues: HashMap<ChatId, mpsc::Sender<InboundEvent>> = HashMap::new();
        let mut workers = JoinSet::new();
        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping intake");
                    break;
                }
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    Self::reap(joined)?;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Event channel closed");
                        break;
                    };

                    match mode {
                        DispatchMode::Sequential => {
                            let route = self.dispatch(event).await;
                            trace!(?route, "Event handled");
                        }
                        DispatchMode::Concurrent => {
                            self.enqueue(&mut queues, &mut workers, event).await;
                        }
                    }
                }
            }
        }

        // Closing the queues lets each worker finish its backlog and exit.
        queues.clear();
        if !workers.is_empty() {
            debug!(workers = workers.len(), "Draining chat workers");
        }
        while let Some(joined) = workers.join_next().await {
            Self::reap(joined)?;
        }

        info!("Parley runtime stopped");
        Ok(())
    }

    /// Appends `event` to its chat's queue, starting a worker for the chat
    /// when it has none.
    async fn enqueue(
        &self,
        queues: &mut HashMap<ChatId, mpsc::Sender<InboundEvent>>,
        workers: &mut JoinSet<()>,
        event: InboundEvent,
    ) {
        let chat_id = event.chat_id;
        let event = match queues.get(&chat_id) {
            Some(queue) => match queue.send(event).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(event)) => {
                    warn!(chat = %chat_id, "Chat worker stopped, restarting it");
                    event
                }
            },
            None => event,
        };

        let (queue, receiver) = mpsc::channel(self.inner.config.dispatch.queue_capacity);
        workers.spawn(self.clone().chat_worker(chat_id, receiver));
        if queue.send(event).await.is_err() {
            error!(chat = %chat_id, "Chat worker exited before its first event");
        }
        queues.insert(chat_id, queue);
    }

    async fn chat_worker(self, chat_id: ChatId, mut queue: mpsc::Receiver<InboundEvent>) {
        trace!(chat = %chat_id, "Chat worker started");
        while let Some(event) = queue.recv().await {
            let route = self.dispatch(event).await;
            trace!(?route, "Event handled");
        }
        trace!(chat = %chat_id, "Chat worker stopped");
    }

    fn reap(joined: Result<(), JoinError>) -> RuntimeResult<()> {
        match joined {
            Ok(()) => Ok(()),
            Err(e) if e.is_panic() => {
                error!(error = %e, "Chat worker panicked");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for ParleyRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParleyRuntime")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`ParleyRuntime`] with custom configuration.
///
/// ```rust,ignore
/// let runtime = ParleyRuntime::builder()
///     .config_file("config/parley.toml")
///     .profile("production")
///     .build(definition, channels)?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Pins a single configuration value.
    pub fn set<T: serde::Serialize>(mut self, key: &str, value: T) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Loads configuration, initializes logging and builds the runtime.
    pub fn build<P>(self, definition: BotDefinitionBuilder, channels: P) -> RuntimeResult<ParleyRuntime>
    where
        P: ReplyChannelProvider,
    {
        let config = self.config_loader.load()?;
        ParleyRuntime::from_config(config, definition, channels)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
