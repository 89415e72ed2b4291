//! Session registry: one conversation state machine per chat.
//!
//! Sessions are created lazily on a chat's first event and live for the
//! rest of the process unless removed explicitly. Each session sits behind
//! its own async mutex, so events of one chat are handled one at a time
//! while different chats proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use parley_core::ChatId;
use parley_framework::{BotDefinition, ChatSession, ChatState};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A session shared between the registry and in-flight dispatches.
pub type SharedSession = Arc<Mutex<ChatSession>>;

/// Map from chat id to that chat's conversation state.
pub struct SessionRegistry {
    definition: Arc<BotDefinition>,
    sessions: RwLock<HashMap<ChatId, SharedSession>>,
}

impl SessionRegistry {
    pub fn new(definition: Arc<BotDefinition>) -> Self {
        Self {
            definition,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The definition new sessions are created from.
    pub fn definition(&self) -> &Arc<BotDefinition> {
        &self.definition
    }

    /// Returns the session of `chat_id`, creating it on first use.
    ///
    /// Concurrent first events of the same chat always receive the same
    /// session.
    pub fn get_or_create(&self, chat_id: ChatId) -> SharedSession {
        if let Some(session) = self.sessions.read().get(&chat_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write();
        let session = sessions.entry(chat_id).or_insert_with(|| {
            info!(chat = %chat_id, "Created session");
            Arc::new(Mutex::new(ChatSession::new(
                chat_id,
                Arc::clone(&self.definition),
            )))
        });
        Arc::clone(session)
    }

    /// Returns the session of `chat_id` if it exists.
    pub fn get(&self, chat_id: ChatId) -> Option<SharedSession> {
        self.sessions.read().get(&chat_id).cloned()
    }

    /// Forgets a chat. Its next event starts a fresh session.
    pub fn remove(&self, chat_id: ChatId) -> Option<SharedSession> {
        let removed = self.sessions.write().remove(&chat_id);
        if removed.is_some() {
            debug!(chat = %chat_id, "Removed session");
        }
        removed
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.sessions.read().contains_key(&chat_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// All known chat ids, in no particular order.
    pub fn chat_ids(&self) -> Vec<ChatId> {
        self.sessions.read().keys().copied().collect()
    }

    /// Counts sessions by state without waiting for busy ones.
    pub fn stats(&self) -> RegistryStats {
        let sessions = self.sessions.read();
        let mut stats = RegistryStats {
            total: sessions.len(),
            ..Default::default()
        };

        for session in sessions.values() {
            match session.try_lock() {
                Ok(session) => match session.state() {
                    ChatState::Idle => stats.idle += 1,
                    ChatState::AwaitingParameter { .. } => stats.collecting += 1,
                },
                Err(_) => stats.busy += 1,
            }
        }

        stats
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish_non_exhaustive()
    }
}

/// Statistics about the session registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    /// Sessions with no command in progress.
    pub idle: usize,
    /// Sessions waiting for a parameter value.
    pub collecting: usize,
    /// Sessions handling an event right now.
    pub busy: usize,
}

impl std::fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sessions: {} total ({} idle, {} collecting, {} busy)",
            self.total, self.idle, self.collecting, self.busy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{InboundEvent, MemoryChannel};
    use parley_framework::{Command, Parameter};

    fn registry() -> SessionRegistry {
        let definition = BotDefinition::builder()
            .command(
                Command::new("/echo", |args, reply| {
                    reply.send_reply(args.value("text").unwrap_or_default())
                })
                .parameter(Parameter::new("text", "What should I echo?")),
            )
            .build()
            .unwrap();
        SessionRegistry::new(Arc::new(definition))
    }

    #[test]
    fn test_lazy_creation() {
        let registry = registry();
        assert!(registry.is_empty());
        assert!(registry.get(ChatId(1)).is_none());

        let first = registry.get_or_create(ChatId(1));
        let again = registry.get_or_create(ChatId(1));
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(ChatId(1)));
    }

    #[test]
    fn test_remove_starts_fresh() {
        let registry = registry();
        let first = registry.get_or_create(ChatId(1));
        registry.get_or_create(ChatId(2));

        assert!(registry.remove(ChatId(1)).is_some());
        assert!(registry.remove(ChatId(1)).is_none());
        assert_eq!(registry.chat_ids(), [ChatId(2)]);

        let second = registry.get_or_create(ChatId(1));
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_stats() {
        let registry = registry();
        let channel = MemoryChannel::new("tester");

        registry.get_or_create(ChatId(1));
        let collecting = registry.get_or_create(ChatId(2));
        collecting
            .lock()
            .await
            .handle(&InboundEvent::text(ChatId(2), "/echo"), &channel);
        let busy = registry.get_or_create(ChatId(3));
        let _guard = busy.lock().await;

        let stats = registry.stats();
        assert_eq!(
            stats,
            RegistryStats {
                total: 3,
                idle: 1,
                collecting: 1,
                busy: 1
            }
        );
        assert_eq!(
            stats.to_string(),
            "Sessions: 3 total (1 idle, 1 collecting, 1 busy)"
        );
    }

    #[test]
    fn test_sessions_are_isolated() {
        let registry = registry();
        let channel = MemoryChannel::new("tester");

        let one = registry.get_or_create(ChatId(1));
        one.blocking_lock()
            .handle(&InboundEvent::text(ChatId(1), "/echo"), &channel);

        let two = registry.get_or_create(ChatId(2));
        assert_eq!(two.blocking_lock().state(), ChatState::Idle);
    }
}
