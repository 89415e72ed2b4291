//! Per-invocation command context.

use std::collections::HashMap;

use crate::parameter::Parameter;

/// State of the command currently being filled in.
///
/// A fresh context is created when a command starts and replaced by an idle
/// one as soon as the command completes or another command interrupts it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationContext {
    command: Option<String>,
    pending: Option<usize>,
    values: HashMap<String, String>,
}

impl ConversationContext {
    /// An idle context.
    pub fn idle() -> Self {
        Self::default()
    }

    /// An empty context for `command`.
    pub fn start(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.command.is_some()
    }

    /// Name of the command being filled in.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Index of the parameter awaiting input, if determined.
    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    pub fn set_pending(&mut self, index: usize) {
        self.pending = Some(index);
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    /// Index of the first parameter without a value.
    pub fn first_missing(&self, parameters: &[Parameter]) -> Option<usize> {
        parameters.iter().position(|p| !self.contains(p.name()))
    }

    /// Consumes the context, returning the collected values.
    pub fn into_values(self) -> HashMap<String, String> {
        self.values
    }
}
