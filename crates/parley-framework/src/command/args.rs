use std::collections::HashMap;
use std::ops::Deref;

/// Immutable snapshot of the values collected for a command invocation.
///
/// Keys are parameter names. Besides the command's own parameters the
/// snapshot also holds every value remembered from earlier commands in the
/// same conversation, so callbacks can read values they never asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs(HashMap<String, String>);

impl CommandArgs {
    /// Returns the value collected for `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Unwraps the value map.
    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

impl Deref for CommandArgs {
    type Target = HashMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<HashMap<String, String>> for CommandArgs {
    fn from(values: HashMap<String, String>) -> Self {
        Self(values)
    }
}

impl FromIterator<(String, String)> for CommandArgs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
