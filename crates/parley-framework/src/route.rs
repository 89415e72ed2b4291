//! Routing outcomes.

/// How an inbound event was routed.
///
/// Returned for every processed event so that an analytics collaborator can
/// record the recognised intent and whether the bot understood the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A command was started, either typed, picked from a menu or matched by
    /// its display name. `completed` is set when it ran immediately.
    CommandStarted { command: String, completed: bool },
    /// A menu level was (re)displayed.
    MenuShown { menu: String },
    /// The event answered a pending parameter question.
    ParameterAnswered {
        command: String,
        parameter: String,
        accepted: bool,
        completed: bool,
    },
    /// The conversation's chat processor handled the event.
    Processed { intent: Option<String> },
    /// Nothing matched; the fallback reply was sent.
    NotUnderstood,
    /// The event carried nothing to route.
    Ignored,
}

impl Route {
    /// The analytics intent of this outcome.
    pub fn intent(&self) -> Option<&str> {
        match self {
            Self::CommandStarted { command, .. } | Self::ParameterAnswered { command, .. } => {
                Some(command.as_str())
            }
            Self::MenuShown { menu } => Some(menu.as_str()),
            Self::Processed { intent } => intent.as_deref(),
            Self::NotUnderstood | Self::Ignored => None,
        }
    }

    /// Returns `false` when the bot did not understand or ignored the event.
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::NotUnderstood | Self::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_and_handled() {
        let started = Route::CommandStarted {
            command: "/weather".into(),
            completed: false,
        };
        assert_eq!(started.intent(), Some("/weather"));
        assert!(started.is_handled());

        assert_eq!(Route::NotUnderstood.intent(), None);
        assert!(!Route::NotUnderstood.is_handled());
        assert!(!Route::Ignored.is_handled());
        assert_eq!(
            Route::Processed {
                intent: Some("smalltalk".into())
            }
            .intent(),
            Some("smalltalk")
        );
    }
}
