//! Inbound events delivered by the transport.
//!
//! An [`InboundEvent`] is addressed to one conversation ([`ChatId`]) and
//! carries exactly one payload kind: plain text, text accompanied by a
//! geo-location, or the data attached to a pressed inline button.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A geographic point shared by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` for the zero/default point some transports send when
    /// no real location is attached.
    pub fn is_zero(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// Payload of an inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// A plain text message.
    Text { text: String },
    /// A message carrying a location, possibly with a caption.
    Location {
        #[serde(default)]
        text: String,
        location: Location,
    },
    /// Data attached to an inline button the user pressed.
    Callback { data: String },
}

/// One event received from the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// The conversation the event belongs to.
    pub chat_id: ChatId,
    /// Transport message id, when the transport provides one.
    #[serde(default)]
    pub message_id: Option<i64>,
    /// What the user sent.
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl InboundEvent {
    /// Creates a text event.
    pub fn text(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id: None,
            payload: EventPayload::Text { text: text.into() },
        }
    }

    /// Creates a location event with an optional caption.
    pub fn location(
        chat_id: impl Into<ChatId>,
        text: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id: None,
            payload: EventPayload::Location {
                text: text.into(),
                location,
            },
        }
    }

    /// Creates a callback event.
    pub fn callback(chat_id: impl Into<ChatId>, data: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id: None,
            payload: EventPayload::Callback { data: data.into() },
        }
    }

    /// Attaches the transport message id.
    pub fn with_message_id(mut self, message_id: i64) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// Returns the message text, or `None` for callback events.
    pub fn text_content(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Text { text } | EventPayload::Location { text, .. } => Some(text),
            EventPayload::Callback { .. } => None,
        }
    }

    /// Returns the attached location, if any.
    pub fn location_content(&self) -> Option<Location> {
        match &self.payload {
            EventPayload::Location { location, .. } => Some(*location),
            _ => None,
        }
    }

    /// Returns the callback data for callback events.
    pub fn callback_data(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Callback { data } => Some(data),
            _ => None,
        }
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self.payload {
            EventPayload::Text { .. } => "text",
            EventPayload::Location { .. } => "location",
            EventPayload::Callback { .. } => "callback",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_location() {
        assert!(Location::default().is_zero());
        assert!(!Location::new(48.85, 2.35).is_zero());
        assert!(!Location::new(0.0, 2.35).is_zero());
    }

    #[test]
    fn test_accessors() {
        let event = InboundEvent::location(ChatId(7), "here", Location::new(1.0, 2.0));
        assert_eq!(event.text_content(), Some("here"));
        assert_eq!(event.location_content(), Some(Location::new(1.0, 2.0)));
        assert_eq!(event.callback_data(), None);
        assert_eq!(event.kind(), "location");

        let event = InboundEvent::callback(ChatId(7), "day:3").with_message_id(42);
        assert_eq!(event.text_content(), None);
        assert_eq!(event.callback_data(), Some("day:3"));
        assert_eq!(event.message_id, Some(42));
    }

    #[test]
    fn test_deserialize_tagged_payload() {
        let json = r#"{"chat_id": 5, "kind": "location", "location": {"latitude": 1.5, "longitude": -3.0}}"#;
        let event: InboundEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.chat_id, ChatId(5));
        assert_eq!(event.message_id, None);
        assert_eq!(event.text_content(), Some(""));
        assert_eq!(event.location_content(), Some(Location::new(1.5, -3.0)));
    }
}
