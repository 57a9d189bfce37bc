use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::classify::ErrorKind;
use crate::types::{Citation, ResponseFragment, Role};

/// Identifies a message within one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message as shown to the presentation layer.
///
/// User messages are created complete.  Model messages start as a streaming
/// placeholder and are replaced by successive snapshots until one arrives with
/// `is_streaming == false`; that snapshot is final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identifier; every snapshot of one message shares it.
    pub id: MessageId,
    /// Who wrote it.
    pub role: Role,
    /// The text accumulated so far.
    pub text: String,
    /// True while fragments may still arrive.
    pub is_streaming: bool,
    /// Citations accumulated so far, in arrival order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    /// When the message was created.
    #[serde(with = "timestamp")]
    pub timestamp: OffsetDateTime,
    /// Set when `text` is a classified failure message rather than a reply.
    #[serde(default, skip)]
    pub error: Option<ErrorKind>,
}

impl Message {
    /// Create a complete user message.
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            text: text.into(),
            is_streaming: false,
            citations: Vec::new(),
            timestamp: OffsetDateTime::now_utc(),
            error: None,
        }
    }

    /// Create an empty model message awaiting its first fragment.
    pub fn model_placeholder(id: MessageId) -> Self {
        Self {
            id,
            role: Role::Model,
            text: String::new(),
            is_streaming: true,
            citations: Vec::new(),
            timestamp: OffsetDateTime::now_utc(),
            error: None,
        }
    }

    /// Append one fragment's text and citations.
    pub fn apply(&mut self, fragment: &ResponseFragment) {
        self.text.push_str(&fragment.text_delta);
        self.citations.extend(fragment.citations.iter().cloned());
    }

    /// True once the message can no longer change.
    pub fn is_final(&self) -> bool {
        !self.is_streaming
    }

    /// True if this message reports a failure.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Serde adapter storing timestamps as RFC 3339 strings.
mod timestamp {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub fn serialize<S: Serializer>(at: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        let text = at.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&text, &Rfc3339).map_err(serde::de::Error::custom)
    }
}
