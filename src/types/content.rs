use serde::{Deserialize, Serialize};

use crate::types::Role;

/// A turn of conversation as the Gemini API represents it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`; absent for system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// The parts that make up the turn.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a single-part text turn for `role`.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.as_str().to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// Create a role-less text content, as used for system instructions.
    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    /// The concatenated text of all text parts.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

/// One part of a content turn.  Only text parts are produced or consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn content_serialization() {
        let content = Content::text(Role::User, "hello");
        assert_eq!(
            to_value(&content).unwrap(),
            json!({"role": "user", "parts": [{"text": "hello"}]})
        );

        let instruction = Content::instruction("be brief");
        assert_eq!(
            to_value(&instruction).unwrap(),
            json!({"parts": [{"text": "be brief"}]})
        );
    }

    #[test]
    fn joined_text_skips_non_text_parts() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [{"text": "a"}, {"functionCall": {"name": "f"}}, {"text": "b"}]
        }))
        .unwrap();
        assert_eq!(content.joined_text(), "ab");
    }
}
