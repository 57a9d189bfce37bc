use serde::{Deserialize, Serialize};

use crate::types::Citation;

/// One incremental unit of a streamed reply.
///
/// `text_delta` is appended to what came before it; it never replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFragment {
    /// Text to append.
    pub text_delta: String,
    /// Grounding references carried by this fragment, in provider order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
}

impl ResponseFragment {
    /// Create a fragment carrying only text.
    pub fn text(text_delta: impl Into<String>) -> Self {
        Self {
            text_delta: text_delta.into(),
            citations: Vec::new(),
        }
    }

    /// Attach citations to this fragment.
    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    /// True if the fragment carries neither text nor citations.
    pub fn is_empty(&self) -> bool {
        self.text_delta.is_empty() && self.citations.is_empty()
    }
}

impl std::str::FromStr for ResponseFragment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::text(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn text_only_fragment_omits_citations() {
        let fragment = ResponseFragment::text("Hi");
        assert_eq!(to_value(&fragment).unwrap(), json!({"text_delta": "Hi"}));
        assert!(!fragment.is_empty());
        assert!(ResponseFragment::default().is_empty());
    }

    #[test]
    fn from_str() {
        let fragment = " there".parse::<ResponseFragment>().unwrap();
        assert_eq!(fragment.text_delta, " there");
    }
}
