use serde::{Deserialize, Serialize};

/// A web source supporting part of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    /// Where the source lives.
    pub uri: String,
    /// The source's title, as reported by the provider.
    pub title: String,
}

impl Citation {
    /// Create a new `Citation`.
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn citation_serialization() {
        let citation = Citation::new("https://example.com/a", "Example");
        assert_eq!(
            to_value(&citation).unwrap(),
            json!({"uri": "https://example.com/a", "title": "Example"})
        );
    }
}
