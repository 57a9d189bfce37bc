use serde::{Deserialize, Serialize};

use crate::types::Citation;

/// Grounding information attached to a candidate when search is enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    /// Sources consulted for the reply.
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    /// Queries the provider ran.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_search_queries: Vec<String>,
}

impl GroundingMetadata {
    /// The web sources among the grounding chunks, in order.
    pub fn citations(&self) -> Vec<Citation> {
        self.grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .map(|web| Citation::new(web.uri.clone(), web.title.clone()))
            .collect()
    }
}

/// A single grounding source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    /// Set for web search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

/// A web page used for grounding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    /// The page address.
    #[serde(default)]
    pub uri: String,
    /// The page title.
    #[serde(default)]
    pub title: String,
}
