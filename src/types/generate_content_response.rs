use serde::{Deserialize, Serialize};

use crate::types::{Citation, Content, GroundingMetadata, ResponseFragment};

/// One chunk of a streamed `generateContent` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate replies; gemchat reads only the first.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Token accounting, usually on the last chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    /// The model version that served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// The text of the first candidate, or the empty string.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(Content::joined_text)
            .unwrap_or_default()
    }

    /// Web citations of the first candidate.
    pub fn citations(&self) -> Vec<Citation> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
            .map(GroundingMetadata::citations)
            .unwrap_or_default()
    }

    /// Converts the chunk to a fragment.
    pub fn to_fragment(&self) -> ResponseFragment {
        ResponseFragment::text(self.text()).with_citations(self.citations())
    }
}

/// A candidate reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The content produced so far in this chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Why generation stopped, on the final chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Search grounding for this candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

/// Token accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_token_count: u64,
    /// Tokens in the candidates.
    #[serde(default)]
    pub candidates_token_count: u64,
    /// Total tokens.
    #[serde(default)]
    pub total_token_count: u64,
}
