//! Data types: the conversation model shared with presenters, and the
//! Gemini wire format.

mod citation;
mod content;
mod generate_content_request;
mod generate_content_response;
mod grounding_metadata;
mod message;
mod model;
mod response_fragment;
mod role;

pub use citation::Citation;
pub use content::{Content, Part};
pub use generate_content_request::{GenerateContentRequest, GenerationConfig, GoogleSearch, Tool};
pub use generate_content_response::{Candidate, GenerateContentResponse, UsageMetadata};
pub use grounding_metadata::{GroundingChunk, GroundingMetadata, WebSource};
pub use message::{Message, MessageId};
pub use model::{KnownModel, Model};
pub use response_fragment::ResponseFragment;
pub use role::Role;
