//! Streaming chat sessions against the Gemini API, with grounded web
//! citations and classified, user-facing failures.
//!
//! The pieces, leaves first:
//!
//! - [`Provider`] and [`ProviderSession`]: the provider contract, implemented
//!   for the Gemini Generative Language API by [`Gemini`].
//! - [`SessionManager`]: owns at most one open session.
//! - [`AggregatingStream`]: turns reply fragments into [`Message`] snapshots.
//! - [`classify`]: maps failures to a small taxonomy of user messages.
//! - [`Conversation`]: the ordered message list a [`Presenter`] renders.

// Public modules
pub mod aggregator;
pub mod chat;
pub mod classify;
pub mod client;
pub mod client_logger;
pub mod config;
pub mod conversation;
pub mod error;
pub mod provider;
pub mod render;
pub mod session;
pub mod types;

mod observability;
mod sse;

// Re-exports
pub use aggregator::AggregatingStream;
pub use classify::{
    ClassifiedError, ErrorKind, FailureDescriptor, FailureOrigin, classify, classify_failure,
};
pub use client::Gemini;
pub use client_logger::{ClientLogger, StderrLogger};
pub use config::{
    Credential, CredentialSource, EnvCredentials, SessionConfig, StaticCredential,
};
pub use conversation::{Conversation, ConversationStats};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use provider::{FragmentStream, GeminiChat, Provider, ProviderSession};
pub use render::{PlainTextPresenter, Presenter, format_sources};
pub use session::SessionManager;
pub use types::*;
