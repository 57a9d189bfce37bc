//! The provider contract and its Gemini implementation.
//!
//! A [`Provider`] turns a credential and a [`SessionConfig`] into a session;
//! a [`ProviderSession`] turns one user message into a lazy stream of
//! [`ResponseFragment`]s.  The session manager depends only on these traits.

use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures::stream::{self, Stream, StreamExt};

use crate::client::{ChunkStream, Gemini};
use crate::config::{Credential, SessionConfig};
use crate::error::{Error, Result};
use crate::observability::STREAM_FRAGMENTS;
use crate::types::{Content, GenerateContentRequest, ResponseFragment, Role};

/// A lazy, fallible sequence of reply fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<ResponseFragment>> + Send>>;

/// Something that can open chat sessions.
pub trait Provider: Send + Sync {
    /// The session type this provider creates.
    type Session: ProviderSession;

    /// Open a session bound to `config`.
    fn create_session(&self, credential: &Credential, config: &SessionConfig)
    -> Result<Self::Session>;
}

/// An open chat session.
#[async_trait::async_trait]
pub trait ProviderSession: Send {
    /// Send `text` and stream the reply.
    ///
    /// Failures before the first fragment are returned directly; later
    /// failures arrive as an `Err` item, after which the stream ends.
    async fn send_stream(&mut self, text: &str) -> Result<FragmentStream>;
}

/////////////////////////////////////////// Gemini ////////////////////////////////////////////

impl Provider for Gemini {
    type Session = GeminiChat;

    fn create_session(&self, credential: &Credential, config: &SessionConfig) -> Result<GeminiChat> {
        config.validate()?;
        Ok(GeminiChat {
            client: self.clone(),
            credential: credential.clone(),
            config: config.clone(),
            history: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

/// A multi-turn Gemini conversation.
///
/// A user/model turn pair joins the history only when its reply stream ends
/// without error.  Failed and abandoned exchanges leave no trace.
#[derive(Debug)]
pub struct GeminiChat {
    client: Gemini,
    credential: Credential,
    config: SessionConfig,
    history: Arc<Mutex<Vec<Content>>>,
}

impl GeminiChat {
    /// The configuration this session is bound to.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The committed turns, oldest first.
    pub fn history(&self) -> Vec<Content> {
        lock_history(&self.history).clone()
    }

    /// Build the request for sending `text` after the committed history.
    pub fn build_request(&self, text: &str) -> GenerateContentRequest {
        let mut contents = self.history();
        contents.push(Content::text(Role::User, text));
        let request = GenerateContentRequest::new(contents)
            .with_system_instruction(&self.config.system_instruction)
            .with_temperature(self.config.temperature);
        if self.config.use_search {
            request.with_google_search()
        } else {
            request
        }
    }
}

#[async_trait::async_trait]
impl ProviderSession for GeminiChat {
    async fn send_stream(&mut self, text: &str) -> Result<FragmentStream> {
        let request = self.build_request(text);
        let chunks = self
            .client
            .stream_generate(&self.credential, &self.config.model, &request)
            .await?;
        let pending = PendingTurn {
            history: Arc::clone(&self.history),
            user: Content::text(Role::User, text),
            reply: String::new(),
        };
        Ok(Box::pin(committing_fragments(chunks, pending)))
    }
}

struct PendingTurn {
    history: Arc<Mutex<Vec<Content>>>,
    user: Content,
    reply: String,
}

impl PendingTurn {
    fn commit(self) {
        let mut history = lock_history(&self.history);
        history.push(self.user);
        history.push(Content::text(Role::Model, self.reply));
    }
}

/// Converts chunks to fragments, committing the turn on a clean end of stream.
fn committing_fragments(
    chunks: ChunkStream,
    pending: PendingTurn,
) -> impl Stream<Item = Result<ResponseFragment>> + Send {
    stream::unfold(
        (chunks, Some(pending)),
        |(mut chunks, mut pending)| async move {
            loop {
                // Once an error is yielded `pending` is gone and the stream ends.
                let turn = pending.as_mut()?;
                match chunks.next().await {
                    Some(Ok(chunk)) => {
                        let fragment = chunk.to_fragment();
                        if fragment.is_empty() {
                            continue;
                        }
                        STREAM_FRAGMENTS.click();
                        turn.reply.push_str(&fragment.text_delta);
                        return Some((Ok(fragment), (chunks, pending)));
                    }
                    Some(Err(err)) => {
                        return Some((Err(err), (chunks, None)));
                    }
                    None => {
                        if let Some(turn) = pending.take() {
                            turn.commit();
                        }
                        return None;
                    }
                }
            }
        },
    )
}

fn lock_history(history: &Mutex<Vec<Content>>) -> std::sync::MutexGuard<'_, Vec<Content>> {
    history
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Wrap an error so that it surfaces as a provider rejection at creation time.
pub(crate) fn creation_rejected(err: Error) -> Error {
    match err {
        Error::Configuration { .. } => err,
        other => Error::configuration(
            format!("provider rejected session configuration: {}", other.message()),
            match &other {
                Error::Validation { param, .. } => param.clone(),
                _ => None,
            },
        ),
    }
}
