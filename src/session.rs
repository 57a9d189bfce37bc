//! Session lifecycle.
//!
//! The [`SessionManager`] owns the provider, the credential source, and at
//! most one open session.  Creating a session always replaces the previous
//! one; a failed creation leaves no session behind.

use crate::config::{CredentialSource, SessionConfig};
use crate::error::{Error, Result};
use crate::observability::{SESSIONS_CREATED, SESSIONS_DISCARDED, SESSIONS_FAILED};
use crate::provider::{FragmentStream, Provider, ProviderSession, creation_rejected};

/// Owns the active session of one conversation.
pub struct SessionManager<P: Provider> {
    provider: P,
    credentials: Box<dyn CredentialSource>,
    config: SessionConfig,
    session: Option<P::Session>,
    sessions_created: u64,
}

impl<P: Provider> SessionManager<P> {
    /// Creates a manager with no open session.
    pub fn new(provider: P, credentials: Box<dyn CredentialSource>, config: SessionConfig) -> Self {
        Self {
            provider,
            credentials,
            config,
            session: None,
            sessions_created: 0,
        }
    }

    /// The configuration new sessions are bound to.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// True if a session is open.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// The number of sessions successfully created.
    pub fn sessions_created(&self) -> u64 {
        self.sessions_created
    }

    /// Opens a fresh session with the current configuration.
    ///
    /// Any previous session is dropped first, so on failure no session is
    /// held.  Every failure is a configuration error.
    pub fn create_session(&mut self) -> Result<()> {
        self.session = None;
        let result = self
            .credentials
            .resolve()
            .and_then(|credential| self.provider.create_session(&credential, &self.config))
            .map_err(creation_rejected);
        match result {
            Ok(session) => {
                SESSIONS_CREATED.click();
                self.sessions_created += 1;
                self.session = Some(session);
                Ok(())
            }
            Err(err) => {
                SESSIONS_FAILED.click();
                Err(err)
            }
        }
    }

    /// Replaces the configuration and opens a session bound to it.
    ///
    /// The new configuration is kept even if creation fails, so a later
    /// [`SessionManager::create_session`] retries with it.
    pub fn create_session_with(&mut self, config: SessionConfig) -> Result<()> {
        self.config = config;
        self.create_session()
    }

    /// Replaces the configuration and drops the open session.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
        self.discard_session();
    }

    /// Drops the open session, if any.
    pub fn discard_session(&mut self) {
        if self.session.take().is_some() {
            SESSIONS_DISCARDED.click();
        }
    }

    /// Sends `text` on the open session.  Never retries.
    pub async fn send(&mut self, text: &str) -> Result<FragmentStream> {
        let Some(session) = self.session.as_mut() else {
            return Err(Error::no_session(
                "create a session before sending a message",
            ));
        };
        session.send_stream(text).await
    }
}
