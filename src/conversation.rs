//! The conversation: ordered messages, one in-flight reply at a time.
//!
//! [`Conversation::send_message`] publishes the user message and a streaming
//! placeholder before awaiting anything, then publishes one snapshot per
//! fragment and a terminal snapshot.  Send-time failures end the exchange
//! with a classified message and discard the session; the next send opens a
//! new one.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::aggregator::{AggregatingStream, fail_message};
use crate::classify::ClassifiedError;
use crate::client_logger::ClientLogger;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::observability::{
    CONVERSATION_CANCELLATIONS, CONVERSATION_RESETS, CONVERSATION_SENDS, record_error_kind,
};
use crate::provider::Provider;
use crate::render::Presenter;
use crate::session::SessionManager;
use crate::types::{Message, MessageId, Model};

/// How often to check for an interrupt while waiting on the provider.
const INTERRUPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Aggregated statistics for a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationStats {
    /// The model new sessions are bound to.
    pub model: Model,
    /// Messages currently in the conversation.
    pub message_count: usize,
    /// Messages sent since the conversation was created.
    pub sends: u64,
    /// Sends that ended in a classified failure.
    pub failed_sends: u64,
    /// Sends the user interrupted.
    pub cancelled_sends: u64,
    /// Sessions successfully created.
    pub sessions_created: u64,
    /// True if a session is open.
    pub has_session: bool,
    /// True while a reply is streaming.
    pub in_flight: bool,
    /// The active configuration.
    pub config: SessionConfig,
}

/// How an exchange ended.
enum Outcome {
    Completed,
    Cancelled,
    Failed(ClassifiedError),
}

/// A conversation driven through a [`SessionManager`] and shown on a [`Presenter`].
pub struct Conversation<P: Provider> {
    manager: SessionManager<P>,
    messages: Vec<Message>,
    next_id: u64,
    in_flight: bool,
    presenter: Box<dyn Presenter>,
    logger: Option<Arc<dyn ClientLogger>>,
    sends: u64,
    failed_sends: u64,
    cancelled_sends: u64,
}

impl<P: Provider> Conversation<P> {
    /// Creates an empty conversation.  No session is opened until the first
    /// send or an explicit reset.
    pub fn new(manager: SessionManager<P>, presenter: Box<dyn Presenter>) -> Self {
        Self {
            manager,
            messages: Vec::new(),
            next_id: 1,
            in_flight: false,
            presenter,
            logger: None,
            sends: 0,
            failed_sends: 0,
            cancelled_sends: 0,
        }
    }

    /// Attach a logger for completions and classified failures.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True while a reply is streaming.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// The configuration new sessions are bound to.
    pub fn config(&self) -> &SessionConfig {
        self.manager.config()
    }

    /// The session manager.
    pub fn manager(&self) -> &SessionManager<P> {
        &self.manager
    }

    /// The presenter, for out-of-band output.
    pub fn presenter_mut(&mut self) -> &mut dyn Presenter {
        self.presenter.as_mut()
    }

    /// Sends `text` and streams the reply to the presenter.
    ///
    /// Returns the terminal snapshot of the reply.  If no session is open one
    /// is created first; if that fails the error is reported and returned and
    /// no messages are added.  Failures after that point are reported in the
    /// returned message.  An interrupt is honored while waiting for the
    /// provider to answer as well as between fragments.
    pub async fn send_message(&mut self, text: &str) -> Result<Message> {
        if !self.manager.has_session()
            && let Err(err) = self.manager.create_session()
        {
            self.report_failure(&ClassifiedError::from(&err));
            return Err(err);
        }

        CONVERSATION_SENDS.click();
        self.sends += 1;
        let user = Message::user(self.allocate_id(), text);
        let placeholder = Message::model_placeholder(self.allocate_id());
        self.publish(user);
        self.publish(placeholder.clone());
        self.set_in_flight(true);

        let sent = {
            let send = self.manager.send(text);
            tokio::pin!(send);
            let mut ticker = tokio::time::interval(INTERRUPT_POLL_INTERVAL);
            loop {
                if self.presenter.should_interrupt() {
                    break None;
                }
                tokio::select! {
                    result = &mut send => break Some(result),
                    _ = ticker.tick() => {}
                }
            }
        };

        let (terminal, outcome) = match sent {
            None => {
                let mut terminal = placeholder;
                terminal.is_streaming = false;
                self.update(&terminal);
                (terminal, Outcome::Cancelled)
            }
            Some(Ok(fragments)) => {
                self.consume(AggregatingStream::new(fragments, placeholder))
                    .await
            }
            Some(Err(err)) => {
                let classified = ClassifiedError::from(&err);
                let mut terminal = placeholder;
                fail_message(&mut terminal, &classified);
                self.update(&terminal);
                (terminal, Outcome::Failed(classified))
            }
        };
        self.set_in_flight(false);

        match outcome {
            Outcome::Completed => {
                if let Some(logger) = &self.logger {
                    logger.log_completion(&terminal);
                }
            }
            Outcome::Cancelled => {
                CONVERSATION_CANCELLATIONS.click();
                self.cancelled_sends += 1;
                if let Some(logger) = &self.logger {
                    logger.log_completion(&terminal);
                }
                self.presenter.print_info("[interrupted]");
            }
            Outcome::Failed(classified) => {
                self.failed_sends += 1;
                self.manager.discard_session();
                record_error_kind(classified.kind);
                if let Some(logger) = &self.logger {
                    logger.log_failure(&classified);
                }
            }
        }
        Ok(terminal)
    }

    /// Clears all messages and opens a fresh session.
    ///
    /// Messages are cleared even if the new session cannot be created.
    pub fn reset_conversation(&mut self) -> Result<()> {
        CONVERSATION_RESETS.click();
        self.messages.clear();
        self.presenter.reset();
        if let Err(err) = self.manager.create_session() {
            self.report_failure(&ClassifiedError::from(&err));
            return Err(err);
        }
        Ok(())
    }

    /// Binds the conversation to `config` and resets it.
    pub fn reconfigure(&mut self, config: SessionConfig) -> Result<()> {
        self.manager.set_config(config);
        self.reset_conversation()
    }

    /// Returns a snapshot of the conversation's statistics.
    pub fn stats(&self) -> ConversationStats {
        ConversationStats {
            model: self.config().model.clone(),
            message_count: self.messages.len(),
            sends: self.sends,
            failed_sends: self.failed_sends,
            cancelled_sends: self.cancelled_sends,
            sessions_created: self.manager.sessions_created(),
            has_session: self.manager.has_session(),
            in_flight: self.in_flight,
            config: self.config().clone(),
        }
    }

    async fn consume(&mut self, mut aggregator: AggregatingStream) -> (Message, Outcome) {
        let mut ticker = tokio::time::interval(INTERRUPT_POLL_INTERVAL);
        loop {
            if self.presenter.should_interrupt() {
                let terminal = aggregator.cancel();
                self.update(&terminal);
                return (terminal, Outcome::Cancelled);
            }
            tokio::select! {
                snapshot = aggregator.next() => {
                    let Some(snapshot) = snapshot else {
                        // The aggregator ends with a terminal snapshot; this is not reached.
                        let terminal = aggregator.cancel();
                        return (terminal, Outcome::Completed);
                    };
                    self.update(&snapshot);
                    if snapshot.is_final() {
                        let outcome = match aggregator.failure() {
                            Some(failure) => Outcome::Failed(failure.clone()),
                            None => Outcome::Completed,
                        };
                        return (snapshot, outcome);
                    }
                }
                _ = ticker.tick() => {}
            }
        }
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        id
    }

    fn publish(&mut self, message: Message) {
        self.presenter.append_message(&message);
        self.messages.push(message);
    }

    fn update(&mut self, snapshot: &Message) {
        if let Some(slot) = self.messages.iter_mut().rev().find(|m| m.id == snapshot.id) {
            *slot = snapshot.clone();
        }
        self.presenter.update_message(snapshot);
    }

    fn set_in_flight(&mut self, in_flight: bool) {
        self.in_flight = in_flight;
        self.presenter.set_in_flight(in_flight);
    }

    fn report_failure(&mut self, classified: &ClassifiedError) {
        record_error_kind(classified.kind);
        if let Some(logger) = &self.logger {
            logger.log_failure(classified);
        }
        self.presenter.print_error(&classified.user_message);
    }
}
