//! Scripted provider and recording presenter shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::stream;

use gemchat::{
    Conversation, Credential, Error, FragmentStream, Message, Presenter, Provider,
    ProviderSession, ResponseFragment, Result, SessionConfig, SessionManager, StaticCredential,
};

/// What a scripted session does on its next send.
pub enum Reply {
    /// Stream these items, then end.
    Fragments(Vec<Result<ResponseFragment>>),
    /// Stream exactly this.
    Stream(FragmentStream),
    /// Fail before any fragment.
    SendError(Error),
    /// Raise the flag, then never answer.
    Stall(Arc<AtomicBool>),
}

impl Reply {
    /// A reply made of plain text fragments.
    pub fn text(deltas: &[&str]) -> Self {
        Reply::Fragments(
            deltas
                .iter()
                .map(|d| Ok(ResponseFragment::text(*d)))
                .collect(),
        )
    }
}

#[derive(Default)]
pub struct Script {
    pub replies: VecDeque<Reply>,
    pub created: Vec<SessionConfig>,
    pub credentials: Vec<String>,
    pub sent: Vec<String>,
    pub reject: Option<Error>,
}

/// A provider whose sessions play back queued replies.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    pub script: Arc<Mutex<Script>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Reply) {
        self.script.lock().unwrap().replies.push_back(reply);
    }

    pub fn reject_with(&self, err: Error) {
        self.script.lock().unwrap().reject = Some(err);
    }

    pub fn created(&self) -> Vec<SessionConfig> {
        self.script.lock().unwrap().created.clone()
    }

    pub fn credentials(&self) -> Vec<String> {
        self.script.lock().unwrap().credentials.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.script.lock().unwrap().sent.clone()
    }
}

impl Provider for ScriptedProvider {
    type Session = ScriptedSession;

    fn create_session(&self, credential: &Credential, config: &SessionConfig) -> Result<Self::Session> {
        let mut script = self.script.lock().unwrap();
        if let Some(err) = script.reject.clone() {
            return Err(err);
        }
        script.created.push(config.clone());
        script.credentials.push(credential.expose().to_string());
        Ok(ScriptedSession {
            script: Arc::clone(&self.script),
        })
    }
}

pub struct ScriptedSession {
    script: Arc<Mutex<Script>>,
}

#[async_trait::async_trait]
impl ProviderSession for ScriptedSession {
    async fn send_stream(&mut self, text: &str) -> Result<FragmentStream> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            script.sent.push(text.to_string());
            script.replies.pop_front()
        };
        match reply {
            Some(Reply::Fragments(items)) => Ok(Box::pin(stream::iter(items))),
            Some(Reply::Stream(stream)) => Ok(stream),
            Some(Reply::SendError(err)) => Err(err),
            Some(Reply::Stall(flag)) => {
                flag.store(true, Ordering::SeqCst);
                futures::future::pending::<Result<FragmentStream>>().await
            }
            None => Ok(Box::pin(stream::empty())),
        }
    }
}

/// One call observed by the [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Append(Message),
    Update(Message),
    InFlight(bool),
    Reset,
    Info(String),
    Error(String),
}

/// A presenter that records every call and can request an interrupt.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    pub events: Arc<Mutex<Vec<Event>>>,
    pub interrupt: Arc<AtomicBool>,
    interrupt_after_updates: Option<usize>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for an interrupt once `updates` snapshots have been seen.
    pub fn interrupting_after(updates: usize) -> Self {
        Self {
            interrupt_after_updates: Some(updates),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<Message> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Update(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Info(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn append_message(&mut self, message: &Message) {
        self.record(Event::Append(message.clone()));
    }

    fn update_message(&mut self, message: &Message) {
        self.record(Event::Update(message.clone()));
    }

    fn set_in_flight(&mut self, in_flight: bool) {
        self.record(Event::InFlight(in_flight));
    }

    fn reset(&mut self) {
        self.record(Event::Reset);
    }

    fn print_info(&mut self, info: &str) {
        self.record(Event::Info(info.to_string()));
    }

    fn print_error(&mut self, error: &str) {
        self.record(Event::Error(error.to_string()));
    }

    fn should_interrupt(&self) -> bool {
        if self.interrupt.load(Ordering::SeqCst) {
            return true;
        }
        match self.interrupt_after_updates {
            Some(limit) => self.updates().len() >= limit,
            None => false,
        }
    }
}

/// A conversation over `provider` with a fixed test credential.
pub fn conversation(
    provider: &ScriptedProvider,
    presenter: &RecordingPresenter,
    config: SessionConfig,
) -> Conversation<ScriptedProvider> {
    conversation_with(provider, presenter, config, StaticCredential::new("test-key"))
}

pub fn conversation_with(
    provider: &ScriptedProvider,
    presenter: &RecordingPresenter,
    config: SessionConfig,
    credential: StaticCredential,
) -> Conversation<ScriptedProvider> {
    let manager = SessionManager::new(provider.clone(), Box::new(credential), config);
    Conversation::new(manager, Box::new(presenter.clone()))
}
