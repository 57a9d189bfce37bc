use biometrics::{Collector, Counter, Moments};

use crate::classify::ErrorKind;

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("gemchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("gemchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("gemchat.client.request_duration_seconds");

pub(crate) static STREAM_FRAGMENTS: Counter = Counter::new("gemchat.stream.fragments");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("gemchat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("gemchat.stream.bytes");
pub(crate) static STREAM_TTFB: Moments = Moments::new("gemchat.stream.ttfb_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("gemchat.stream.duration_seconds");

pub(crate) static SESSIONS_CREATED: Counter = Counter::new("gemchat.session.created");
pub(crate) static SESSIONS_FAILED: Counter = Counter::new("gemchat.session.create_failures");
pub(crate) static SESSIONS_DISCARDED: Counter = Counter::new("gemchat.session.discarded");

pub(crate) static CONVERSATION_SENDS: Counter = Counter::new("gemchat.conversation.sends");
pub(crate) static CONVERSATION_CANCELLATIONS: Counter =
    Counter::new("gemchat.conversation.cancellations");
pub(crate) static CONVERSATION_RESETS: Counter = Counter::new("gemchat.conversation.resets");

pub(crate) static ERRORS_CONFIGURATION: Counter = Counter::new("gemchat.errors.configuration");
pub(crate) static ERRORS_AUTHENTICATION: Counter = Counter::new("gemchat.errors.authentication");
pub(crate) static ERRORS_MODEL_UNAVAILABLE: Counter =
    Counter::new("gemchat.errors.model_unavailable");
pub(crate) static ERRORS_TRANSPORT: Counter = Counter::new("gemchat.errors.transport");
pub(crate) static ERRORS_UNKNOWN: Counter = Counter::new("gemchat.errors.unknown");

pub(crate) fn record_error_kind(kind: ErrorKind) {
    match kind {
        ErrorKind::Configuration => ERRORS_CONFIGURATION.click(),
        ErrorKind::Authentication => ERRORS_AUTHENTICATION.click(),
        ErrorKind::ModelUnavailable => ERRORS_MODEL_UNAVAILABLE.click(),
        ErrorKind::Transport => ERRORS_TRANSPORT.click(),
        ErrorKind::Unknown => ERRORS_UNKNOWN.click(),
    }
}

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_FRAGMENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_TTFB);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&SESSIONS_CREATED);
    collector.register_counter(&SESSIONS_FAILED);
    collector.register_counter(&SESSIONS_DISCARDED);

    collector.register_counter(&CONVERSATION_SENDS);
    collector.register_counter(&CONVERSATION_CANCELLATIONS);
    collector.register_counter(&CONVERSATION_RESETS);

    collector.register_counter(&ERRORS_CONFIGURATION);
    collector.register_counter(&ERRORS_AUTHENTICATION);
    collector.register_counter(&ERRORS_MODEL_UNAVAILABLE);
    collector.register_counter(&ERRORS_TRANSPORT);
    collector.register_counter(&ERRORS_UNKNOWN);
}
