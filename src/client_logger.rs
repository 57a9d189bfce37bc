//! Logging trait for gemchat client and conversation operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! every request sent to the provider, every streamed chunk, completed replies,
//! and classified failures together with the diagnostic that caused them.

use std::io::{self, Write};

use crate::classify::ClassifiedError;
use crate::types::{GenerateContentRequest, GenerateContentResponse, Message};

/// A trait for logging gemchat operations.
///
/// All methods have empty default bodies; implement the ones you need.
///
/// # Example
///
/// ```rust,ignore
/// use gemchat::{ClassifiedError, ClientLogger};
/// use std::sync::Mutex;
///
/// struct FailureLog {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FailureLog {
///     fn log_failure(&self, failure: &ClassifiedError) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "{}: {}", failure.kind, failure.diagnostic).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, model: &str, request: &GenerateContentRequest) {
        _ = model;
        _ = request;
    }

    /// Log one decoded chunk of a streamed reply.
    fn log_stream_chunk(&self, chunk: &GenerateContentResponse) {
        _ = chunk;
    }

    /// Log the terminal snapshot of a reply that finished or was cancelled.
    fn log_completion(&self, message: &Message) {
        _ = message;
    }

    /// Log a classified failure.  `failure.diagnostic` holds the original
    /// message, which is never shown to the user for fixed-template kinds.
    fn log_failure(&self, failure: &ClassifiedError) {
        _ = failure;
    }
}

/// Writes a one-line summary of each event to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLogger;

impl StderrLogger {
    fn line(&self, text: &str) {
        let mut stderr = io::stderr().lock();
        _ = writeln!(stderr, "[gemchat] {text}");
    }
}

impl ClientLogger for StderrLogger {
    fn log_request(&self, model: &str, request: &GenerateContentRequest) {
        self.line(&format!(
            "request model={model} turns={} search={}",
            request.contents.len(),
            !request.tools.is_empty()
        ));
    }

    fn log_stream_chunk(&self, chunk: &GenerateContentResponse) {
        let fragment = chunk.to_fragment();
        self.line(&format!(
            "chunk bytes={} citations={}",
            fragment.text_delta.len(),
            fragment.citations.len()
        ));
    }

    fn log_completion(&self, message: &Message) {
        self.line(&format!(
            "complete id={} chars={} citations={}",
            message.id,
            message.text.chars().count(),
            message.citations.len()
        ));
    }

    fn log_failure(&self, failure: &ClassifiedError) {
        self.line(&format!("failure kind={} diagnostic={}", failure.kind, failure.diagnostic));
    }
}
