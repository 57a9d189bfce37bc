//! Presentation of conversation messages.
//!
//! This module provides the [`Presenter`] trait, which receives every message
//! snapshot a conversation publishes, and [`PlainTextPresenter`], which
//! prints replies to a terminal as they stream in.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::{Citation, Message, MessageId, Role};

/// ANSI escape code for dim text (used for sources).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the reply label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Label printed before each reply.
const REPLY_LABEL: &str = "Gemini:";

/// Receives the ordered message snapshots of a conversation.
///
/// `append_message` is called once per message, in order.  For a model
/// message it is followed by zero or more `update_message` calls with the
/// same id, the last of which has `is_streaming == false`.
pub trait Presenter: Send {
    /// A new message joined the conversation.
    fn append_message(&mut self, message: &Message);

    /// The trailing message changed.
    fn update_message(&mut self, message: &Message);

    /// A request started or finished.
    fn set_in_flight(&mut self, in_flight: bool) {
        _ = in_flight;
    }

    /// The conversation was cleared.
    fn reset(&mut self) {}

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Returns true if the in-flight reply should be abandoned.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Formats citations as a numbered source list, one per line.
pub fn format_sources(citations: &[Citation]) -> String {
    let mut out = String::new();
    for (idx, citation) in citations.iter().enumerate() {
        let title = if citation.title.is_empty() {
            citation.uri.as_str()
        } else {
            citation.title.as_str()
        };
        out.push_str(&format!("  [{}] {} <{}>\n", idx + 1, title, citation.uri));
    }
    out
}

/// Plain text presenter with optional ANSI styling.
///
/// User messages are not echoed; the terminal already shows them.  Reply text
/// is printed incrementally and sources follow the finished reply.
pub struct PlainTextPresenter {
    out: Box<dyn Write + Send>,
    use_color: bool,
    current: Option<MessageId>,
    printed: usize,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextPresenter {
    /// Creates a new PlainTextPresenter with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextPresenter with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(Box::new(io::stdout()), use_color)
    }

    /// Creates a presenter writing to `out`.
    pub fn with_writer(out: Box<dyn Write + Send>, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            current: None,
            printed: 0,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the presenter.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    fn write(&mut self, text: &str) {
        _ = self.out.write_all(text.as_bytes());
        _ = self.out.flush();
    }

    fn styled(&mut self, style: &str, text: &str) {
        if self.use_color {
            let text = format!("{style}{text}{ANSI_RESET}");
            self.write(&text);
        } else {
            self.write(text);
        }
    }

    fn finish_reply(&mut self, message: &Message) {
        if self.printed > 0 {
            self.write("\n");
        }
        if !message.citations.is_empty() {
            let sources = format!("Sources:\n{}", format_sources(&message.citations));
            self.styled(ANSI_DIM, &sources);
        }
        self.current = None;
        self.printed = 0;
    }
}

impl Default for PlainTextPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for PlainTextPresenter {
    fn append_message(&mut self, message: &Message) {
        if message.role != Role::Model {
            return;
        }
        self.styled(ANSI_CYAN, REPLY_LABEL);
        self.write("\n");
        self.current = Some(message.id);
        self.printed = 0;
        if message.is_final() {
            self.update_message(message);
        }
    }

    fn update_message(&mut self, message: &Message) {
        if self.current != Some(message.id) {
            return;
        }
        if message.is_error() {
            if self.printed > 0 {
                self.write("\n");
                self.printed = 0;
            }
            let text = format!("{}\n", message.text);
            self.styled(ANSI_RED, &text);
            self.current = None;
            return;
        }
        if message.text.len() > self.printed && message.text.is_char_boundary(self.printed) {
            let delta = message.text[self.printed..].to_string();
            self.write(&delta);
            self.printed = message.text.len();
        }
        if message.is_final() {
            self.finish_reply(message);
        }
    }

    fn reset(&mut self) {
        self.current = None;
        self.printed = 0;
    }

    fn print_info(&mut self, info: &str) {
        self.write(&format!("{info}\n"));
    }

    fn print_error(&mut self, error: &str) {
        let text = format!("Error: {error}\n");
        self.styled(ANSI_RED, &text);
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
