//! Chat application module for interactive conversations with Gemini.
//!
//! This module provides the pieces of the `gemchat` REPL that are not tied
//! to a terminal:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing
//! - [`session`]: Routing input lines to commands or the conversation

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextPresenter, Presenter};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{ChatSession, describe_config};
