//! Line handling for the chat REPL.
//!
//! [`ChatSession`] routes each input line either to a slash command or to
//! [`Conversation::send_message`], and formats statistics and configuration
//! for display.

use std::ops::ControlFlow;

use crate::chat::commands::{ChatCommand, help_text, parse_command};
use crate::config::{DEFAULT_SYSTEM_INSTRUCTION, SessionConfig};
use crate::conversation::Conversation;
use crate::provider::Provider;
use crate::types::Model;

/// A REPL-facing wrapper around a conversation.
pub struct ChatSession<P: Provider> {
    conversation: Conversation<P>,
}

impl<P: Provider> ChatSession<P> {
    /// Wraps `conversation`.
    pub fn new(conversation: Conversation<P>) -> Self {
        Self { conversation }
    }

    /// The wrapped conversation.
    pub fn conversation(&self) -> &Conversation<P> {
        &self.conversation
    }

    /// The wrapped conversation, mutably.
    pub fn conversation_mut(&mut self) -> &mut Conversation<P> {
        &mut self.conversation
    }

    /// Handles one line of input.  Breaks when the user asks to quit.
    ///
    /// Blank lines are ignored.  Failures have already been shown by the
    /// presenter when this returns.
    pub async fn handle_line(&mut self, line: &str) -> ControlFlow<()> {
        let line = line.trim();
        if line.is_empty() {
            return ControlFlow::Continue(());
        }
        if let Some(command) = parse_command(line) {
            return self.handle_command(command);
        }
        // Failures are published to the presenter as they happen.
        _ = self.conversation.send_message(line).await;
        ControlFlow::Continue(())
    }

    /// Applies a parsed slash command.
    pub fn handle_command(&mut self, command: ChatCommand) -> ControlFlow<()> {
        match command {
            ChatCommand::Quit => return ControlFlow::Break(()),
            ChatCommand::Reset => {
                if self.conversation.reset_conversation().is_ok() {
                    self.info("Started a new conversation.");
                }
            }
            ChatCommand::Help => {
                let help = help_text()
                    .lines()
                    .map(|line| format!("    {line}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                self.info(&help);
            }
            ChatCommand::Model(name) => {
                let model = Model::from(name);
                let config = self.conversation.config().clone().with_model(model.clone());
                self.reconfigure(config, &format!("Model changed to: {model}"));
            }
            ChatCommand::System(instruction) => {
                let (instruction, note) = match instruction {
                    Some(text) => (text.clone(), format!("System instruction set to: {text}")),
                    None => (
                        DEFAULT_SYSTEM_INSTRUCTION.to_string(),
                        "System instruction restored to the default.".to_string(),
                    ),
                };
                let config = self
                    .conversation
                    .config()
                    .clone()
                    .with_system_instruction(instruction);
                self.reconfigure(config, &note);
            }
            ChatCommand::Temperature(value) => {
                let config = self.conversation.config().clone().with_temperature(value);
                self.reconfigure(config, &format!("Temperature set to {value:.2}"));
            }
            ChatCommand::Search(enabled) => {
                let config = self.conversation.config().clone().with_search(enabled);
                let note = if enabled {
                    "Web search grounding enabled."
                } else {
                    "Web search grounding disabled."
                };
                self.reconfigure(config, note);
            }
            ChatCommand::Stats => {
                let stats = self.describe_stats();
                self.info(&stats);
            }
            ChatCommand::ShowConfig => {
                let config = describe_config(self.conversation.config());
                self.info(&config);
            }
            ChatCommand::Invalid(message) => {
                self.conversation.presenter_mut().print_error(&message);
            }
        }
        ControlFlow::Continue(())
    }

    /// Formats conversation statistics for display.
    pub fn describe_stats(&self) -> String {
        let stats = self.conversation.stats();
        let mut out = String::from("    Conversation Statistics:\n");
        out.push_str(&format!("      Model: {}\n", stats.model));
        out.push_str(&format!("      Messages: {}\n", stats.message_count));
        out.push_str(&format!(
            "      Sends: {} ({} failed, {} interrupted)\n",
            stats.sends, stats.failed_sends, stats.cancelled_sends
        ));
        out.push_str(&format!("      Sessions created: {}\n", stats.sessions_created));
        out.push_str(&format!(
            "      Session: {}",
            if stats.has_session { "open" } else { "not open" }
        ));
        out
    }

    fn reconfigure(&mut self, config: SessionConfig, note: &str) {
        if self.conversation.reconfigure(config).is_ok() {
            self.info(&format!("{note} Started a new conversation."));
        }
    }

    fn info(&mut self, text: &str) {
        self.conversation.presenter_mut().print_info(text);
    }
}

/// Formats a session configuration for display.
pub fn describe_config(config: &SessionConfig) -> String {
    let mut out = String::from("    Current Configuration:\n");
    out.push_str(&format!("      Model: {}\n", config.model));
    out.push_str(&format!("      Temperature: {:.2}\n", config.temperature));
    out.push_str(&format!(
        "      Web search: {}\n",
        if config.use_search { "on" } else { "off" }
    ));
    out.push_str(&format!("      System instruction: {}", config.system_instruction));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_config_lists_fields() {
        let text = describe_config(
            &SessionConfig::new()
                .with_model("m1")
                .with_temperature(0.25)
                .with_search(false),
        );
        assert!(text.contains("Model: m1"));
        assert!(text.contains("Temperature: 0.25"));
        assert!(text.contains("Web search: off"));
    }
}
