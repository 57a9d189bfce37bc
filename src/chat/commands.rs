//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the conversation without sending messages to
//! the provider.

/// A parsed chat command.
///
/// These commands control the conversation and are not sent to the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation and start a fresh session.
    Reset,

    /// Change the model.
    Model(String),

    /// Set the system instruction.
    /// `None` restores the default instruction.
    System(Option<String>),

    /// Set the sampling temperature.
    Temperature(f32),

    /// Enable or disable web search grounding.
    Search(bool),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display conversation statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a regular message.
///
/// # Examples
///
/// ```
/// # use gemchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model gemini-1.5-pro").is_some());
/// assert!(parse_command("What's new in Rust?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "reset" | "new" | "clear" => ChatCommand::Reset,
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "system" => ChatCommand::System(argument.map(|s| s.to_string())),
        "temperature" | "temp" => match argument {
            Some(arg) => match parse_f32_in_range(arg, 0.0, 2.0) {
                Ok(value) => ChatCommand::Temperature(value),
                Err(err) => ChatCommand::Invalid(format!("/temperature {err}")),
            },
            None => ChatCommand::Invalid("/temperature requires a value".to_string()),
        },
        "search" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Search(value),
            None => ChatCommand::Invalid("/search expects 'on' or 'off'".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn parse_f32_in_range(value: &str, min: f32, max: f32) -> Result<f32, String> {
    let parsed: f32 = value
        .parse()
        .map_err(|_| format!("expects a value between {min} and {max}"))?;
    if parsed.is_finite() && parsed >= min && parsed <= max {
        Ok(parsed)
    } else {
        Err(format!("expects a value between {min} and {max}"))
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /reset                 Start a new conversation (aliases: /new, /clear)
  /model <name>          Change the model (e.g., /model gemini-1.5-pro)
  /system [text]         Set the system instruction (no argument restores the default)
  /temperature <v>       Set temperature 0.0-2.0
  /search on|off         Enable or disable web search grounding
  /stats                 Show conversation statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat

Changing the model, system instruction, temperature or search setting starts
a new conversation. Press Ctrl+C while a reply streams to stop it."#
}
