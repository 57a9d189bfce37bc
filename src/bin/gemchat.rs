//! Interactive chat with Gemini, grounded with web search.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage; the API key comes from GEMCHAT_API_KEY, GEMINI_API_KEY or API_KEY
//! gemchat
//!
//! # Specify a model and turn off search grounding
//! gemchat --model gemini-1.5-pro --no-search
//!
//! # Load settings from a file, override the temperature
//! gemchat --config gemchat.yaml --temperature 0.2
//! ```
//!
//! Type `/help` for slash commands.  Ctrl+C while a reply streams stops it;
//! Ctrl+D exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use gemchat::chat::{ChatArgs, ChatConfig, ChatSession, PlainTextPresenter};
use gemchat::{Conversation, EnvCredentials, Gemini, SessionManager, StderrLogger};

/// Main entry point for the gemchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("gemchat [OPTIONS]");
    let config = ChatConfig::from_args(args)?;

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut client = Gemini::new()?;
    if config.verbose {
        client = client.with_logger(Arc::new(StderrLogger));
    }
    let manager = SessionManager::new(
        client,
        Box::new(EnvCredentials::new()),
        config.session.clone(),
    );
    let presenter =
        PlainTextPresenter::with_color(config.use_color).with_interrupt(interrupted.clone());
    let mut conversation = Conversation::new(manager, Box::new(presenter));
    if config.verbose {
        conversation = conversation.with_logger(Arc::new(StderrLogger));
    }

    println!("Gemini Chat (model: {})", config.session.model);
    println!("Type /help for commands, /quit to exit\n");

    // Surface a missing or malformed key before the first message.
    _ = conversation.reset_conversation();

    let mut session = ChatSession::new(conversation);
    let mut rl = DefaultEditor::new()?;

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                if session.handle_line(line).await.is_break() {
                    println!("Goodbye!");
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                session
                    .conversation_mut()
                    .presenter_mut()
                    .print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}
