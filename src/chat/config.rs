//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the REPL runs with.  Values come from, in increasing
//! priority: built-in defaults, the YAML file named by `--config`, and the
//! command line.

use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::types::Model;

/// Command-line arguments for the gemchat tool.
#[derive(CommandLine, Debug, Default, Eq, PartialEq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-1.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// System instruction for the conversation.
    #[arrrg(optional, "System instruction for the conversation", "TEXT")]
    pub system: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature 0.0-2.0 (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// Disable web search grounding.
    #[arrrg(flag, "Disable web search grounding")]
    pub no_search: bool,

    /// YAML file with session defaults.
    #[arrrg(optional, "YAML file with session settings", "PATH")]
    pub config: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log requests, chunks and failures to stderr.
    #[arrrg(flag, "Log requests and failures to stderr")]
    pub verbose: bool,
}

/// Configuration for a chat run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The session configuration the conversation starts with.
    pub session: SessionConfig,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to log to stderr.
    pub verbose: bool,

    /// The YAML file the session settings were read from, if any.
    pub config_path: Option<PathBuf>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    pub fn new() -> Self {
        Self {
            session: SessionConfig::new(),
            use_color: true,
            verbose: false,
            config_path: None,
        }
    }

    /// Sets the session configuration.
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Enables stderr logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolves command-line arguments against the optional YAML file and
    /// defaults, then validates the result.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        let config_path = args.config.map(PathBuf::from);
        let mut session = match &config_path {
            Some(path) => SessionConfig::from_file(path)?,
            None => SessionConfig::new(),
        };
        if let Some(model) = args.model {
            session.model = Model::from(model);
        }
        if let Some(system) = args.system {
            session.system_instruction = system;
        }
        if let Some(temperature) = args.temperature {
            session.temperature = parse_temperature(&temperature)?;
        }
        if args.no_search {
            session.use_search = false;
        }
        session.validate()?;

        Ok(ChatConfig {
            session,
            use_color: !args.no_color,
            verbose: args.verbose,
            config_path,
        })
    }
}

fn parse_temperature(value: &str) -> Result<f32> {
    value.trim().parse::<f32>().map_err(|_| {
        Error::validation(
            format!("temperature must be a number between 0.0 and 2.0, got {value:?}"),
            Some("temperature".to_string()),
        )
    })
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}
