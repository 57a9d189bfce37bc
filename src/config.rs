//! Session configuration and credential resolution.
//!
//! A [`SessionConfig`] is fixed for the lifetime of a session; changing any
//! field means building a new value and creating a new session.  Credentials
//! are resolved through a [`CredentialSource`] at session-creation time.

use std::env;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Model;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default system instruction.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful, knowledgeable assistant. \
Answer clearly and concisely. When you use information found on the web, rely on the \
sources provided and say so.";

/// Environment variables consulted by [`EnvCredentials`], in order.
pub const CREDENTIAL_VARIABLES: &[&str] = &["GEMCHAT_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// Inclusive range of accepted temperatures.
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

//////////////////////////////////////// SessionConfig ////////////////////////////////////////

/// The configuration a session is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// The model identifier.
    pub model: Model,
    /// The system instruction sent with every request.
    pub system_instruction: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Whether replies may be grounded with web search.
    pub use_search: bool,
}

impl SessionConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            use_search: true,
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<Model>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Enables or disables search grounding.
    pub fn with_search(mut self, use_search: bool) -> Self {
        self.use_search = use_search;
        self
    }

    /// Checks that the configuration can be sent to a provider.
    pub fn validate(&self) -> Result<()> {
        if self.model.as_str().trim().is_empty() {
            return Err(Error::configuration(
                "model name must not be empty",
                Some("model".to_string()),
            ));
        }
        if !self.temperature.is_finite() || !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(Error::validation(
                format!(
                    "temperature must be between {} and {}, got {}",
                    TEMPERATURE_RANGE.start(),
                    TEMPERATURE_RANGE.end(),
                    self.temperature
                ),
                Some("temperature".to_string()),
            ));
        }
        Ok(())
    }

    /// Loads a configuration from a YAML file.  Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::io(format!("cannot open {}: {e}", path.display()), e))?;
        let config: SessionConfig = serde_yaml::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Writes this configuration to a YAML file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| Error::io(format!("cannot create {}: {e}", path.display()), e))?;
        serde_yaml::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////// Credential /////////////////////////////////////////

/// An access credential for the provider.
///
/// The value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validates and wraps a credential string.
    ///
    /// Empty values, values with surrounding whitespace, and values containing
    /// control characters are rejected with a configuration error.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(Error::configuration("API key not provided: credential is empty", None));
        }
        if value.trim() != value {
            return Err(Error::configuration(
                "API key is malformed: surrounding whitespace",
                None,
            ));
        }
        if value.chars().any(char::is_control) {
            return Err(Error::configuration(
                "API key is malformed: control characters",
                None,
            ));
        }
        Ok(Self(value))
    }

    /// The raw credential, for placing in request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Somewhere a credential can be looked up.
pub trait CredentialSource: Send + Sync {
    /// Resolves the credential, failing with a configuration error if it is
    /// absent or malformed.
    fn resolve(&self) -> Result<Credential>;
}

/// Reads the credential from the first set environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    variables: Vec<String>,
}

impl EnvCredentials {
    /// Consults [`CREDENTIAL_VARIABLES`].
    pub fn new() -> Self {
        Self::with_variables(CREDENTIAL_VARIABLES.iter().copied())
    }

    /// Consults the given variables, in order.
    pub fn with_variables<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }

    /// The variables consulted, in order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for EnvCredentials {
    fn resolve(&self) -> Result<Credential> {
        for name in &self.variables {
            if let Ok(value) = env::var(name) {
                return Credential::new(value).map_err(|err| match err {
                    Error::Configuration { message, .. } => {
                        Error::configuration(message, Some(name.clone()))
                    }
                    other => other,
                });
            }
        }
        Err(Error::configuration(
            format!(
                "API key not configured: set one of {}",
                self.variables.join(", ")
            ),
            self.variables.first().cloned(),
        ))
    }
}

/// A credential fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    /// A source that always yields `value`, subject to validation.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }

    /// A source that has no credential.
    pub fn missing() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredential {
    fn resolve(&self) -> Result<Credential> {
        match &self.0 {
            Some(value) => Credential::new(value.clone()),
            None => Err(Error::configuration("API key not configured", None)),
        }
    }
}
