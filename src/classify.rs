//! Classification of failures into a small user-facing taxonomy.
//!
//! Every failure that reaches a conversation is reduced to a
//! [`FailureDescriptor`] (where it came from, a status code, and the original
//! message) and then mapped by [`classify`] to one [`ErrorKind`].  The rules
//! are checked in a fixed order and the first match wins:
//!
//! 1. configuration: the credential is missing or malformed
//! 2. authentication: the provider rejected the credential
//! 3. model unavailable: the provider does not know or serve the model
//! 4. transport: the provider could not be reached or the stream broke
//! 5. unknown: everything else
//!
//! A failure that carries both an invalid-credential indicator and a
//! model-unavailable indicator is an authentication failure.

use std::fmt;

use crate::Error;

/// Substrings (lowercase) that mark a missing or malformed credential.
const CONFIGURATION_MARKERS: &[&str] = &[
    "api key not configured",
    "api key not provided",
    "missing credential",
    "credential is missing",
    "credential is empty",
    "gemini_api_key",
];

/// Substrings (lowercase) that mark a credential the provider rejected.
const AUTHENTICATION_MARKERS: &[&str] = &[
    "api key not valid",
    "api_key_invalid",
    "invalid api key",
    "api key expired",
    "unauthorized",
    "unauthenticated",
    "permission_denied",
    "permission denied",
];

/// Substrings (lowercase) that mark an unknown or unavailable model.
const MODEL_MARKERS: &[&str] = &[
    "is not found for api version",
    "not supported for generatecontent",
    "model not found",
    "unknown model",
    "model is not available",
    "model unavailable",
];

/// Substrings (lowercase) that mark a transport-level failure.
const TRANSPORT_MARKERS: &[&str] = &[
    "network",
    "connection refused",
    "connection reset",
    "connection closed",
    "failed to fetch",
    "timed out",
    "dns error",
    "unreachable",
    "error sending request",
];

/// The closed set of failure categories surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or malformed access credential.
    Configuration,
    /// The provider rejected the access credential.
    Authentication,
    /// The requested model is unknown or unavailable.
    ModelUnavailable,
    /// The provider could not be reached.
    Transport,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// All kinds, in precedence order.
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Configuration,
        ErrorKind::Authentication,
        ErrorKind::ModelUnavailable,
        ErrorKind::Transport,
        ErrorKind::Unknown,
    ];

    /// Stable category name.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::ModelUnavailable => "ModelUnavailableError",
            ErrorKind::Transport => "TransportError",
            ErrorKind::Unknown => "UnknownError",
        }
    }

    /// The fixed user-facing message for this kind.
    ///
    /// [`ErrorKind::Unknown`] has no fixed message; see [`ErrorKind::render`].
    pub fn template(self) -> Option<&'static str> {
        match self {
            ErrorKind::Configuration => Some(
                "Configuration error: the access credential is missing or invalid. \
                 Set GEMINI_API_KEY and start a new conversation.",
            ),
            ErrorKind::Authentication => Some(
                "Authentication failed: the provider rejected the access credential. \
                 Check that your API key is valid.",
            ),
            ErrorKind::ModelUnavailable => Some(
                "Model unavailable: the requested model does not exist or is not enabled \
                 for this key. Choose a different model.",
            ),
            ErrorKind::Transport => Some(
                "Connection error: the provider could not be reached. \
                 Check your network connection and try again.",
            ),
            ErrorKind::Unknown => None,
        }
    }

    /// Renders the user-facing message for a failure whose original message
    /// is `original`.
    pub fn render(self, original: &str) -> String {
        match self.template() {
            Some(template) => template.to_string(),
            None => format!("Sorry, something went wrong while processing your request: {original}"),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a failure was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    /// While resolving credentials or creating a session.
    Configuration,
    /// Reported by the provider.
    Provider,
    /// Raised by the network transport.
    Transport,
}

/// The facts about a failure that classification looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDescriptor {
    /// Where the failure was raised.
    pub origin: FailureOrigin,
    /// HTTP-style status code, if any.
    pub code: Option<u16>,
    /// Provider status string (e.g. `NOT_FOUND`), if any.
    pub status: Option<String>,
    /// The original diagnostic message.
    pub message: String,
}

impl FailureDescriptor {
    /// Creates a descriptor with no code or status.
    pub fn new(origin: FailureOrigin, message: impl Into<String>) -> Self {
        Self {
            origin,
            code: None,
            status: None,
            message: message.into(),
        }
    }

    /// Sets the status code.
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Sets the provider status string.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    fn haystack(&self) -> String {
        let mut haystack = self.message.to_lowercase();
        if let Some(status) = &self.status {
            haystack.push(' ');
            haystack.push_str(&status.to_lowercase());
        }
        haystack
    }
}

impl From<&Error> for FailureDescriptor {
    fn from(err: &Error) -> Self {
        let origin = match err {
            Error::Configuration { .. } => FailureOrigin::Configuration,
            e if e.is_transport() => FailureOrigin::Transport,
            _ => FailureOrigin::Provider,
        };
        let status = match err {
            Error::Api { status, .. } | Error::BadRequest { status, .. } => status.clone(),
            Error::NotFound {
                resource_type: Some(resource_type),
                ..
            } if resource_type == "model" => Some("MODEL_NOT_FOUND".to_string()),
            _ => None,
        };
        Self {
            origin,
            code: err.status_code(),
            status,
            message: err.message().to_string(),
        }
    }
}

/// A failure after classification: the category, the message to show, and the
/// original diagnostic to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    /// The category.
    pub kind: ErrorKind,
    /// The message shown to the user.
    pub user_message: String,
    /// The original diagnostic, unmodified.
    pub diagnostic: String,
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.user_message)
    }
}

impl std::error::Error for ClassifiedError {}

impl From<&Error> for ClassifiedError {
    fn from(err: &Error) -> Self {
        classify_failure(&FailureDescriptor::from(err))
    }
}

impl From<Error> for ClassifiedError {
    fn from(err: Error) -> Self {
        ClassifiedError::from(&err)
    }
}

/// Maps a failure to its category.
pub fn classify(failure: &FailureDescriptor) -> ErrorKind {
    let haystack = failure.haystack();
    let mentions = |markers: &[&str]| markers.iter().any(|m| haystack.contains(m));

    if failure.origin == FailureOrigin::Configuration || mentions(CONFIGURATION_MARKERS) {
        return ErrorKind::Configuration;
    }
    if matches!(failure.code, Some(401 | 403)) || mentions(AUTHENTICATION_MARKERS) {
        return ErrorKind::Authentication;
    }
    if failure.code == Some(404) || mentions(MODEL_MARKERS) {
        return ErrorKind::ModelUnavailable;
    }
    if failure.origin == FailureOrigin::Transport || mentions(TRANSPORT_MARKERS) {
        return ErrorKind::Transport;
    }
    ErrorKind::Unknown
}

/// Classifies a failure and renders its user-facing message.
pub fn classify_failure(failure: &FailureDescriptor) -> ClassifiedError {
    let kind = classify(failure);
    ClassifiedError {
        kind,
        user_message: kind.render(&failure.message),
        diagnostic: failure.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(message: &str) -> FailureDescriptor {
        FailureDescriptor::new(FailureOrigin::Provider, message)
    }

    #[test]
    fn configuration_origin_wins() {
        let failure = FailureDescriptor::new(FailureOrigin::Configuration, "unauthorized")
            .with_code(401);
        assert_eq!(classify(&failure), ErrorKind::Configuration);
    }

    #[test]
    fn configuration_marker_from_provider() {
        assert_eq!(
            classify(&provider("GEMINI_API_KEY environment variable not set")),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn authentication_by_code_and_text() {
        assert_eq!(
            classify(&provider("forbidden").with_code(403)),
            ErrorKind::Authentication
        );
        assert_eq!(
            classify(
                &provider("API key not valid. Please pass a valid API key.")
                    .with_code(400)
                    .with_status("INVALID_ARGUMENT")
            ),
            ErrorKind::Authentication
        );
        assert_eq!(
            classify(&provider("request was Unauthorized")),
            ErrorKind::Authentication
        );
    }

    #[test]
    fn model_unavailable() {
        assert_eq!(
            classify(&provider(
                "models/m1 is not found for API version v1beta, or is not supported for generateContent."
            )),
            ErrorKind::ModelUnavailable
        );
        assert_eq!(
            classify(&provider("gone").with_code(404)),
            ErrorKind::ModelUnavailable
        );
    }

    #[test]
    fn credential_beats_model_when_both_present() {
        let failure = provider("API key not valid; models/m1 is not found for API version v1")
            .with_code(404);
        assert_eq!(classify(&failure), ErrorKind::Authentication);
    }

    #[test]
    fn transport() {
        let failure = FailureDescriptor::new(FailureOrigin::Transport, "broken pipe");
        assert_eq!(classify(&failure), ErrorKind::Transport);
        assert_eq!(
            classify(&provider("TypeError: Failed to fetch")),
            ErrorKind::Transport
        );
    }

    #[test]
    fn unknown_forwards_original_message() {
        let failure = provider("quota exceeded for project 42").with_code(429);
        let classified = classify_failure(&failure);
        assert_eq!(classified.kind, ErrorKind::Unknown);
        assert!(classified.user_message.contains("quota exceeded for project 42"));
        assert_eq!(classified.diagnostic, "quota exceeded for project 42");
    }

    #[test]
    fn fixed_templates_do_not_leak_diagnostics() {
        let classified = classify_failure(&provider("unauthorized: key AIza-secret"));
        assert_eq!(classified.kind, ErrorKind::Authentication);
        assert_eq!(
            Some(classified.user_message.as_str()),
            ErrorKind::Authentication.template()
        );
        assert!(classified.diagnostic.contains("AIza-secret"));
    }

    #[test]
    fn from_crate_errors() {
        let kind = |err: Error| ClassifiedError::from(err).kind;
        assert_eq!(
            kind(Error::configuration("no key", None)),
            ErrorKind::Configuration
        );
        assert_eq!(kind(Error::authentication("bad")), ErrorKind::Authentication);
        assert_eq!(kind(Error::permission("no")), ErrorKind::Authentication);
        assert_eq!(
            kind(Error::not_found("missing", Some("model".to_string()))),
            ErrorKind::ModelUnavailable
        );
        assert_eq!(kind(Error::connection("refused", None)), ErrorKind::Transport);
        assert_eq!(kind(Error::timeout("slow", Some(60.0))), ErrorKind::Transport);
        assert_eq!(
            kind(Error::streaming("Error in HTTP stream: body closed", None)),
            ErrorKind::Transport
        );
        assert_eq!(kind(Error::rate_limit("slow down", None)), ErrorKind::Unknown);
        assert_eq!(kind(Error::internal_server("oops")), ErrorKind::Unknown);
    }

    #[test]
    fn crate_error_message_forwarded_without_decoration() {
        let classified = ClassifiedError::from(Error::rate_limit(
            "Resource has been exhausted",
            Some(7),
        ));
        assert_eq!(classified.kind, ErrorKind::Unknown);
        assert_eq!(
            classified.user_message,
            "Sorry, something went wrong while processing your request: Resource has been exhausted"
        );
        assert_eq!(classified.diagnostic, "Resource has been exhausted");
    }

    #[test]
    fn names_are_stable() {
        let names: Vec<_> = ErrorKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            vec![
                "ConfigurationError",
                "AuthenticationError",
                "ModelUnavailableError",
                "TransportError",
                "UnknownError"
            ]
        );
    }
}
