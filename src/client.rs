use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use futures::{Stream, future};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::config::Credential;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, STREAM_DURATION, STREAM_TTFB,
};
use crate::sse::process_sse;
use crate::types::{GenerateContentRequest, GenerateContentResponse, Model};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A boxed stream of decoded response chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

/// Client for the Gemini Generative Language API.
#[derive(Clone)]
pub struct Gemini {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Gemini {
    /// Create a new Gemini client pointed at the public endpoint.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `base_url` must be an absolute http(s) URL; a trailing slash is added if
    /// missing so that `models/...` resolves beneath it.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that sees every request and streamed chunk.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The endpoint for streaming generation with `model`.
    pub fn stream_url(&self, model: &Model) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("models/{}:streamGenerateContent", model.as_str()))?;
        url.query_pairs_mut().append_pair("alt", "sse");
        Ok(url)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self, credential: &Credential) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        let mut key = HeaderValue::from_str(credential.expose()).map_err(|_| {
            Error::configuration(
                "API key is malformed: not a valid header value",
                Some("x-goog-api-key".to_string()),
            )
        })?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let parsed = serde_json::from_str::<GoogleErrorResponse>(&error_body)
            .ok()
            .map(|e| e.error);
        let status = parsed.as_ref().and_then(|e| e.status.clone());
        let message = parsed
            .and_then(|e| e.message)
            .unwrap_or_else(|| error_body.clone());

        error_from_status(status_code, status, message, retry_after)
    }

    /// Send a request and stream the reply as decoded chunks.
    pub async fn stream_generate(
        &self,
        credential: &Credential,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream> {
        let url = self.stream_url(model)?;
        let headers = self.default_headers(credential)?;
        if let Some(logger) = &self.logger {
            logger.log_request(model.as_str(), request);
        }

        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                self.map_transport_error(e)
            })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let logger = self.logger.clone();
        let mut first = true;
        let chunks = process_sse(response.bytes_stream())
            .map(move |chunk| {
                if first {
                    STREAM_TTFB.add(start.elapsed().as_secs_f64());
                    first = false;
                }
                if let (Some(logger), Ok(chunk)) = (&logger, &chunk) {
                    logger.log_stream_chunk(chunk);
                }
                Some(chunk)
            })
            .chain(stream::once(async move {
                STREAM_DURATION.add(start.elapsed().as_secs_f64());
                None
            }))
            .filter_map(future::ready);
        Ok(Box::pin(chunks))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut base_url = base_url.to_string();
    if !base_url.ends_with('/') {
        base_url.push('/');
    }
    let url = Url::parse(&base_url)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::url(
            format!("base URL must be http or https, got {}", url.scheme()),
            None,
        ));
    }
    Ok(url)
}

#[derive(Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorBody,
}

/// The `error` object of a Google API error body.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GoogleErrorBody {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
}

/// Map an HTTP status and Google error details to an [`Error`].
pub(crate) fn error_from_status(
    status_code: u16,
    status: Option<String>,
    message: String,
    retry_after: Option<u64>,
) -> Error {
    match status_code {
        400 => Error::bad_request(message, status),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message, Some("model".to_string())),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, status, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Gemini::new().unwrap();
        assert_eq!(client.base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = Gemini::with_options(
            Some("https://custom-api.example.com/v1".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url.as_str(), "https://custom-api.example.com/v1/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(
            Gemini::with_options(Some("not a url".to_string()), None),
            Err(Error::Url { .. })
        ));
        assert!(matches!(
            Gemini::with_options(Some("ftp://example.com/".to_string()), None),
            Err(Error::Url { .. })
        ));
    }

    #[test]
    fn stream_url_layout() {
        let client = Gemini::new().unwrap();
        let url = client
            .stream_url(&Model::from("gemini-1.5-flash"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn status_mapping() {
        let map = |code| error_from_status(code, None, "m".to_string(), Some(7));
        assert!(map(400).is_bad_request());
        assert!(map(401).is_authentication());
        assert!(map(403).is_permission());
        assert!(matches!(
            map(404),
            Error::NotFound { resource_type: Some(ref t), .. } if t == "model"
        ));
        assert!(map(408).is_timeout());
        assert!(matches!(map(429), Error::RateLimit { retry_after: Some(7), .. }));
        assert!(matches!(map(500), Error::InternalServer { .. }));
        assert!(matches!(map(503), Error::ServiceUnavailable { .. }));
        assert!(matches!(map(418), Error::Api { status_code: 418, .. }));
    }
}
