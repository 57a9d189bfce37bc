//! End-to-end tests of the Gemini provider against a mock server.

mod common;

use std::time::Duration;

use serde_json::Value;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gemchat::{
    Conversation, ErrorKind, Gemini, SessionConfig, SessionManager, StaticCredential,
};

use common::RecordingPresenter;

const STREAM_PATH: &str = "/v1beta/models/gemini-1.5-flash:streamGenerateContent";

fn grounded_reply() -> String {
    let first = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Rust "}]}}]}"#;
    let second = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"1.80 is out."}]},"finishReason":"STOP","groundingMetadata":{"groundingChunks":[{"web":{"uri":"https://blog.rust-lang.org/","title":"Rust Blog"}},{"web":{"uri":"https://releases.rs/","title":""}}],"webSearchQueries":["latest rust release"]}}],"usageMetadata":{"promptTokenCount":4,"candidatesTokenCount":6,"totalTokenCount":10}}"#;
    format!("data: {first}\r\n\r\ndata: {second}\r\n\r\n")
}

fn error_body(code: u16, message: &str, status: &str) -> Value {
    serde_json::json!({"error": {"code": code, "message": message, "status": status}})
}

fn conversation_at(
    base_url: String,
    config: SessionConfig,
    presenter: &RecordingPresenter,
) -> Conversation<Gemini> {
    let client = Gemini::with_options(Some(base_url), Some(Duration::from_secs(5)))
        .expect("client should build");
    let manager = SessionManager::new(
        client,
        Box::new(StaticCredential::new("test-key")),
        config,
    );
    Conversation::new(manager, Box::new(presenter.clone()))
}

async fn mock_server() -> (MockServer, String) {
    let server = MockServer::start().await;
    let base_url = format!("{}/v1beta", server.uri());
    (server, base_url)
}

#[tokio::test]
async fn grounded_reply_streams_with_citations() {
    let (server, base_url) = mock_server().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(grounded_reply().into_bytes(), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let presenter = RecordingPresenter::new();
    let mut conversation = conversation_at(base_url, SessionConfig::new(), &presenter);
    let terminal = conversation
        .send_message("What is the latest Rust?")
        .await
        .unwrap();

    assert_eq!(terminal.text, "Rust 1.80 is out.");
    assert!(!terminal.is_error());
    assert_eq!(terminal.citations.len(), 2);
    assert_eq!(terminal.citations[0].uri, "https://blog.rust-lang.org/");
    assert_eq!(terminal.citations[0].title, "Rust Blog");
    assert_eq!(terminal.citations[1].title, "");

    let texts: Vec<_> = presenter.updates().into_iter().map(|m| m.text).collect();
    assert_eq!(texts, vec!["Rust ", "Rust 1.80 is out.", "Rust 1.80 is out."]);
}

#[tokio::test]
async fn request_carries_config_and_history() {
    let (server, base_url) = mock_server().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(grounded_reply().into_bytes(), "text/event-stream"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = SessionConfig::new()
        .with_temperature(0.5)
        .with_system_instruction("Answer briefly.");
    let presenter = RecordingPresenter::new();
    let mut conversation = conversation_at(base_url, config, &presenter);
    conversation.send_message("first").await.unwrap();
    conversation.send_message("second").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let first: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(first["contents"].as_array().unwrap().len(), 1);
    assert_eq!(first["contents"][0]["role"], "user");
    assert_eq!(first["contents"][0]["parts"][0]["text"], "first");
    assert_eq!(
        first["systemInstruction"]["parts"][0]["text"],
        "Answer briefly."
    );
    assert_eq!(first["generationConfig"]["temperature"], 0.5);
    assert!(first["tools"][0].get("googleSearch").is_some());

    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    let contents = second["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[1]["parts"][0]["text"], "Rust 1.80 is out.");
    assert_eq!(contents[2]["parts"][0]["text"], "second");
}

#[tokio::test]
async fn search_off_sends_no_tools() {
    let (server, base_url) = mock_server().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(grounded_reply().into_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let presenter = RecordingPresenter::new();
    let mut conversation =
        conversation_at(base_url, SessionConfig::new().with_search(false), &presenter);
    conversation.send_message("hi").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("tools").is_none());
}

async fn failing_send(status: u16, body: Value, model: &str) -> gemchat::Message {
    let (server, base_url) = mock_server().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{model}:streamGenerateContent")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;

    let presenter = RecordingPresenter::new();
    let mut conversation =
        conversation_at(base_url, SessionConfig::new().with_model(model), &presenter);
    let terminal = conversation.send_message("hello").await.unwrap();
    assert!(!conversation.manager().has_session());
    terminal
}

#[tokio::test]
async fn unauthorized_is_authentication() {
    let terminal = failing_send(
        401,
        error_body(401, "Request had invalid authentication credentials.", "UNAUTHENTICATED"),
        "gemini-1.5-flash",
    )
    .await;
    assert_eq!(terminal.error, Some(ErrorKind::Authentication));
    assert_eq!(
        Some(terminal.text.as_str()),
        ErrorKind::Authentication.template()
    );
}

#[tokio::test]
async fn invalid_key_on_bad_request_is_authentication() {
    let terminal = failing_send(
        400,
        error_body(
            400,
            "API key not valid. Please pass a valid API key.",
            "INVALID_ARGUMENT",
        ),
        "gemini-1.5-flash",
    )
    .await;
    assert_eq!(terminal.error, Some(ErrorKind::Authentication));
}

#[tokio::test]
async fn unknown_model_is_model_unavailable() {
    let terminal = failing_send(
        404,
        error_body(
            404,
            "models/gemini-0.1-nano is not found for API version v1beta, or is not supported for generateContent.",
            "NOT_FOUND",
        ),
        "gemini-0.1-nano",
    )
    .await;
    assert_eq!(terminal.error, Some(ErrorKind::ModelUnavailable));
    assert_eq!(
        Some(terminal.text.as_str()),
        ErrorKind::ModelUnavailable.template()
    );
}

#[tokio::test]
async fn other_bad_request_forwards_message() {
    let terminal = failing_send(
        400,
        error_body(
            400,
            "Invalid JSON payload received. Unknown name \"frobnicate\"",
            "INVALID_ARGUMENT",
        ),
        "gemini-1.5-flash",
    )
    .await;
    assert_eq!(terminal.error, Some(ErrorKind::Unknown));
    assert_eq!(
        terminal.text,
        ErrorKind::Unknown.render("Invalid JSON payload received. Unknown name \"frobnicate\"")
    );
}

#[tokio::test]
async fn error_event_mid_stream_replaces_partial_text() {
    let (server, base_url) = mock_server().await;
    let body = format!(
        "data: {}\n\ndata: {}\n\n",
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Half an ans"}]}}]}"#,
        error_body(500, "Internal error encountered.", "INTERNAL"),
    );
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let presenter = RecordingPresenter::new();
    let mut conversation = conversation_at(base_url, SessionConfig::new(), &presenter);
    let terminal = conversation.send_message("hello").await.unwrap();

    assert_eq!(terminal.error, Some(ErrorKind::Unknown));
    assert_eq!(
        terminal.text,
        ErrorKind::Unknown.render("Internal error encountered.")
    );
    assert!(!terminal.text.contains("Half an ans"));
    assert_eq!(presenter.updates()[0].text, "Half an ans");
}

#[tokio::test]
async fn unreachable_provider_is_transport() {
    let presenter = RecordingPresenter::new();
    let mut conversation = conversation_at(
        "http://127.0.0.1:1/v1beta".to_string(),
        SessionConfig::new(),
        &presenter,
    );
    let terminal = conversation.send_message("hello").await.unwrap();

    assert_eq!(terminal.error, Some(ErrorKind::Transport));
    assert_eq!(
        Some(terminal.text.as_str()),
        ErrorKind::Transport.template()
    );
    assert!(!conversation.manager().has_session());
}
