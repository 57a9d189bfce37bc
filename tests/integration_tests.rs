//! Integration tests against the live Gemini API.
//! These tests require an API key in the environment to run.

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use gemchat::{
        CredentialSource, EnvCredentials, Gemini, Provider, ProviderSession, SessionConfig,
    };

    fn credential() -> Option<gemchat::Credential> {
        if std::env::var("GEMINI_API_KEY").is_err() {
            eprintln!("Skipping test: GEMINI_API_KEY not set");
            return None;
        }
        EnvCredentials::with_variables(["GEMINI_API_KEY"]).resolve().ok()
    }

    #[tokio::test]
    async fn test_simple_streamed_reply() {
        let Some(credential) = credential() else {
            return;
        };

        let client = Gemini::new().expect("Failed to create client");
        let config = SessionConfig::new().with_search(false).with_temperature(0.0);
        let mut session = client
            .create_session(&credential, &config)
            .expect("Failed to create session");

        let mut fragments = session
            .send_stream("Say 'test passed'")
            .await
            .expect("Request should succeed with valid API key");
        let mut text = String::new();
        while let Some(fragment) = fragments.next().await {
            text.push_str(&fragment.expect("fragment").text_delta);
        }
        assert!(!text.is_empty(), "Should receive some text");
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_grounded_reply() {
        let Some(credential) = credential() else {
            return;
        };

        let client = Gemini::new().expect("Failed to create client");
        let mut session = client
            .create_session(&credential, &SessionConfig::new())
            .expect("Failed to create session");

        let mut fragments = session
            .send_stream("What is the latest stable Rust release?")
            .await
            .expect("Request should succeed with valid API key");
        let mut received = 0;
        while let Some(fragment) = fragments.next().await {
            fragment.expect("fragment");
            received += 1;
        }
        assert!(received > 0, "Should receive at least one fragment");
    }
}
