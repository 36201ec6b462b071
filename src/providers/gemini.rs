//! Gemini chat provider
//!
//! Implements [`ChatProvider`] against the Gemini `generateContent` REST
//! endpoint. Session roles map user→"user" and assistant→"model", and the
//! full history is sent on every call.

use crate::config::GeminiConfig;
use crate::error::{ClinicbotError, Result};
use crate::providers::ChatProvider;
use crate::storage::types::{ChatEntry, ChatRole};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Gemini API provider
///
/// Connects to the Gemini generative language API. The API key comes from
/// config or the `GEMINI_API_KEY` environment variable; `api_base` can be
/// overridden to point the provider at a mock server in tests.
pub struct GeminiProvider {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

/// Request body for generateContent
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

/// A single conversation turn in Gemini's wire format
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Part {
    text: String,
}

/// Response body from generateContent
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

impl GeminiProvider {
    /// Creates a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns `ClinicbotError::MissingCredentials` if no API key is
    /// configured and `GEMINI_API_KEY` is unset, or an HTTP error if the
    /// client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = resolve_api_key(config.api_key, std::env::var("GEMINI_API_KEY").ok())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ClinicbotError::Http)?;

        Ok(Self {
            client,
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key,
            model: config.model,
        })
    }
}

/// Picks the configured key over the environment; empty strings count
/// as unset.
fn resolve_api_key(configured: Option<String>, env_key: Option<String>) -> Result<String> {
    configured
        .filter(|key| !key.is_empty())
        .or_else(|| env_key.filter(|key| !key.is_empty()))
        .ok_or_else(|| ClinicbotError::MissingCredentials("gemini".to_string()).into())
}

/// Converts session history into Gemini wire-format turns.
fn build_contents(history: &[ChatEntry]) -> Vec<Content> {
    history
        .iter()
        .map(|entry| Content {
            role: match entry.role {
                ChatRole::User => "user".to_string(),
                ChatRole::Assistant => "model".to_string(),
            },
            parts: vec![Part {
                text: entry.content.clone(),
            }],
        })
        .collect()
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn respond(&self, history: &[ChatEntry]) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: build_contents(history),
        };

        tracing::debug!(
            "Calling Gemini model {} with {} history entries",
            self.model,
            history.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ClinicbotError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClinicbotError::Provider(format!(
                "Gemini API returned {}: {}",
                status, body
            ))
            .into());
        }

        let body: GenerateContentResponse =
            response.json().await.map_err(ClinicbotError::Http)?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| {
                ClinicbotError::Provider("Gemini response contained no candidates".to_string())
            })?;

        tracing::debug!("Gemini reply length: {} characters", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server_uri: &str) -> GeminiProvider {
        GeminiProvider::new(GeminiConfig {
            model: "gemini-1.5-flash-latest".to_string(),
            api_base: Some(server_uri.to_string()),
            api_key: Some("test-key".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn test_build_contents_role_mapping() {
        let history = vec![
            ChatEntry::user("hello"),
            ChatEntry::assistant("hi, how can I help?"),
            ChatEntry::user("what are your opening hours?"),
        ];

        let contents = build_contents(&history);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2].role, "user");
        assert_eq!(contents[2].parts[0].text, "what are your opening hours?");
    }

    #[test]
    fn test_resolve_api_key_missing_everywhere_is_error() {
        let error = resolve_api_key(None, None).unwrap_err().to_string();
        assert!(error.contains("gemini"));
    }

    #[test]
    fn test_resolve_api_key_config_wins_over_environment() {
        let key =
            resolve_api_key(Some("config-key".to_string()), Some("env-key".to_string())).unwrap();
        assert_eq!(key, "config-key");
    }

    #[test]
    fn test_resolve_api_key_empty_config_falls_back_to_environment() {
        let key = resolve_api_key(Some(String::new()), Some("env-key".to_string())).unwrap();
        assert_eq!(key, "env-key");

        let error = resolve_api_key(Some(String::new()), Some(String::new())).unwrap_err();
        assert!(error.to_string().contains("gemini"));
    }

    #[tokio::test]
    async fn test_respond_returns_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(
                "/models/gemini-1.5-flash-latest:generateContent",
            ))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{"text": "Hello! How can I help you today?"}]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server.uri());
        let reply = provider.respond(&[ChatEntry::user("hello")]).await.unwrap();
        assert_eq!(reply, "Hello! How can I help you today?");
    }

    #[tokio::test]
    async fn test_respond_error_status_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let provider = provider_for(&server.uri());
        let result = provider.respond(&[ChatEntry::user("hello")]).await;
        let error = result.unwrap_err().to_string();
        assert!(error.contains("429"));
    }

    #[tokio::test]
    async fn test_respond_empty_candidates_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server.uri());
        let result = provider.respond(&[ChatEntry::user("hello")]).await;
        let error = result.unwrap_err().to_string();
        assert!(error.contains("no candidates"));
    }
}
