//! Generative text-completion client
//!
//! One system instruction plus one user message in, one text answer out.
//! The OpenAI-compatible client uses a long-lived reqwest::Client for
//! connection pooling; tests substitute their own `CompletionClient`.

use crate::error::AdvisorError;
use crate::Result;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// A single completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Provider label for logs
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Reusable OpenAI chat-completions client (connection-pooled)
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn build_body(&self, request: &CompletionRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(AdvisorError::NotConfigured(
                "OPENAI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);

        info!(model = %self.model, "Calling chat completions API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| {
                error!("Chat completions request failed: {}", e);
                if e.is_timeout() {
                    AdvisorError::Timeout(format!("chat completions: {}", e))
                } else {
                    AdvisorError::UpstreamUnavailable(format!("chat completions: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, "Chat completions error response: {}", error_text);
            return Err(map_status(status, error_text));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse chat completions response: {}", e);
            AdvisorError::UpstreamUnavailable(format!("chat completions parse error: {}", e))
        })?;

        let answer = first_choice_text(&chat_response).ok_or_else(|| {
            AdvisorError::UpstreamUnavailable("Provider returned empty response".to_string())
        })?;

        info!(chars = answer.len(), "Chat completion received");

        Ok(answer)
    }
}

fn map_status(status: StatusCode, body: String) -> AdvisorError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AdvisorError::RateLimited(body),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => AdvisorError::Timeout(body),
        _ => AdvisorError::UpstreamUnavailable(format!("{}: {}", status, body)),
    }
}

fn first_choice_text(response: &ChatResponse) -> Option<String> {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> CompletionRequest {
        CompletionRequest {
            system: "You are a mortgage assistant".to_string(),
            user: "What is PMI?".to_string(),
            temperature: 0.7,
            max_tokens: 800,
            top_p: 0.9,
            frequency_penalty: 0.3,
            presence_penalty: 0.3,
        }
    }

    #[test]
    fn test_request_serialization() {
        let client =
            OpenAiClient::new("sk-test".into(), "http://localhost/v1/", "gpt-4-turbo-preview", Duration::from_secs(10))
                .unwrap();
        let json = serde_json::to_value(client.build_body(&sample_request())).unwrap();

        assert_eq!(json["model"], "gpt-4-turbo-preview");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "What is PMI?");
        assert_eq!(json["max_tokens"], 800);
        assert_eq!(client.base_url, "http://localhost/v1");
    }

    #[test]
    fn test_response_parsing() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"  PMI protects the lender.  "},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_text(&parsed).as_deref(), Some("PMI protects the lender."));

        let empty: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"   "}}]}"#).unwrap();
        assert!(first_choice_text(&empty).is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            AdvisorError::RateLimited(_)
        ));
        assert!(matches!(
            map_status(StatusCode::GATEWAY_TIMEOUT, String::new()),
            AdvisorError::Timeout(_)
        ));
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "bad key".into()),
            AdvisorError::UpstreamUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client =
            OpenAiClient::new(String::new(), "http://127.0.0.1:9/v1", "gpt-4-turbo-preview", Duration::from_secs(1))
                .unwrap();
        let err = client.complete(&sample_request()).await.unwrap_err();
        assert!(err.to_string().to_lowercase().contains("openai_api_key"));
    }
}
