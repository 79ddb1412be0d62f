use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from the external text-completion endpoint
///
/// None of these cross the ranker: every variant degrades to the
/// deterministic ordering.
#[derive(Debug, Error)]
pub enum RankingServiceError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Gateway returned error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid completion envelope: {0}")]
    InvalidResponse(String),

    #[error("Ranking call timed out after {0:?}")]
    Timeout(Duration),
}

/// System instruction and user prompt for one completion call
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Free-form text completion used to reorder donor candidates
#[async_trait]
pub trait RankingService: Send + Sync {
    /// Returns the raw completion text
    async fn complete(&self, prompt: &Prompt) -> Result<String, RankingServiceError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// OpenAI-compatible chat-completions client
pub struct AiGatewayClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl AiGatewayClient {
    pub fn new(endpoint: String, api_key: String, model: String, timeout: Duration) -> Result<Self, RankingServiceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl RankingService for AiGatewayClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, RankingServiceError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RankingServiceError::ApiError { status, body });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RankingServiceError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RankingServiceError::InvalidResponse("Completion has no message content".into()))
    }

    fn name(&self) -> &str {
        "ai-gateway"
    }
}
