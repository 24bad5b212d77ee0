//! OpenAI-compatible chat completions backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::sse::sse_to_stream;
use super::{GenerationModel, TokenStream, check_status, http_client};
use crate::error::GenerationError;
use crate::models::{GenerationConfig, Message, Role};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Client for `/chat/completions` on OpenAI or any compatible server.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiClient {
    /// A key is required unless a custom `base_url` points at a local server.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        if config.api_key.is_none() && config.base_url.is_none() {
            return Err(GenerationError::MissingApiKey(PROVIDER));
        }

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
        })
    }

    fn build_request<'a>(&'a self, messages: &'a [Message], stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| ApiMessage {
                    role: match m.role {
                        Role::System => "system",
                        Role::Human => "user",
                        Role::Assistant => "assistant",
                    },
                    content: &m.content,
                })
                .collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
        }
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response, GenerationError> {
        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;
        check_status(PROVIDER, response).await
    }
}

fn parse_stream_event(data: &str) -> Option<Result<String, GenerationError>> {
    if data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            let content = chunk
                .choices
                .first()
                .and_then(|c| c.delta.content.as_deref())
                .unwrap_or_default();

            if content.is_empty() {
                None
            } else {
                Some(Ok(content.to_owned()))
            }
        }
        Err(e) => Some(Err(GenerationError::StreamError(format!(
            "failed to parse SSE data: {e}"
        )))),
    }
}

#[async_trait]
impl GenerationModel for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, GenerationError> {
        let response = self.send(&self.build_request(messages, false)).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(GenerationError::EmptyResponse(PROVIDER))
    }

    async fn stream(&self, messages: &[Message]) -> Result<TokenStream, GenerationError> {
        let response = self.send(&self.build_request(messages, true)).await?;
        Ok(sse_to_stream(response, parse_stream_event))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
