//! Google Gemini REST backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::sse::sse_to_stream;
use super::{GenerationModel, TokenStream, check_status, http_client};
use crate::error::GenerationError;
use crate::models::{GenerationConfig, Message, Role};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const PROVIDER: &str = "gemini";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

/// Client for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_output_tokens: Option<u32>,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(GenerationError::MissingApiKey(PROVIDER))?;

        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn build_request(&self, messages: &[Message]) -> GenerateContentRequest {
        let system: Vec<Part> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| Part {
                text: Some(m.content.clone()),
            })
            .collect();

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Content {
                role: Some(
                    match m.role {
                        Role::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: (!system.is_empty()).then_some(Content {
                role: None,
                parts: system,
            }),
            generation_config: GenerationParams {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }
}

fn parse_stream_event(data: &str) -> Option<Result<String, GenerationError>> {
    match serde_json::from_str::<GenerateContentResponse>(data) {
        Ok(response) => {
            if let Some(reason) = response.block_reason() {
                return Some(Err(GenerationError::InvalidResponse(format!(
                    "prompt blocked: {reason}"
                ))));
            }
            let text = response.text();
            if text.is_empty() { None } else { Some(Ok(text)) }
        }
        Err(e) => Some(Err(GenerationError::StreamError(format!(
            "failed to parse SSE data: {e}"
        )))),
    }
}

#[async_trait]
impl GenerationModel for GeminiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(self.url("generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request(messages))
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        if let Some(reason) = body.block_reason() {
            return Err(GenerationError::InvalidResponse(format!(
                "prompt blocked: {reason}"
            )));
        }
        let text = body.text();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse(PROVIDER));
        }
        Ok(text)
    }

    async fn stream(&self, messages: &[Message]) -> Result<TokenStream, GenerationError> {
        let response = self
            .client
            .post(self.url("streamGenerateContent"))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request(messages))
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;
        tracing::debug!(model = %self.model, "gemini stream opened");

        Ok(sse_to_stream(response, parse_stream_event))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
