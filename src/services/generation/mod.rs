//! Generation model abstraction and the HTTP backends behind it.

mod gemini;
mod openai;
mod sse;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;

use crate::error::GenerationError;
use crate::models::{GenerationConfig, GenerationProvider, Message};

/// Ordered, finite sequence of answer fragments. Not restartable.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

/// A language model answering a sequence of role-tagged messages.
#[async_trait]
pub trait GenerationModel: Send + Sync {
    /// Generate the whole answer in one call.
    async fn complete(&self, messages: &[Message]) -> Result<String, GenerationError>;

    /// Generate the answer incrementally.
    ///
    /// Fails before the first fragment if the request cannot be started.
    async fn stream(&self, messages: &[Message]) -> Result<TokenStream, GenerationError>;

    fn model_id(&self) -> &str;
}

/// Create the configured generation backend.
pub fn create_model(config: &GenerationConfig) -> Result<Arc<dyn GenerationModel>, GenerationError> {
    let model: Arc<dyn GenerationModel> = match config.provider {
        GenerationProvider::Gemini => Arc::new(GeminiClient::new(config)?),
        GenerationProvider::OpenAi => Arc::new(OpenAiClient::new(config)?),
    };
    Ok(model)
}

/// Turn a non-success response into an `ApiError`.
async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GenerationError::ApiError {
        provider,
        status: status.as_u16(),
        body,
    })
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, GenerationError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(GenerationError::RequestError)
}
