//! HTTP client for a running chat server.

use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::Client;

use crate::error::ClientError;
use crate::models::{ChatAnswer, ChatEvent, ChatRequest};

pub type ClientEventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent, ClientError>> + Send>>;

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/v1/chat`
    pub async fn ask(&self, question: &str) -> Result<ChatAnswer, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/v1/chat", self.base_url))
            .json(&ChatRequest {
                question: question.to_string(),
            })
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// `POST /api/v1/chat/stream`, decoded record by record.
    pub async fn ask_stream(&self, question: &str) -> Result<ClientEventStream, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/v1/chat/stream", self.base_url))
            .json(&ChatRequest {
                question: question.to_string(),
            })
            .send()
            .await?;
        let response = check_status(response).await?;

        let mut bytes = Box::pin(response.bytes_stream());
        let events = async_stream::try_stream! {
            let mut decoder = NdjsonDecoder::default();
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(ClientError::from)?;
                for event in decoder.feed(&chunk)? {
                    yield event;
                }
            }
            if let Some(event) = decoder.finish()? {
                yield event;
            }
        };
        Ok(Box::pin(events))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::StatusError {
        status: status.as_u16(),
        body,
    })
}

/// Splits a byte stream into newline-delimited chat events.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    /// Consume bytes and return every complete record seen so far.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<ChatEvent>, ClientError> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = decode_line(&line[..line.len() - 1])? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Decode a trailing record without a final newline.
    pub fn finish(&mut self) -> Result<Option<ChatEvent>, ClientError> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Result<Option<ChatEvent>, ClientError> {
    let text = std::str::from_utf8(line).map_err(|e| ClientError::DecodeError(e.to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| ClientError::DecodeError(format!("{e}: {text}")))
}
