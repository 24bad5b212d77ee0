//! Retrieval-augmented chat engine.
//!
//! A turn runs retrieval, prompt assembly, generation and source attribution
//! in sequence. Nothing is kept between turns.

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};

use super::generation::GenerationModel;
use super::vector_store::VectorIndex;
use crate::error::{ChatError, ConfigError};
use crate::models::{
    CONTEXT_PLACEHOLDER, ChatAnswer, ChatEvent, DEFAULT_SYSTEM_PROMPT, Message, RetrievalConfig,
    RetrievedChunk, SearchMode,
};

pub type ChatEventStream = Pin<Box<dyn Stream<Item = ChatEvent> + Send>>;

/// System prompt with a `{context}` slot.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>) -> Result<Self, ConfigError> {
        let system = system.into();
        if !system.contains(CONTEXT_PLACEHOLDER) {
            return Err(ConfigError::ValidationError(format!(
                "system prompt must contain the {CONTEXT_PLACEHOLDER} placeholder"
            )));
        }
        Ok(Self { system })
    }

    /// System message carrying the context, then the question as a human message.
    pub fn render(&self, context: &str, question: &str) -> Vec<Message> {
        vec![
            Message::system(self.system.replace(CONTEXT_PLACEHOLDER, context)),
            Message::human(question),
        ]
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ChatEngine {
    index: Arc<dyn VectorIndex>,
    model: Arc<dyn GenerationModel>,
    template: PromptTemplate,
    k: usize,
    mode: SearchMode,
    sources_limit: usize,
}

impl ChatEngine {
    pub fn new(index: Arc<dyn VectorIndex>, model: Arc<dyn GenerationModel>) -> Self {
        Self {
            index,
            model,
            template: PromptTemplate::default(),
            k: crate::models::DEFAULT_K as usize,
            mode: SearchMode::default(),
            sources_limit: crate::models::DEFAULT_SOURCES_LIMIT as usize,
        }
    }

    pub fn from_config(
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn GenerationModel>,
        config: &RetrievalConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(index, model)
            .with_template(PromptTemplate::new(config.system_prompt.clone())?)
            .with_k(config.k as usize)
            .with_mode(config.search_mode())
            .with_sources_limit(config.sources_limit as usize))
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_sources_limit(mut self, limit: usize) -> Self {
        self.sources_limit = limit;
        self
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn model(&self) -> &Arc<dyn GenerationModel> {
        &self.model
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>, ChatError> {
        let context = self
            .index
            .query(question, self.k, self.mode)
            .await
            .map_err(ChatError::Retrieval)?;
        tracing::debug!(chunks = context.len(), mode = %self.mode, "retrieved context");
        Ok(context)
    }

    /// Join chunk texts in ranking order, separated by a blank line.
    pub fn build_messages(&self, question: &str, context: &[RetrievedChunk]) -> Vec<Message> {
        let block = context
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        self.template.render(&block, question)
    }

    /// Answer a question in one call, with its sources.
    pub async fn ask(&self, question: &str) -> Result<ChatAnswer, ChatError> {
        let context = self.retrieve(question).await?;
        let messages = self.build_messages(question, &context);
        let answer = self.model.complete(&messages).await?;
        Ok(ChatAnswer {
            answer,
            sources: collect_sources(&context, self.sources_limit),
        })
    }

    /// Answer a question as a stream of events.
    ///
    /// Yields non-empty `Answer` fragments in arrival order, then exactly one
    /// `Sources`. Any failure yields a single `Error` and ends the stream.
    pub fn ask_stream(&self, question: impl Into<String>) -> ChatEventStream {
        let engine = self.clone();
        let question = question.into();

        Box::pin(async_stream::stream! {
            let context = match engine.retrieve(&question).await {
                Ok(context) => context,
                Err(e) => {
                    tracing::warn!(error = %e, "chat turn failed");
                    yield ChatEvent::Error(e.to_string());
                    return;
                }
            };

            let messages = engine.build_messages(&question, &context);
            let mut tokens = match engine.model.stream(&messages).await {
                Ok(tokens) => tokens,
                Err(e) => {
                    let e = ChatError::from(e);
                    tracing::warn!(error = %e, "chat turn failed");
                    yield ChatEvent::Error(e.to_string());
                    return;
                }
            };

            while let Some(fragment) = tokens.next().await {
                match fragment {
                    Ok(text) if text.is_empty() => {}
                    Ok(text) => yield ChatEvent::Answer(text),
                    Err(e) => {
                        let e = ChatError::from(e);
                        tracing::warn!(error = %e, "generation stream failed");
                        yield ChatEvent::Error(e.to_string());
                        return;
                    }
                }
            }

            yield ChatEvent::Sources(collect_sources(&context, engine.sources_limit));
        })
    }
}

/// File names of the first `limit` chunks' sources, deduplicated in first-seen order.
pub fn collect_sources(context: &[RetrievedChunk], limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    context
        .iter()
        .take(limit)
        .filter_map(|c| c.metadata.file_name())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}
