//! Builds services from a loaded configuration.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::models::Config;
use crate::services::{
    ChatEngine, EmbeddingClient, IngestionService, VectorIndex, create_backend, create_model,
};

pub(super) fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("failed to load configuration")
}

pub(super) async fn open_index(config: &Config) -> Result<Arc<dyn VectorIndex>> {
    let embedder =
        EmbeddingClient::new(&config.embedding).context("failed to create embedding client")?;
    create_backend(&config.vector_store, Arc::new(embedder))
        .await
        .with_context(|| {
            format!(
                "failed to open {} vector store at {}",
                config.vector_store.driver, config.vector_store.url
            )
        })
}

pub(super) async fn build_engine(config: &Config) -> Result<ChatEngine> {
    let index = open_index(config).await?;
    let model = create_model(&config.generation).context("failed to create generation model")?;
    ChatEngine::from_config(index, model, &config.retrieval).context("invalid retrieval settings")
}

pub(super) async fn build_ingestion(config: &Config) -> Result<IngestionService> {
    let index = open_index(config).await?;
    IngestionService::new(index, &config.ingestion).context("invalid ingestion settings")
}
