use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use console::style;

use super::runtime::load_config;
use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{OutputFormat, VectorDriver};
use crate::services::{EmbeddingClient, create_backend};

pub async fn handle_status(
    config_path: Option<&Path>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let formatter = get_formatter(format);

    let embedder = Arc::new(EmbeddingClient::new(&config.embedding)?);
    let embedding_reachable = match embedder.health_check().await {
        Ok(()) => true,
        Err(e) => {
            if verbose {
                eprintln!("embedding server: {e}");
            }
            false
        }
    };

    let (vector_store_connected, entries) =
        match create_backend(&config.vector_store, embedder).await {
            Ok(index) => {
                let connected = index.health_check().await.unwrap_or(false);
                let entries = if connected {
                    index.count().await.unwrap_or(0)
                } else {
                    0
                };
                (connected, entries)
            }
            Err(e) => {
                if verbose {
                    eprintln!("vector store: {e}");
                }
                (false, 0)
            }
        };

    let status = StatusInfo {
        vector_store_driver: config.vector_store.driver.to_string(),
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected,
        collection: config.vector_store.collection.clone(),
        entries,
        embedding_url: config.embedding.url.clone(),
        embedding_model: config.embedding.model_id.clone(),
        embedding_reachable,
        generation_provider: config.generation.provider.to_string(),
        generation_model: config.generation.model.clone(),
    };

    print!("{}", formatter.format_status(&status));

    if !embedding_reachable || !vector_store_connected {
        eprintln!();
        if !embedding_reachable {
            eprintln!(
                "{} embedding server not reachable at {}",
                style("Warning:").yellow().bold(),
                config.embedding.url
            );
        }
        if !vector_store_connected {
            let hint = match config.vector_store.driver {
                VectorDriver::Qdrant => "Qdrant not running. Start with: docker compose up -d qdrant",
                VectorDriver::PostgreSQL => "PostgreSQL not accessible. Check connection settings.",
                VectorDriver::Memory => "in-memory index unavailable.",
            };
            eprintln!("{} {}", style("Warning:").yellow().bold(), hint);
        }
    } else if entries == 0 {
        eprintln!();
        eprintln!(
            "{} collection is empty. Run: docchat db ingest",
            style("Hint:").cyan().bold()
        );
    }

    Ok(())
}
