//! Document index management.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use super::runtime::{build_ingestion, load_config};
use crate::cli::output::get_formatter;
use crate::models::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DbAction {
    /// Ingest every matching file under the documents directory
    Ingest,
    /// Ingest a single file
    #[value(name = "ingest_one", alias = "ingest-one")]
    IngestOne,
    /// Delete the whole collection
    Clear,
}

#[derive(Debug, Args)]
pub struct DbArgs {
    /// Action to perform
    pub action: DbAction,

    /// Documents directory for `ingest`, file for `ingest_one`
    pub path: Option<PathBuf>,
}

pub async fn handle_db(
    args: DbArgs,
    config_path: Option<&Path>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    if args.action == DbAction::IngestOne && args.path.is_none() {
        anyhow::bail!("`db ingest_one` requires a PATH to the file to ingest");
    }

    let config = load_config(config_path)?;
    let formatter = get_formatter(format);
    let service = build_ingestion(&config).await?;

    match args.action {
        DbAction::Ingest => {
            let root = args
                .path
                .unwrap_or_else(|| config.ingestion.documents_dir.clone());
            if verbose {
                eprintln!(
                    "Ingesting {} from {}",
                    config.ingestion.glob,
                    root.display()
                );
            }

            let service = if format == OutputFormat::Text && console::Term::stderr().is_term() {
                service.with_progress()
            } else {
                service
            };
            let report = service
                .ingest_all(&root)
                .await
                .with_context(|| format!("ingestion of {} failed", root.display()))?;

            print!("{}", formatter.format_ingest_report(&report));
            if report.aborted {
                anyhow::bail!(
                    "discovery under {} stopped early; the index is partially populated",
                    root.display()
                );
            }
            if report.is_partial() {
                anyhow::bail!(
                    "{} of {} batches failed; the index is partially populated",
                    report.failed_batches,
                    report.batches
                );
            }
        }
        DbAction::IngestOne => {
            let path = args
                .path
                .context("`db ingest_one` requires a PATH to the file to ingest")?;
            let inserted = service
                .ingest_one(&path)
                .await
                .with_context(|| format!("failed to ingest {}", path.display()))?;
            print!(
                "{}",
                formatter.format_message(&format!(
                    "Ingested {}: {} chunks",
                    path.display(),
                    inserted
                ))
            );
        }
        DbAction::Clear => {
            service.clear().await.context("failed to clear collection")?;
            print!(
                "{}",
                formatter.format_message(&format!(
                    "Collection '{}' cleared",
                    config.vector_store.collection
                ))
            );
        }
    }

    Ok(())
}
