use std::fmt::{self, Write as FmtWrite};

use serde::Serialize;

use crate::models::{ChatAnswer, OutputFormat};
use crate::services::IngestReport;

pub trait Formatter {
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_ingest_report(&self, report: &IngestReport) -> String;
    fn format_answer(&self, answer: &ChatAnswer) -> String;
    fn format_sources(&self, sources: &[String]) -> String;
    fn format_message(&self, message: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub vector_store_driver: String,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub collection: String,
    pub entries: u64,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_reachable: bool,
    pub generation_provider: String,
    pub generation_model: String,
}

fn render(f: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut output = String::new();
    if let Err(e) = f(&mut output) {
        tracing::debug!(error = %e, "formatting failed");
    }
    output
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_status(&self, status: &StatusInfo) -> String {
        render(|output| {
            writeln!(output, "Status")?;
            writeln!(output, "------")?;

            let embedding_status = if status.embedding_reachable {
                "[RUNNING]"
            } else {
                "[UNREACHABLE]"
            };
            writeln!(output, "Embedding:     {}", embedding_status)?;
            writeln!(output, "  URL:         {}", status.embedding_url)?;
            writeln!(output, "  Model:       {}", status.embedding_model)?;
            writeln!(output)?;

            let vector_status = if status.vector_store_connected {
                "[CONNECTED]"
            } else {
                "[DISCONNECTED]"
            };
            writeln!(
                output,
                "Vector Store:  {} ({})",
                status.vector_store_driver, vector_status
            )?;
            writeln!(output, "  URL:         {}", status.vector_store_url)?;
            writeln!(output, "  Collection:  {}", status.collection)?;
            if status.vector_store_connected {
                writeln!(output, "  Entries:     {}", status.entries)?;
            }
            writeln!(output)?;

            writeln!(
                output,
                "Generation:    {} ({})",
                status.generation_provider, status.generation_model
            )
        })
    }

    fn format_ingest_report(&self, report: &IngestReport) -> String {
        render(|output| {
            if report.is_partial() {
                writeln!(output, "Ingestion Finished With Errors")?;
                writeln!(output, "------------------------------")?;
            } else {
                writeln!(output, "Ingestion Complete")?;
                writeln!(output, "------------------")?;
            }
            writeln!(output, "Root: {}", report.root.display())?;
            writeln!(output, "Files scanned: {}", report.files_scanned)?;
            writeln!(output, "Files skipped: {}", report.files_skipped)?;
            writeln!(output, "Documents: {}", report.documents)?;
            writeln!(
                output,
                "Batches: {} ({} failed)",
                report.batches, report.failed_batches
            )?;
            writeln!(output, "Chunks inserted: {}", report.chunks_inserted)?;
            writeln!(output, "Duration: {}ms", report.duration_ms)?;
            for error in &report.errors {
                writeln!(output, "  ! {}", error)?;
            }
            Ok(())
        })
    }

    fn format_answer(&self, answer: &ChatAnswer) -> String {
        format!(
            "{}\n{}",
            answer.answer,
            self.format_sources(&answer.sources)
        )
    }

    fn format_sources(&self, sources: &[String]) -> String {
        if sources.is_empty() {
            return String::new();
        }
        format!("\n[Sources: {}]\n", sources.join(", "))
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let result = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        result.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "embedding": {
                "url": status.embedding_url,
                "model": status.embedding_model,
                "reachable": status.embedding_reachable,
            },
            "vector_store": {
                "driver": status.vector_store_driver,
                "url": status.vector_store_url,
                "connected": status.vector_store_connected,
                "collection": status.collection,
                "entries": status.entries,
            },
            "generation": {
                "provider": status.generation_provider,
                "model": status.generation_model,
            }
        });
        self.to_json(&json)
    }

    fn format_ingest_report(&self, report: &IngestReport) -> String {
        self.to_json(report)
    }

    fn format_answer(&self, answer: &ChatAnswer) -> String {
        self.to_json(answer)
    }

    fn format_sources(&self, sources: &[String]) -> String {
        self.to_json(&serde_json::json!({ "sources": sources }))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_status(&self, status: &StatusInfo) -> String {
        render(|output| {
            writeln!(output, "## Status\n")?;

            let embedding_status = if status.embedding_reachable {
                "✅"
            } else {
                "❌"
            };
            writeln!(output, "### Embedding {}\n", embedding_status)?;
            writeln!(output, "- **URL:** `{}`", status.embedding_url)?;
            writeln!(output, "- **Model:** {}\n", status.embedding_model)?;

            let vector_status = if status.vector_store_connected {
                "✅"
            } else {
                "❌"
            };
            writeln!(
                output,
                "### Vector Store ({}) {}\n",
                status.vector_store_driver, vector_status
            )?;
            writeln!(output, "- **URL:** `{}`", status.vector_store_url)?;
            writeln!(output, "- **Collection:** {}", status.collection)?;
            writeln!(output, "- **Entries:** {}\n", status.entries)?;

            writeln!(output, "### Generation\n")?;
            writeln!(output, "- **Provider:** {}", status.generation_provider)?;
            writeln!(output, "- **Model:** {}", status.generation_model)
        })
    }

    fn format_ingest_report(&self, report: &IngestReport) -> String {
        render(|output| {
            writeln!(output, "## Ingestion Report\n")?;
            writeln!(output, "| Metric | Value |")?;
            writeln!(output, "|--------|-------|")?;
            writeln!(output, "| Root | `{}` |", report.root.display())?;
            writeln!(output, "| Files scanned | {} |", report.files_scanned)?;
            writeln!(output, "| Files skipped | {} |", report.files_skipped)?;
            writeln!(output, "| Documents | {} |", report.documents)?;
            writeln!(output, "| Batches | {} |", report.batches)?;
            writeln!(output, "| Failed batches | {} |", report.failed_batches)?;
            writeln!(output, "| Chunks inserted | {} |", report.chunks_inserted)?;
            writeln!(output, "| Duration | {}ms |", report.duration_ms)?;
            if !report.errors.is_empty() {
                writeln!(output, "\n### Errors\n")?;
                for error in &report.errors {
                    writeln!(output, "- {}", error)?;
                }
            }
            Ok(())
        })
    }

    fn format_answer(&self, answer: &ChatAnswer) -> String {
        format!(
            "{}\n{}",
            answer.answer,
            self.format_sources(&answer.sources)
        )
    }

    fn format_sources(&self, sources: &[String]) -> String {
        if sources.is_empty() {
            return String::new();
        }
        let items: Vec<String> = sources.iter().map(|s| format!("- `{}`", s)).collect();
        format!("\n**Sources:**\n\n{}\n", items.join("\n"))
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer() -> ChatAnswer {
        ChatAnswer {
            answer: "Ownership moves values.".to_string(),
            sources: vec!["rust.pdf".to_string(), "book.pdf".to_string()],
        }
    }

    #[test]
    fn test_text_answer_lists_sources() {
        let out = TextFormatter.format_answer(&answer());
        assert!(out.starts_with("Ownership moves values."));
        assert!(out.contains("[Sources: rust.pdf, book.pdf]"));
    }

    #[test]
    fn test_text_sources_empty() {
        assert_eq!(TextFormatter.format_sources(&[]), "");
    }

    #[test]
    fn test_json_answer_shape() {
        let out = JsonFormatter::new(false).format_answer(&answer());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["answer"], "Ownership moves values.");
        assert_eq!(value["sources"][1], "book.pdf");
    }

    #[test]
    fn test_partial_report_heading() {
        let report = IngestReport {
            failed_batches: 1,
            errors: vec!["batch 2: connection refused".to_string()],
            ..Default::default()
        };
        let out = TextFormatter.format_ingest_report(&report);
        assert!(out.starts_with("Ingestion Finished With Errors"));
        assert!(out.contains("batch 2: connection refused"));
    }
}
