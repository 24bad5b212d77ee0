//! Interactive chat session.

use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;

use super::ask::print_stream;
use super::runtime::{build_engine, load_config};
use crate::cli::output::get_formatter;
use crate::client::ChatClient;
use crate::models::{ChatEvent, OutputFormat};
use crate::services::ChatEngine;

const QUIT_WORDS: &[&str] = &["salir", "exit", "quit"];

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Talk to a running server instead of answering locally
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,
}

enum Backend {
    Local(ChatEngine),
    Remote(ChatClient),
}

impl Backend {
    async fn events(&self, question: &str) -> Result<BoxStream<'static, Result<ChatEvent>>> {
        match self {
            Backend::Local(engine) => Ok(engine.ask_stream(question).map(Ok).boxed()),
            Backend::Remote(client) => {
                let events = client
                    .ask_stream(question)
                    .await
                    .with_context(|| format!("request to {} failed", client.base_url()))?;
                Ok(events.map(|e| e.map_err(anyhow::Error::from)).boxed())
            }
        }
    }
}

pub fn is_quit_command(input: &str) -> bool {
    let input = input.trim();
    QUIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

/// Lines from `reader`, read on a detached thread. A pending terminal read
/// does not keep the process alive after the loop exits.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

pub async fn handle_chat(
    args: ChatArgs,
    config_path: Option<&Path>,
    _format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    // Streamed fragments only make sense as plain text.
    let formatter = get_formatter(OutputFormat::Text);

    let backend = match args.server {
        Some(url) => {
            let client = ChatClient::new(
                &url,
                Duration::from_secs(config.generation.timeout_secs),
            )?;
            Backend::Remote(client)
        }
        None => Backend::Local(build_engine(&config).await?),
    };

    println!(
        "{}",
        style("Document assistant ready. Type 'exit' to quit.").bold()
    );

    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    loop {
        print!("\n{} ", style("You:").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.recv().await.transpose()? else {
            println!();
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_quit_command(question) {
            break;
        }

        print!("{} ", style("Assistant:").green().bold());
        std::io::stdout().flush()?;

        let outcome = match backend.events(question).await {
            Ok(events) => print_stream(events, formatter.as_ref()).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(None) => {}
            Ok(Some(message)) => eprintln!("{} {}", style("Error:").red().bold(), message),
            Err(e) => eprintln!("{} {:#}", style("Error:").red().bold(), e),
        }
    }

    println!("{}", style("Goodbye.").dim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_words() {
        assert!(is_quit_command("salir"));
        assert!(is_quit_command("  EXIT "));
        assert!(is_quit_command("quit"));
        assert!(!is_quit_command("quitting time"));
        assert!(!is_quit_command(""));
    }

    #[tokio::test]
    async fn test_line_reader_forwards_lines_then_closes() {
        let input = std::io::Cursor::new("hello\n\nexit\n");
        let mut lines = spawn_line_reader(input);

        let mut seen = Vec::new();
        while let Some(line) = lines.recv().await {
            seen.push(line.unwrap());
        }
        assert_eq!(seen, vec!["hello", "", "exit"]);
    }

    #[tokio::test]
    async fn test_line_reader_stops_after_read_error() {
        let input = std::io::Cursor::new(vec![b'o', b'k', b'\n', 0xff, b'\n', b'x', b'\n']);
        let mut lines = spawn_line_reader(input);

        assert_eq!(lines.recv().await.unwrap().unwrap(), "ok");
        assert!(lines.recv().await.unwrap().is_err());
        assert!(lines.recv().await.is_none());
    }
}
