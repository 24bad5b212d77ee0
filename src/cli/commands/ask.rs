use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use futures::{Stream, StreamExt};

use super::runtime::{build_engine, load_config};
use crate::cli::output::{Formatter, get_formatter};
use crate::models::{ChatEvent, OutputFormat};

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Question to ask
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Wait for the full answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,
}

pub async fn handle_ask(
    args: AskArgs,
    config_path: Option<&Path>,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let question = args.question.join(" ");
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("question must not be empty");
    }

    let config = load_config(config_path)?;
    let formatter = get_formatter(format);
    let engine = build_engine(&config).await?;

    if args.no_stream || format != OutputFormat::Text {
        let answer = engine.ask(question).await.context("chat turn failed")?;
        println!("{}", formatter.format_answer(&answer));
        return Ok(());
    }

    let events = engine.ask_stream(question).map(Ok::<_, anyhow::Error>);
    if let Some(error) = print_stream(events, formatter.as_ref()).await? {
        anyhow::bail!("chat turn failed: {error}");
    }
    Ok(())
}

/// Print answer fragments as they arrive, then the sources line.
///
/// Returns the message of an `Error` event, if one ended the turn.
pub(super) async fn print_stream<S>(
    mut events: S,
    formatter: &dyn Formatter,
) -> Result<Option<String>>
where
    S: Stream<Item = Result<ChatEvent>> + Unpin,
{
    let mut stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        match event? {
            ChatEvent::Answer(fragment) => {
                write!(stdout, "{fragment}")?;
                stdout.flush()?;
            }
            ChatEvent::Sources(sources) => {
                writeln!(stdout)?;
                write!(stdout, "{}", formatter.format_sources(&sources))?;
            }
            ChatEvent::Error(message) => {
                writeln!(stdout)?;
                return Ok(Some(message));
            }
        }
    }
    stdout.flush()?;
    Ok(None)
}
