//! CLI module for the document chat assistant.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Ask questions about a folder of PDF documents.
#[derive(Debug, Parser)]
#[command(name = "docchat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, short = 'c', global = true, help = "Path to a config file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage the document index (ingest, ingest_one, clear)
    Db(commands::DbArgs),

    /// Ask a single question
    Ask(commands::AskArgs),

    /// Interactive chat session
    Chat(commands::ChatArgs),

    /// Run the HTTP chat API
    Serve(commands::ServeArgs),

    /// Check vector store and model status
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_db_ingest_one() {
        let cli = Cli::try_parse_from(["docchat", "db", "ingest_one", "docs/a.pdf"]).unwrap();
        match cli.command {
            Commands::Db(args) => {
                assert_eq!(args.action, commands::DbAction::IngestOne);
                assert_eq!(args.path, Some(PathBuf::from("docs/a.pdf")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_db_action() {
        assert!(Cli::try_parse_from(["docchat", "db", "reindex"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["docchat", "status", "--format", "json", "-v"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.verbose);
    }
}
