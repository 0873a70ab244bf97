//! Command-line interface wiring for note-assistant.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod diagnose;
pub mod serve;
pub mod summarize;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Clinical note summarizer and diagnostic assistant", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Serve(args) => serve::run(args, settings).await,
            Commands::Summarize(args) => summarize::run(args, settings).await,
            Commands::Diagnose(args) => diagnose::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the JSON API and HTML forms.
    Serve(serve::Args),
    /// Summarize a note file and print its structured entities as JSON.
    Summarize(summarize::Args),
    /// Ask the language model for a diagnostic suggestion.
    Diagnose(diagnose::Args),
}
